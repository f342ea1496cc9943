//! # Tazkara Core
//!
//! Inventory and order consistency engine for an event ticketing
//! platform: no ticket type ever oversells, money amounts stay exact,
//! and every booking/payment/refund walks a legal state path even
//! under concurrent access.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Aggregates (ticket type, booking, payment, hold),
//!   Money, query specifications, repository traits, domain events
//! - **application**: The reservation coordinator and its expiry
//!   sweep, payment processing, inventory administration, read paths
//! - **infrastructure**: In-memory repositories and the mock payment
//!   gateway
//! - **shared**: Error taxonomy, reference generation, retry,
//!   shutdown plumbing
//!
//! The embedding service (HTTP layer, auth, the Event entity itself)
//! lives outside this crate and talks to it through the application
//! services and the [`domain::RepositoryProvider`] seam.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use config::{default_config_path, EngineConfig};

// Re-export the operational surface for easy access
pub use application::{
    create_event_bus, start_hold_expiry_task, EventBus, InventoryService, LineRequest,
    PaymentGateway, PaymentService, QueryService, ReservationCoordinator, ReservationRequest,
    SharedEventBus, TicketTypeLocks,
};
pub use domain::{DomainError, DomainResult, RepositoryProvider};
pub use infrastructure::{InMemoryRepositoryProvider, MockPaymentGateway};
pub use shared::shutdown::ShutdownSignal;
