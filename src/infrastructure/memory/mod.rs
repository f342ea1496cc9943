//! In-memory repository implementations
//!
//! Per-aggregate DashMap repositories + unified RepositoryProvider.

pub mod booking_repository;
pub mod hold_repository;
pub mod payment_repository;
pub mod repository_provider;
pub mod ticket_type_repository;

pub use booking_repository::InMemoryBookingRepository;
pub use hold_repository::InMemoryHoldRepository;
pub use payment_repository::InMemoryPaymentRepository;
pub use repository_provider::InMemoryRepositoryProvider;
pub use ticket_type_repository::InMemoryTicketTypeRepository;
