//! Payment aggregate
//!
//! Contains the Payment entity, its refunds, and the repository
//! interface.

pub mod model;
pub mod repository;

pub use model::{Payment, PaymentMethod, PaymentStatus, Refund};
pub use repository::{PaymentField, PaymentRepository};
