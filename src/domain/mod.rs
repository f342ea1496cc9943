pub mod booking;
pub mod events;
pub mod hold;
pub mod money;
pub mod payment;
pub mod repositories;
pub mod specification;
pub mod ticket_type;

// Re-export commonly used types
pub use booking::{Booking, BookingLine, BookingStatus, CancellationReason};
pub use hold::ReservationHold;
pub use money::Money;
pub use payment::{Payment, PaymentMethod, PaymentStatus, Refund};
pub use repositories::RepositoryProvider;
pub use specification::{CompareOp, Direction, FilterValue, SpecTarget, Specification};
pub use ticket_type::TicketType;

// Re-export the error types for convenience
pub use crate::shared::errors::{DomainError, DomainResult};
