//! Domain events
//!
//! Event types that represent facts about what happened in the system.
//! The EventBus implementation lives in `application::events`.

pub mod types;

// Re-export all event types
pub use types::{
    BookingCancelledEvent, BookingConfirmedEvent, BookingCreatedEvent, Event, EventMessage,
    HoldExpiredEvent, PaymentCompletedEvent, PaymentFailedEvent, PaymentRefundedEvent,
    TicketTypeSoldOutEvent,
};
