//! Reservation protocol: per-ticket-type locks, the coordinator that
//! serializes inventory mutation, and the hold expiry sweep.

pub mod coordinator;
pub mod expiry;
pub mod locks;

pub use coordinator::{LineRequest, ReservationCoordinator, ReservationRequest};
pub use expiry::start_hold_expiry_task;
pub use locks::{SharedTicketTypeLocks, TicketTypeGuard, TicketTypeLocks};
