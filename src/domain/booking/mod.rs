//! Booking aggregate
//!
//! Contains the Booking entity, its lines and status machine, and the
//! repository interface.

pub mod model;
pub mod repository;

pub use model::{Booking, BookingLine, BookingStatus, CancellationReason};
pub use repository::{BookingField, BookingRepository};
