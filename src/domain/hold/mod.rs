//! Reservation hold aggregate
//!
//! Contains the transient hold record and its repository interface.

pub mod model;
pub mod repository;

pub use model::ReservationHold;
pub use repository::HoldRepository;
