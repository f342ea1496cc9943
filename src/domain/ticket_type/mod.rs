//! Ticket type aggregate
//!
//! Contains the TicketType entity, its inventory contract, and the
//! repository interface.

pub mod model;
pub mod repository;

pub use model::TicketType;
pub use repository::{TicketTypeField, TicketTypeRepository};
