//! Application ports (hexagonal architecture boundaries)
//!
//! Outbound ports decouple the engine's services from external
//! collaborators. The only one the engine needs is the payment
//! gateway.

pub mod outbound;

pub use outbound::{GatewayError, PaymentGateway, PaymentIntent};
