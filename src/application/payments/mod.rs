//! Payment processing against the external gateway.

pub mod locks;
pub mod service;

pub use service::PaymentService;
