//! Infrastructure layer - external concerns

pub mod gateway;
pub mod memory;

pub use gateway::{GatewayBehavior, MockPaymentGateway};
pub use memory::InMemoryRepositoryProvider;
