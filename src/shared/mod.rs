pub mod errors;
pub mod reference;
pub mod retry;
pub mod shutdown;

pub use errors::{DomainError, DomainResult};
pub use reference::generate_reference;
pub use retry::{retry_with_backoff, RetryConfig};
pub use shutdown::{ShutdownNotified, ShutdownSignal};
