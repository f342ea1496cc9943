//! Outbound ports: interface to the external payment gateway
//!
//! [`PaymentGateway`] is the architectural contract that decouples the
//! payment service from the concrete processor integration. The engine
//! calls it synchronously during payment transitions and maps results
//! onto the payment's state machine; it never sees processor wire
//! formats.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::money::Money;
use crate::shared::errors::DomainError;

/// Handle for a created payment intent. The `client_secret` goes to
/// the buyer's client for processor-side confirmation; the engine only
/// keeps `intent_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub client_secret: String,
}

/// Gateway-side failures, split by whether retrying can help.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The processor rejected the operation (declined card, invalid
    /// intent). Retrying the same request cannot succeed.
    #[error("Payment declined: {0}")]
    Declined(String),

    /// The processor was unreachable or answered with a server fault.
    #[error("Gateway transport failure: {0}")]
    Transport(String),
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        DomainError::Gateway {
            transient: err.is_retryable(),
            message: err.to_string(),
        }
    }
}

/// Port for charging and refunding money through the processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register an intended charge; returns the processor's handle.
    async fn create_intent(&self, amount: &Money) -> Result<PaymentIntent, GatewayError>;

    /// Capture a previously created intent; returns the processor's
    /// transaction reference.
    async fn capture(&self, intent_id: &str) -> Result<String, GatewayError>;

    /// Return part or all of a captured transaction; returns the
    /// processor's refund reference.
    async fn refund(
        &self,
        external_transaction_id: &str,
        amount: &Money,
    ) -> Result<String, GatewayError>;
}
