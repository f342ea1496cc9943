//! Domain error taxonomy
//!
//! Every business-rule failure crossing the engine boundary is one of
//! these typed variants; callers match on them instead of parsing
//! messages. Unexpected conditions (storage faults, broken invariants)
//! use the same enum but are flagged fatal or transient so the caller
//! can decide between alerting and retrying.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("Validation: {0}")]
    Validation(String),

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error(
        "Insufficient inventory for ticket type {ticket_type_id}: requested {requested}, available {available}"
    )]
    InsufficientInventory {
        ticket_type_id: Uuid,
        requested: u32,
        available: u32,
    },

    #[error("Timed out acquiring reservation lock for ticket type {ticket_type_id}")]
    ReservationTimeout { ticket_type_id: Uuid },

    #[error("Invalid {entity} transition: {from} -> {to}")]
    InvalidStateTransition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },

    #[error("Refund of {requested} would exceed payment amount {amount} (refunded so far: {refunded})")]
    RefundExceedsPayment {
        requested: String,
        refunded: String,
        amount: String,
    },

    #[error("Reservation hold for booking {booking_id} already resolved")]
    HoldAlreadyResolved { booking_id: Uuid },

    #[error("Invalid release on ticket type {ticket_type_id}: releasing {quantity} with {sold} sold")]
    InvalidRelease {
        ticket_type_id: Uuid,
        quantity: u32,
        sold: u32,
    },

    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Payment gateway error: {message}")]
    Gateway {
        message: String,
        // Transport faults are worth retrying; declines are final.
        transient: bool,
    },
}

impl DomainError {
    /// Whether the operation may succeed if simply retried.
    ///
    /// Lock-wait timeouts and transport-level faults qualify; business
    /// rejections (insufficient inventory, bad transitions) do not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DomainError::ReservationTimeout { .. }
                | DomainError::Storage(_)
                | DomainError::Gateway { transient: true, .. }
        )
    }

    /// Whether this error signals a broken internal invariant rather
    /// than a normal business rejection. Fatal errors are logged at
    /// error level and should page someone; they are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DomainError::InvalidRelease { .. })
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

// ── Tests ──────────────────────────────────────────────────────
