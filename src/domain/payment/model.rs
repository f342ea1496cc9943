//! Payment domain entity
//!
//! One payment attempt against a booking, plus the refunds applied to
//! it. Transitions are driven by the payment gateway's results; the
//! entity only enforces which transitions are legal and that refunds
//! never exceed the captured amount.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::money::Money;
use crate::shared::errors::{DomainError, DomainResult};
use crate::shared::reference::generate_reference;

/// Payment status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Created, gateway not yet invoked
    Pending,
    /// Capture in flight at the gateway
    Processing,
    /// Captured; refunds may be appended
    Completed,
    /// Capture failed or was declined
    Failed,
    /// Abandoned before capture (booking cancelled or expired)
    Cancelled,
    /// Some, but not all, of the amount refunded
    PartiallyRefunded,
    /// Fully refunded
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
            Self::PartiallyRefunded => "PartiallyRefunded",
            Self::Refunded => "Refunded",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Pending" => Self::Pending,
            "Processing" => Self::Processing,
            "Completed" => Self::Completed,
            "Failed" => Self::Failed,
            "Cancelled" => Self::Cancelled,
            "PartiallyRefunded" => Self::PartiallyRefunded,
            "Refunded" => Self::Refunded,
            _ => Self::Failed,
        }
    }

    /// A terminal payment accepts no further capture attempt. Refund
    /// states are terminal in this sense even though refunds may still
    /// be appended.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Processing)
    }

    /// Whether refunds may be appended in this status.
    pub fn accepts_refunds(&self) -> bool {
        matches!(self, Self::Completed | Self::PartiallyRefunded)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the buyer paid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
    Card,
    Wallet,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "Card",
            Self::Wallet => "Wallet",
            Self::Cash => "Cash",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Card" => Self::Card,
            "Wallet" => Self::Wallet,
            "Cash" => Self::Cash,
            _ => Self::Card,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One refund applied to a payment. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Refund {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub amount: Money,
    pub reason: String,
    /// Gateway's reference for the refund, when one was issued
    pub external_refund_id: Option<String>,
    pub refunded_at: DateTime<Utc>,
}

/// One payment attempt (and its refunds) against a booking.
#[derive(Debug, Clone)]
pub struct Payment {
    /// Unique payment ID
    pub id: Uuid,
    pub booking_id: Uuid,
    /// Human-referenceable number, unique across payments
    pub payment_number: String,
    /// Amount to capture; always the booking's total currency
    pub amount: Money,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    /// Gateway's transaction reference once captured
    pub external_transaction_id: Option<String>,
    /// Refunds in the order they were applied
    pub refunds: Vec<Refund>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(booking_id: Uuid, amount: Money, method: PaymentMethod) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_id,
            payment_number: generate_reference("PAY"),
            amount,
            status: PaymentStatus::Pending,
            method,
            external_transaction_id: None,
            refunds: Vec::new(),
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Capture handed to the gateway.
    pub fn mark_processing(&mut self) -> DomainResult<()> {
        if self.status != PaymentStatus::Pending {
            return Err(self.bad_transition("Processing"));
        }
        self.status = PaymentStatus::Processing;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Gateway confirmed the capture.
    pub fn mark_completed(&mut self, external_transaction_id: impl Into<String>) -> DomainResult<()> {
        if self.status != PaymentStatus::Processing {
            return Err(self.bad_transition("Completed"));
        }
        self.status = PaymentStatus::Completed;
        self.external_transaction_id = Some(external_transaction_id.into());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Gateway declined or the capture errored out.
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        if !matches!(
            self.status,
            PaymentStatus::Pending | PaymentStatus::Processing
        ) {
            return Err(self.bad_transition("Failed"));
        }
        self.status = PaymentStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Abandoned before capture, e.g. the booking was cancelled or its
    /// hold expired.
    pub fn mark_cancelled(&mut self) -> DomainResult<()> {
        if !matches!(
            self.status,
            PaymentStatus::Pending | PaymentStatus::Processing
        ) {
            return Err(self.bad_transition("Cancelled"));
        }
        self.status = PaymentStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Sum of refunds applied so far, in the payment's currency.
    pub fn refunded_total(&self) -> Decimal {
        self.refunds.iter().map(|r| r.amount.amount()).sum()
    }

    /// Append a refund. Allowed while `Completed` or
    /// `PartiallyRefunded`; the cumulative total can never exceed the
    /// captured amount. Moves to `Refunded` when the totals meet.
    pub fn add_refund(
        &mut self,
        amount: Money,
        reason: impl Into<String>,
        external_refund_id: Option<String>,
    ) -> DomainResult<Refund> {
        if !self.status.accepts_refunds() {
            return Err(self.bad_transition("Refunded"));
        }
        if amount.currency() != self.amount.currency() {
            return Err(DomainError::CurrencyMismatch {
                left: self.amount.currency().to_string(),
                right: amount.currency().to_string(),
            });
        }
        if amount.is_zero() {
            return Err(DomainError::Validation(
                "Refund amount cannot be zero".to_string(),
            ));
        }

        let refunded = self.refunded_total();
        if refunded + amount.amount() > self.amount.amount() {
            return Err(DomainError::RefundExceedsPayment {
                requested: amount.to_string(),
                refunded: format!("{} {}", refunded, self.amount.currency()),
                amount: self.amount.to_string(),
            });
        }

        let refund = Refund {
            id: Uuid::new_v4(),
            payment_id: self.id,
            amount,
            reason: reason.into(),
            external_refund_id,
            refunded_at: Utc::now(),
        };
        self.refunds.push(refund.clone());

        self.status = if self.refunded_total() == self.amount.amount() {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::PartiallyRefunded
        };
        self.updated_at = Utc::now();
        Ok(refund)
    }

    fn bad_transition(&self, to: &'static str) -> DomainError {
        DomainError::InvalidStateTransition {
            entity: "Payment",
            from: self.status.as_str(),
            to,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
