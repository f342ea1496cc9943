//! Domain events
//!
//! Facts about what happened in the engine, broadcast to out-of-core
//! consumers (email, analytics) over the event bus. Aggregates never
//! call those consumers directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::Money;

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    BookingCreated(BookingCreatedEvent),
    BookingConfirmed(BookingConfirmedEvent),
    BookingCancelled(BookingCancelledEvent),
    HoldExpired(HoldExpiredEvent),
    PaymentCompleted(PaymentCompletedEvent),
    PaymentFailed(PaymentFailedEvent),
    PaymentRefunded(PaymentRefundedEvent),
    TicketTypeSoldOut(TicketTypeSoldOutEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::BookingCreated(_) => "booking_created",
            Event::BookingConfirmed(_) => "booking_confirmed",
            Event::BookingCancelled(_) => "booking_cancelled",
            Event::HoldExpired(_) => "hold_expired",
            Event::PaymentCompleted(_) => "payment_completed",
            Event::PaymentFailed(_) => "payment_failed",
            Event::PaymentRefunded(_) => "payment_refunded",
            Event::TicketTypeSoldOut(_) => "ticket_type_sold_out",
        }
    }

    /// The booking this event concerns, if any.
    pub fn booking_id(&self) -> Option<Uuid> {
        match self {
            Event::BookingCreated(e) => Some(e.booking_id),
            Event::BookingConfirmed(e) => Some(e.booking_id),
            Event::BookingCancelled(e) => Some(e.booking_id),
            Event::HoldExpired(e) => Some(e.booking_id),
            Event::PaymentCompleted(e) => Some(e.booking_id),
            Event::PaymentFailed(e) => Some(e.booking_id),
            Event::PaymentRefunded(e) => Some(e.booking_id),
            Event::TicketTypeSoldOut(_) => None,
        }
    }
}

/// Booking entered `PendingPayment` with its inventory held
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreatedEvent {
    pub booking_id: Uuid,
    pub booking_number: String,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub total_tickets: u32,
    pub total_amount: Money,
    pub timestamp: DateTime<Utc>,
}

/// Booking confirmed; the sale is final
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub booking_number: String,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Booking cancelled and its inventory released
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCancelledEvent {
    pub booking_id: Uuid,
    pub booking_number: String,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// One hold outlived its deadline and was swept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldExpiredEvent {
    pub booking_id: Uuid,
    pub ticket_type_id: Uuid,
    pub quantity: u32,
    pub timestamp: DateTime<Utc>,
}

/// Gateway captured a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCompletedEvent {
    pub payment_id: Uuid,
    pub payment_number: String,
    pub booking_id: Uuid,
    pub amount: Money,
    pub external_transaction_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Payment attempt failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentFailedEvent {
    pub payment_id: Uuid,
    pub booking_id: Uuid,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// A refund was applied to a completed payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRefundedEvent {
    pub payment_id: Uuid,
    pub refund_id: Uuid,
    pub booking_id: Uuid,
    pub amount: Money,
    /// True once the payment is fully refunded
    pub fully_refunded: bool,
    pub timestamp: DateTime<Utc>,
}

/// A ticket type's last unit was reserved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketTypeSoldOutEvent {
    pub ticket_type_id: Uuid,
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Wrapper for sending events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
