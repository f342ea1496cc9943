//! Booking domain entity
//!
//! A booking is one user's order for tickets of one event. It owns its
//! lines: quantities are fixed at construction and cancellation is
//! whole-booking only. Inventory movement never happens here; the
//! reservation coordinator reserves and releases around the state
//! transitions this entity enforces.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::money::Money;
use crate::shared::errors::{DomainError, DomainResult};
use crate::shared::reference::generate_reference;

/// Booking status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingStatus {
    /// Under construction by the coordinator; inventory not yet held
    Draft,
    /// Inventory held, waiting for a payment to complete
    PendingPayment,
    /// Paid (or free); the sale is final
    Confirmed,
    /// Released; inventory returned unless it was never taken
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::PendingPayment => "PendingPayment",
            Self::Confirmed => "Confirmed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Draft" => Self::Draft,
            "PendingPayment" => Self::PendingPayment,
            "Confirmed" => Self::Confirmed,
            "Cancelled" => Self::Cancelled,
            _ => Self::Cancelled,
        }
    }

    /// Terminal states admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Cancelled)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a booking was cancelled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationReason {
    /// Explicit cancellation by the buyer or an organizer
    UserRequested,
    /// Reservation hold timed out before payment completed
    ReservationExpired,
    /// Payment failed with no retry left
    PaymentFailed,
}

impl CancellationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRequested => "UserRequested",
            Self::ReservationExpired => "ReservationExpired",
            Self::PaymentFailed => "PaymentFailed",
        }
    }
}

impl std::fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ticket-type line of a booking.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingLine {
    pub ticket_type_id: Uuid,
    pub quantity: u32,
    /// Price per ticket at booking time; later price changes on the
    /// ticket type do not reprice existing bookings
    pub unit_price: Money,
}

impl BookingLine {
    pub fn new(ticket_type_id: Uuid, quantity: u32, unit_price: Money) -> Self {
        Self {
            ticket_type_id,
            quantity,
            unit_price,
        }
    }

    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A user's order for one or more ticket types of one event.
#[derive(Debug, Clone)]
pub struct Booking {
    /// Unique booking ID
    pub id: Uuid,
    /// Human-referenceable number, unique across bookings
    pub booking_number: String,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: BookingStatus,
    /// Ordered lines; never mutated after construction
    pub lines: Vec<BookingLine>,
    /// Always equals the sum of line totals, in one currency
    pub total_amount: Money,
    /// Always equals the sum of line quantities
    pub total_tickets: u32,
    /// Organizer flagged this order for manual review
    pub requires_approval: bool,
    /// Set once any attendee of this booking has entered the venue
    pub checked_in: bool,
    pub cancellation_reason: Option<CancellationReason>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Build a booking in `Draft` from validated lines.
    ///
    /// Checks the construction invariants: at least one line, positive
    /// quantities, no ticket type repeated, one currency across all
    /// lines. Totals are derived here and nowhere else.
    pub fn new(
        user_id: Uuid,
        event_id: Uuid,
        lines: Vec<BookingLine>,
        requires_approval: bool,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::Validation(
                "Booking must have at least one line".to_string(),
            ));
        }
        for (i, line) in lines.iter().enumerate() {
            if line.quantity == 0 {
                return Err(DomainError::Validation(format!(
                    "Booking line {} has zero quantity",
                    i
                )));
            }
            if lines[..i]
                .iter()
                .any(|earlier| earlier.ticket_type_id == line.ticket_type_id)
            {
                return Err(DomainError::Validation(format!(
                    "Ticket type {} appears in more than one line",
                    line.ticket_type_id
                )));
            }
        }

        let mut total_amount = Money::zero(lines[0].unit_price.currency())?;
        let mut total_tickets: u32 = 0;
        for line in &lines {
            total_amount = total_amount.add(&line.line_total())?;
            total_tickets = total_tickets.checked_add(line.quantity).ok_or_else(|| {
                DomainError::Validation(
                    "Booking line quantities overflow the ticket count".to_string(),
                )
            })?;
        }

        Ok(Self {
            id: Uuid::new_v4(),
            booking_number: generate_reference("BK"),
            user_id,
            event_id,
            status: BookingStatus::Draft,
            lines,
            total_amount,
            total_tickets,
            requires_approval,
            checked_in: false,
            cancellation_reason: None,
            created_at: Utc::now(),
            confirmed_at: None,
            cancelled_at: None,
        })
    }

    /// Move `Draft` to `PendingPayment` once inventory is held.
    pub fn await_payment(&mut self) -> DomainResult<()> {
        if self.status != BookingStatus::Draft {
            return Err(self.bad_transition("PendingPayment"));
        }
        self.status = BookingStatus::PendingPayment;
        Ok(())
    }

    /// Move `PendingPayment` to `Confirmed`. Idempotent: confirming an
    /// already-confirmed booking succeeds without changing state. The
    /// coordinator verifies the completed payment before calling this.
    pub fn confirm(&mut self) -> DomainResult<()> {
        if self.status == BookingStatus::Confirmed {
            return Ok(());
        }
        if self.status != BookingStatus::PendingPayment {
            return Err(self.bad_transition("Confirmed"));
        }
        self.status = BookingStatus::Confirmed;
        self.confirmed_at = Some(Utc::now());
        Ok(())
    }

    /// Move `PendingPayment` or `Confirmed` to `Cancelled`. Idempotent:
    /// cancelling an already-cancelled booking succeeds and keeps the
    /// original reason.
    pub fn cancel(&mut self, reason: CancellationReason) -> DomainResult<()> {
        if self.status == BookingStatus::Cancelled {
            return Ok(());
        }
        if !matches!(
            self.status,
            BookingStatus::PendingPayment | BookingStatus::Confirmed
        ) {
            return Err(self.bad_transition("Cancelled"));
        }
        self.status = BookingStatus::Cancelled;
        self.cancellation_reason = Some(reason);
        self.cancelled_at = Some(Utc::now());
        Ok(())
    }

    /// Record venue entry. Only confirmed bookings admit attendees.
    pub fn check_in(&mut self) -> DomainResult<()> {
        if self.status != BookingStatus::Confirmed {
            return Err(DomainError::Validation(format!(
                "Cannot check in booking {} in status {}",
                self.booking_number, self.status
            )));
        }
        self.checked_in = true;
        Ok(())
    }

    pub fn is_free(&self) -> bool {
        self.total_amount.is_zero()
    }

    /// Quantity held for one ticket type, zero if the type is not in
    /// this booking.
    pub fn quantity_of(&self, ticket_type_id: Uuid) -> u32 {
        self.lines
            .iter()
            .filter(|line| line.ticket_type_id == ticket_type_id)
            .map(|line| line.quantity)
            .sum()
    }

    fn bad_transition(&self, to: &'static str) -> DomainError {
        DomainError::InvalidStateTransition {
            entity: "Booking",
            from: self.status.as_str(),
            to,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn egp(amount: i64) -> Money {
        Money::new(Decimal::from(amount), "EGP").unwrap()
    }

    fn sample_booking() -> Booking {
        Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![
                BookingLine::new(Uuid::new_v4(), 2, egp(100)),
                BookingLine::new(Uuid::new_v4(), 3, egp(50)),
            ],
            false,
        )
        .unwrap()
    }

    #[test]
    fn new_booking_derives_totals() {
        let booking = sample_booking();
        assert_eq!(booking.status, BookingStatus::Draft);
        assert_eq!(booking.total_tickets, 5);
        assert_eq!(booking.total_amount, egp(350));
        assert!(booking.booking_number.starts_with("BK-"));
        assert!(!booking.checked_in);
    }

    #[test]
    fn empty_lines_are_rejected() {
        let result = Booking::new(Uuid::new_v4(), Uuid::new_v4(), vec![], false);
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn zero_quantity_line_is_rejected() {
        let result = Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![BookingLine::new(Uuid::new_v4(), 0, egp(100))],
            false,
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn duplicate_ticket_type_lines_are_rejected() {
        let ticket_type_id = Uuid::new_v4();
        let result = Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![
                BookingLine::new(ticket_type_id, 2, egp(100)),
                BookingLine::new(ticket_type_id, 1, egp(100)),
            ],
            false,
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn ticket_count_overflow_is_rejected() {
        let result = Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![
                BookingLine::new(Uuid::new_v4(), u32::MAX, egp(0)),
                BookingLine::new(Uuid::new_v4(), 1, egp(0)),
            ],
            false,
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn mixed_currency_lines_are_rejected() {
        let result = Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![
                BookingLine::new(Uuid::new_v4(), 1, egp(100)),
                BookingLine::new(
                    Uuid::new_v4(),
                    1,
                    Money::new(Decimal::from(10), "USD").unwrap(),
                ),
            ],
            false,
        );
        assert!(matches!(result, Err(DomainError::CurrencyMismatch { .. })));
    }

    #[test]
    fn draft_to_pending_to_confirmed() {
        let mut booking = sample_booking();
        booking.await_payment().unwrap();
        assert_eq!(booking.status, BookingStatus::PendingPayment);

        booking.confirm().unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert!(booking.confirmed_at.is_some());
    }

    #[test]
    fn confirm_from_draft_is_invalid() {
        let mut booking = sample_booking();
        let err = booking.confirm().unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidStateTransition {
                entity: "Booking",
                from: "Draft",
                to: "Confirmed",
            }
        );
    }

    #[test]
    fn confirm_is_idempotent() {
        let mut booking = sample_booking();
        booking.await_payment().unwrap();
        booking.confirm().unwrap();
        let confirmed_at = booking.confirmed_at;

        booking.confirm().unwrap();
        assert_eq!(booking.confirmed_at, confirmed_at);
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn cancel_keeps_first_reason() {
        let mut booking = sample_booking();
        booking.await_payment().unwrap();
        booking.cancel(CancellationReason::ReservationExpired).unwrap();

        booking.cancel(CancellationReason::UserRequested).unwrap();
        assert_eq!(
            booking.cancellation_reason,
            Some(CancellationReason::ReservationExpired)
        );
    }

    #[test]
    fn cancel_after_confirm_is_allowed() {
        let mut booking = sample_booking();
        booking.await_payment().unwrap();
        booking.confirm().unwrap();
        booking.cancel(CancellationReason::UserRequested).unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
    }

    #[test]
    fn confirm_after_cancel_is_invalid() {
        let mut booking = sample_booking();
        booking.await_payment().unwrap();
        booking.cancel(CancellationReason::PaymentFailed).unwrap();
        assert!(booking.confirm().is_err());
    }

    #[test]
    fn check_in_requires_confirmed() {
        let mut booking = sample_booking();
        booking.await_payment().unwrap();
        assert!(booking.check_in().is_err());

        booking.confirm().unwrap();
        booking.check_in().unwrap();
        assert!(booking.checked_in);
    }

    #[test]
    fn zero_priced_booking_is_free() {
        let booking = Booking::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![BookingLine::new(Uuid::new_v4(), 2, egp(0))],
            false,
        )
        .unwrap();
        assert!(booking.is_free());
    }

    #[test]
    fn quantity_of_sums_matching_lines() {
        let booking = sample_booking();
        let first = booking.lines[0].ticket_type_id;
        assert_eq!(booking.quantity_of(first), 2);
        assert_eq!(booking.quantity_of(Uuid::new_v4()), 0);
    }

    #[test]
    fn status_round_trip() {
        for status in &[
            BookingStatus::Draft,
            BookingStatus::PendingPayment,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(&BookingStatus::from_str(status.as_str()), status);
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(BookingStatus::Confirmed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(!BookingStatus::PendingPayment.is_terminal());
        assert!(!BookingStatus::Draft.is_terminal());
    }
}
