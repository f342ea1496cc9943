//! Reservation coordinator
//!
//! Makes "check capacity, then commit" atomic across all lines of one
//! booking request and across concurrent requests for the same ticket
//! type. The protocol is two-phase: reserve inventory line by line
//! under per-ticket-type locks, then either confirm (holds deleted,
//! sale final) or release (inventory returned). Any failure part-way
//! rolls back every line already taken in that operation.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::locks::SharedTicketTypeLocks;
use crate::application::events::SharedEventBus;
use crate::config::EngineConfig;
use crate::domain::booking::{Booking, BookingLine, BookingStatus, CancellationReason};
use crate::domain::events::types::{
    BookingCancelledEvent, BookingConfirmedEvent, BookingCreatedEvent, Event, HoldExpiredEvent,
    TicketTypeSoldOutEvent,
};
use crate::domain::hold::ReservationHold;
use crate::domain::payment::PaymentStatus;
use crate::domain::RepositoryProvider;
use crate::shared::errors::{DomainError, DomainResult};

/// One requested booking line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRequest {
    pub ticket_type_id: Uuid,
    pub quantity: u32,
}

/// A booking request entering the coordinator
#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub lines: Vec<LineRequest>,
    pub requires_approval: bool,
}

/// Serializes inventory mutation and owns the reserve → confirm /
/// release protocol.
pub struct ReservationCoordinator {
    repos: Arc<dyn RepositoryProvider>,
    locks: SharedTicketTypeLocks,
    event_bus: SharedEventBus,
    config: EngineConfig,
}

impl ReservationCoordinator {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        locks: SharedTicketTypeLocks,
        event_bus: SharedEventBus,
        config: EngineConfig,
    ) -> Self {
        Self {
            repos,
            locks,
            event_bus,
            config,
        }
    }

    /// Reserve inventory for every line of the request and create the
    /// booking.
    ///
    /// Lines are processed in ticket-type-ID order under per-key locks.
    /// If any line cannot be filled, lines already taken are released
    /// in reverse order and the error names the failing ticket type.
    /// On success the booking is `PendingPayment` with one hold per
    /// line, or immediately `Confirmed` (and hold-free) when the total
    /// is zero.
    pub async fn reserve(&self, request: ReservationRequest) -> DomainResult<Booking> {
        if request.lines.is_empty() {
            return Err(DomainError::Validation(
                "Reservation needs at least one line".to_string(),
            ));
        }

        let mut sorted_lines = request.lines.clone();
        sorted_lines.sort_by_key(|line| line.ticket_type_id);
        if sorted_lines
            .windows(2)
            .any(|pair| pair[0].ticket_type_id == pair[1].ticket_type_id)
        {
            return Err(DomainError::Validation(
                "Reservation lists the same ticket type twice".to_string(),
            ));
        }

        // Cheap validation before any lock is taken.
        let mut booking_lines = Vec::with_capacity(sorted_lines.len());
        let mut currency: Option<String> = None;
        for line in &sorted_lines {
            let ticket_type = self
                .repos
                .ticket_types()
                .get_by_id(line.ticket_type_id)
                .await?
                .ok_or(DomainError::NotFound {
                    entity: "TicketType",
                    field: "id",
                    value: line.ticket_type_id.to_string(),
                })?;
            if ticket_type.event_id != request.event_id {
                return Err(DomainError::Validation(format!(
                    "Ticket type {} belongs to a different event",
                    ticket_type.id
                )));
            }
            // One currency across lines, checked before any inventory
            // moves.
            match &currency {
                None => currency = Some(ticket_type.price.currency().to_string()),
                Some(expected) if ticket_type.price.currency() != expected => {
                    return Err(DomainError::CurrencyMismatch {
                        left: expected.clone(),
                        right: ticket_type.price.currency().to_string(),
                    });
                }
                Some(_) => {}
            }
            ticket_type.check_order_quantity(line.quantity)?;
            booking_lines.push(BookingLine::new(
                ticket_type.id,
                line.quantity,
                ticket_type.price.clone(),
            ));
        }

        // Phase 1: take each line under its lock, sorted order.
        let wait = self.config.lock_wait();
        let mut guards = Vec::with_capacity(sorted_lines.len());
        let mut reserved: Vec<(Uuid, u32)> = Vec::new();
        let mut sold_out: Vec<Uuid> = Vec::new();

        for line in &sorted_lines {
            let guard = match self.locks.acquire(line.ticket_type_id, wait).await {
                Ok(guard) => guard,
                Err(e) => {
                    self.rollback_reserved(&reserved).await;
                    return Err(e);
                }
            };
            guards.push(guard);

            match self.reserve_line(line).await {
                Ok(now_sold_out) => {
                    reserved.push((line.ticket_type_id, line.quantity));
                    if now_sold_out {
                        sold_out.push(line.ticket_type_id);
                    }
                }
                Err(e) => {
                    self.rollback_reserved(&reserved).await;
                    return Err(e);
                }
            }
        }

        // Phase 2: booking and holds, still under the line locks.
        let booking = match self.create_booking_and_holds(&request, booking_lines).await {
            Ok(booking) => booking,
            Err(e) => {
                self.rollback_reserved(&reserved).await;
                return Err(e);
            }
        };

        // Counts are durable; holds track provisional ownership from
        // here on. Locks can go.
        drop(guards);

        self.event_bus
            .publish(Event::BookingCreated(BookingCreatedEvent {
                booking_id: booking.id,
                booking_number: booking.booking_number.clone(),
                user_id: booking.user_id,
                event_id: booking.event_id,
                total_tickets: booking.total_tickets,
                total_amount: booking.total_amount.clone(),
                timestamp: Utc::now(),
            }));
        for ticket_type_id in sold_out {
            self.event_bus
                .publish(Event::TicketTypeSoldOut(TicketTypeSoldOutEvent {
                    ticket_type_id,
                    event_id: request.event_id,
                    timestamp: Utc::now(),
                }));
        }
        if booking.status == BookingStatus::Confirmed {
            self.event_bus
                .publish(Event::BookingConfirmed(BookingConfirmedEvent {
                    booking_id: booking.id,
                    booking_number: booking.booking_number.clone(),
                    user_id: booking.user_id,
                    event_id: booking.event_id,
                    timestamp: Utc::now(),
                }));
        }

        info!(
            booking_id = %booking.id,
            booking_number = %booking.booking_number,
            total_tickets = booking.total_tickets,
            status = %booking.status,
            "Reservation placed"
        );
        Ok(booking)
    }

    /// Confirm a pending booking: delete its holds and finalize the
    /// sale. Inventory counts stay decremented.
    ///
    /// Requires a captured payment covering the total (`Processing`
    /// right before completion, or already `Completed`). Idempotent on
    /// confirmed bookings. Fails with `HoldAlreadyResolved` when the
    /// expiry sweep cancelled the booking first.
    pub async fn confirm_booking(&self, booking_id: Uuid) -> DomainResult<Booking> {
        let booking = self.load_booking(booking_id).await?;
        match booking.status {
            BookingStatus::Confirmed => return Ok(booking),
            BookingStatus::Cancelled => {
                return Err(DomainError::HoldAlreadyResolved { booking_id });
            }
            BookingStatus::PendingPayment => {}
            BookingStatus::Draft => {
                return Err(DomainError::InvalidStateTransition {
                    entity: "Booking",
                    from: booking.status.as_str(),
                    to: "Confirmed",
                });
            }
        }

        if !booking.is_free() {
            let payments = self.repos.payments().list_for_booking(booking_id).await?;
            let covered = payments.iter().any(|payment| {
                matches!(
                    payment.status,
                    PaymentStatus::Processing | PaymentStatus::Completed
                ) && payment.amount == booking.total_amount
            });
            if !covered {
                return Err(DomainError::Validation(format!(
                    "Booking {} has no captured payment covering {}",
                    booking.booking_number, booking.total_amount
                )));
            }
        }

        let ids: Vec<Uuid> = booking.lines.iter().map(|l| l.ticket_type_id).collect();
        let _guards = self.locks.acquire_many(&ids, self.config.lock_wait()).await?;

        // Re-check under the locks: the expiry sweep may have won the
        // race while we waited.
        let mut booking = self.load_booking(booking_id).await?;
        match booking.status {
            BookingStatus::Confirmed => return Ok(booking),
            BookingStatus::Cancelled => {
                return Err(DomainError::HoldAlreadyResolved { booking_id });
            }
            _ => {}
        }

        booking.confirm()?;
        self.repos.bookings().update(booking.clone()).await?;
        let removed = self.repos.holds().remove_for_booking(booking_id).await?;
        debug!(booking_id = %booking_id, removed, "Holds deleted on confirmation");

        self.event_bus
            .publish(Event::BookingConfirmed(BookingConfirmedEvent {
                booking_id: booking.id,
                booking_number: booking.booking_number.clone(),
                user_id: booking.user_id,
                event_id: booking.event_id,
                timestamp: Utc::now(),
            }));
        info!(
            booking_id = %booking.id,
            booking_number = %booking.booking_number,
            "Booking confirmed"
        );
        Ok(booking)
    }

    /// Cancel a booking and return its inventory.
    ///
    /// Idempotent on cancelled bookings. For confirmed bookings the
    /// configured cancellation policy applies: check-in and event start
    /// can each forbid it. `event_start` comes from the caller since
    /// event data lives outside this engine.
    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        reason: CancellationReason,
        event_start: Option<DateTime<Utc>>,
    ) -> DomainResult<Booking> {
        let booking = self.load_booking(booking_id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Ok(booking);
        }
        if !matches!(
            booking.status,
            BookingStatus::PendingPayment | BookingStatus::Confirmed
        ) {
            return Err(DomainError::InvalidStateTransition {
                entity: "Booking",
                from: booking.status.as_str(),
                to: "Cancelled",
            });
        }

        let ids: Vec<Uuid> = booking.lines.iter().map(|l| l.ticket_type_id).collect();
        let _guards = self.locks.acquire_many(&ids, self.config.lock_wait()).await?;

        let mut booking = self.load_booking(booking_id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Ok(booking);
        }

        if booking.status == BookingStatus::Confirmed {
            let policy = &self.config.cancellation;
            if policy.forbid_after_check_in && booking.checked_in {
                return Err(DomainError::Validation(format!(
                    "Booking {} cannot be cancelled after check-in",
                    booking.booking_number
                )));
            }
            if policy.forbid_after_event_start {
                if let Some(start) = event_start {
                    if start <= Utc::now() {
                        return Err(DomainError::Validation(format!(
                            "Booking {} cannot be cancelled after the event started",
                            booking.booking_number
                        )));
                    }
                }
            }
        }

        self.release_booking_inventory(&booking).await?;

        booking.cancel(reason.clone())?;
        self.repos.bookings().update(booking.clone()).await?;
        self.repos.holds().remove_for_booking(booking_id).await?;
        self.cancel_open_payments(booking_id).await?;

        self.event_bus
            .publish(Event::BookingCancelled(BookingCancelledEvent {
                booking_id: booking.id,
                booking_number: booking.booking_number.clone(),
                user_id: booking.user_id,
                event_id: booking.event_id,
                reason: reason.to_string(),
                timestamp: Utc::now(),
            }));
        info!(
            booking_id = %booking.id,
            booking_number = %booking.booking_number,
            reason = %reason,
            "Booking cancelled"
        );
        Ok(booking)
    }

    /// Release every hold past its deadline whose booking is still
    /// pending payment. Returns how many bookings were expired.
    ///
    /// Each booking's holds are handled under the same per-ticket-type
    /// locks the confirmation path takes, so only one of "confirm" or
    /// "expire and release" can win; the loser sees the holds gone and
    /// walks away.
    pub async fn expire_due_holds(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let due = self.repos.holds().find_due(now).await?;

        let mut by_booking: BTreeMap<Uuid, Vec<ReservationHold>> = BTreeMap::new();
        for hold in due {
            by_booking.entry(hold.booking_id).or_default().push(hold);
        }

        let mut expired = 0;
        for (booking_id, holds) in by_booking {
            let ids: Vec<Uuid> = holds.iter().map(|h| h.ticket_type_id).collect();
            match self.expire_booking(booking_id, &ids, now).await {
                Ok(true) => expired += 1,
                Ok(false) => {}
                Err(e) => warn!(booking_id = %booking_id, error = %e, "Hold expiry failed"),
            }
        }

        if expired > 0 {
            info!(expired, "Expired overdue reservation holds");
        }
        // The sweep tick doubles as lock-table housekeeping: entries
        // for ticket types nobody is touching are dropped.
        self.locks.evict_unused();
        Ok(expired)
    }

    async fn expire_booking(
        &self,
        booking_id: Uuid,
        ticket_type_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let _guards = self
            .locks
            .acquire_many(ticket_type_ids, self.config.lock_wait())
            .await?;

        // A confirmation that won the race deleted the holds.
        let holds = self.repos.holds().list_for_booking(booking_id).await?;
        if holds.is_empty() {
            debug!(booking_id = %booking_id, "Holds already resolved; skipping expiry");
            return Ok(false);
        }
        if !holds.iter().any(|hold| hold.is_expired_at(now)) {
            return Ok(false);
        }

        let mut booking = self.load_booking(booking_id).await?;
        if booking.status != BookingStatus::PendingPayment {
            warn!(
                booking_id = %booking_id,
                status = %booking.status,
                "Due holds on a booking not pending payment"
            );
            return Ok(false);
        }

        for hold in &holds {
            let mut ticket_type = self
                .repos
                .ticket_types()
                .get_by_id(hold.ticket_type_id)
                .await?
                .ok_or(DomainError::NotFound {
                    entity: "TicketType",
                    field: "id",
                    value: hold.ticket_type_id.to_string(),
                })?;
            if let Err(e) = ticket_type.release(hold.quantity) {
                error!(
                    booking_id = %booking_id,
                    ticket_type_id = %hold.ticket_type_id,
                    error = %e,
                    "Expiry release failed"
                );
                return Err(e);
            }
            self.repos.ticket_types().update(ticket_type).await?;
        }

        booking.cancel(CancellationReason::ReservationExpired)?;
        self.repos.bookings().update(booking.clone()).await?;
        self.repos.holds().remove_for_booking(booking_id).await?;
        self.cancel_open_payments(booking_id).await?;

        for hold in &holds {
            self.event_bus.publish(Event::HoldExpired(HoldExpiredEvent {
                booking_id,
                ticket_type_id: hold.ticket_type_id,
                quantity: hold.quantity,
                timestamp: now,
            }));
        }
        self.event_bus
            .publish(Event::BookingCancelled(BookingCancelledEvent {
                booking_id: booking.id,
                booking_number: booking.booking_number.clone(),
                user_id: booking.user_id,
                event_id: booking.event_id,
                reason: CancellationReason::ReservationExpired.to_string(),
                timestamp: now,
            }));
        info!(
            booking_id = %booking.id,
            booking_number = %booking.booking_number,
            "Reservation hold expired; booking cancelled"
        );
        Ok(true)
    }

    // ── Internal helpers ───────────────────────────────────────

    async fn load_booking(&self, booking_id: Uuid) -> DomainResult<Booking> {
        self.repos
            .bookings()
            .get_by_id(booking_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Booking",
                field: "id",
                value: booking_id.to_string(),
            })
    }

    /// Reserve one line against current inventory. Runs under the
    /// line's lock. Returns whether the ticket type just sold out.
    async fn reserve_line(&self, line: &LineRequest) -> DomainResult<bool> {
        let mut ticket_type = self
            .repos
            .ticket_types()
            .get_by_id(line.ticket_type_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "TicketType",
                field: "id",
                value: line.ticket_type_id.to_string(),
            })?;
        ticket_type.reserve(line.quantity)?;
        let now_sold_out = ticket_type.is_sold_out();
        self.repos.ticket_types().update(ticket_type).await?;
        Ok(now_sold_out)
    }

    /// Undo provisional reserves in reverse order. Runs while the
    /// per-ticket-type guards are still held; failures here are logged
    /// and swallowed so the original error reaches the caller.
    async fn rollback_reserved(&self, reserved: &[(Uuid, u32)]) {
        for (ticket_type_id, quantity) in reserved.iter().rev() {
            match self.repos.ticket_types().get_by_id(*ticket_type_id).await {
                Ok(Some(mut ticket_type)) => match ticket_type.release(*quantity) {
                    Ok(()) => {
                        if let Err(e) = self.repos.ticket_types().update(ticket_type).await {
                            error!(
                                ticket_type_id = %ticket_type_id,
                                error = %e,
                                "Rollback could not store released inventory"
                            );
                        }
                    }
                    Err(e) => {
                        error!(
                            ticket_type_id = %ticket_type_id,
                            error = %e,
                            "Rollback release failed"
                        );
                    }
                },
                Ok(None) => {
                    error!(ticket_type_id = %ticket_type_id, "Rollback found no ticket type");
                }
                Err(e) => {
                    error!(ticket_type_id = %ticket_type_id, error = %e, "Rollback load failed");
                }
            }
        }
    }

    /// Persist the booking and one hold per line. Free bookings skip
    /// holds and confirm right away.
    async fn create_booking_and_holds(
        &self,
        request: &ReservationRequest,
        booking_lines: Vec<BookingLine>,
    ) -> DomainResult<Booking> {
        let mut booking = Booking::new(
            request.user_id,
            request.event_id,
            booking_lines,
            request.requires_approval,
        )?;
        booking.await_payment()?;

        if booking.is_free() {
            booking.confirm()?;
            return self.repos.bookings().add(booking).await;
        }

        let booking = self.repos.bookings().add(booking).await?;
        let expires_at = Utc::now() + self.config.hold_duration();
        for line in &booking.lines {
            let hold = ReservationHold::new(
                booking.event_id,
                line.ticket_type_id,
                booking.id,
                line.quantity,
                expires_at,
            );
            if let Err(e) = self.repos.holds().add(hold).await {
                // Failed multi-step mutation: take back what this
                // operation created before surfacing the error.
                let _ = self.repos.holds().remove_for_booking(booking.id).await;
                let _ = self.repos.bookings().delete(booking.id).await;
                return Err(e);
            }
        }
        Ok(booking)
    }

    /// Return every line's quantity to its ticket type. Runs under the
    /// booking's line locks.
    async fn release_booking_inventory(&self, booking: &Booking) -> DomainResult<()> {
        for line in &booking.lines {
            let mut ticket_type = self
                .repos
                .ticket_types()
                .get_by_id(line.ticket_type_id)
                .await?
                .ok_or(DomainError::NotFound {
                    entity: "TicketType",
                    field: "id",
                    value: line.ticket_type_id.to_string(),
                })?;
            if let Err(e) = ticket_type.release(line.quantity) {
                error!(
                    booking_id = %booking.id,
                    ticket_type_id = %line.ticket_type_id,
                    error = %e,
                    "Inventory release failed"
                );
                return Err(e);
            }
            self.repos.ticket_types().update(ticket_type).await?;
        }
        Ok(())
    }

    /// Void payment attempts still in flight for a booking that is
    /// being cancelled.
    async fn cancel_open_payments(&self, booking_id: Uuid) -> DomainResult<()> {
        let payments = self.repos.payments().list_for_booking(booking_id).await?;
        for mut payment in payments {
            if !payment.status.is_terminal() {
                payment.mark_cancelled()?;
                self.repos.payments().update(payment).await?;
            }
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────
