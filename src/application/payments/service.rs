//! Payment application service
//!
//! Drives the payment aggregate's state machine against the external
//! gateway: create, process (intent, capture, booking confirmation),
//! refund. Transport faults are retried with backoff; declines are
//! final. Every gateway result maps onto exactly one payment
//! transition, so the stored record always tells the true story.
//!
//! Mutations are serialized per booking through [`PaymentLocks`]:
//! creation, the capture flow, and refunds each re-read the payment
//! under the booking's lock, so no path acts on a stale copy.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::locks::PaymentLocks;
use crate::application::events::SharedEventBus;
use crate::application::ports::{GatewayError, PaymentGateway};
use crate::application::reservations::ReservationCoordinator;
use crate::config::EngineConfig;
use crate::domain::booking::{Booking, BookingStatus, CancellationReason};
use crate::domain::events::types::{
    Event, PaymentCompletedEvent, PaymentFailedEvent, PaymentRefundedEvent,
};
use crate::domain::money::Money;
use crate::domain::payment::{Payment, PaymentMethod, PaymentStatus};
use crate::domain::RepositoryProvider;
use crate::shared::errors::{DomainError, DomainResult};
use crate::shared::retry::{retry_with_backoff, RetryConfig};

pub struct PaymentService {
    repos: Arc<dyn RepositoryProvider>,
    gateway: Arc<dyn PaymentGateway>,
    coordinator: Arc<ReservationCoordinator>,
    event_bus: SharedEventBus,
    config: EngineConfig,
    // Every payment mutation passes through this service, so the
    // per-booking exclusivity lives here.
    locks: PaymentLocks,
}

impl PaymentService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        gateway: Arc<dyn PaymentGateway>,
        coordinator: Arc<ReservationCoordinator>,
        event_bus: SharedEventBus,
        config: EngineConfig,
    ) -> Self {
        Self {
            repos,
            gateway,
            coordinator,
            event_bus,
            config,
            locks: PaymentLocks::new(),
        }
    }

    /// Open a payment for a booking awaiting payment.
    ///
    /// The amount is the booking total, so the currency invariant holds
    /// by construction. At most one payment per booking may be
    /// non-terminal at a time.
    pub async fn create_payment(
        &self,
        booking_id: Uuid,
        method: PaymentMethod,
    ) -> DomainResult<Payment> {
        let _guard = self.locks.acquire(booking_id).await;

        let booking = self.load_booking(booking_id).await?;
        if booking.status != BookingStatus::PendingPayment {
            return Err(DomainError::Validation(format!(
                "Booking {} is not awaiting payment",
                booking.booking_number
            )));
        }

        let payments = self.repos.payments().list_for_booking(booking_id).await?;
        if payments.iter().any(|p| !p.status.is_terminal()) {
            return Err(DomainError::Validation(format!(
                "Booking {} already has a payment in flight",
                booking.booking_number
            )));
        }

        let payment = Payment::new(booking_id, booking.total_amount.clone(), method);
        let payment = self.repos.payments().add(payment).await?;
        info!(
            payment_id = %payment.id,
            payment_number = %payment.payment_number,
            booking_id = %booking_id,
            amount = %payment.amount,
            "Payment created"
        );
        Ok(payment)
    }

    /// Run a pending payment through the gateway and confirm its
    /// booking.
    ///
    /// Order matters: the booking is confirmed before the payment is
    /// marked completed, so a booking resolved in the meantime (hold
    /// expired, user cancelled) surfaces as `HoldAlreadyResolved` and
    /// the captured charge is refunded instead of completed.
    pub async fn process_payment(&self, payment_id: Uuid) -> DomainResult<Payment> {
        let booking_id = self.load_payment(payment_id).await?.booking_id;
        let _guard = self.locks.acquire(booking_id).await;

        // Re-read under the lock.
        let mut payment = self.load_payment(payment_id).await?;
        let booking = self.load_booking(payment.booking_id).await?;

        match booking.status {
            BookingStatus::PendingPayment => {}
            BookingStatus::Cancelled => {
                if !payment.status.is_terminal() {
                    payment.mark_cancelled()?;
                    self.repos.payments().update(payment).await?;
                }
                return Err(DomainError::HoldAlreadyResolved {
                    booking_id: booking.id,
                });
            }
            _ => {
                return Err(DomainError::Validation(format!(
                    "Booking {} is not awaiting payment",
                    booking.booking_number
                )));
            }
        }

        if payment.status != PaymentStatus::Pending {
            return Err(DomainError::InvalidStateTransition {
                entity: "Payment",
                from: payment.status.as_str(),
                to: "Processing",
            });
        }

        payment.mark_processing()?;
        self.repos.payments().update(payment.clone()).await?;

        let retry = self.retry_config();
        let intent = match retry_with_backoff(
            retry.clone(),
            || self.gateway.create_intent(&payment.amount),
            GatewayError::is_retryable,
            "gateway_create_intent",
        )
        .await
        {
            Ok(intent) => intent,
            Err(e) => return self.fail_payment(payment, &booking, e).await,
        };

        let transaction_id = match retry_with_backoff(
            retry,
            || self.gateway.capture(&intent.intent_id),
            GatewayError::is_retryable,
            "gateway_capture",
        )
        .await
        {
            Ok(transaction_id) => transaction_id,
            Err(e) => return self.fail_payment(payment, &booking, e).await,
        };

        match self.coordinator.confirm_booking(payment.booking_id).await {
            Ok(_) => {
                payment.mark_completed(transaction_id.clone())?;
                self.repos.payments().update(payment.clone()).await?;

                self.event_bus
                    .publish(Event::PaymentCompleted(PaymentCompletedEvent {
                        payment_id: payment.id,
                        payment_number: payment.payment_number.clone(),
                        booking_id: payment.booking_id,
                        amount: payment.amount.clone(),
                        external_transaction_id: transaction_id,
                        timestamp: Utc::now(),
                    }));
                info!(
                    payment_id = %payment.id,
                    payment_number = %payment.payment_number,
                    "Payment completed"
                );
                Ok(payment)
            }
            Err(confirm_err) => {
                warn!(
                    payment_id = %payment.id,
                    booking_id = %payment.booking_id,
                    error = %confirm_err,
                    "Captured but could not confirm booking; refunding"
                );
                if let Err(refund_err) =
                    self.gateway.refund(&transaction_id, &payment.amount).await
                {
                    error!(
                        payment_id = %payment.id,
                        transaction_id = %transaction_id,
                        error = %refund_err,
                        "Compensating refund failed; manual reconciliation required"
                    );
                }
                payment.external_transaction_id = Some(transaction_id);
                payment.mark_cancelled()?;
                self.repos.payments().update(payment).await?;
                Err(confirm_err)
            }
        }
    }

    /// Refund part or all of a captured payment.
    ///
    /// The refund is validated against a scratch copy first, so a
    /// doomed request (wrong state, over the remaining amount) never
    /// reaches the processor. Refunds for one booking run serially:
    /// each request re-reads the payment under the booking's lock, so
    /// it validates against every refund already recorded.
    pub async fn refund_payment(
        &self,
        payment_id: Uuid,
        amount: Money,
        reason: impl Into<String>,
    ) -> DomainResult<Payment> {
        let reason = reason.into();
        let booking_id = self.load_payment(payment_id).await?.booking_id;
        let _guard = self.locks.acquire(booking_id).await;

        // Re-read under the lock.
        let mut payment = self.load_payment(payment_id).await?;

        payment
            .clone()
            .add_refund(amount.clone(), reason.clone(), None)?;

        let transaction_id = payment.external_transaction_id.clone().ok_or_else(|| {
            DomainError::Validation(format!(
                "Payment {} has no processor transaction to refund",
                payment.payment_number
            ))
        })?;

        let refund_reference = retry_with_backoff(
            self.retry_config(),
            || self.gateway.refund(&transaction_id, &amount),
            GatewayError::is_retryable,
            "gateway_refund",
        )
        .await
        .map_err(DomainError::from)?;

        let refund = payment.add_refund(amount, reason, Some(refund_reference))?;
        self.repos.payments().update(payment.clone()).await?;

        self.event_bus
            .publish(Event::PaymentRefunded(PaymentRefundedEvent {
                payment_id: payment.id,
                refund_id: refund.id,
                booking_id: payment.booking_id,
                amount: refund.amount.clone(),
                fully_refunded: payment.status == PaymentStatus::Refunded,
                timestamp: Utc::now(),
            }));
        info!(
            payment_id = %payment.id,
            refund_id = %refund.id,
            status = %payment.status,
            "Refund recorded"
        );
        Ok(payment)
    }

    // ── Internal helpers ───────────────────────────────────────

    async fn load_payment(&self, payment_id: Uuid) -> DomainResult<Payment> {
        self.repos
            .payments()
            .get_by_id(payment_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Payment",
                field: "id",
                value: payment_id.to_string(),
            })
    }

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

    fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.config.payment.max_attempts,
            ..RetryConfig::default()
        }
    }

    /// Record a terminal gateway failure and apply the booking policy:
    /// with no other payment in flight, nothing can still complete the
    /// booking, so it is cancelled and its inventory returned.
    async fn fail_payment(
        &self,
        mut payment: Payment,
        booking: &Booking,
        gateway_err: GatewayError,
    ) -> DomainResult<Payment> {
        let reason = gateway_err.to_string();
        payment.mark_failed(reason.clone())?;
        self.repos.payments().update(payment.clone()).await?;

        self.event_bus
            .publish(Event::PaymentFailed(PaymentFailedEvent {
                payment_id: payment.id,
                booking_id: booking.id,
                reason: reason.clone(),
                timestamp: Utc::now(),
            }));
        warn!(
            payment_id = %payment.id,
            booking_id = %booking.id,
            reason = %reason,
            "Payment failed"
        );

        let payments = self.repos.payments().list_for_booking(booking.id).await?;
        let another_open = payments
            .iter()
            .any(|p| p.id != payment.id && !p.status.is_terminal());
        if !another_open {
            self.coordinator
                .cancel_booking(booking.id, CancellationReason::PaymentFailed, None)
                .await?;
        }

        Err(gateway_err.into())
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;

    use super::*;
    use crate::application::events::create_event_bus;
    use crate::application::reservations::{LineRequest, ReservationRequest, TicketTypeLocks};
    use crate::domain::ticket_type::TicketType;
    use crate::infrastructure::gateway::{GatewayBehavior, MockPaymentGateway};
    use crate::infrastructure::memory::InMemoryRepositoryProvider;

    struct Fixture {
        repos: Arc<InMemoryRepositoryProvider>,
        gateway: Arc<MockPaymentGateway>,
        coordinator: Arc<ReservationCoordinator>,
        service: Arc<PaymentService>,
    }

    fn build_fixture() -> Fixture {
        let config = EngineConfig::default();
        let repos = InMemoryRepositoryProvider::shared();
        let gateway = MockPaymentGateway::shared();
        let event_bus = create_event_bus();
        let coordinator = Arc::new(ReservationCoordinator::new(
            repos.clone(),
            TicketTypeLocks::shared(),
            event_bus.clone(),
            config.clone(),
        ));
        let service = Arc::new(PaymentService::new(
            repos.clone(),
            gateway.clone(),
            coordinator.clone(),
            event_bus,
            config,
        ));
        Fixture {
            repos,
            gateway,
            coordinator,
            service,
        }
    }

    async fn reserved_booking(fixture: &Fixture, total: u32, quantity: u32) -> (TicketType, Booking) {
        let event_id = Uuid::new_v4();
        let price = Money::new(Decimal::from(100), "EGP").unwrap();
        let ticket_type = TicketType::new(event_id, "General", price, total).unwrap();
        let ticket_type = fixture
            .repos
            .ticket_types()
            .add(ticket_type)
            .await
            .unwrap();
        let booking = fixture
            .coordinator
            .reserve(ReservationRequest {
                user_id: Uuid::new_v4(),
                event_id,
                lines: vec![LineRequest {
                    ticket_type_id: ticket_type.id,
                    quantity,
                }],
                requires_approval: false,
            })
            .await
            .unwrap();
        (ticket_type, booking)
    }

    async fn sold_quantity(fixture: &Fixture, id: Uuid) -> u32 {
        fixture
            .repos
            .ticket_types()
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .sold_quantity
    }

    #[tokio::test]
    async fn successful_payment_confirms_booking() {
        let fixture = build_fixture();
        let (ticket_type, booking) = reserved_booking(&fixture, 10, 2).await;

        let payment = fixture
            .service
            .create_payment(booking.id, PaymentMethod::Card)
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.amount, booking.total_amount);

        let completed = fixture.service.process_payment(payment.id).await.unwrap();
        assert_eq!(completed.status, PaymentStatus::Completed);
        assert!(completed.external_transaction_id.is_some());

        let confirmed = fixture
            .repos
            .bookings()
            .get_by_id(booking.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(sold_quantity(&fixture, ticket_type.id).await, 2);
        assert!(fixture
            .repos
            .holds()
            .list_for_booking(booking.id)
            .await
            .unwrap()
            .is_empty());
        // create_intent + capture, no refund
        assert_eq!(fixture.gateway.calls(), 2);
    }

    #[tokio::test]
    async fn only_one_payment_in_flight_per_booking() {
        let fixture = build_fixture();
        let (_, booking) = reserved_booking(&fixture, 10, 1).await;

        fixture
            .service
            .create_payment(booking.id, PaymentMethod::Card)
            .await
            .unwrap();
        let err = fixture
            .service
            .create_payment(booking.id, PaymentMethod::Wallet)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn decline_fails_payment_and_cancels_booking() {
        let fixture = build_fixture();
        let (ticket_type, booking) = reserved_booking(&fixture, 10, 3).await;
        let payment = fixture
            .service
            .create_payment(booking.id, PaymentMethod::Card)
            .await
            .unwrap();

        fixture
            .gateway
            .script([GatewayBehavior::Decline("insufficient funds".to_string())]);

        let err = fixture.service.process_payment(payment.id).await.unwrap_err();
        // A decline is final; nothing should report it as retryable.
        assert!(matches!(err, DomainError::Gateway { transient: false, .. }));
        assert!(!err.is_transient());

        let failed = fixture
            .repos
            .payments()
            .get_by_id(payment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failed.status, PaymentStatus::Failed);
        assert!(failed.failure_reason.is_some());

        // No other payment could still complete it, so the booking was
        // cancelled and the inventory returned.
        let cancelled = fixture
            .repos
            .bookings()
            .get_by_id(booking.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(
            cancelled.cancellation_reason,
            Some(CancellationReason::PaymentFailed)
        );
        assert_eq!(sold_quantity(&fixture, ticket_type.id).await, 0);
    }

    #[tokio::test]
    async fn transport_fault_is_retried_then_succeeds() {
        let fixture = build_fixture();
        let (_, booking) = reserved_booking(&fixture, 10, 1).await;
        let payment = fixture
            .service
            .create_payment(booking.id, PaymentMethod::Card)
            .await
            .unwrap();

        fixture
            .gateway
            .script([GatewayBehavior::TransportError("connection reset".to_string())]);

        let completed = fixture.service.process_payment(payment.id).await.unwrap();
        assert_eq!(completed.status, PaymentStatus::Completed);
        // create_intent (failed), create_intent (retry), capture
        assert_eq!(fixture.gateway.calls(), 3);
    }

    #[tokio::test]
    async fn processing_resolved_booking_cancels_payment_without_gateway_calls() {
        let fixture = build_fixture();
        let (_, booking) = reserved_booking(&fixture, 10, 2).await;
        let payment = fixture
            .service
            .create_payment(booking.id, PaymentMethod::Card)
            .await
            .unwrap();

        fixture
            .coordinator
            .cancel_booking(booking.id, CancellationReason::UserRequested, None)
            .await
            .unwrap();

        let err = fixture.service.process_payment(payment.id).await.unwrap_err();
        assert!(matches!(err, DomainError::HoldAlreadyResolved { .. }));

        let stored = fixture
            .repos
            .payments()
            .get_by_id(payment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PaymentStatus::Cancelled);
        assert_eq!(fixture.gateway.calls(), 0);
    }

    #[tokio::test]
    async fn refund_happy_path_reaches_refunded() {
        let fixture = build_fixture();
        let (_, booking) = reserved_booking(&fixture, 10, 1).await;
        let payment = fixture
            .service
            .create_payment(booking.id, PaymentMethod::Card)
            .await
            .unwrap();
        fixture.service.process_payment(payment.id).await.unwrap();

        let forty = Money::new(Decimal::from(40), "EGP").unwrap();
        let partial = fixture
            .service
            .refund_payment(payment.id, forty, "goodwill")
            .await
            .unwrap();
        assert_eq!(partial.status, PaymentStatus::PartiallyRefunded);
        assert!(partial.refunds[0].external_refund_id.is_some());

        let sixty = Money::new(Decimal::from(60), "EGP").unwrap();
        let full = fixture
            .service
            .refund_payment(payment.id, sixty, "event cancelled")
            .await
            .unwrap();
        assert_eq!(full.status, PaymentStatus::Refunded);
        assert_eq!(full.refunds.len(), 2);
    }

    #[tokio::test]
    async fn oversized_refund_never_reaches_the_gateway() {
        let fixture = build_fixture();
        let (_, booking) = reserved_booking(&fixture, 10, 1).await;
        let payment = fixture
            .service
            .create_payment(booking.id, PaymentMethod::Card)
            .await
            .unwrap();
        fixture.service.process_payment(payment.id).await.unwrap();
        let calls_after_capture = fixture.gateway.calls();

        let too_much = Money::new(Decimal::from(150), "EGP").unwrap();
        let err = fixture
            .service
            .refund_payment(payment.id, too_much, "oops")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::RefundExceedsPayment { .. }));
        assert_eq!(fixture.gateway.calls(), calls_after_capture);

        let stored = fixture
            .repos
            .payments()
            .get_by_id(payment.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.refunds.is_empty());
    }

    #[tokio::test]
    async fn refund_requires_a_captured_payment() {
        let fixture = build_fixture();
        let (_, booking) = reserved_booking(&fixture, 10, 1).await;
        let payment = fixture
            .service
            .create_payment(booking.id, PaymentMethod::Card)
            .await
            .unwrap();

        let amount = Money::new(Decimal::from(10), "EGP").unwrap();
        let err = fixture
            .service
            .refund_payment(payment.id, amount, "too early")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
    }

    #[tokio::test]
    async fn concurrent_refunds_cannot_exceed_the_captured_amount() {
        let fixture = build_fixture();
        let (_, booking) = reserved_booking(&fixture, 10, 1).await;
        let payment = fixture
            .service
            .create_payment(booking.id, PaymentMethod::Card)
            .await
            .unwrap();
        fixture.service.process_payment(payment.id).await.unwrap();
        let calls_after_capture = fixture.gateway.calls();
        let payment_id = payment.id;

        // Slow the processor so both requests are in flight at once.
        // Each alone fits the 100 EGP capture; together they exceed it.
        fixture.gateway.set_latency(Duration::from_millis(50));
        let sixty = Money::new(Decimal::from(60), "EGP").unwrap();

        let service = fixture.service.clone();
        let amount = sixty.clone();
        let first = tokio::spawn(async move {
            service
                .refund_payment(payment_id, amount, "event cancelled")
                .await
        });
        let service = fixture.service.clone();
        let amount = sixty.clone();
        let second = tokio::spawn(async move {
            service
                .refund_payment(payment_id, amount, "event cancelled")
                .await
        });

        let results = [first.await.unwrap(), second.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let err = results.into_iter().find_map(Result::err).unwrap();
        assert!(matches!(err, DomainError::RefundExceedsPayment { .. }));

        // Exactly one refund reached the processor; the loser was
        // validated against the winner's recorded refund, not against
        // a stale copy read before the race.
        assert_eq!(fixture.gateway.calls(), calls_after_capture + 1);

        let stored = fixture
            .repos
            .payments()
            .get_by_id(payment_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PaymentStatus::PartiallyRefunded);
        assert_eq!(stored.refunds.len(), 1);
        assert_eq!(stored.refunded_total(), sixty.amount());
    }

    #[tokio::test]
    async fn cancel_during_capture_refunds_and_keeps_the_reference() {
        let fixture = build_fixture();
        let (ticket_type, booking) = reserved_booking(&fixture, 10, 2).await;
        let payment = fixture
            .service
            .create_payment(booking.id, PaymentMethod::Card)
            .await
            .unwrap();
        let payment_id = payment.id;

        // Slow gateway: the booking gets cancelled while the capture
        // flow is still talking to the processor.
        fixture.gateway.set_latency(Duration::from_millis(200));

        let service = fixture.service.clone();
        let task = tokio::spawn(async move { service.process_payment(payment_id).await });

        tokio::time::sleep(Duration::from_millis(300)).await;
        fixture
            .coordinator
            .cancel_booking(booking.id, CancellationReason::UserRequested, None)
            .await
            .unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, DomainError::HoldAlreadyResolved { .. }));

        // create_intent, capture, compensating refund
        assert_eq!(fixture.gateway.calls(), 3);

        // The captured money went back and the processor reference
        // survives for reconciliation; no refund record is written
        // because the payment never completed.
        let stored = fixture
            .repos
            .payments()
            .get_by_id(payment_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PaymentStatus::Cancelled);
        assert_eq!(stored.external_transaction_id.as_deref(), Some("txn_000002"));
        assert!(stored.refunds.is_empty());

        let cancelled = fixture
            .repos
            .bookings()
            .get_by_id(booking.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(
            cancelled.cancellation_reason,
            Some(CancellationReason::UserRequested)
        );
        assert_eq!(sold_quantity(&fixture, ticket_type.id).await, 0);
    }
}
