//! Background task that periodically expires overdue reservation holds.
//!
//! Runs in a tokio::spawn loop, handing due holds to the coordinator
//! every `sweep_interval_secs`. The coordinator releases inventory
//! under the same per-ticket-type locks the reservation paths take,
//! so a sweep can never race a confirmation into an oversell.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Duration;
use tracing::{info, warn};

use super::coordinator::ReservationCoordinator;
use crate::shared::shutdown::ShutdownSignal;

/// Start the hold expiry background task.
///
/// The task checks every `sweep_interval_secs` (default 60) for holds
/// with `expires_at` in the past, cancels their bookings and returns
/// the held inventory.
pub fn start_hold_expiry_task(
    coordinator: Arc<ReservationCoordinator>,
    shutdown: ShutdownSignal,
    sweep_interval_secs: u64,
) {
    tokio::spawn(async move {
        info!(
            sweep_interval = sweep_interval_secs,
            "📅 Hold expiry task started"
        );

        let mut interval = tokio::time::interval(Duration::from_secs(sweep_interval_secs));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = coordinator.expire_due_holds(Utc::now()).await {
                        warn!(error = %e, "Hold expiry sweep error");
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!("📅 Hold expiry task shutting down");
                    break;
                }
            }
        }

        info!("📅 Hold expiry task stopped");
    });
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::application::events::create_event_bus;
    use crate::application::reservations::coordinator::{LineRequest, ReservationRequest};
    use crate::application::reservations::locks::TicketTypeLocks;
    use crate::config::EngineConfig;
    use crate::domain::booking::BookingStatus;
    use crate::domain::money::Money;
    use crate::domain::ticket_type::TicketType;
    use crate::domain::RepositoryProvider;
    use crate::infrastructure::memory::InMemoryRepositoryProvider;

    #[tokio::test]
    async fn task_sweeps_overdue_holds_until_shutdown() {
        // Zero hold duration makes everything due immediately.
        let mut config = EngineConfig::default();
        config.reservation.hold_duration_minutes = 0;

        let repos = InMemoryRepositoryProvider::shared();
        let coordinator = Arc::new(ReservationCoordinator::new(
            repos.clone(),
            TicketTypeLocks::shared(),
            create_event_bus(),
            config,
        ));

        let event_id = Uuid::new_v4();
        let price = Money::new(Decimal::from(100), "EGP").unwrap();
        let ticket_type = TicketType::new(event_id, "General", price, 10).unwrap();
        let ticket_type = repos.ticket_types().add(ticket_type).await.unwrap();

        let booking = coordinator
            .reserve(ReservationRequest {
                user_id: Uuid::new_v4(),
                event_id,
                lines: vec![LineRequest {
                    ticket_type_id: ticket_type.id,
                    quantity: 2,
                }],
                requires_approval: false,
            })
            .await
            .unwrap();

        let shutdown = ShutdownSignal::new();
        start_hold_expiry_task(coordinator, shutdown.clone(), 1);

        // First tick fires immediately; give the sweep a moment.
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        let swept = repos.bookings().get_by_id(booking.id).await.unwrap().unwrap();
        assert_eq!(swept.status, BookingStatus::Cancelled);
        let tt = repos
            .ticket_types()
            .get_by_id(ticket_type.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tt.sold_quantity, 0);

        shutdown.trigger();
    }
}
