//! Reservation hold repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::model::ReservationHold;
use crate::shared::errors::DomainResult;

/// Stores reservation holds. Holds are transient coordinator records:
/// they are hard-deleted on confirm and cancel, not tombstoned.
#[async_trait]
pub trait HoldRepository: Send + Sync {
    async fn add(&self, hold: ReservationHold) -> DomainResult<()>;

    /// Holds currently claiming inventory for a booking.
    async fn list_for_booking(&self, booking_id: Uuid) -> DomainResult<Vec<ReservationHold>>;

    /// All holds whose deadline has passed at `now`.
    async fn find_due(&self, now: DateTime<Utc>) -> DomainResult<Vec<ReservationHold>>;

    /// Drop every hold of a booking; returns how many were removed.
    /// Removing holds that are already gone is not an error.
    async fn remove_for_booking(&self, booking_id: Uuid) -> DomainResult<usize>;
}
