//! In-memory implementation of HoldRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::hold::{HoldRepository, ReservationHold};
use crate::shared::errors::DomainResult;

/// DashMap-backed hold store. Holds are short-lived bookkeeping, so
/// removal is a hard delete rather than a tombstone.
#[derive(Default)]
pub struct InMemoryHoldRepository {
    rows: DashMap<Uuid, ReservationHold>,
}

impl InMemoryHoldRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HoldRepository for InMemoryHoldRepository {
    async fn add(&self, hold: ReservationHold) -> DomainResult<()> {
        self.rows.insert(hold.id, hold);
        Ok(())
    }

    async fn list_for_booking(&self, booking_id: Uuid) -> DomainResult<Vec<ReservationHold>> {
        Ok(self
            .rows
            .iter()
            .filter(|entry| entry.booking_id == booking_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_due(&self, now: DateTime<Utc>) -> DomainResult<Vec<ReservationHold>> {
        Ok(self
            .rows
            .iter()
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn remove_for_booking(&self, booking_id: Uuid) -> DomainResult<usize> {
        let ids: Vec<Uuid> = self
            .rows
            .iter()
            .filter(|entry| entry.booking_id == booking_id)
            .map(|entry| entry.id)
            .collect();
        let mut removed = 0;
        for id in &ids {
            if self.rows.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
