//! In-memory implementation of BookingRepository

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::booking::{Booking, BookingField, BookingRepository};
use crate::domain::specification::{evaluate, Specification};
use crate::shared::errors::{DomainError, DomainResult};

/// DashMap-backed booking store with a unique index on the human
/// booking number. Soft deletes tombstone the row.
#[derive(Default)]
pub struct InMemoryBookingRepository {
    rows: DashMap<Uuid, Booking>,
    by_number: DashMap<String, Uuid>,
    tombstones: DashMap<Uuid, ()>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_rows(&self) -> Vec<Booking> {
        self.rows
            .iter()
            .filter(|entry| !self.tombstones.contains_key(entry.key()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn not_found(id: Uuid) -> DomainError {
        DomainError::NotFound {
            entity: "Booking",
            field: "id",
            value: id.to_string(),
        }
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn get_by_id(&self, id: Uuid) -> DomainResult<Option<Booking>> {
        if self.tombstones.contains_key(&id) {
            return Ok(None);
        }
        Ok(self.rows.get(&id).map(|entry| entry.clone()))
    }

    async fn get_by_number(&self, booking_number: &str) -> DomainResult<Option<Booking>> {
        let Some(id) = self.by_number.get(booking_number).map(|entry| *entry) else {
            return Ok(None);
        };
        self.get_by_id(id).await
    }

    async fn get_by_specification(
        &self,
        spec: &Specification<BookingField>,
    ) -> DomainResult<Option<Booking>> {
        Ok(evaluate(spec, &self.live_rows()).into_iter().next())
    }

    async fn list_by_specification(
        &self,
        spec: &Specification<BookingField>,
    ) -> DomainResult<Vec<Booking>> {
        Ok(evaluate(spec, &self.live_rows()))
    }

    async fn add(&self, booking: Booking) -> DomainResult<Booking> {
        if self.rows.contains_key(&booking.id) {
            return Err(DomainError::Storage(format!(
                "Booking {} already exists",
                booking.id
            )));
        }
        // Unique constraint on the reference; a collision surfaces as
        // a `Storage` error.
        if self.by_number.contains_key(&booking.booking_number) {
            return Err(DomainError::Storage(format!(
                "Booking number {} already exists",
                booking.booking_number
            )));
        }
        self.by_number
            .insert(booking.booking_number.clone(), booking.id);
        self.rows.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn update(&self, booking: Booking) -> DomainResult<()> {
        if self.tombstones.contains_key(&booking.id) || !self.rows.contains_key(&booking.id) {
            return Err(Self::not_found(booking.id));
        }
        self.rows.insert(booking.id, booking);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        if !self.rows.contains_key(&id) || self.tombstones.contains_key(&id) {
            return Err(Self::not_found(id));
        }
        self.tombstones.insert(id, ());
        Ok(())
    }

    async fn exists(&self, spec: &Specification<BookingField>) -> DomainResult<bool> {
        Ok(self.live_rows().iter().any(|row| spec.is_satisfied_by(row)))
    }
}
