//! In-memory implementation of PaymentRepository

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::payment::{Payment, PaymentField, PaymentRepository};
use crate::domain::specification::{evaluate, Specification};
use crate::shared::errors::{DomainError, DomainResult};

/// DashMap-backed payment store. Soft deletes tombstone the row;
/// refunds travel inside their payment, so there is no separate table.
#[derive(Default)]
pub struct InMemoryPaymentRepository {
    rows: DashMap<Uuid, Payment>,
    by_number: DashMap<String, Uuid>,
    tombstones: DashMap<Uuid, ()>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_rows(&self) -> Vec<Payment> {
        self.rows
            .iter()
            .filter(|entry| !self.tombstones.contains_key(entry.key()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn not_found(id: Uuid) -> DomainError {
        DomainError::NotFound {
            entity: "Payment",
            field: "id",
            value: id.to_string(),
        }
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn get_by_id(&self, id: Uuid) -> DomainResult<Option<Payment>> {
        if self.tombstones.contains_key(&id) {
            return Ok(None);
        }
        Ok(self.rows.get(&id).map(|entry| entry.clone()))
    }

    async fn list_for_booking(&self, booking_id: Uuid) -> DomainResult<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .live_rows()
            .into_iter()
            .filter(|payment| payment.booking_id == booking_id)
            .collect();
        payments.sort_by_key(|payment| payment.created_at);
        Ok(payments)
    }

    async fn get_by_specification(
        &self,
        spec: &Specification<PaymentField>,
    ) -> DomainResult<Option<Payment>> {
        Ok(evaluate(spec, &self.live_rows()).into_iter().next())
    }

    async fn list_by_specification(
        &self,
        spec: &Specification<PaymentField>,
    ) -> DomainResult<Vec<Payment>> {
        Ok(evaluate(spec, &self.live_rows()))
    }

    async fn add(&self, payment: Payment) -> DomainResult<Payment> {
        if self.rows.contains_key(&payment.id) {
            return Err(DomainError::Storage(format!(
                "Payment {} already exists",
                payment.id
            )));
        }
        if self.by_number.contains_key(&payment.payment_number) {
            return Err(DomainError::Storage(format!(
                "Payment number {} already exists",
                payment.payment_number
            )));
        }
        self.by_number
            .insert(payment.payment_number.clone(), payment.id);
        self.rows.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn update(&self, payment: Payment) -> DomainResult<()> {
        if self.tombstones.contains_key(&payment.id) || !self.rows.contains_key(&payment.id) {
            return Err(Self::not_found(payment.id));
        }
        self.rows.insert(payment.id, payment);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        if !self.rows.contains_key(&id) || self.tombstones.contains_key(&id) {
            return Err(Self::not_found(id));
        }
        self.tombstones.insert(id, ());
        Ok(())
    }

    async fn exists(&self, spec: &Specification<PaymentField>) -> DomainResult<bool> {
        Ok(self.live_rows().iter().any(|row| spec.is_satisfied_by(row)))
    }
}
