//! Payment repository interface

use async_trait::async_trait;
use uuid::Uuid;

use super::model::Payment;
use crate::domain::specification::{FilterValue, SpecTarget, Specification};
use crate::shared::errors::DomainResult;

/// Queryable fields of [`Payment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentField {
    Id,
    BookingId,
    PaymentNumber,
    Amount,
    Status,
    Method,
    ExternalTransactionId,
    CreatedAt,
}

impl SpecTarget for Payment {
    type Field = PaymentField;

    fn field_value(&self, field: PaymentField) -> FilterValue {
        match field {
            PaymentField::Id => FilterValue::Id(self.id),
            PaymentField::BookingId => FilterValue::Id(self.booking_id),
            PaymentField::PaymentNumber => FilterValue::Text(self.payment_number.clone()),
            PaymentField::Amount => FilterValue::Decimal(self.amount.amount()),
            PaymentField::Status => FilterValue::Text(self.status.as_str().to_string()),
            PaymentField::Method => FilterValue::Text(self.method.as_str().to_string()),
            PaymentField::ExternalTransactionId => match &self.external_transaction_id {
                Some(id) => FilterValue::Text(id.clone()),
                None => FilterValue::Null,
            },
            PaymentField::CreatedAt => FilterValue::Timestamp(self.created_at),
        }
    }
}

/// Stores payments. `payment_number` is unique; `add` rejects one that
/// already exists.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> DomainResult<Option<Payment>>;

    /// All payments ever attempted for a booking, oldest first.
    async fn list_for_booking(&self, booking_id: Uuid) -> DomainResult<Vec<Payment>>;

    async fn get_by_specification(
        &self,
        spec: &Specification<PaymentField>,
    ) -> DomainResult<Option<Payment>>;

    async fn list_by_specification(
        &self,
        spec: &Specification<PaymentField>,
    ) -> DomainResult<Vec<Payment>>;

    async fn add(&self, payment: Payment) -> DomainResult<Payment>;

    async fn update(&self, payment: Payment) -> DomainResult<()>;

    /// Soft-delete: the row survives with a deletion marker and stops
    /// appearing in reads.
    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    async fn exists(&self, spec: &Specification<PaymentField>) -> DomainResult<bool>;
}
