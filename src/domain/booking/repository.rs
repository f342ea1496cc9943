//! Booking repository interface

use async_trait::async_trait;
use uuid::Uuid;

use super::model::Booking;
use crate::domain::specification::{FilterValue, SpecTarget, Specification};
use crate::shared::errors::DomainResult;

/// Queryable fields of [`Booking`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingField {
    Id,
    BookingNumber,
    UserId,
    EventId,
    Status,
    TotalAmount,
    TotalTickets,
    RequiresApproval,
    CheckedIn,
    CreatedAt,
    ConfirmedAt,
    CancelledAt,
}

impl SpecTarget for Booking {
    type Field = BookingField;

    fn field_value(&self, field: BookingField) -> FilterValue {
        match field {
            BookingField::Id => FilterValue::Id(self.id),
            BookingField::BookingNumber => FilterValue::Text(self.booking_number.clone()),
            BookingField::UserId => FilterValue::Id(self.user_id),
            BookingField::EventId => FilterValue::Id(self.event_id),
            BookingField::Status => FilterValue::Text(self.status.as_str().to_string()),
            BookingField::TotalAmount => FilterValue::Decimal(self.total_amount.amount()),
            BookingField::TotalTickets => FilterValue::Integer(self.total_tickets as i64),
            BookingField::RequiresApproval => FilterValue::Boolean(self.requires_approval),
            BookingField::CheckedIn => FilterValue::Boolean(self.checked_in),
            BookingField::CreatedAt => FilterValue::Timestamp(self.created_at),
            BookingField::ConfirmedAt => match self.confirmed_at {
                Some(at) => FilterValue::Timestamp(at),
                None => FilterValue::Null,
            },
            BookingField::CancelledAt => match self.cancelled_at {
                Some(at) => FilterValue::Timestamp(at),
                None => FilterValue::Null,
            },
        }
    }
}

/// Stores bookings. `booking_number` is unique; `add` rejects one that
/// already exists.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> DomainResult<Option<Booking>>;

    /// Look up by the human-referenceable number.
    async fn get_by_number(&self, booking_number: &str) -> DomainResult<Option<Booking>>;

    async fn get_by_specification(
        &self,
        spec: &Specification<BookingField>,
    ) -> DomainResult<Option<Booking>>;

    async fn list_by_specification(
        &self,
        spec: &Specification<BookingField>,
    ) -> DomainResult<Vec<Booking>>;

    async fn add(&self, booking: Booking) -> DomainResult<Booking>;

    async fn update(&self, booking: Booking) -> DomainResult<()>;

    /// Soft-delete: the row survives with a deletion marker and stops
    /// appearing in reads.
    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    async fn exists(&self, spec: &Specification<BookingField>) -> DomainResult<bool>;
}
