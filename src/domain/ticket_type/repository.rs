//! Ticket type repository interface

use async_trait::async_trait;
use uuid::Uuid;

use super::model::TicketType;
use crate::domain::specification::{FilterValue, SpecTarget, Specification};
use crate::shared::errors::DomainResult;

/// Queryable fields of [`TicketType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketTypeField {
    Id,
    EventId,
    Name,
    Price,
    TotalQuantity,
    SoldQuantity,
    Active,
    SalesStart,
    SalesEnd,
    CreatedAt,
}

impl SpecTarget for TicketType {
    type Field = TicketTypeField;

    fn field_value(&self, field: TicketTypeField) -> FilterValue {
        match field {
            TicketTypeField::Id => FilterValue::Id(self.id),
            TicketTypeField::EventId => FilterValue::Id(self.event_id),
            TicketTypeField::Name => FilterValue::Text(self.name.clone()),
            TicketTypeField::Price => FilterValue::Decimal(self.price.amount()),
            TicketTypeField::TotalQuantity => FilterValue::Integer(self.total_quantity as i64),
            TicketTypeField::SoldQuantity => FilterValue::Integer(self.sold_quantity as i64),
            TicketTypeField::Active => FilterValue::Boolean(self.active),
            TicketTypeField::SalesStart => match self.sales_start {
                Some(at) => FilterValue::Timestamp(at),
                None => FilterValue::Null,
            },
            TicketTypeField::SalesEnd => match self.sales_end {
                Some(at) => FilterValue::Timestamp(at),
                None => FilterValue::Null,
            },
            TicketTypeField::CreatedAt => FilterValue::Timestamp(self.created_at),
        }
    }
}

/// Stores ticket types and their inventory counters.
///
/// `sold_quantity` read through this trait is the single source of
/// truth for availability. Implementations must make the coordinator's
/// load-check-store sequence on one ticket type atomic with respect to
/// that ticket type (a transaction, row lock, or equivalent) when the
/// deployment spans processes; the in-process keyed lock alone is not
/// enough there.
#[async_trait]
pub trait TicketTypeRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> DomainResult<Option<TicketType>>;

    /// First match for the specification, if any.
    async fn get_by_specification(
        &self,
        spec: &Specification<TicketTypeField>,
    ) -> DomainResult<Option<TicketType>>;

    async fn list_by_specification(
        &self,
        spec: &Specification<TicketTypeField>,
    ) -> DomainResult<Vec<TicketType>>;

    /// Persist a new ticket type and return the stored value.
    async fn add(&self, ticket_type: TicketType) -> DomainResult<TicketType>;

    async fn update(&self, ticket_type: TicketType) -> DomainResult<()>;

    /// Soft-delete: the row survives with a deletion marker and stops
    /// appearing in reads.
    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    async fn exists(&self, spec: &Specification<TicketTypeField>) -> DomainResult<bool>;
}
