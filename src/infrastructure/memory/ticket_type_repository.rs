//! In-memory implementation of TicketTypeRepository

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::specification::{evaluate, Specification};
use crate::domain::ticket_type::{TicketType, TicketTypeField, TicketTypeRepository};
use crate::shared::errors::{DomainError, DomainResult};

/// DashMap-backed ticket type store.
///
/// Soft deletes tombstone the row: reads and specifications skip it,
/// the data itself stays put.
#[derive(Default)]
pub struct InMemoryTicketTypeRepository {
    rows: DashMap<Uuid, TicketType>,
    tombstones: DashMap<Uuid, ()>,
}

impl InMemoryTicketTypeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_rows(&self) -> Vec<TicketType> {
        self.rows
            .iter()
            .filter(|entry| !self.tombstones.contains_key(entry.key()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn not_found(id: Uuid) -> DomainError {
        DomainError::NotFound {
            entity: "TicketType",
            field: "id",
            value: id.to_string(),
        }
    }
}

#[async_trait]
impl TicketTypeRepository for InMemoryTicketTypeRepository {
    async fn get_by_id(&self, id: Uuid) -> DomainResult<Option<TicketType>> {
        if self.tombstones.contains_key(&id) {
            return Ok(None);
        }
        Ok(self.rows.get(&id).map(|entry| entry.clone()))
    }

    async fn get_by_specification(
        &self,
        spec: &Specification<TicketTypeField>,
    ) -> DomainResult<Option<TicketType>> {
        Ok(evaluate(spec, &self.live_rows()).into_iter().next())
    }

    async fn list_by_specification(
        &self,
        spec: &Specification<TicketTypeField>,
    ) -> DomainResult<Vec<TicketType>> {
        Ok(evaluate(spec, &self.live_rows()))
    }

    async fn add(&self, ticket_type: TicketType) -> DomainResult<TicketType> {
        if self.rows.contains_key(&ticket_type.id) {
            return Err(DomainError::Storage(format!(
                "Ticket type {} already exists",
                ticket_type.id
            )));
        }
        self.rows.insert(ticket_type.id, ticket_type.clone());
        Ok(ticket_type)
    }

    async fn update(&self, ticket_type: TicketType) -> DomainResult<()> {
        if self.tombstones.contains_key(&ticket_type.id)
            || !self.rows.contains_key(&ticket_type.id)
        {
            return Err(Self::not_found(ticket_type.id));
        }
        self.rows.insert(ticket_type.id, ticket_type);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        if !self.rows.contains_key(&id) || self.tombstones.contains_key(&id) {
            return Err(Self::not_found(id));
        }
        self.tombstones.insert(id, ());
        Ok(())
    }

    async fn exists(&self, spec: &Specification<TicketTypeField>) -> DomainResult<bool> {
        Ok(self.live_rows().iter().any(|row| spec.is_satisfied_by(row)))
    }
}
