//! Ticket type administration
//!
//! Organizer-facing mutations of the inventory catalogue. Every write
//! goes through the same per-ticket-type lock the reservation paths
//! use, so an admin update can never clobber a concurrent sale's
//! `sold_quantity`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::application::reservations::SharedTicketTypeLocks;
use crate::config::EngineConfig;
use crate::domain::booking::{BookingField, BookingStatus};
use crate::domain::money::Money;
use crate::domain::specification::{CompareOp, FilterValue, Specification};
use crate::domain::ticket_type::TicketType;
use crate::domain::RepositoryProvider;
use crate::shared::errors::{DomainError, DomainResult};

/// Parameters for a new ticket type. Window and limits are optional;
/// the model defaults apply when absent.
#[derive(Debug, Clone)]
pub struct NewTicketType {
    pub event_id: Uuid,
    pub name: String,
    pub price: Money,
    pub total_quantity: u32,
    pub sales_start: Option<DateTime<Utc>>,
    pub sales_end: Option<DateTime<Utc>>,
    pub min_per_order: Option<u32>,
    pub max_per_order: Option<u32>,
}

pub struct InventoryService {
    repos: Arc<dyn RepositoryProvider>,
    locks: SharedTicketTypeLocks,
    config: EngineConfig,
}

impl InventoryService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        locks: SharedTicketTypeLocks,
        config: EngineConfig,
    ) -> Self {
        Self {
            repos,
            locks,
            config,
        }
    }

    pub async fn create_ticket_type(&self, params: NewTicketType) -> DomainResult<TicketType> {
        let mut ticket_type = TicketType::new(
            params.event_id,
            params.name,
            params.price,
            params.total_quantity,
        )?;
        ticket_type.set_sales_window(params.sales_start, params.sales_end)?;
        if params.min_per_order.is_some() || params.max_per_order.is_some() {
            ticket_type.set_order_limits(
                params.min_per_order.unwrap_or(ticket_type.min_per_order),
                params.max_per_order,
            )?;
        }

        let ticket_type = self.repos.ticket_types().add(ticket_type).await?;
        info!(
            ticket_type_id = %ticket_type.id,
            event_id = %ticket_type.event_id,
            name = %ticket_type.name,
            total_quantity = ticket_type.total_quantity,
            "Ticket type created"
        );
        Ok(ticket_type)
    }

    pub async fn get_ticket_type(&self, id: Uuid) -> DomainResult<TicketType> {
        self.load(id).await
    }

    pub async fn update_price(&self, id: Uuid, price: Money) -> DomainResult<TicketType> {
        self.mutate(id, "price updated", |ticket_type| {
            ticket_type.set_price(price);
            Ok(())
        })
        .await
    }

    /// Change capacity. Never allowed below the tickets already sold.
    pub async fn update_total_quantity(&self, id: Uuid, total: u32) -> DomainResult<TicketType> {
        self.mutate(id, "capacity updated", |ticket_type| {
            ticket_type.set_total_quantity(total)
        })
        .await
    }

    pub async fn update_sales_window(
        &self,
        id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> DomainResult<TicketType> {
        self.mutate(id, "sales window updated", |ticket_type| {
            ticket_type.set_sales_window(start, end)
        })
        .await
    }

    pub async fn update_order_limits(
        &self,
        id: Uuid,
        min: u32,
        max: Option<u32>,
    ) -> DomainResult<TicketType> {
        self.mutate(id, "order limits updated", |ticket_type| {
            ticket_type.set_order_limits(min, max)
        })
        .await
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> DomainResult<TicketType> {
        self.mutate(id, "active flag updated", |ticket_type| {
            if active {
                ticket_type.activate();
            } else {
                ticket_type.deactivate();
            }
            Ok(())
        })
        .await
    }

    /// Soft-delete a ticket type.
    ///
    /// Refused while any non-cancelled booking still references it;
    /// those bookings must be cancelled (returning their inventory)
    /// first.
    pub async fn delete_ticket_type(&self, id: Uuid) -> DomainResult<()> {
        let _guard = self.locks.acquire(id, self.config.lock_wait()).await?;
        let ticket_type = self.load(id).await?;

        let live = Specification::new().filter(
            BookingField::Status,
            CompareOp::Ne,
            FilterValue::Text(BookingStatus::Cancelled.as_str().to_string()),
        );
        let bookings = self.repos.bookings().list_by_specification(&live).await?;
        if bookings.iter().any(|booking| booking.quantity_of(id) > 0) {
            return Err(DomainError::Validation(format!(
                "Ticket type {} is referenced by active bookings",
                ticket_type.name
            )));
        }

        self.repos.ticket_types().delete(id).await?;
        info!(ticket_type_id = %id, name = %ticket_type.name, "Ticket type deleted");
        Ok(())
    }

    // ── Internal helpers ───────────────────────────────────────

    async fn load(&self, id: Uuid) -> DomainResult<TicketType> {
        self.repos
            .ticket_types()
            .get_by_id(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "TicketType",
                field: "id",
                value: id.to_string(),
            })
    }

    /// Load, mutate and store one ticket type under its lock.
    async fn mutate(
        &self,
        id: Uuid,
        action: &'static str,
        apply: impl FnOnce(&mut TicketType) -> DomainResult<()>,
    ) -> DomainResult<TicketType> {
        let _guard = self.locks.acquire(id, self.config.lock_wait()).await?;
        let mut ticket_type = self.load(id).await?;
        apply(&mut ticket_type)?;
        self.repos.ticket_types().update(ticket_type.clone()).await?;
        info!(ticket_type_id = %id, "Ticket type {}", action);
        Ok(ticket_type)
    }
}

// ── Tests ──────────────────────────────────────────────────────
