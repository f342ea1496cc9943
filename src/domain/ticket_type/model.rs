//! Ticket type domain entity
//!
//! One priced admission class of one event ("VIP", "General", ...).
//! `sold_quantity` is the single source of truth for availability and
//! is mutated only through [`TicketType::reserve`] and
//! [`TicketType::release`]; everything else on the entity is
//! administrative.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::money::Money;
use crate::shared::errors::{DomainError, DomainResult};

/// Ticket class inventory and sale settings.
#[derive(Debug, Clone)]
pub struct TicketType {
    /// Unique ticket type ID
    pub id: Uuid,
    /// Event this ticket class belongs to
    pub event_id: Uuid,
    /// Display name shown to buyers
    pub name: String,
    /// Price per ticket
    pub price: Money,
    /// Configured capacity
    pub total_quantity: u32,
    /// Units currently reserved or sold; never exceeds `total_quantity`
    pub sold_quantity: u32,
    /// Sales open from this instant (inclusive); `None` = open
    pub sales_start: Option<DateTime<Utc>>,
    /// Sales close at this instant (exclusive); `None` = never
    pub sales_end: Option<DateTime<Utc>>,
    /// Inactive ticket types cannot be reserved
    pub active: bool,
    /// Smallest quantity one booking line may request
    pub min_per_order: u32,
    /// Largest quantity one booking line may request
    pub max_per_order: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketType {
    pub fn new(
        event_id: Uuid,
        name: impl Into<String>,
        price: Money,
        total_quantity: u32,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::Validation(
                "Ticket type name cannot be empty".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            event_id,
            name,
            price,
            total_quantity,
            sold_quantity: 0,
            sales_start: None,
            sales_end: None,
            active: true,
            min_per_order: 1,
            max_per_order: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Units still reservable.
    pub fn available_quantity(&self) -> u32 {
        self.total_quantity - self.sold_quantity
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_quantity() == 0
    }

    /// Whether a reservation could succeed at `at`: the class is
    /// active, has units left, and `at` falls inside the sales window.
    pub fn is_available_at(&self, at: DateTime<Utc>) -> bool {
        self.active && !self.is_sold_out() && self.sales_window_contains(at)
    }

    pub fn is_available(&self) -> bool {
        self.is_available_at(Utc::now())
    }

    fn sales_window_contains(&self, at: DateTime<Utc>) -> bool {
        let after_start = self.sales_start.map_or(true, |start| at >= start);
        let before_end = self.sales_end.map_or(true, |end| at < end);
        after_start && before_end
    }

    /// Claim `quantity` units. Succeeds iff the class is available
    /// right now and the claim fits under capacity; fails without side
    /// effects otherwise. Callers must hold this ticket type's
    /// exclusivity (see the reservation coordinator).
    pub fn reserve(&mut self, quantity: u32) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::Validation(
                "Cannot reserve zero tickets".to_string(),
            ));
        }
        if !self.is_available() {
            return Err(DomainError::InsufficientInventory {
                ticket_type_id: self.id,
                requested: quantity,
                available: 0,
            });
        }
        let new_sold = self
            .sold_quantity
            .checked_add(quantity)
            .filter(|&new_sold| new_sold <= self.total_quantity)
            .ok_or(DomainError::InsufficientInventory {
                ticket_type_id: self.id,
                requested: quantity,
                available: self.available_quantity(),
            })?;
        self.sold_quantity = new_sold;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Return `quantity` units to the pool. Failing this check means a
    /// coordinator bug released more than was reserved; the error is
    /// fatal, never clamped.
    pub fn release(&mut self, quantity: u32) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::Validation(
                "Cannot release zero tickets".to_string(),
            ));
        }
        if quantity > self.sold_quantity {
            return Err(DomainError::InvalidRelease {
                ticket_type_id: self.id,
                quantity,
                sold: self.sold_quantity,
            });
        }
        self.sold_quantity -= quantity;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Check a requested line quantity against this class's per-order
    /// limits. Runs before any lock is taken.
    pub fn check_order_quantity(&self, quantity: u32) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::Validation(
                "Cannot reserve zero tickets".to_string(),
            ));
        }
        if quantity < self.min_per_order {
            return Err(DomainError::Validation(format!(
                "Quantity {} is below the minimum of {} for '{}'",
                quantity, self.min_per_order, self.name
            )));
        }
        if let Some(max) = self.max_per_order {
            if quantity > max {
                return Err(DomainError::Validation(format!(
                    "Quantity {} exceeds the maximum of {} for '{}'",
                    quantity, max, self.name
                )));
            }
        }
        Ok(())
    }

    /// Change capacity. The new total must cover what is already sold.
    pub fn set_total_quantity(&mut self, total: u32) -> DomainResult<()> {
        if total < self.sold_quantity {
            return Err(DomainError::Validation(format!(
                "Total quantity {} is below the {} tickets already sold",
                total, self.sold_quantity
            )));
        }
        self.total_quantity = total;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_price(&mut self, price: Money) {
        self.price = price;
        self.updated_at = Utc::now();
    }

    pub fn set_sales_window(
        &mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> DomainResult<()> {
        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                return Err(DomainError::Validation(
                    "Sales window must start before it ends".to_string(),
                ));
            }
        }
        self.sales_start = start;
        self.sales_end = end;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_order_limits(&mut self, min: u32, max: Option<u32>) -> DomainResult<()> {
        if min == 0 {
            return Err(DomainError::Validation(
                "Minimum per order must be at least 1".to_string(),
            ));
        }
        if let Some(max) = max {
            if max < min {
                return Err(DomainError::Validation(format!(
                    "Maximum per order {} is below the minimum {}",
                    max, min
                )));
            }
        }
        self.min_per_order = min;
        self.max_per_order = max;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn activate(&mut self) {
        self.active = true;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }
}

// ── Tests ──────────────────────────────────────────────────────
