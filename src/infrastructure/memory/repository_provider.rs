//! In-memory implementation of RepositoryProvider

use std::sync::Arc;

use crate::domain::booking::BookingRepository;
use crate::domain::hold::HoldRepository;
use crate::domain::payment::PaymentRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::ticket_type::TicketTypeRepository;

use super::booking_repository::InMemoryBookingRepository;
use super::hold_repository::InMemoryHoldRepository;
use super::payment_repository::InMemoryPaymentRepository;
use super::ticket_type_repository::InMemoryTicketTypeRepository;

/// Unified repository provider backed by DashMaps.
///
/// The reference backend for tests and single-process deployments.
/// Holds one store per aggregate and exposes the per-aggregate
/// repository accessors.
///
/// ```ignore
/// let repos = InMemoryRepositoryProvider::shared();
/// let ticket_type = repos.ticket_types().get_by_id(id).await?;
/// ```
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    ticket_types: InMemoryTicketTypeRepository,
    bookings: InMemoryBookingRepository,
    payments: InMemoryPaymentRepository,
    holds: InMemoryHoldRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self {
            ticket_types: InMemoryTicketTypeRepository::new(),
            bookings: InMemoryBookingRepository::new(),
            payments: InMemoryPaymentRepository::new(),
            holds: InMemoryHoldRepository::new(),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn ticket_types(&self) -> &dyn TicketTypeRepository {
        &self.ticket_types
    }

    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn payments(&self) -> &dyn PaymentRepository {
        &self.payments
    }

    fn holds(&self) -> &dyn HoldRepository {
        &self.holds
    }
}

// ── Tests ──────────────────────────────────────────────────────
