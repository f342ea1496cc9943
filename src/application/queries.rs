//! Read paths
//!
//! Thin query layer over the repositories. Each read is phrased as a
//! specification (closed filter/order/page primitives), so the same
//! request works against any storage backend. Derived facts the
//! primitives cannot express, like "available right now", are computed
//! here after the specification narrows the set.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::booking::{Booking, BookingField, BookingStatus};
use crate::domain::payment::{Payment, PaymentField, PaymentStatus};
use crate::domain::specification::{CompareOp, Direction, FilterValue, Specification};
use crate::domain::ticket_type::{TicketType, TicketTypeField};
use crate::domain::RepositoryProvider;
use crate::shared::errors::DomainResult;

/// One page of results, newest first unless stated otherwise.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

pub struct QueryService {
    repos: Arc<dyn RepositoryProvider>,
}

impl QueryService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Look up one booking by its human reference.
    pub async fn booking_by_number(&self, number: &str) -> DomainResult<Option<Booking>> {
        self.repos.bookings().get_by_number(number).await
    }

    /// A user's bookings, newest first.
    pub async fn bookings_for_user(
        &self,
        user_id: Uuid,
        page: Option<PageRequest>,
    ) -> DomainResult<Vec<Booking>> {
        let mut spec = Specification::new()
            .filter(BookingField::UserId, CompareOp::Eq, FilterValue::Id(user_id))
            .include("lines")
            .order_by(BookingField::CreatedAt, Direction::Descending);
        if let Some(page) = page {
            spec = spec.page(page.offset, page.limit);
        }
        self.repos.bookings().list_by_specification(&spec).await
    }

    /// An event's bookings, optionally narrowed to one status.
    pub async fn bookings_for_event(
        &self,
        event_id: Uuid,
        status: Option<BookingStatus>,
    ) -> DomainResult<Vec<Booking>> {
        let mut spec = Specification::new()
            .filter(BookingField::EventId, CompareOp::Eq, FilterValue::Id(event_id))
            .order_by(BookingField::CreatedAt, Direction::Descending);
        if let Some(status) = status {
            spec = spec.filter(
                BookingField::Status,
                CompareOp::Eq,
                FilterValue::Text(status.as_str().to_string()),
            );
        }
        self.repos.bookings().list_by_specification(&spec).await
    }

    /// Payments recorded for one booking, oldest first.
    pub async fn payments_for_booking(&self, booking_id: Uuid) -> DomainResult<Vec<Payment>> {
        self.repos.payments().list_for_booking(booking_id).await
    }

    /// Every payment taken for an event, newest first. Payments carry
    /// no event id of their own, so this joins through the event's
    /// bookings.
    pub async fn payments_for_event(&self, event_id: Uuid) -> DomainResult<Vec<Payment>> {
        let spec = Specification::new()
            .filter(BookingField::EventId, CompareOp::Eq, FilterValue::Id(event_id));
        let bookings = self.repos.bookings().list_by_specification(&spec).await?;

        let mut payments = Vec::new();
        for booking in &bookings {
            payments.extend(self.repos.payments().list_for_booking(booking.id).await?);
        }
        payments.sort_by_key(|payment| std::cmp::Reverse(payment.created_at));
        Ok(payments)
    }

    /// Payments in one status across the platform, newest first.
    /// Ops dashboards use this for failed-payment triage.
    pub async fn payments_with_status(
        &self,
        status: PaymentStatus,
        page: Option<PageRequest>,
    ) -> DomainResult<Vec<Payment>> {
        let mut spec = Specification::new()
            .filter(
                PaymentField::Status,
                CompareOp::Eq,
                FilterValue::Text(status.as_str().to_string()),
            )
            .order_by(PaymentField::CreatedAt, Direction::Descending);
        if let Some(page) = page {
            spec = spec.page(page.offset, page.limit);
        }
        self.repos.payments().list_by_specification(&spec).await
    }

    /// Ticket types a buyer can order right now for an event, cheapest
    /// first. The specification narrows to the event's active types;
    /// window and sell-out are computed per type.
    pub async fn ticket_types_on_sale(&self, event_id: Uuid) -> DomainResult<Vec<TicketType>> {
        let spec = Specification::new()
            .filter(
                TicketTypeField::EventId,
                CompareOp::Eq,
                FilterValue::Id(event_id),
            )
            .filter(TicketTypeField::Active, CompareOp::Eq, FilterValue::Boolean(true))
            .order_by(TicketTypeField::Price, Direction::Ascending);
        let now = Utc::now();
        let types = self.repos.ticket_types().list_by_specification(&spec).await?;
        Ok(types
            .into_iter()
            .filter(|ticket_type| ticket_type.is_available_at(now))
            .collect())
    }

    /// Search ticket types by name fragment, case-insensitive.
    pub async fn search_ticket_types(
        &self,
        event_id: Uuid,
        name_fragment: &str,
    ) -> DomainResult<Vec<TicketType>> {
        let spec = Specification::new()
            .filter(
                TicketTypeField::EventId,
                CompareOp::Eq,
                FilterValue::Id(event_id),
            )
            .filter(
                TicketTypeField::Name,
                CompareOp::Contains,
                FilterValue::Text(name_fragment.to_string()),
            )
            .order_by(TicketTypeField::Name, Direction::Ascending);
        self.repos.ticket_types().list_by_specification(&spec).await
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::booking::BookingLine;
    use crate::domain::money::Money;
    use crate::domain::payment::PaymentMethod;
    use crate::infrastructure::memory::InMemoryRepositoryProvider;

    fn egp(amount: i64) -> Money {
        Money::new(Decimal::from(amount), "EGP").unwrap()
    }

    fn booking_for(user_id: Uuid, event_id: Uuid) -> Booking {
        let line = BookingLine::new(Uuid::new_v4(), 1, egp(100));
        Booking::new(user_id, event_id, vec![line], false).unwrap()
    }

    fn build_service() -> (Arc<InMemoryRepositoryProvider>, QueryService) {
        let repos = InMemoryRepositoryProvider::shared();
        let service = QueryService::new(repos.clone());
        (repos, service)
    }

    #[tokio::test]
    async fn bookings_for_user_pages_newest_first() {
        let (repos, service) = build_service();
        let user_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();

        let mut ordered = Vec::new();
        for _ in 0..3 {
            let mut booking = booking_for(user_id, event_id);
            // Distinct timestamps keep the ordering deterministic.
            booking.created_at = Utc::now() - Duration::seconds(ordered.len() as i64);
            let booking = repos.bookings().add(booking).await.unwrap();
            ordered.push(booking.id);
        }
        repos
            .bookings()
            .add(booking_for(Uuid::new_v4(), event_id))
            .await
            .unwrap();

        let all = service.bookings_for_user(user_id, None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, ordered[0], "newest booking comes first");

        let page = service
            .bookings_for_user(user_id, Some(PageRequest { offset: 1, limit: 1 }))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, ordered[1]);
    }

    #[tokio::test]
    async fn bookings_for_event_filters_by_status() {
        let (repos, service) = build_service();
        let event_id = Uuid::new_v4();

        let mut pending = booking_for(Uuid::new_v4(), event_id);
        pending.await_payment().unwrap();
        let pending = repos.bookings().add(pending).await.unwrap();

        let mut confirmed = booking_for(Uuid::new_v4(), event_id);
        confirmed.await_payment().unwrap();
        confirmed.confirm().unwrap();
        repos.bookings().add(confirmed).await.unwrap();

        let found = service
            .bookings_for_event(event_id, Some(BookingStatus::PendingPayment))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, pending.id);

        let everything = service.bookings_for_event(event_id, None).await.unwrap();
        assert_eq!(everything.len(), 2);
    }

    #[tokio::test]
    async fn payments_for_event_joins_through_bookings() {
        let (repos, service) = build_service();
        let event_id = Uuid::new_v4();

        let ours = repos
            .bookings()
            .add(booking_for(Uuid::new_v4(), event_id))
            .await
            .unwrap();
        let theirs = repos
            .bookings()
            .add(booking_for(Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap();

        let wanted = repos
            .payments()
            .add(Payment::new(ours.id, egp(100), PaymentMethod::Card))
            .await
            .unwrap();
        repos
            .payments()
            .add(Payment::new(theirs.id, egp(100), PaymentMethod::Card))
            .await
            .unwrap();

        let found = service.payments_for_event(event_id).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, wanted.id);
    }

    #[tokio::test]
    async fn failed_payments_listing_skips_other_statuses() {
        let (repos, service) = build_service();

        let mut failed = Payment::new(Uuid::new_v4(), egp(100), PaymentMethod::Card);
        failed.mark_processing().unwrap();
        failed.mark_failed("card declined").unwrap();
        let failed = repos.payments().add(failed).await.unwrap();

        let pending = Payment::new(Uuid::new_v4(), egp(50), PaymentMethod::Wallet);
        repos.payments().add(pending).await.unwrap();

        let found = service
            .payments_with_status(PaymentStatus::Failed, None)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, failed.id);
    }

    #[tokio::test]
    async fn on_sale_listing_hides_unavailable_types() {
        let (repos, service) = build_service();
        let event_id = Uuid::new_v4();

        let cheap = TicketType::new(event_id, "General", egp(100), 10).unwrap();
        repos.ticket_types().add(cheap).await.unwrap();

        let pricey = TicketType::new(event_id, "VIP", egp(400), 10).unwrap();
        repos.ticket_types().add(pricey).await.unwrap();

        let mut inactive = TicketType::new(event_id, "Hidden", egp(50), 10).unwrap();
        inactive.deactivate();
        repos.ticket_types().add(inactive).await.unwrap();

        let mut closed = TicketType::new(event_id, "Early Bird", egp(80), 10).unwrap();
        closed
            .set_sales_window(
                Some(Utc::now() - Duration::days(30)),
                Some(Utc::now() - Duration::days(1)),
            )
            .unwrap();
        repos.ticket_types().add(closed).await.unwrap();

        let mut sold_out = TicketType::new(event_id, "Backstage", egp(900), 2).unwrap();
        sold_out.reserve(2).unwrap();
        repos.ticket_types().add(sold_out).await.unwrap();

        let on_sale = service.ticket_types_on_sale(event_id).await.unwrap();
        let names: Vec<&str> = on_sale.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["General", "VIP"], "cheapest first, rest hidden");
    }

    #[tokio::test]
    async fn name_search_is_case_insensitive() {
        let (repos, service) = build_service();
        let event_id = Uuid::new_v4();
        let vip = TicketType::new(event_id, "VIP Lounge", egp(400), 10).unwrap();
        repos.ticket_types().add(vip).await.unwrap();
        let general = TicketType::new(event_id, "General", egp(100), 10).unwrap();
        repos.ticket_types().add(general).await.unwrap();

        let found = service.search_ticket_types(event_id, "vip").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "VIP Lounge");
    }
}
