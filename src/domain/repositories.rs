//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories

use super::booking::BookingRepository;
use super::hold::HoldRepository;
use super::payment::PaymentRepository;
use super::ticket_type::TicketTypeRepository;

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let booking = repos.bookings().get_by_id(booking_id).await?;
///     let holds = repos.holds().list_for_booking(booking_id).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn ticket_types(&self) -> &dyn TicketTypeRepository;
    fn bookings(&self) -> &dyn BookingRepository;
    fn payments(&self) -> &dyn PaymentRepository;
    fn holds(&self) -> &dyn HoldRepository;
}
