//! Reservation hold entity
//!
//! A time-boxed claim on reserved inventory, one per booking line. It
//! exists only between "inventory provisionally reserved" and "booking
//! confirmed or released"; the expiry sweep returns the inventory of
//! holds that outlive their deadline.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Provisional claim on `quantity` units of one ticket type.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationHold {
    pub id: Uuid,
    pub event_id: Uuid,
    pub ticket_type_id: Uuid,
    pub booking_id: Uuid,
    pub quantity: u32,
    /// Past this instant the sweep may release the claim
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ReservationHold {
    pub fn new(
        event_id: Uuid,
        ticket_type_id: Uuid,
        booking_id: Uuid,
        quantity: u32,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            ticket_type_id,
            booking_id,
            quantity,
            expires_at,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        at > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn fresh_hold_is_not_expired() {
        let hold = ReservationHold::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            2,
            Utc::now() + Duration::minutes(15),
        );
        assert!(!hold.is_expired());
    }

    #[test]
    fn hold_past_deadline_is_expired() {
        let hold = ReservationHold::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            2,
            Utc::now() - Duration::seconds(1),
        );
        assert!(hold.is_expired());
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let deadline = Utc::now() + Duration::minutes(5);
        let hold = ReservationHold::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            1,
            deadline,
        );
        assert!(!hold.is_expired_at(deadline));
        assert!(hold.is_expired_at(deadline + Duration::milliseconds(1)));
    }
}
