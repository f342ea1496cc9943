//! Per-booking payment lock table
//!
//! Serializes every payment mutation scoped to one booking. Payment
//! rows are touched from several directions (creation, the capture
//! flow, failure handling, refunds), and the one-open-payment rule
//! spans all of a booking's payments, so exclusivity is keyed by the
//! booking rather than by the individual payment. Waiting is
//! unbounded: payment flows always terminate, and a queued refund
//! must observe the earlier one's effect rather than time out.
//!
//! Lock order: a payment guard may be held while ticket-type locks
//! are taken (the capture flow confirms the booking), never the other
//! way around.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Thread-safe table of per-booking mutexes
pub struct PaymentLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl PaymentLocks {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire exclusivity over one booking's payments, waiting as
    /// long as it takes. Each acquire first drops entries nobody
    /// holds, so the table tracks only bookings with payment work in
    /// flight.
    pub async fn acquire(&self, booking_id: Uuid) -> PaymentGuard {
        self.evict_unused();
        let mutex = self
            .locks
            .entry(booking_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        PaymentGuard {
            booking_id,
            _guard: mutex.lock_owned().await,
        }
    }

    // `retain` holds the shard lock while it checks the count, so an
    // entry observed at one reference cannot gain a holder before it
    // is removed.
    fn evict_unused(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Number of bookings currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Default for PaymentLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusivity over one booking's payments; released on drop.
#[derive(Debug)]
pub struct PaymentGuard {
    pub booking_id: Uuid,
    _guard: OwnedMutexGuard<()>,
}

// ── Tests ──────────────────────────────────────────────────────
