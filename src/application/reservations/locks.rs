//! Per-ticket-type lock table
//!
//! Serializes every inventory mutation scoped to one ticket type. The
//! reservation, confirmation, cancellation, and expiry paths all pass
//! through here, so only one of them can touch a given ticket type's
//! counters at a time. There is no global lock; multi-line operations
//! take their keys in sorted order to stay deadlock-free.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::shared::errors::{DomainError, DomainResult};

/// Thread-safe table of per-ticket-type mutexes
pub struct TicketTypeLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

/// Shared, reference-counted lock table
pub type SharedTicketTypeLocks = Arc<TicketTypeLocks>;

impl TicketTypeLocks {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Wrap in `Arc` for shared ownership
    pub fn shared() -> SharedTicketTypeLocks {
        Arc::new(Self::new())
    }

    fn entry(&self, ticket_type_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(ticket_type_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire exclusivity over one ticket type, waiting at most
    /// `wait`. Timing out maps to `ReservationTimeout`, which callers
    /// may retry; it never means the inventory was insufficient.
    pub async fn acquire(
        &self,
        ticket_type_id: Uuid,
        wait: Duration,
    ) -> DomainResult<TicketTypeGuard> {
        let mutex = self.entry(ticket_type_id);
        match tokio::time::timeout(wait, mutex.lock_owned()).await {
            Ok(guard) => Ok(TicketTypeGuard {
                ticket_type_id,
                _guard: guard,
            }),
            Err(_) => Err(DomainError::ReservationTimeout { ticket_type_id }),
        }
    }

    /// Acquire several ticket types, always in sorted ID order so two
    /// overlapping multi-line operations cannot deadlock. On timeout,
    /// every guard taken so far is dropped before the error returns.
    pub async fn acquire_many(
        &self,
        ticket_type_ids: &[Uuid],
        wait: Duration,
    ) -> DomainResult<Vec<TicketTypeGuard>> {
        let mut ids: Vec<Uuid> = ticket_type_ids.to_vec();
        ids.sort();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.acquire(id, wait).await?);
        }
        Ok(guards)
    }

    /// Drop entries nobody holds or waits on. The table gains one
    /// entry per ticket type ever locked; callers with a periodic
    /// housekeeping moment (the expiry sweep) trim it here.
    ///
    /// `retain` holds the shard lock while it checks the count, so an
    /// entry observed at one reference cannot gain a holder before it
    /// is removed.
    pub fn evict_unused(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Number of ticket types currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Default for TicketTypeLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusivity over one ticket type; released on drop.
#[derive(Debug)]
pub struct TicketTypeGuard {
    pub ticket_type_id: Uuid,
    _guard: OwnedMutexGuard<()>,
}

// ── Tests ──────────────────────────────────────────────────────
