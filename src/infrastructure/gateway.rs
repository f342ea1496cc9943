//! Mock payment gateway
//!
//! Deterministic [`PaymentGateway`] for tests and single-process runs.
//! Outcomes are scripted per call in FIFO order; when the script runs
//! dry every call succeeds. References are sequential so assertions
//! can pin them down, and an optional per-call latency lets tests
//! interleave work with an in-flight round trip.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{GatewayError, PaymentGateway, PaymentIntent};
use crate::domain::money::Money;

/// One scripted gateway outcome.
#[derive(Debug, Clone)]
pub enum GatewayBehavior {
    Succeed,
    Decline(String),
    TransportError(String),
}

pub struct MockPaymentGateway {
    script: Mutex<VecDeque<GatewayBehavior>>,
    sequence: AtomicU64,
    calls: AtomicU64,
    latency_ms: AtomicU64,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            sequence: AtomicU64::new(1),
            calls: AtomicU64::new(0),
            latency_ms: AtomicU64::new(0),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Queue outcomes for upcoming calls, oldest first.
    pub fn script(&self, behaviors: impl IntoIterator<Item = GatewayBehavior>) {
        if let Ok(mut script) = self.script.lock() {
            script.extend(behaviors);
        }
    }

    /// How many gateway calls were made, across all operations.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every call sleep before answering, so tests can overlap
    /// other work with an in-flight gateway round trip.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    async fn simulate_latency(&self) {
        let ms = self.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn next_outcome(&self) -> GatewayBehavior {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or(GatewayBehavior::Succeed)
    }

    fn next_reference(&self, prefix: &str) -> String {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst);
        format!("{}_{:06}", prefix, n)
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_intent(&self, _amount: &Money) -> Result<PaymentIntent, GatewayError> {
        self.simulate_latency().await;
        match self.next_outcome() {
            GatewayBehavior::Succeed => {
                let intent_id = self.next_reference("pi");
                let client_secret = format!("{}_secret", intent_id);
                Ok(PaymentIntent {
                    intent_id,
                    client_secret,
                })
            }
            GatewayBehavior::Decline(reason) => Err(GatewayError::Declined(reason)),
            GatewayBehavior::TransportError(reason) => Err(GatewayError::Transport(reason)),
        }
    }

    async fn capture(&self, _intent_id: &str) -> Result<String, GatewayError> {
        self.simulate_latency().await;
        match self.next_outcome() {
            GatewayBehavior::Succeed => Ok(self.next_reference("txn")),
            GatewayBehavior::Decline(reason) => Err(GatewayError::Declined(reason)),
            GatewayBehavior::TransportError(reason) => Err(GatewayError::Transport(reason)),
        }
    }

    async fn refund(
        &self,
        _external_transaction_id: &str,
        _amount: &Money,
    ) -> Result<String, GatewayError> {
        self.simulate_latency().await;
        match self.next_outcome() {
            GatewayBehavior::Succeed => Ok(self.next_reference("re")),
            GatewayBehavior::Decline(reason) => Err(GatewayError::Declined(reason)),
            GatewayBehavior::TransportError(reason) => Err(GatewayError::Transport(reason)),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
