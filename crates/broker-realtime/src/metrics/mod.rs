//! Gate dependability counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters shared by the multiplexer and the scheduler.
#[derive(Debug, Default)]
pub struct GateMetrics {
    /// Complete messages received
    pub messages: AtomicU64,
    /// Partial frames received
    pub fragmented: AtomicU64,
    /// Protocol and routing failures
    pub errors: AtomicU64,
    /// Error envelopes sent
    pub error_responses: AtomicU64,
    /// Subscribe responses sent
    pub subscribe_responses: AtomicU64,
    /// Unsubscribe responses sent
    pub unsubscribe_responses: AtomicU64,
    /// Notifications handed to gates
    pub notifications: AtomicU64,
    /// Gates currently open
    pub active_gates: AtomicU64,
    /// Gates ever opened
    pub gates_opened: AtomicU64,
    /// Gates closed
    pub gates_closed: AtomicU64,
}

impl GateMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_open(&self) {
        Self::inc(&self.gates_opened);
        Self::inc(&self.active_gates);
    }

    pub fn record_close(&self) {
        Self::inc(&self.gates_closed);
        let _ = self
            .active_gates
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Clears the message counters. Gate counts are left alone.
    pub fn reset(&self) {
        for counter in [
            &self.messages,
            &self.fragmented,
            &self.errors,
            &self.error_responses,
            &self.subscribe_responses,
            &self.unsubscribe_responses,
            &self.notifications,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages: self.messages.load(Ordering::Relaxed),
            fragmented: self.fragmented.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            error_responses: self.error_responses.load(Ordering::Relaxed),
            subscribe_responses: self.subscribe_responses.load(Ordering::Relaxed),
            unsubscribe_responses: self.unsubscribe_responses.load(Ordering::Relaxed),
            notifications: self.notifications.load(Ordering::Relaxed),
            active_gates: self.active_gates.load(Ordering::Relaxed),
            gates_opened: self.gates_opened.load(Ordering::Relaxed),
            gates_closed: self.gates_closed.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub messages: u64,
    pub fragmented: u64,
    pub errors: u64,
    pub error_responses: u64,
    pub subscribe_responses: u64,
    pub unsubscribe_responses: u64,
    pub notifications: u64,
    pub active_gates: u64,
    pub gates_opened: u64,
    pub gates_closed: u64,
}
