//! The live gate table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use broker_core::types::GateId;

use crate::gate::Gate;
use crate::message::OutboundMessage;
use crate::scheduler::{Delivery, GateDispatcher};

/// Live gates keyed by ID.
///
/// Open, close and dispatch all go through the same mutex, so a message is
/// never routed to a gate that is already being torn down. Nothing awaits
/// while the lock is held.
#[derive(Debug, Default)]
pub struct GateRegistry {
    gates: Mutex<HashMap<GateId, Arc<Gate>>>,
}

impl GateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<GateId, Arc<Gate>>> {
        self.gates.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, gate: Arc<Gate>) {
        self.table().insert(gate.id, gate);
    }

    pub fn get(&self, gid: GateId) -> Option<Arc<Gate>> {
        self.table().get(&gid).cloned()
    }

    /// Runs `f` against a live gate while holding the table lock.
    pub fn with_gate<R>(&self, gid: GateId, f: impl FnOnce(&Gate) -> R) -> Option<R> {
        let table = self.table();
        table.get(&gid).map(|gate| f(gate))
    }

    /// Removes a gate and moves it to CLOSING in one step.
    pub fn remove(&self, gid: GateId) -> Option<Arc<Gate>> {
        let mut table = self.table();
        let gate = table.remove(&gid)?;
        gate.begin_close();
        Some(gate)
    }

    /// Removes every gate, each moved to CLOSING.
    pub fn drain(&self) -> Vec<Arc<Gate>> {
        let mut table = self.table();
        table
            .drain()
            .map(|(_, gate)| {
                gate.begin_close();
                gate
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }
}

impl GateDispatcher for GateRegistry {
    fn dispatch(&self, gid: GateId, msg: OutboundMessage) -> Delivery {
        self.with_gate(gid, |gate| gate.send(msg))
            .unwrap_or(Delivery::GateClosed)
    }

    fn is_open(&self, gid: GateId) -> bool {
        self.with_gate(gid, Gate::is_open).unwrap_or(false)
    }
}
