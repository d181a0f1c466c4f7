//! Per-gate request worker.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::gate::handle::Gate;
use crate::message::InboundMessage;
use crate::scheduler::Scheduler;

/// Hands the gate's requests to the scheduler one at a time, in arrival
/// order, until the gate starts closing.
pub async fn run(
    gate: Arc<Gate>,
    mut requests: mpsc::Receiver<InboundMessage>,
    scheduler: Arc<Scheduler>,
) {
    let cancel = gate.cancellation();
    loop {
        let msg = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            msg = requests.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };
        scheduler.process(gate.id, msg).await;
    }
    debug!(gid = %gate.id, "Gate worker stopped");
}
