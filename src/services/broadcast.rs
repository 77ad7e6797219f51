//! Broadcast service — fan-out over per-connection channels.
//!
//! DESIGN
//! ======
//! Every live connection owns an mpsc queue drained by its socket task.
//! Fan-out is fire-and-forget `try_send`: a full queue means that one
//! client is too slow and loses the frame; delivery to everyone else is
//! never stalled. Which audience an event gets (include-all vs.
//! exclude-sender) is the dispatch layer's decision — this module only
//! executes it via the `exclude` parameter.

use uuid::Uuid;

use crate::protocol::ServerEvent;
use crate::state::AppState;

/// Send an event to every live connection, optionally excluding one
/// (the originator, for exclude-self semantics).
pub async fn broadcast(state: &AppState, event: &ServerEvent, exclude: Option<Uuid>) {
    let session = state.session.read().await;
    for (conn_id, tx) in &session.clients {
        if exclude == Some(*conn_id) {
            continue;
        }
        if tx.try_send(event.clone()).is_err() {
            tracing::warn!(%conn_id, event = event.name(), "client queue full, frame dropped");
        }
    }
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
