//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the single session: the ordered stroke log, the roster of
//! identified participants, and an outbound channel per live
//! connection. One process, one implicit room; everything is ephemeral.
//!
//! All mutation goes through the `RwLock` write guard, so a clear is
//! atomic and no reader ever observes a half-appended stroke.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::protocol::ServerEvent;

/// Outbound queue depth per connection. Broadcasts use `try_send`, so a
/// client that falls this far behind starts losing frames instead of
/// stalling delivery to everyone else.
pub const CLIENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// STROKE
// =============================================================================

/// One point in canvas-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One continuous pen-down-to-pen-up drawing action.
///
/// Style is fixed at stroke start. `points` is append-only while the
/// stroke is open and frozen once it ends or its owner disconnects —
/// a stroke cut short mid-draw is retained as a finished partial shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_display_name: String,
    pub color: String,
    pub width: f64,
    pub points: Vec<Point>,
}

// =============================================================================
// PARTICIPANT
// =============================================================================

/// An identified connection. Created on the first valid `identify`,
/// destroyed on disconnect; never outlives its connection.
#[derive(Debug, Clone)]
pub struct Participant {
    pub display_name: String,
    pub color: String,
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// The single authoritative whiteboard + roster snapshot.
pub struct SessionState {
    /// Insertion-ordered stroke log since the last clear. Replayed in
    /// order to reconstruct the canvas for a late joiner.
    pub strokes: Vec<Stroke>,
    /// Connection id -> index into `strokes` of that sender's open
    /// stroke. Keeps point appends O(1) instead of scanning history.
    pub open_strokes: HashMap<Uuid, usize>,
    /// Identified participants keyed by connection id.
    pub participants: HashMap<Uuid, Participant>,
    /// Every live connection (identified or not): sender for outgoing
    /// events. Anonymous viewers receive broadcasts too.
    pub clients: HashMap<Uuid, mpsc::Sender<ServerEvent>>,
    /// Monotonic join counter; drives palette color assignment.
    pub joined_total: usize,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            strokes: Vec::new(),
            open_strokes: HashMap::new(),
            participants: HashMap::new(),
            clients: HashMap::new(),
            joined_total: 0,
        }
    }

    /// Consistent point-in-time copy of the stroke log for replay to a
    /// new joiner. In-progress strokes are included with their points
    /// so far. Callers already hold the lock, so the copy can never
    /// catch a stroke half-appended.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Stroke> {
        self.strokes.clone()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State
/// extractor. Clone is required by Axum — the session is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<SessionState>>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self { session: Arc::new(RwLock::new(SessionState::new())) }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// Register a live connection and return its id plus the receiving
    /// end of its outbound queue.
    pub async fn register_client(state: &AppState) -> (Uuid, mpsc::Receiver<ServerEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(CLIENT_CHANNEL_CAPACITY);
        state.session.write().await.clients.insert(conn_id, tx);
        (conn_id, rx)
    }
}
