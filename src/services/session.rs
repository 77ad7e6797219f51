//! Session service — stroke log, roster, and palette assignment.
//!
//! DESIGN
//! ======
//! Every operation takes the session write lock for its full duration,
//! so mutations are serialized: two point appends never interleave and
//! `clear` is all-or-nothing from any reader's perspective.
//!
//! Point appends go through `open_strokes` (connection id -> index into
//! the stroke log), never a scan of the full history — a busy session
//! accumulates thousands of strokes.
//!
//! ERROR HANDLING
//! ==============
//! Errors here are expected conditions (unidentified sender, stale
//! stroke reference), not faults. The dispatch layer logs and drops
//! them; the protocol has no error channel back to the sender.

use uuid::Uuid;

use crate::protocol::{RosterEntry, now_ms};
use crate::state::{AppState, Participant, Point, Stroke};

/// Fixed color palette, assigned by join order and cycling.
pub const PALETTE: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F", "#BB8FCE", "#85C1E9",
];

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("sender has no identity: {0}")]
    NotIdentified(Uuid),
    #[error("sender has no open stroke: {0}")]
    NoOpenStroke(Uuid),
}

/// A freshly opened stroke, ready to broadcast.
#[derive(Debug, Clone)]
pub struct StrokeStarted {
    pub stroke_id: Uuid,
    pub owner_display_name: String,
    pub color: String,
    pub width: f64,
    pub x: f64,
    pub y: f64,
}

/// A point appended to an open stroke. Carries the stroke's fixed style
/// so receivers can render without a local lookup.
#[derive(Debug, Clone)]
pub struct PointAppended {
    pub stroke_id: Uuid,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub width: f64,
}

/// Result of a canvas clear: attribution for the include-all broadcast.
#[derive(Debug, Clone)]
pub struct Cleared {
    pub by_display_name: String,
    pub timestamp: i64,
}

/// A chat message stamped with the sender's stored identity. Broadcast
/// and discarded — never retained in session state.
#[derive(Debug, Clone)]
pub struct ChatOut {
    pub display_name: String,
    pub color: String,
    pub text: String,
    pub timestamp: i64,
}

/// Point-in-time roster view.
#[derive(Debug, Clone)]
pub struct RosterSnapshot {
    pub count: usize,
    pub participants: Vec<RosterEntry>,
}

// =============================================================================
// ROSTER
// =============================================================================

/// Register an identity for a connection and assign its palette color.
/// Idempotent: a connection that already has an identity keeps it — a
/// repeat `identify` neither reassigns nor duplicates.
pub async fn add_participant(state: &AppState, conn_id: Uuid, display_name: String) -> Participant {
    let mut session = state.session.write().await;
    if let Some(existing) = session.participants.get(&conn_id) {
        return existing.clone();
    }

    let color = PALETTE[session.joined_total % PALETTE.len()].to_string();
    session.joined_total += 1;

    let participant = Participant { display_name, color };
    session.participants.insert(conn_id, participant.clone());
    tracing::info!(%conn_id, name = %participant.display_name, color = %participant.color, "participant joined");
    participant
}

/// Remove a connection's participant record. Any stroke the sender left
/// open is finalized as-is — committed strokes are never rolled back.
pub async fn remove_participant(state: &AppState, conn_id: Uuid) -> Option<Participant> {
    let mut session = state.session.write().await;
    session.open_strokes.remove(&conn_id);
    let participant = session.participants.remove(&conn_id);
    if let Some(p) = &participant {
        tracing::info!(%conn_id, name = %p.display_name, remaining = session.participants.len(), "participant left");
    }
    participant
}

/// Fresh full roster. Always recomputed from current participants,
/// never an incremental diff, so a missed broadcast cannot drift it.
pub async fn roster(state: &AppState) -> RosterSnapshot {
    let session = state.session.read().await;
    let participants: Vec<RosterEntry> = session
        .participants
        .values()
        .map(|p| RosterEntry { display_name: p.display_name.clone(), color: p.color.clone() })
        .collect();
    RosterSnapshot { count: participants.len(), participants }
}

// =============================================================================
// STROKES
// =============================================================================

/// Open a new stroke for a sender. If the sender already has an open
/// stroke (a lost `stroke-end`), the old one is finalized as-is first.
///
/// # Errors
///
/// Returns `NotIdentified` if the sender has no participant record.
pub async fn start_stroke(
    state: &AppState,
    conn_id: Uuid,
    x: f64,
    y: f64,
    color: String,
    width: f64,
) -> Result<StrokeStarted, SessionError> {
    let mut session = state.session.write().await;
    let owner_display_name = session
        .participants
        .get(&conn_id)
        .map(|p| p.display_name.clone())
        .ok_or(SessionError::NotIdentified(conn_id))?;

    let stroke = Stroke {
        id: Uuid::new_v4(),
        owner_id: conn_id,
        owner_display_name: owner_display_name.clone(),
        color: color.clone(),
        width,
        points: vec![Point { x, y }],
    };
    let stroke_id = stroke.id;

    let index = session.strokes.len();
    session.strokes.push(stroke);
    session.open_strokes.insert(conn_id, index);

    Ok(StrokeStarted { stroke_id, owner_display_name, color, width, x, y })
}

/// Append a point to the sender's open stroke.
///
/// # Errors
///
/// Returns `NoOpenStroke` when the sender has no stroke in progress —
/// a stale or duplicate message from the network, dropped upstream.
pub async fn append_point(
    state: &AppState,
    conn_id: Uuid,
    x: f64,
    y: f64,
) -> Result<PointAppended, SessionError> {
    let mut session = state.session.write().await;
    let index = *session
        .open_strokes
        .get(&conn_id)
        .ok_or(SessionError::NoOpenStroke(conn_id))?;

    let stroke = &mut session.strokes[index];
    stroke.points.push(Point { x, y });
    Ok(PointAppended {
        stroke_id: stroke.id,
        x,
        y,
        color: stroke.color.clone(),
        width: stroke.width,
    })
}

/// Finalize the sender's open stroke. Once ended, later points for the
/// same stroke no longer resolve and are dropped as stale.
///
/// # Errors
///
/// Returns `NoOpenStroke` if nothing is in progress for this sender.
pub async fn end_stroke(state: &AppState, conn_id: Uuid) -> Result<Uuid, SessionError> {
    let mut session = state.session.write().await;
    let index = session
        .open_strokes
        .remove(&conn_id)
        .ok_or(SessionError::NoOpenStroke(conn_id))?;
    Ok(session.strokes[index].id)
}

/// Atomically empty the stroke log. In-progress strokes are dropped
/// with it; their owners' later points are stale and ignored.
///
/// # Errors
///
/// Returns `NotIdentified` if the sender has no participant record.
pub async fn clear(state: &AppState, conn_id: Uuid) -> Result<Cleared, SessionError> {
    let mut session = state.session.write().await;
    let by_display_name = session
        .participants
        .get(&conn_id)
        .map(|p| p.display_name.clone())
        .ok_or(SessionError::NotIdentified(conn_id))?;

    let dropped = session.strokes.len();
    session.strokes.clear();
    session.open_strokes.clear();
    tracing::info!(%conn_id, dropped, "canvas cleared");

    Ok(Cleared { by_display_name, timestamp: now_ms() })
}

// =============================================================================
// CHAT
// =============================================================================

/// Stamp a chat message with the sender's stored display name, color,
/// and a canonical timestamp. Client-supplied identity is never used.
///
/// # Errors
///
/// Returns `NotIdentified` if the sender has no display name yet.
pub async fn chat_message(state: &AppState, conn_id: Uuid, text: String) -> Result<ChatOut, SessionError> {
    let session = state.session.read().await;
    let participant = session
        .participants
        .get(&conn_id)
        .ok_or(SessionError::NotIdentified(conn_id))?;

    Ok(ChatOut {
        display_name: participant.display_name.clone(),
        color: participant.color.clone(),
        text,
        timestamp: now_ms(),
    })
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
