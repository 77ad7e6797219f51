//! Wire protocol — typed events exchanged over the WebSocket.
//!
//! DESIGN
//! ======
//! Every message is a named event with a structured payload, encoded as
//! an adjacently tagged JSON object: `{"event": "stroke-start", "data":
//! {...}}`. Event names are kebab-case, payload fields camelCase.
//!
//! Inbound and outbound directions are separate enums: the server never
//! re-parses its own output, and serde's decode step doubles as the
//! structural half of validation — a payload with the wrong field types
//! simply fails to parse and is dropped upstream.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::Stroke;

// =============================================================================
// TIMESTAMPS
// =============================================================================

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// CLIENT → SERVER
// =============================================================================

/// Events a client may send. Unknown event names and wrong payload
/// types fail deserialization and never reach a handler.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    Identify {
        #[serde(rename = "displayName")]
        display_name: String,
    },
    StrokeStart { x: f64, y: f64, color: String, width: f64 },
    /// Continues the sender's open stroke; the stroke id is implicit.
    StrokePoint { x: f64, y: f64 },
    StrokeEnd {},
    Clear {},
    Chat { text: String },
}

// =============================================================================
// SERVER → CLIENT
// =============================================================================

/// Roster line for one identified participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub display_name: String,
    pub color: String,
}

/// Events the server sends. Identity fields (`displayName`, `color`,
/// timestamps) are always stamped from server-side state, never echoed
/// from a client payload.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Full committed stroke log, sent once on connect.
    History { strokes: Vec<Stroke> },
    /// Full roster, recomputed on every join/leave — never a diff.
    Roster { count: usize, participants: Vec<RosterEntry> },
    #[serde(rename_all = "camelCase")]
    StrokeStart {
        stroke_id: Uuid,
        owner_display_name: String,
        color: String,
        width: f64,
        x: f64,
        y: f64,
    },
    #[serde(rename_all = "camelCase")]
    StrokePoint { stroke_id: Uuid, x: f64, y: f64, color: String, width: f64 },
    #[serde(rename_all = "camelCase")]
    StrokeEnd { stroke_id: Uuid },
    #[serde(rename_all = "camelCase")]
    Clear { by_display_name: String, timestamp: i64 },
    #[serde(rename_all = "camelCase")]
    Chat { display_name: String, color: String, text: String, timestamp: i64 },
    Joined { message: String, timestamp: i64 },
    Left { message: String, timestamp: i64 },
}

impl ServerEvent {
    /// Event name as it appears on the wire. Used for logging only.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::History { .. } => "history",
            Self::Roster { .. } => "roster",
            Self::StrokeStart { .. } => "stroke-start",
            Self::StrokePoint { .. } => "stroke-point",
            Self::StrokeEnd { .. } => "stroke-end",
            Self::Clear { .. } => "clear",
            Self::Chat { .. } => "chat",
            Self::Joined { .. } => "joined",
            Self::Left { .. } => "left",
        }
    }
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
