//! WebSocket handler — connection lifecycle and event dispatch.
//!
//! DESIGN
//! ======
//! On upgrade, generates a connection ID, registers an outbound queue,
//! replays the canvas history, and enters a `select!` loop:
//! - Incoming client events → decode + dispatch by event kind
//! - Broadcast events from peers → forward to this client
//!
//! Handler functions are pure business logic — they validate, mutate
//! session state, and return an `Outcome`. The dispatch layer owns all
//! outbound traffic and maps each event kind to its audience:
//! stroke events exclude the sender (it already rendered optimistically),
//! clear and chat include everyone (the sender needs the server-stamped
//! attribution and timestamp), join/leave announcements exclude their
//! subject. Invalid input is dropped without acknowledgment.
//!
//! LIFECYCLE
//! =========
//! Connected-Anonymous → Identified → Disconnected.
//! 1. Upgrade → register queue → send `history` (viewing needs no name)
//! 2. First valid `identify` → participant registered → `roster` to all,
//!    `joined` to others. Mutating events before this are dropped.
//! 3. Close → participant removed (open stroke kept as-is) → `roster`
//!    to all, `left` to others. No grace period: a reconnect is a brand
//!    new participant with a fresh color.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::{ClientEvent, ServerEvent, now_ms};
use crate::services;
use crate::state::{AppState, CLIENT_CHANNEL_CAPACITY};

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this
/// to decide who receives what — handlers never send events directly.
enum Outcome {
    /// Broadcast to every connection, including the sender.
    Broadcast(ServerEvent),
    /// Broadcast to every connection except the sender.
    BroadcastExcludeSender(ServerEvent),
    /// One event for everyone plus an announcement the subject skips.
    BroadcastAndAnnounce { all: ServerEvent, others: ServerEvent },
    /// No outbound traffic. Invalid or stale input, dropped silently.
    Silent,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();

    // Per-connection queue for events fanned out by peers.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerEvent>(CLIENT_CHANNEL_CAPACITY);
    attach_client(&state, conn_id, client_tx).await;
    info!(%conn_id, "ws: client connected");

    let mut identified = false;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        process_event(&state, conn_id, &mut identified, &text).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(event) = client_rx.recv() => {
                if send_event(&mut socket, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    disconnect(&state, conn_id, identified).await;
}

/// Register a connection's outbound queue and replay history into it,
/// all under one write guard: no event can commit between the snapshot
/// and this connection joining the broadcast audience, so a stroke is
/// delivered either in `history` or live — never both. Replay precedes
/// identity on purpose: a client may watch the canvas without ever
/// setting a name.
async fn attach_client(state: &AppState, conn_id: Uuid, client_tx: mpsc::Sender<ServerEvent>) {
    let mut session = state.session.write().await;
    let strokes = session.snapshot();
    // The queue is freshly created and empty; this cannot fail.
    let _ = client_tx.try_send(ServerEvent::History { strokes });
    session.clients.insert(conn_id, client_tx);
}

/// Tear down a connection from either lifecycle state. Committed
/// strokes are retained; the participant record and outbound queue go.
async fn disconnect(state: &AppState, conn_id: Uuid, identified: bool) {
    state.session.write().await.clients.remove(&conn_id);
    let participant = services::session::remove_participant(state, conn_id).await;

    // Roster rebroadcast and leave announcement only make sense for a
    // connection that had reached Identified.
    if identified {
        if let Some(participant) = participant {
            let roster = services::session::roster(state).await;
            services::broadcast::broadcast(
                state,
                &ServerEvent::Roster { count: roster.count, participants: roster.participants },
                None,
            )
            .await;
            services::broadcast::broadcast(
                state,
                &ServerEvent::Left {
                    message: format!("{} left", participant.display_name),
                    timestamp: now_ms(),
                },
                Some(conn_id),
            )
            .await;
        }
    }
    info!(%conn_id, "ws: client disconnected");
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Decode one inbound text message, run its handler, apply the outcome.
///
/// Split from the socket loop so tests can drive dispatch end-to-end
/// through registered channels without a live websocket.
async fn process_event(state: &AppState, conn_id: Uuid, identified: &mut bool, text: &str) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            // Malformed input never touches state and never crashes the
            // session; there is no error channel back to the sender.
            warn!(%conn_id, error = %e, "ws: malformed event dropped");
            return;
        }
    };

    let outcome = match event {
        ClientEvent::Identify { display_name } => {
            handle_identify(state, conn_id, identified, &display_name).await
        }
        ClientEvent::StrokeStart { x, y, color, width } => {
            handle_stroke_start(state, conn_id, *identified, x, y, color, width).await
        }
        ClientEvent::StrokePoint { x, y } => {
            handle_stroke_point(state, conn_id, *identified, x, y).await
        }
        ClientEvent::StrokeEnd {} => handle_stroke_end(state, conn_id, *identified).await,
        ClientEvent::Clear {} => handle_clear(state, conn_id, *identified).await,
        ClientEvent::Chat { text } => handle_chat(state, conn_id, *identified, &text).await,
    };

    match outcome {
        Outcome::Broadcast(event) => {
            services::broadcast::broadcast(state, &event, None).await;
        }
        Outcome::BroadcastExcludeSender(event) => {
            services::broadcast::broadcast(state, &event, Some(conn_id)).await;
        }
        Outcome::BroadcastAndAnnounce { all, others } => {
            services::broadcast::broadcast(state, &all, None).await;
            services::broadcast::broadcast(state, &others, Some(conn_id)).await;
        }
        Outcome::Silent => {}
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn handle_identify(
    state: &AppState,
    conn_id: Uuid,
    identified: &mut bool,
    raw_name: &str,
) -> Outcome {
    // Repeat identify is a no-op: the existing identity stands.
    if *identified {
        debug!(%conn_id, "duplicate identify ignored");
        return Outcome::Silent;
    }

    let display_name = match services::validate::display_name(raw_name) {
        Ok(name) => name,
        Err(e) => {
            warn!(%conn_id, error = %e, "identify rejected");
            return Outcome::Silent;
        }
    };

    let participant = services::session::add_participant(state, conn_id, display_name).await;
    *identified = true;

    let roster = services::session::roster(state).await;
    Outcome::BroadcastAndAnnounce {
        all: ServerEvent::Roster { count: roster.count, participants: roster.participants },
        others: ServerEvent::Joined {
            message: format!("{} joined", participant.display_name),
            timestamp: now_ms(),
        },
    }
}

async fn handle_stroke_start(
    state: &AppState,
    conn_id: Uuid,
    identified: bool,
    x: f64,
    y: f64,
    color: String,
    width: f64,
) -> Outcome {
    if !identified {
        debug!(%conn_id, "stroke-start before identify dropped");
        return Outcome::Silent;
    }
    if let Err(e) = services::validate::point(x, y) {
        warn!(%conn_id, error = %e, "stroke-start rejected");
        return Outcome::Silent;
    }
    if let Err(e) = services::validate::stroke_style(&color, width) {
        warn!(%conn_id, error = %e, "stroke-start rejected");
        return Outcome::Silent;
    }

    match services::session::start_stroke(state, conn_id, x, y, color, width).await {
        Ok(started) => Outcome::BroadcastExcludeSender(ServerEvent::StrokeStart {
            stroke_id: started.stroke_id,
            owner_display_name: started.owner_display_name,
            color: started.color,
            width: started.width,
            x: started.x,
            y: started.y,
        }),
        Err(e) => {
            debug!(%conn_id, error = %e, "stroke-start dropped");
            Outcome::Silent
        }
    }
}

async fn handle_stroke_point(
    state: &AppState,
    conn_id: Uuid,
    identified: bool,
    x: f64,
    y: f64,
) -> Outcome {
    if !identified {
        debug!(%conn_id, "stroke-point before identify dropped");
        return Outcome::Silent;
    }
    if let Err(e) = services::validate::point(x, y) {
        warn!(%conn_id, error = %e, "stroke-point rejected");
        return Outcome::Silent;
    }

    match services::session::append_point(state, conn_id, x, y).await {
        Ok(appended) => Outcome::BroadcastExcludeSender(ServerEvent::StrokePoint {
            stroke_id: appended.stroke_id,
            x: appended.x,
            y: appended.y,
            color: appended.color,
            width: appended.width,
        }),
        // Unknown or ended stroke: a stale message, not an error.
        Err(e) => {
            debug!(%conn_id, error = %e, "stroke-point dropped");
            Outcome::Silent
        }
    }
}

async fn handle_stroke_end(state: &AppState, conn_id: Uuid, identified: bool) -> Outcome {
    if !identified {
        debug!(%conn_id, "stroke-end before identify dropped");
        return Outcome::Silent;
    }

    match services::session::end_stroke(state, conn_id).await {
        Ok(stroke_id) => Outcome::BroadcastExcludeSender(ServerEvent::StrokeEnd { stroke_id }),
        Err(e) => {
            debug!(%conn_id, error = %e, "stroke-end dropped");
            Outcome::Silent
        }
    }
}

async fn handle_clear(state: &AppState, conn_id: Uuid, identified: bool) -> Outcome {
    if !identified {
        debug!(%conn_id, "clear before identify dropped");
        return Outcome::Silent;
    }

    match services::session::clear(state, conn_id).await {
        // Everyone gets the clear, sender included: the wipe must land
        // at the same logical instant for all canvases, and the sender
        // wants the server-confirmed attribution echoed back.
        Ok(cleared) => Outcome::Broadcast(ServerEvent::Clear {
            by_display_name: cleared.by_display_name,
            timestamp: cleared.timestamp,
        }),
        Err(e) => {
            debug!(%conn_id, error = %e, "clear dropped");
            Outcome::Silent
        }
    }
}

async fn handle_chat(state: &AppState, conn_id: Uuid, identified: bool, raw_text: &str) -> Outcome {
    if !identified {
        debug!(%conn_id, "chat before identify dropped");
        return Outcome::Silent;
    }

    let text = match services::validate::chat_text(raw_text) {
        Ok(text) => text,
        Err(e) => {
            warn!(%conn_id, error = %e, "chat rejected");
            return Outcome::Silent;
        }
    };

    match services::session::chat_message(state, conn_id, text).await {
        Ok(out) => Outcome::Broadcast(ServerEvent::Chat {
            display_name: out.display_name,
            color: out.color,
            text: out.text,
            timestamp: out.timestamp,
        }),
        Err(e) => {
            debug!(%conn_id, error = %e, "chat dropped");
            Outcome::Silent
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), ()> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize event");
            return Err(());
        }
    };
    // stroke-point is high frequency; keep it out of the log.
    if !matches!(event, ServerEvent::StrokePoint { .. }) {
        debug!(event = event.name(), "ws: send event");
    }
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
