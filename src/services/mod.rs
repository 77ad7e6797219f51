//! Domain services used by the websocket route.
//!
//! ARCHITECTURE
//! ============
//! Service modules own session state mutation, validation, and fan-out
//! so the route handler can stay focused on protocol translation and
//! connection lifecycle.

pub mod broadcast;
pub mod session;
pub mod validate;
