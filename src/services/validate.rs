//! Validation service — semantic checks on inbound event payloads.
//!
//! DESIGN
//! ======
//! Structural validation (field presence, types, unknown event names)
//! already happened when serde decoded the event; anything that reaches
//! this module is well-typed. These checks cover what the type system
//! can't: emptiness after trimming, length bounds, finite coordinates,
//! plausible colors.
//!
//! A failed check means the event is dropped before it touches session
//! state or gets broadcast. There is no error acknowledgment back to
//! the sender — the protocol is best-effort, not transactional.

/// Longest accepted chat message, after trimming.
pub const MAX_CHAT_LEN: usize = 500;

/// Longest accepted display name, after trimming.
pub const MAX_DISPLAY_NAME_LEN: usize = 64;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("display name empty after trimming")]
    EmptyDisplayName,
    #[error("display name exceeds {MAX_DISPLAY_NAME_LEN} chars")]
    DisplayNameTooLong,
    #[error("chat text empty after trimming")]
    EmptyChatText,
    #[error("chat text exceeds {MAX_CHAT_LEN} chars")]
    ChatTextTooLong,
    #[error("coordinate is not finite")]
    NonFiniteCoordinate,
    #[error("stroke width out of range: {0}")]
    InvalidWidth(f64),
    #[error("unrecognized color: {0:?}")]
    InvalidColor(String),
}

// =============================================================================
// IDENTITY
// =============================================================================

/// Validate and normalize a display name: trimmed, non-empty, bounded.
///
/// # Errors
///
/// Rejects names that are empty after trimming or too long.
pub fn display_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyDisplayName);
    }
    if trimmed.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ValidationError::DisplayNameTooLong);
    }
    Ok(trimmed.to_string())
}

// =============================================================================
// CHAT
// =============================================================================

/// Validate and normalize chat text: trimmed, length in (0, 500].
///
/// # Errors
///
/// Rejects text that is empty after trimming or over the cap.
pub fn chat_text(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyChatText);
    }
    if trimmed.chars().count() > MAX_CHAT_LEN {
        return Err(ValidationError::ChatTextTooLong);
    }
    Ok(trimmed.to_string())
}

// =============================================================================
// STROKES
// =============================================================================

/// Validate a canvas-local coordinate pair.
///
/// # Errors
///
/// Rejects non-finite values. JSON can't encode NaN, but an oversized
/// literal parses to infinity and would poison every client's canvas.
pub fn point(x: f64, y: f64) -> Result<(), ValidationError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFiniteCoordinate)
    }
}

/// Validate stroke style: a recognizable color and a sane width.
///
/// # Errors
///
/// Rejects widths that are negative or non-finite, and colors that are
/// neither hex (`#RGB` / `#RRGGBB`) nor an alphabetic CSS name.
pub fn stroke_style(color: &str, width: f64) -> Result<(), ValidationError> {
    if !width.is_finite() || width < 0.0 {
        return Err(ValidationError::InvalidWidth(width));
    }
    if !is_css_color(color) {
        return Err(ValidationError::InvalidColor(color.to_string()));
    }
    Ok(())
}

/// Hex color (`#RGB` or `#RRGGBB`) or a plain alphabetic name like
/// `crimson`. Names are not checked against the CSS keyword list; the
/// goal is keeping markup and control characters off the wire, not
/// color correctness.
fn is_css_color(color: &str) -> bool {
    if let Some(hex) = color.strip_prefix('#') {
        return matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    !color.is_empty() && color.len() <= 32 && color.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
