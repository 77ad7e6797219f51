use super::*;

#[test]
fn display_name_trims_and_accepts() {
    assert_eq!(display_name("  Ana  ").unwrap(), "Ana");
}

#[test]
fn display_name_rejects_whitespace_only() {
    assert_eq!(display_name("   "), Err(ValidationError::EmptyDisplayName));
    assert_eq!(display_name(""), Err(ValidationError::EmptyDisplayName));
}

#[test]
fn display_name_length_cap() {
    let at_cap = "a".repeat(MAX_DISPLAY_NAME_LEN);
    assert!(display_name(&at_cap).is_ok());

    let over_cap = "a".repeat(MAX_DISPLAY_NAME_LEN + 1);
    assert_eq!(display_name(&over_cap), Err(ValidationError::DisplayNameTooLong));
}

#[test]
fn chat_text_trims_and_accepts() {
    assert_eq!(chat_text("  hello board  ").unwrap(), "hello board");
}

#[test]
fn chat_text_rejects_empty_after_trim() {
    assert_eq!(chat_text("   \t  "), Err(ValidationError::EmptyChatText));
}

#[test]
fn chat_text_length_boundary() {
    let at_cap = "x".repeat(MAX_CHAT_LEN);
    assert!(chat_text(&at_cap).is_ok());

    let over_cap = "x".repeat(MAX_CHAT_LEN + 1);
    assert_eq!(chat_text(&over_cap), Err(ValidationError::ChatTextTooLong));
}

#[test]
fn point_accepts_finite_coordinates() {
    assert!(point(0.0, 0.0).is_ok());
    assert!(point(-12.5, 99999.0).is_ok());
}

#[test]
fn point_rejects_non_finite() {
    assert_eq!(point(f64::INFINITY, 0.0), Err(ValidationError::NonFiniteCoordinate));
    assert_eq!(point(0.0, f64::NAN), Err(ValidationError::NonFiniteCoordinate));
}

#[test]
fn stroke_style_width_bounds() {
    assert!(stroke_style("#000", 0.0).is_ok());
    assert!(stroke_style("#000", 12.5).is_ok());
    assert!(matches!(stroke_style("#000", -1.0), Err(ValidationError::InvalidWidth(_))));
    assert!(matches!(stroke_style("#000", f64::NAN), Err(ValidationError::InvalidWidth(_))));
}

#[test]
fn stroke_style_accepts_hex_and_names() {
    assert!(stroke_style("#000", 1.0).is_ok());
    assert!(stroke_style("#00AAff", 1.0).is_ok());
    assert!(stroke_style("red", 1.0).is_ok());
    assert!(stroke_style("CornflowerBlue", 1.0).is_ok());
}

#[test]
fn stroke_style_rejects_garbage_colors() {
    assert!(matches!(stroke_style("", 1.0), Err(ValidationError::InvalidColor(_))));
    assert!(matches!(stroke_style("#00", 1.0), Err(ValidationError::InvalidColor(_))));
    assert!(matches!(stroke_style("#GGG", 1.0), Err(ValidationError::InvalidColor(_))));
    assert!(matches!(
        stroke_style("url(javascript:alert(1))", 1.0),
        Err(ValidationError::InvalidColor(_))
    ));
}
