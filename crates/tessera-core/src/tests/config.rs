use crate::config::{ComposeConfig, DEFAULT_COMPOSE_MARGINS};
use crate::geom::Margins;
use serde_json::json;

#[test]
fn defaults_use_ten_pixel_margins_and_responsive_output() {
    let config = ComposeConfig::default();
    assert_eq!(config.margins, DEFAULT_COMPOSE_MARGINS);
    assert!(config.responsive);
    assert_eq!(config.width, None);
    assert_eq!(config.view_box(), None);
}

#[test]
fn overrides_merge_onto_defaults() {
    let config = ComposeConfig::from_value(&json!({
        "width": 600,
        "height": 400,
        "margins": {"top": 20}
    }))
    .unwrap();
    assert_eq!(config.width, Some(600.0));
    assert_eq!(
        config.margins,
        Margins {
            top: 20.0,
            right: 10.0,
            bottom: 10.0,
            left: 10.0,
        }
    );
    assert_eq!(config.view_box().as_deref(), Some("0 0 600 400"));
    assert_eq!(config.preserve_aspect_ratio(), Some("xMidYMid meet"));
}

#[test]
fn numeric_margins_apply_to_all_sides() {
    let config = ComposeConfig::from_value(&json!({"margins": 0, "responsive": false})).unwrap();
    assert_eq!(config.margins, Margins::ZERO);
    assert_eq!(config.preserve_aspect_ratio(), None);
}
