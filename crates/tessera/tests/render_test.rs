use serde_json::json;
use tessera::render::{HeadlessError, render_html, render_svg};
use tessera::{ComposeConfig, LayoutDescription};

fn layout() -> LayoutDescription {
    LayoutDescription::from_value(&json!([
        {"type": "Title", "text": "Inputs"},
        {"_layered": true, "items": [{"type": "Bars", "data": [1, 2, 3]}]},
        {"type": "Overlay", "id": "tip", "text": "hover"}
    ]))
    .unwrap()
}

#[test]
fn render_svg_serializes_the_canvas() {
    let svg = render_svg(
        layout(),
        json!(null),
        ComposeConfig::default().with_size(400.0, 300.0),
    )
    .unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(">Inputs</text>"));
    assert!(!svg.contains("hover"));
}

#[test]
fn render_html_keeps_overlays() {
    let html = render_html(
        layout(),
        json!(null),
        ComposeConfig::default().with_size(400.0, 300.0),
    )
    .unwrap();
    assert!(html.starts_with("<div"));
    assert!(html.contains("hover"));
}

#[test]
fn unknown_types_surface_as_render_errors() {
    let layout = LayoutDescription::from_value(&json!([{"type": "Pie"}])).unwrap();
    let err = render_svg(layout, json!(null), ComposeConfig::default()).unwrap_err();
    assert!(matches!(err, HeadlessError::Render(_)));
}
