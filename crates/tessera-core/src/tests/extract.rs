use crate::extract::item_id;
use crate::*;
use serde_json::json;

fn positions(extracted: &ExtractedLayout) -> Vec<(String, Position)> {
    extracted
        .components
        .iter()
        .map(|c| (c.id_str().to_string(), c.position.unwrap()))
        .collect()
}

#[test]
fn missing_description_extracts_nothing() {
    let extracted = extract_layout(None).unwrap();
    assert!(extracted.is_empty());
    assert!(extracted.charts.is_empty());
    assert!(extracted.data.is_empty());
}

#[test]
fn classic_frame_infers_all_four_edges() {
    let description = LayoutDescription::new()
        .row(ItemConfig::new("Title").id("title"))
        .columns([
            LayoutEntry::from(ItemConfig::new("Text").id("y-axis")),
            layered([ItemConfig::new("Bars").id("bars")]),
            LayoutEntry::from(ItemConfig::new("Text").id("y2-axis")),
        ])
        .row(ItemConfig::new("Text").id("x-axis"));

    let extracted = extract_layout(Some(&description)).unwrap();

    assert_eq!(
        positions(&extracted),
        vec![
            ("title".to_string(), Position::Top),
            ("y-axis".to_string(), Position::Left),
            ("y2-axis".to_string(), Position::Right),
            ("x-axis".to_string(), Position::Bottom),
        ]
    );
    assert_eq!(extracted.charts.len(), 1);
    assert_eq!(extracted.charts[0].id_str(), "bars");
    assert_eq!(
        extracted.layout[1],
        vec![
            Some(LayoutCell::Item("y-axis".into())),
            Some(LayoutCell::Layered(vec!["bars".into()])),
            Some(LayoutCell::Item("y2-axis".into())),
        ]
    );
}

#[test]
fn multi_column_row_before_charts_splits_left_and_right() {
    let description = LayoutDescription::from_value(&json!([
        [{"type": "Text", "id": "a"}, {"type": "Text", "id": "b"}],
        {"_layered": true, "items": [{"type": "Bars"}]},
        {"type": "Text", "id": "c"}
    ]))
    .unwrap();

    let extracted = extract_layout(Some(&description)).unwrap();
    assert_eq!(
        positions(&extracted),
        vec![
            ("a".to_string(), Position::Left),
            ("b".to_string(), Position::Right),
            ("c".to_string(), Position::Bottom),
        ]
    );
}

#[test]
fn multi_column_row_after_charts_is_right() {
    let description = LayoutDescription::from_value(&json!([
        [{"_layered": true, "items": [{"type": "Bars", "id": "bars"}]}, {"type": "Legend", "id": "legend"}],
        [{"type": "Text", "id": "a"}, {"type": "Text", "id": "b"}]
    ]))
    .unwrap();

    let extracted = extract_layout(Some(&description)).unwrap();
    assert!(
        extracted
            .components
            .iter()
            .all(|c| c.position == Some(Position::Right))
    );
}

#[test]
fn explicit_position_wins() {
    let description = LayoutDescription::new()
        .row(ItemConfig::new("Legend").id("legend").position(Position::Right))
        .row(layered([ItemConfig::new("Bars")]));

    let extracted = extract_layout(Some(&description)).unwrap();
    assert_eq!(extracted.components[0].position, Some(Position::Right));
}

#[test]
fn components_are_ordered_inside_out() {
    let description = LayoutDescription::new()
        .row(ItemConfig::new("Title").id("outer-title"))
        .row(ItemConfig::new("Text").id("inner-title"))
        .row(layered([ItemConfig::new("Bars")]))
        .row(ItemConfig::new("Text").id("inner-axis"))
        .row(ItemConfig::new("Text").id("outer-axis"));

    let extracted = extract_layout(Some(&description)).unwrap();
    let ids: Vec<_> = extracted.components.iter().map(|c| c.id_str()).collect();
    assert_eq!(ids, ["inner-title", "outer-title", "inner-axis", "outer-axis"]);
}

#[test]
fn ids_are_synthesized_from_grid_coordinates() {
    let description = LayoutDescription::from_value(&json!([
        {"type": "Title"},
        [{"type": "Text"}, {"_layered": true, "items": [{"type": "Bars"}, {"type": "Labels"}]}]
    ]))
    .unwrap();

    let extracted = extract_layout(Some(&description)).unwrap();
    let ids: Vec<_> = extracted.items.keys().cloned().collect();
    assert_eq!(ids, ["item-1-1", "item-2-1", "item-2-2-1", "item-2-2-2"]);
    assert_eq!(item_id(0, 1, None), "item-1-2");
}

#[test]
fn holes_keep_column_indices() {
    let description = LayoutDescription::from_value(&json!([
        [null, {"type": "Text"}, {"_layered": true, "items": [{"type": "Bars"}]}]
    ]))
    .unwrap();

    let extracted = extract_layout(Some(&description)).unwrap();
    assert_eq!(extracted.layout[0][0], None);
    assert_eq!(extracted.components[0].id_str(), "item-1-2");
    assert_eq!(extracted.charts[0].id_str(), "item-1-3-1");
}

#[test]
fn literal_data_moves_into_data_tables() {
    let description = LayoutDescription::from_value(&json!([
        {"type": "Title", "id": "title", "data": "Sales"},
        {"_layered": true, "items": [{"type": "Bars", "id": "bars", "data": [[1, 2, 3]]}]}
    ]))
    .unwrap();

    let extracted = extract_layout(Some(&description)).unwrap();
    assert_eq!(extracted.data.component("title"), Some(&json!("Sales")));
    assert_eq!(extracted.data.chart("bars"), Some(&json!([[1, 2, 3]])));
    assert_eq!(extracted.items["bars"].data, None);
    assert_eq!(extracted.charts[0].data, None);
}

#[test]
fn derived_data_stays_on_the_item() {
    let description = LayoutDescription::new()
        .row(ItemConfig::new("Legend").id("legend").derive_data(|d| d["names"].clone()))
        .row(layered([ItemConfig::new("Bars")]));

    let extracted = extract_layout(Some(&description)).unwrap();
    assert!(extracted.data.component("legend").is_none());
    assert!(matches!(
        extracted.components[0].data,
        Some(ItemData::Derived(_))
    ));
}

#[test]
fn duplicate_ids_are_rejected() {
    let description = LayoutDescription::new()
        .row(ItemConfig::new("Text").id("same"))
        .row(ItemConfig::new("Text").id("same"));

    let err = extract_layout(Some(&description)).unwrap_err();
    assert!(matches!(err, Error::MalformedLayout { .. }), "{err}");
}

#[test]
fn extraction_is_deterministic() {
    let description = LayoutDescription::from_value(&json!([
        {"type": "Title"},
        [{"type": "Text"}, {"_layered": true, "items": [{"type": "Bars"}]}, {"type": "Legend"}],
        {"type": "Text"}
    ]))
    .unwrap();

    let first = extract_layout(Some(&description)).unwrap();
    let second = extract_layout(Some(&description)).unwrap();
    assert_eq!(first, second);
}
