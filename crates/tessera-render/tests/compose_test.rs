use serde_json::{Value, json};
use tessera_core::{
    ComposeConfig, Error as CoreError, ItemConfig, LayoutDescription, Position, layered,
};
use tessera_render::builtins::overlay::OverlayPosition;
use tessera_render::item::ComponentState;
use tessera_render::svg::Scene;
use tessera_render::{
    Compose, Error, Item, ItemType, LayerKind, LayoutSource, LifecycleEvent, PointerEvent,
    Positioned, RenderContext, Surface, TypeRegistry,
};

fn description(value: Value) -> LayoutDescription {
    LayoutDescription::from_value(&value).unwrap()
}

fn compose(layout: Value) -> Compose {
    Compose::new(description(layout)).with_config(
        ComposeConfig::default()
            .with_size(400.0, 300.0)
            .with_responsive(false),
    )
}

fn transform_of(compose: &Compose, id: &str) -> String {
    let slot = compose
        .components()
        .get(id)
        .or_else(|| compose.charts().get(id))
        .unwrap();
    compose
        .surface()
        .attr(slot.layer, "transform")
        .unwrap_or_default()
        .to_string()
}

#[test]
fn top_title_shrinks_the_plot_area() {
    let mut compose = compose(json!([
        {"type": "Title", "id": "title", "text": "Inputs", "height": 24, "margins": 8},
        {"_layered": true, "items": [{"type": "Bars", "id": "bars", "data": [1, 2, 3]}]}
    ]));
    compose.draw(Value::Null).unwrap();

    let chart = compose.chart_position();
    assert_eq!(chart.top, 50.0);
    assert_eq!(chart.left, 10.0);
    assert_eq!(chart.width, 380.0);
    assert_eq!(chart.height, 240.0);

    assert_eq!(transform_of(&compose, "bars"), "translate(10, 50)");
    assert_eq!(transform_of(&compose, "title"), "translate(18, 18)");
}

#[test]
fn top_components_stack_outwards_from_the_plot() {
    let mut compose = compose(json!([
        {"type": "Text", "id": "a", "text": "outer", "height": 20},
        {"type": "Text", "id": "b", "text": "inner", "height": 30},
        {"_layered": true, "items": [{"type": "Bars", "id": "bars"}]}
    ]));
    compose.draw(Value::Null).unwrap();

    assert_eq!(compose.chart_position().top, 60.0);
    let top: Vec<_> = compose
        .layout_result()
        .top
        .iter()
        .map(|p| (p.id.as_str(), p.offset))
        .collect();
    assert_eq!(top, vec![("b", 30.0), ("a", 20.0)]);
    assert_eq!(transform_of(&compose, "b"), "translate(10, 30)");
    assert_eq!(transform_of(&compose, "a"), "translate(10, 10)");
}

#[test]
fn redrawing_the_same_data_is_idempotent() {
    let mut compose = compose(json!([
        {"type": "Title", "id": "title", "text": "Inputs"},
        [
            {"type": "Legend", "id": "legend", "data": ["a", "b"]},
            {"_layered": true, "items": [{"type": "Bars", "id": "bars", "data": [[1, 2], [3, 4]]}]}
        ]
    ]));
    compose.draw(Value::Null).unwrap();
    let first_svg = compose.to_svg();
    let first_position = compose.chart_position();
    let instances: Vec<_> = ["title", "legend", "bars"]
        .iter()
        .map(|id| compose.instance_of(id).unwrap())
        .collect();
    compose.drain_events();

    compose.redraw().unwrap();
    assert_eq!(compose.to_svg(), first_svg);
    assert_eq!(compose.chart_position(), first_position);
    for (id, instance) in ["title", "legend", "bars"].iter().zip(instances) {
        assert_eq!(compose.instance_of(id), Some(instance));
    }
    assert!(compose.drain_events().is_empty());
}

#[test]
fn changing_the_type_recreates_the_item() {
    let mut compose = compose(json!([{"type": "Text", "id": "x", "text": "hello"}]));
    compose.draw(Value::Null).unwrap();
    let before = compose.instance_of("x").unwrap();
    let old_layer = compose.components().get("x").unwrap().layer;
    compose.drain_events();

    compose.set_layout(description(json!([{"type": "Legend", "id": "x", "data": ["a"]}])));
    compose.draw(Value::Null).unwrap();

    let after = compose.instance_of("x").unwrap();
    assert_ne!(before, after);
    assert!(!compose.surface().is_attached(old_layer));
    assert_eq!(
        compose.drain_events(),
        vec![
            LifecycleEvent::Detached {
                id: "x".to_string(),
                instance: before,
            },
            LifecycleEvent::Attached {
                id: "x".to_string(),
                instance: after,
                kind: tessera_render::LayerKind::Component,
            },
        ]
    );
}

#[test]
fn options_change_updates_in_place() {
    let mut compose = compose(json!([{"type": "Text", "id": "x", "text": "hello"}]));
    compose.draw(Value::Null).unwrap();
    let before = compose.instance_of("x").unwrap();

    compose.set_layout(description(json!([{"type": "Text", "id": "x", "text": "world"}])));
    compose.draw(Value::Null).unwrap();

    assert_eq!(compose.instance_of("x"), Some(before));
    assert!(compose.to_svg().contains(">world</text>"));
}

#[test]
fn removed_items_lose_their_fragment() {
    let mut compose = compose(json!([
        {"type": "Text", "id": "keep", "text": "keep"},
        {"type": "Text", "id": "drop", "text": "drop"}
    ]));
    compose.draw(Value::Null).unwrap();
    let dropped = compose.components().get("drop").unwrap().layer;

    compose.set_layout(description(json!([{"type": "Text", "id": "keep", "text": "keep"}])));
    compose.draw(Value::Null).unwrap();

    assert_eq!(compose.components().ids().collect::<Vec<_>>(), vec!["keep"]);
    assert!(!compose.surface().is_attached(dropped));
    assert!(!compose.to_svg().contains(">drop</text>"));
}

#[test]
fn configuration_errors_leave_the_composition_untouched() {
    let mut compose = compose(json!([{"type": "Text", "id": "x", "text": "hello"}]));
    compose.draw(Value::Null).unwrap();
    let svg = compose.to_svg();
    let instance = compose.instance_of("x");

    compose.set_layout(description(json!([
        {"type": "Text", "id": "x", "text": "changed"},
        {"type": "Pie", "id": "pie"}
    ])));
    let err = compose.draw(Value::Null).unwrap_err();
    assert!(err.to_string().contains("Pie"));
    assert_eq!(compose.to_svg(), svg);
    assert_eq!(compose.instance_of("x"), instance);
    assert!(compose.instance_of("pie").is_none());

    compose.set_layout(description(json!([
        {"type": "Text", "id": "x", "textAlign": "justify"}
    ])));
    assert!(compose.draw(Value::Null).is_err());
    assert_eq!(compose.to_svg(), svg);
}

#[test]
fn demux_prefers_slices_then_derivations_then_the_original() {
    let layout = LayoutDescription::new()
        .row(ItemConfig::new("Text").id("title").data(json!("From config")))
        .row(layered([
            ItemConfig::new("Bars").id("literal").data(json!([1, 2])),
            ItemConfig::new("Bars")
                .id("derived")
                .derive_data(|data| data["values"].clone()),
            ItemConfig::new("Bars").id("plain"),
        ]));
    let mut compose = Compose::new(layout)
        .with_config(ComposeConfig::default().with_size(400.0, 300.0));
    let original = json!({"values": [3, 4, 5]});
    compose.draw(original.clone()).unwrap();

    let data = compose.draw_data().clone();
    assert_eq!(compose.demux("title", &data), json!("From config"));
    assert_eq!(compose.demux("literal", &data), json!([1, 2]));
    assert_eq!(compose.demux("derived", &data), json!([3, 4, 5]));
    assert_eq!(compose.demux("plain", &data), original);
    assert_eq!(compose.demux("unknown", &data), original);
}

#[test]
fn layout_functions_see_the_draw_data() {
    let source = LayoutSource::json(|data| {
        json!([
            {"type": "Title", "id": "title", "text": data["title"].clone()},
            {"_layered": true, "items": [{"type": "Bars", "id": "bars"}]}
        ])
    });
    let mut compose = Compose::new(source)
        .with_config(ComposeConfig::default().with_size(400.0, 300.0));
    compose.draw(json!({"title": "Quarterly"})).unwrap();
    assert!(compose.to_svg().contains(">Quarterly</text>"));
    assert_eq!(compose.raw_data(), Some(&json!({"title": "Quarterly"})));
}

#[test]
fn fragments_follow_z_index() {
    let mut compose = compose(json!([
        {"type": "Title", "id": "title", "text": "Inputs"},
        {"_layered": true, "items": [{"type": "Bars", "id": "bars", "data": [1]}]}
    ]));
    compose.draw(Value::Null).unwrap();

    let title = compose.components().get("title").unwrap().layer;
    let bars = compose.charts().get("bars").unwrap().layer;
    let root = compose.surface().svg_root();
    assert_eq!(compose.surface().children(root), &[title, bars]);
}

#[test]
fn overlays_move_and_toggle() {
    let mut compose = compose(json!([
        {"type": "Overlay", "id": "tip", "text": "tooltip"},
        {"_layered": true, "items": [{"type": "Bars", "id": "bars"}]}
    ]));
    compose.draw(Value::Null).unwrap();

    let layer = compose.components().get("tip").unwrap().layer;
    let style = |compose: &Compose| {
        compose
            .surface()
            .attr(layer, "style")
            .unwrap_or_default()
            .to_string()
    };
    assert!(style(&compose).ends_with("display: none;"));

    assert!(compose.position_overlay("tip", OverlayPosition::Chart { x: 5.0, y: 5.0 }));
    assert!(compose.show_overlay("tip"));
    let shown = style(&compose);
    assert!(shown.contains("transform: translate(15px, 15px)"));
    assert!(!shown.contains("display: none"));

    assert!(compose.hide_overlay("tip"));
    assert!(style(&compose).ends_with("display: none;"));
    assert!(!compose.show_overlay("bars"));
    assert!(compose.to_html().contains("tooltip"));
}

#[test]
fn overlays_need_an_html_container() {
    let layout = description(json!([{"type": "Overlay", "id": "tip"}]));
    let mut compose = Compose::with_surface(
        Scene::without_container(),
        TypeRegistry::with_builtins(),
        layout,
    )
    .with_config(ComposeConfig::default().with_size(400.0, 300.0));

    assert!(compose.draw(Value::Null).is_err());
    assert!(compose.components().is_empty());
    assert!(compose.drain_events().is_empty());
}

#[test]
fn pointer_events_translate_and_clamp() {
    let layout = description(json!([
        {"_layered": true, "items": [{"type": "Bars", "id": "bars"}]}
    ]));
    let mut compose = Compose::with_surface(
        Scene::new().with_client_origin(100.0, 100.0),
        TypeRegistry::with_builtins(),
        layout,
    )
    .with_config(
        ComposeConfig::default()
            .with_size(400.0, 300.0)
            .with_responsive(false),
    );
    compose.draw(Value::Null).unwrap();

    let Some(PointerEvent::Enter(coords)) = compose.pointer_enter(105.0, 105.0) else {
        panic!("expected an enter event");
    };
    assert_eq!((coords.container.x, coords.container.y), (5.0, 5.0));
    assert_eq!((coords.chart.x, coords.chart.y), (0.0, 0.0));

    let Some(PointerEvent::Move(coords)) = compose.pointer_move(300.0, 200.0) else {
        panic!("expected a move event");
    };
    assert_eq!((coords.chart.x, coords.chart.y), (190.0, 90.0));

    assert_eq!(compose.pointer_move(600.0, 600.0), Some(PointerEvent::Leave));
    assert_eq!(compose.pointer_move(650.0, 650.0), None);
    assert_eq!(compose.pointer_leave(), None);
}

#[test]
fn clear_detaches_everything() {
    let mut compose = compose(json!([
        {"type": "Text", "id": "x", "text": "hello"},
        {"_layered": true, "items": [{"type": "Bars", "id": "bars"}]}
    ]));
    compose.draw(Value::Null).unwrap();
    compose.drain_events();

    compose.clear();
    assert!(compose.charts().is_empty());
    assert!(compose.components().is_empty());
    assert!(compose.raw_data().is_none());
    let detached = compose
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, LifecycleEvent::Detached { .. }))
        .count();
    assert_eq!(detached, 2);
    compose.redraw().unwrap();
    assert!(compose.charts().is_empty());
}

/// A chart whose options freeze once it is attached.
struct Frozen {
    attached: bool,
}

impl Item for Frozen {
    fn configure(&mut self, config: &ItemConfig) -> tessera_render::Result<()> {
        if self.attached || config.options.get("reject").is_some() {
            return Err(
                CoreError::invalid_option(config.id_str(), "reject", "options are frozen").into(),
            );
        }
        Ok(())
    }

    fn render(
        &mut self,
        _ctx: &mut RenderContext<'_>,
        _data: &Value,
    ) -> tessera_render::Result<()> {
        Ok(())
    }

    fn on_attach(&mut self, _id: &str) {
        self.attached = true;
    }
}

fn create_frozen(_config: &ItemConfig) -> tessera_render::Result<Box<dyn Item>> {
    Ok(Box::new(Frozen { attached: false }))
}

fn types_with_frozen() -> TypeRegistry {
    let mut types = TypeRegistry::with_builtins();
    types.insert(ItemType::new("Frozen", LayerKind::Chart, create_frozen));
    types
}

#[test]
fn failed_reconfigure_keeps_the_previous_items() {
    let layout = LayoutSource::json(|data| {
        let mut items = vec![
            json!({"type": "Bars", "id": "a", "data": [1, 2]}),
            json!({"type": "Frozen", "id": "p"}),
        ];
        if data["extra"] == true {
            items.push(json!({"type": "Bars", "id": "c"}));
        }
        json!([{"_layered": true, "items": items}])
    });
    let mut compose = Compose::with_surface(Scene::new(), types_with_frozen(), layout)
        .with_config(ComposeConfig::default().with_size(400.0, 300.0));
    compose.draw(json!({"extra": false})).unwrap();
    compose.drain_events();

    let instances = (compose.instance_of("a"), compose.instance_of("p"));
    let root = compose.surface().svg_root();
    let layers = compose.surface().children(root).len();
    let nodes = compose.surface().node_count();

    let err = compose.draw(json!({"extra": true})).unwrap_err();
    assert!(
        matches!(err, Error::Core(CoreError::InvalidOption { .. })),
        "{err:?}"
    );

    assert_eq!(compose.charts().ids().collect::<Vec<_>>(), ["a", "p"]);
    assert_eq!((compose.instance_of("a"), compose.instance_of("p")), instances);
    let bars = compose.charts().get("a").unwrap().layer;
    assert!(compose.surface().is_attached(bars));
    assert!(compose.drain_events().is_empty());
    assert_eq!(compose.surface().children(root).len(), layers);
    assert_eq!(compose.surface().node_count(), nodes);
    assert_eq!(compose.raw_data(), Some(&json!({"extra": false})));
}

#[test]
fn rejected_options_abort_before_anything_is_attached() {
    let layout = description(json!([
        {"_layered": true, "items": [
            {"type": "Bars", "id": "a"},
            {"type": "Frozen", "id": "p", "reject": true}
        ]}
    ]));
    let mut compose = Compose::with_surface(Scene::new(), types_with_frozen(), layout)
        .with_config(ComposeConfig::default().with_size(400.0, 300.0));

    assert!(compose.draw(Value::Null).is_err());
    assert!(compose.charts().is_empty());
    assert!(compose.drain_events().is_empty());
    let root = compose.surface().svg_root();
    assert!(compose.surface().children(root).is_empty());
}

/// A component that renders into a hidden layer, so it can never be measured.
struct Hidden {
    state: ComponentState,
}

impl Item for Hidden {
    fn configure(&mut self, config: &ItemConfig) -> tessera_render::Result<()> {
        self.state.configure(config)
    }

    fn render(
        &mut self,
        ctx: &mut RenderContext<'_>,
        _data: &Value,
    ) -> tessera_render::Result<()> {
        ctx.surface.clear_children(ctx.layer);
        let rect = ctx.surface.append_child(ctx.layer, "rect");
        ctx.surface.set_attr(rect, "width", "100");
        ctx.surface.set_attr(rect, "height", "40");
        ctx.surface.set_attr(ctx.layer, "display", "none");
        Ok(())
    }

    fn positioned(&self) -> Option<&dyn Positioned> {
        Some(self)
    }

    fn positioned_mut(&mut self) -> Option<&mut dyn Positioned> {
        Some(self)
    }
}

impl Positioned for Hidden {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }
}

fn create_hidden(config: &ItemConfig) -> tessera_render::Result<Box<dyn Item>> {
    Ok(Box::new(Hidden {
        state: ComponentState::from_config(config)?,
    }))
}

#[test]
fn unmeasurable_component_contributes_no_offset() {
    let mut types = TypeRegistry::with_builtins();
    types.insert(ItemType::new("Hidden", LayerKind::Component, create_hidden));
    let layout = description(json!([
        {"type": "Hidden", "id": "hidden"},
        {"_layered": true, "items": [{"type": "Bars", "id": "bars", "data": [1, 2]}]}
    ]));
    let mut compose = Compose::with_surface(Scene::new(), types, layout).with_config(
        ComposeConfig::default()
            .with_size(400.0, 300.0)
            .with_responsive(false),
    );
    compose.draw(Value::Null).unwrap();

    let top = compose.layout_result().edge(Position::Top);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].id, "hidden");
    assert_eq!(top[0].offset, 0.0);

    let chart = compose.chart_position();
    assert_eq!((chart.top, chart.height), (10.0, 280.0));
    assert_eq!(transform_of(&compose, "bars"), "translate(10, 10)");
}

#[test]
fn explicit_size_wins_over_the_container() {
    let layout = description(json!([
        {"_layered": true, "items": [{"type": "Bars", "id": "bars"}]}
    ]));
    let mut compose = Compose::with_surface(
        Scene::new().with_container_size(800.0, 600.0),
        TypeRegistry::with_builtins(),
        layout,
    )
    .with_config(
        ComposeConfig::default()
            .with_size(400.0, 300.0)
            .with_responsive(false),
    );
    compose.draw(Value::Null).unwrap();
    assert_eq!(compose.canvas_size(), (400.0, 300.0));
    let root = compose.surface().svg_root();
    assert_eq!(compose.surface().attr(root, "width"), Some("400"));

    compose.set_config(ComposeConfig::default().with_responsive(false));
    compose.redraw().unwrap();
    assert_eq!(compose.canvas_size(), (800.0, 600.0));
    assert_eq!(compose.chart_position().width, 780.0);
}

#[test]
fn resized_container_updates_pointer_bounds_on_redraw() {
    let layout = description(json!([
        {"_layered": true, "items": [{"type": "Bars", "id": "bars"}]}
    ]));
    let mut compose = Compose::with_surface(
        Scene::new().with_container_size(800.0, 600.0),
        TypeRegistry::with_builtins(),
        layout,
    )
    .with_config(ComposeConfig::default().with_responsive(false));
    compose.draw(Value::Null).unwrap();

    assert!(matches!(
        compose.pointer_enter(600.0, 300.0),
        Some(PointerEvent::Enter(c)) if c.chart.x == 590.0
    ));
    assert!(matches!(
        compose.pointer_move(395.0, 100.0),
        Some(PointerEvent::Move(c)) if c.chart.x == 385.0
    ));

    compose.surface_mut().resize_container(400.0, 300.0);
    // Cached until the next draw.
    assert!(matches!(
        compose.pointer_move(395.0, 100.0),
        Some(PointerEvent::Move(c)) if c.chart.x == 385.0
    ));

    compose.redraw().unwrap();
    assert_eq!(compose.canvas_size(), (400.0, 300.0));
    assert!(matches!(
        compose.pointer_move(395.0, 100.0),
        Some(PointerEvent::Move(c)) if c.chart.x == 380.0
    ));
    assert_eq!(compose.pointer_move(500.0, 100.0), Some(PointerEvent::Leave));
}

#[test]
fn redraws_do_not_grow_the_scene() {
    let mut compose = compose(json!([
        {"type": "Title", "id": "title", "text": "Inputs"},
        {"_layered": true, "items": [{"type": "Bars", "id": "bars", "data": [1, 2, 3]}]}
    ]));
    compose.draw(Value::Null).unwrap();
    let nodes = compose.surface().node_count();
    for _ in 0..50 {
        compose.redraw().unwrap();
    }
    assert_eq!(compose.surface().node_count(), nodes);
}
