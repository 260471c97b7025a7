//! The Composition Controller: one draw cycle from raw data to placed, rendered items.

use crate::builtins::overlay::OverlayPosition;
use crate::item::RenderContext;
use crate::layout::{ChartPosition, LayoutResult, apply_layout, calculate_layout};
use crate::pointer::{PointerEvent, PointerGeometry, PointerTracker};
use crate::pool::{ItemPool, LifecycleEvent};
use crate::registry::{LayerKind, TypeRegistry};
use crate::surface::Surface;
use crate::svg::Scene;
use crate::{Result, draw_timing_enabled};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tessera_core::geom::point;
use tessera_core::{ComposeConfig, ExtractedData, LayoutDescription, extract_layout};

type DescribeFn = Arc<dyn Fn(&Value) -> tessera_core::Result<LayoutDescription> + Send + Sync>;

/// Produces the layout description for a draw.
#[derive(Clone)]
pub enum LayoutSource {
    Static(LayoutDescription),
    Function(DescribeFn),
}

impl LayoutSource {
    pub fn function(
        f: impl Fn(&Value) -> tessera_core::Result<LayoutDescription> + Send + Sync + 'static,
    ) -> Self {
        LayoutSource::Function(Arc::new(f))
    }

    /// A function returning the JSON form of a description.
    pub fn json(f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        Self::function(move |data| LayoutDescription::from_value(&f(data)))
    }

    pub fn describe(&self, data: &Value) -> tessera_core::Result<LayoutDescription> {
        match self {
            LayoutSource::Static(description) => Ok(description.clone()),
            LayoutSource::Function(f) => f(data),
        }
    }
}

impl Default for LayoutSource {
    fn default() -> Self {
        LayoutSource::Static(LayoutDescription::default())
    }
}

impl From<LayoutDescription> for LayoutSource {
    fn from(description: LayoutDescription) -> Self {
        LayoutSource::Static(description)
    }
}

impl fmt::Debug for LayoutSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutSource::Static(d) => f.debug_tuple("Static").field(d).finish(),
            LayoutSource::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// The payload of a draw: the caller's data plus the slices extracted from item configs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawData {
    pub original: Value,
    pub config: ExtractedData,
}

pub struct Compose<S: Surface = Scene> {
    config: ComposeConfig,
    types: TypeRegistry,
    surface: S,
    layout: LayoutSource,
    charts: ItemPool,
    components: ItemPool,
    chart_position: ChartPosition,
    canvas: (f64, f64),
    layout_result: LayoutResult,
    raw_data: Option<Value>,
    draw_data: DrawData,
    events: Vec<LifecycleEvent>,
    next_instance: u64,
    pointer: PointerTracker,
    drawn: bool,
}

impl<S: Surface + fmt::Debug> fmt::Debug for Compose<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compose")
            .field("config", &self.config)
            .field("surface", &self.surface)
            .field("charts", &self.charts)
            .field("components", &self.components)
            .field("chart_position", &self.chart_position)
            .finish_non_exhaustive()
    }
}

impl Compose<Scene> {
    /// An HTML-hosted [`Scene`] with the built-in item types.
    pub fn new(layout: impl Into<LayoutSource>) -> Self {
        Self::with_surface(Scene::new(), TypeRegistry::with_builtins(), layout)
    }

    pub fn to_svg(&self) -> String {
        self.surface.to_svg()
    }

    pub fn to_html(&self) -> String {
        self.surface.to_html()
    }
}

impl<S: Surface> Compose<S> {
    pub fn with_surface(surface: S, types: TypeRegistry, layout: impl Into<LayoutSource>) -> Self {
        Self {
            config: ComposeConfig::default(),
            types,
            surface,
            layout: layout.into(),
            charts: ItemPool::new(),
            components: ItemPool::new(),
            chart_position: ChartPosition::default(),
            canvas: (0.0, 0.0),
            layout_result: LayoutResult::default(),
            raw_data: None,
            draw_data: DrawData::default(),
            events: Vec::new(),
            next_instance: 0,
            pointer: PointerTracker::new(),
            drawn: false,
        }
    }

    pub fn with_config(mut self, config: ComposeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ComposeConfig {
        &self.config
    }

    /// Takes effect on the next draw.
    pub fn set_config(&mut self, config: ComposeConfig) {
        self.config = config;
    }

    pub fn set_layout(&mut self, layout: impl Into<LayoutSource>) {
        self.layout = layout.into();
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn charts(&self) -> &ItemPool {
        &self.charts
    }

    pub fn components(&self) -> &ItemPool {
        &self.components
    }

    /// Instance id of the chart or component `id`, if attached.
    pub fn instance_of(&self, id: &str) -> Option<u64> {
        self.charts
            .get(id)
            .or_else(|| self.components.get(id))
            .map(|slot| slot.instance)
    }

    pub fn chart_position(&self) -> ChartPosition {
        self.chart_position
    }

    pub fn canvas_size(&self) -> (f64, f64) {
        self.canvas
    }

    pub fn layout_result(&self) -> &LayoutResult {
        &self.layout_result
    }

    pub fn raw_data(&self) -> Option<&Value> {
        self.raw_data.as_ref()
    }

    pub fn draw_data(&self) -> &DrawData {
        &self.draw_data
    }

    pub fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Runs a full draw cycle.
    ///
    /// Configuration errors abort before the surface or the pools are touched.
    pub fn draw(&mut self, data: Value) -> Result<()> {
        let timing_enabled = draw_timing_enabled();
        let total_start = timing_enabled.then(std::time::Instant::now);

        let extract_start = timing_enabled.then(std::time::Instant::now);
        let description = self.layout.describe(&data)?;
        let extracted = extract_layout(Some(&description))?;
        let extract = extract_start.map(|s| s.elapsed());

        let reconcile_start = timing_enabled.then(std::time::Instant::now);
        let mut chart_plan = self
            .charts
            .plan(&extracted.charts, &self.types, &self.surface)?;
        let mut component_plan =
            self.components
                .plan(&extracted.components, &self.types, &self.surface)?;
        tracing::debug!(
            charts = extracted.charts.len(),
            components = extracted.components.len(),
            created = chart_plan.created() + component_plan.created(),
            removed = chart_plan.removed() + component_plan.removed(),
            "reconcile"
        );
        self.charts.prepare(&mut chart_plan, &mut self.surface)?;
        if let Err(err) = self
            .components
            .prepare(&mut component_plan, &mut self.surface)
        {
            chart_plan.discard(&mut self.surface);
            return Err(err);
        }
        self.charts.commit(
            chart_plan,
            &mut self.surface,
            &mut self.next_instance,
            &mut self.events,
        );
        self.components.commit(
            component_plan,
            &mut self.surface,
            &mut self.next_instance,
            &mut self.events,
        );
        let reconcile = reconcile_start.map(|s| s.elapsed());

        self.raw_data = Some(data.clone());
        self.draw_data = DrawData {
            original: data,
            config: extracted.data,
        };

        let (width, height) = self.dimensions();
        self.canvas = (width, height);
        self.surface.set_dimensions(width, height, &self.config);

        let layout_start = timing_enabled.then(std::time::Instant::now);
        self.layout(width, height)?;
        let layout = layout_start.map(|s| s.elapsed());

        let render_start = timing_enabled.then(std::time::Instant::now);
        self.render_items()?;
        let render = render_start.map(|s| s.elapsed());

        self.pointer.invalidate();
        self.drawn = true;

        if let Some(start) = total_start {
            tracing::debug!(
                total = ?start.elapsed(),
                extract = ?extract.unwrap_or_default(),
                reconcile = ?reconcile.unwrap_or_default(),
                layout = ?layout.unwrap_or_default(),
                render = ?render.unwrap_or_default(),
                items = self.charts.len() + self.components.len(),
                "[draw-timing]"
            );
        }
        Ok(())
    }

    /// Replays the last draw's raw data. Does nothing before the first draw.
    pub fn redraw(&mut self) -> Result<()> {
        match self.raw_data.clone() {
            Some(data) => self.draw(data),
            None => Ok(()),
        }
    }

    /// The data slice for item `id`.
    ///
    /// A tracked chart gets its chart slice, a tracked component its component slice.
    /// Otherwise the item's data derivation is applied to the original data, and without one
    /// the original data is returned unchanged.
    pub fn demux(&self, id: &str, data: &DrawData) -> Value {
        demux_value(id, data, &self.charts, &self.components)
    }

    /// Detaches every item and forgets the last draw.
    pub fn clear(&mut self) {
        self.charts.clear(&mut self.surface, &mut self.events);
        self.components.clear(&mut self.surface, &mut self.events);
        self.raw_data = None;
        self.draw_data = DrawData::default();
        self.layout_result = LayoutResult::default();
        self.pointer.invalidate();
        self.drawn = false;
    }

    fn dimensions(&self) -> (f64, f64) {
        let container = self.surface.container_size();
        let width = self
            .config
            .width
            .or(container.map(|s| s.width))
            .unwrap_or(0.0);
        let height = self
            .config
            .height
            .or(container.map(|s| s.height))
            .unwrap_or(0.0);
        if width <= 0.0 || height <= 0.0 {
            tracing::warn!(
                width,
                height,
                "canvas has no area; set width/height or size the container"
            );
        }
        (width, height)
    }

    fn layout(&mut self, width: f64, height: f64) -> Result<()> {
        if !self.drawn {
            self.chart_position = ChartPosition::from_insets(self.config.margins, width, height);
        }
        self.position_chart_layers();

        let inputs: Vec<Value> = self
            .components
            .slots()
            .iter()
            .map(|slot| demux_value(&slot.id, &self.draw_data, &self.charts, &self.components))
            .collect();
        let layout = calculate_layout(
            self.components.slots_mut(),
            &inputs,
            &mut self.surface,
            self.chart_position,
        )?;

        self.chart_position =
            ChartPosition::from_layout(self.config.margins, &layout, width, height);
        tracing::debug!(chart_position = ?self.chart_position, "chart position");
        self.position_chart_layers();

        for placement in apply_layout(&layout, &self.chart_position, width, height) {
            let Some(slot) = self.components.get_mut(&placement.id) else {
                continue;
            };
            let layer = slot.layer;
            if let Some(positioned) = slot.item.positioned_mut() {
                positioned.set_layout(
                    &mut self.surface,
                    layer,
                    placement.x,
                    placement.y,
                    placement.constraints,
                );
            }
        }
        self.layout_result = layout;

        self.position_by_z_index();
        Ok(())
    }

    fn position_chart_layers(&mut self) {
        let position = self.chart_position;
        let transform = position.transform();
        for slot in self.charts.slots() {
            if slot.kind == LayerKind::Overlay {
                continue;
            }
            self.surface.set_attr(slot.layer, "transform", &transform);
            self.surface
                .set_attr(slot.layer, "width", &tessera_core::geom::fmt_number(position.width));
            self.surface.set_attr(
                slot.layer,
                "height",
                &tessera_core::geom::fmt_number(position.height),
            );
        }
    }

    /// Stable ascending z-order; equal z-indexes keep chart-then-component registration order.
    fn position_by_z_index(&mut self) {
        let mut layers: Vec<(i32, crate::surface::NodeId)> = self
            .charts
            .slots()
            .iter()
            .chain(self.components.slots())
            .filter(|slot| slot.kind != LayerKind::Overlay)
            .map(|slot| (slot.z_index, slot.layer))
            .collect();
        layers.sort_by_key(|(z, _)| *z);
        let order: Vec<_> = layers.into_iter().map(|(_, layer)| layer).collect();
        self.surface.reorder_fragments(&order);
    }

    fn render_items(&mut self) -> Result<()> {
        let chart_inputs: Vec<Value> = self
            .charts
            .slots()
            .iter()
            .map(|slot| demux_value(&slot.id, &self.draw_data, &self.charts, &self.components))
            .collect();
        let component_inputs: Vec<Value> = self
            .components
            .slots()
            .iter()
            .map(|slot| demux_value(&slot.id, &self.draw_data, &self.charts, &self.components))
            .collect();

        for (slot, data) in self.charts.slots_mut().iter_mut().zip(&chart_inputs) {
            let mut ctx = RenderContext {
                surface: &mut self.surface,
                layer: slot.layer,
                id: &slot.id,
                chart_position: self.chart_position,
            };
            slot.item.render(&mut ctx, data)?;
        }
        for (slot, data) in self.components.slots_mut().iter_mut().zip(&component_inputs) {
            let mut ctx = RenderContext {
                surface: &mut self.surface,
                layer: slot.layer,
                id: &slot.id,
                chart_position: self.chart_position,
            };
            slot.item.render(&mut ctx, data)?;
        }
        Ok(())
    }

    fn pointer_geometry(&self) -> PointerGeometry {
        let bounds = self.surface.client_bounds();
        let (width, height) = self.canvas;
        let ratio = |canvas: f64, client: f64| if client > 0.0 { canvas / client } else { 1.0 };
        PointerGeometry {
            chart: self.chart_position,
            bounds,
            scale: (ratio(width, bounds.width), ratio(height, bounds.height)),
        }
    }

    pub fn pointer_enter(&mut self, client_x: f64, client_y: f64) -> Option<PointerEvent> {
        let geometry = self.pointer_geometry();
        self.pointer.enter(point(client_x, client_y), || geometry)
    }

    pub fn pointer_move(&mut self, client_x: f64, client_y: f64) -> Option<PointerEvent> {
        let geometry = self.pointer_geometry();
        self.pointer.move_to(point(client_x, client_y), || geometry)
    }

    pub fn pointer_leave(&mut self) -> Option<PointerEvent> {
        self.pointer.leave()
    }

    /// Container-units to absolute-pixel ratio, when the canvas is scaled into its container.
    fn responsive_ratio(&self) -> Option<(f64, f64)> {
        let container = self.surface.container_size()?;
        let (width, height) = self.canvas;
        (self.config.responsive && width > 0.0 && height > 0.0)
            .then(|| (container.width / width, container.height / height))
    }

    /// Moves overlay `id`. Returns `false` when `id` is not an attached overlay.
    pub fn position_overlay(&mut self, id: &str, at: OverlayPosition) -> bool {
        let ratio = self.responsive_ratio();
        let chart = self.chart_position;
        self.with_overlay(id, |overlay| overlay.position_at(at, &chart, ratio))
    }

    pub fn show_overlay(&mut self, id: &str) -> bool {
        self.with_overlay(id, |overlay| overlay.show())
    }

    pub fn hide_overlay(&mut self, id: &str) -> bool {
        self.with_overlay(id, |overlay| overlay.hide())
    }

    fn with_overlay(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut crate::builtins::overlay::OverlayState),
    ) -> bool {
        let Some(slot) = self.components.get_mut(id) else {
            return false;
        };
        let layer = slot.layer;
        let Some(overlay) = slot.item.overlay_mut() else {
            return false;
        };
        f(overlay);
        self.surface.set_attr(layer, "style", &overlay.style());
        true
    }
}

fn demux_value(id: &str, data: &DrawData, charts: &ItemPool, components: &ItemPool) -> Value {
    if charts.contains(id) {
        if let Some(slice) = data.config.chart(id) {
            return slice.clone();
        }
    } else if components.contains(id) {
        if let Some(slice) = data.config.component(id) {
            return slice.clone();
        }
    }
    charts
        .get(id)
        .or_else(|| components.get(id))
        .and_then(|slot| slot.derived_data(&data.original))
        .unwrap_or_else(|| data.original.clone())
}
