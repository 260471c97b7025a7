//! HTML overlays positioned over the canvas (tooltips and the like).

use super::parse_options;
use crate::Result;
use crate::item::{ComponentState, Item, Positioned, RenderContext};
use crate::layout::ChartPosition;
use serde::Deserialize;
use serde_json::Value;
use tessera_core::ItemConfig;
use tessera_core::geom::fmt_number;

/// Coordinate space of an [`OverlayPosition`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayPosition {
    /// Pixels relative to the container, used as-is.
    Absolute { x: f64, y: f64 },
    /// Plot-area coordinates; offset by the chart position, then scaled to the container.
    Chart { x: f64, y: f64 },
    /// Canvas coordinates, scaled to the container.
    Container { x: f64, y: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    pub x: f64,
    pub y: f64,
    pub hidden: bool,
}

impl Default for OverlayState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            hidden: true,
        }
    }
}

impl OverlayState {
    pub fn show(&mut self) {
        self.hidden = false;
    }

    pub fn hide(&mut self) {
        self.hidden = true;
    }

    /// `ratio` maps canvas units to container pixels when the canvas is scaled.
    pub fn position_at(
        &mut self,
        at: OverlayPosition,
        chart: &ChartPosition,
        ratio: Option<(f64, f64)>,
    ) {
        let (rx, ry) = ratio.unwrap_or((1.0, 1.0));
        let (x, y) = match at {
            OverlayPosition::Absolute { x, y } => (x, y),
            OverlayPosition::Chart { x, y } => ((x + chart.left) * rx, (y + chart.top) * ry),
            OverlayPosition::Container { x, y } => (x * rx, y * ry),
        };
        self.x = x;
        self.y = y;
    }

    pub fn style(&self) -> String {
        let transform = format!("translate({}px, {}px)", fmt_number(self.x), fmt_number(self.y));
        let mut styles = vec![
            ("position", "absolute".to_string()),
            ("top", "0".to_string()),
            ("left", "0".to_string()),
            ("-webkit-transform", transform.clone()),
            ("-ms-transform", transform.clone()),
            ("transform", transform),
        ];
        if self.hidden {
            styles.push(("display", "none".to_string()));
        }
        tessera_core::geom::style(styles)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OverlayOptions {
    x: Option<f64>,
    y: Option<f64>,
    hidden: Option<bool>,
    text: Option<String>,
    class: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Overlay {
    component: ComponentState,
    state: OverlayState,
    text: Option<String>,
    class: Option<String>,
}

pub fn create_overlay(config: &ItemConfig) -> Result<Box<dyn Item>> {
    Ok(Box::new(Overlay::new(config)?))
}

impl Overlay {
    pub fn new(config: &ItemConfig) -> Result<Self> {
        let mut overlay = Self {
            component: ComponentState::default(),
            state: OverlayState::default(),
            text: None,
            class: None,
        };
        overlay.configure(config)?;
        Ok(overlay)
    }

    pub fn overlay_state(&self) -> &OverlayState {
        &self.state
    }
}

impl Item for Overlay {
    fn configure(&mut self, config: &ItemConfig) -> Result<()> {
        let options: OverlayOptions = parse_options(config, "Overlay")?;
        self.component.configure(config)?;
        if let Some(x) = options.x {
            self.state.x = x;
        }
        if let Some(y) = options.y {
            self.state.y = y;
        }
        if let Some(hidden) = options.hidden {
            self.state.hidden = hidden;
        }
        self.text = options.text;
        self.class = options.class;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>, data: &Value) -> Result<()> {
        let surface = &mut *ctx.surface;
        let class = match &self.class {
            Some(class) => format!("chart-overlay-layer {class}"),
            None => "chart-overlay-layer".to_string(),
        };
        surface.set_attr(ctx.layer, "class", &class);
        surface.set_attr(ctx.layer, "style", &self.state.style());

        let text = match (&self.text, data) {
            (Some(text), _) => Some(text.clone()),
            (None, Value::String(s)) => Some(s.clone()),
            _ => None,
        };
        if let Some(text) = text {
            surface.set_text(ctx.layer, &text);
        }
        Ok(())
    }

    fn positioned(&self) -> Option<&dyn Positioned> {
        Some(self)
    }

    fn positioned_mut(&mut self) -> Option<&mut dyn Positioned> {
        Some(self)
    }

    fn overlay_mut(&mut self) -> Option<&mut OverlayState> {
        Some(&mut self.state)
    }
}

impl Positioned for Overlay {
    fn state(&self) -> &ComponentState {
        &self.component
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.component
    }

    fn skip_layout(&self) -> bool {
        true
    }
}
