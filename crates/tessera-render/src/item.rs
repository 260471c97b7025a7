//! Capability traits implemented by chart and component types.
//!
//! Every item implements [`Item`] (configure + render). Items that take part in box-model
//! layout also expose [`Positioned`]; most do so by embedding a [`ComponentState`].

use crate::Result;
use crate::layout::ChartPosition;
use crate::surface::{MeasureError, NodeId, Surface};
use serde::Deserialize;
use serde_json::Value;
use tessera_core::geom::{MarginsSpec, Size, translate};
use tessera_core::{Error as CoreError, ItemConfig, Margins, Position};

/// What an item sees while it draws into its fragment.
pub struct RenderContext<'a> {
    pub surface: &'a mut dyn Surface,
    pub layer: NodeId,
    pub id: &'a str,
    /// Plot area of the current draw; provisional during the measuring pass.
    pub chart_position: ChartPosition,
}

pub trait Item {
    /// Re-applies options to a live instance. Called for items kept across draws.
    fn configure(&mut self, config: &ItemConfig) -> Result<()>;

    /// Full data-bound render into `ctx.layer`.
    fn render(&mut self, ctx: &mut RenderContext<'_>, data: &Value) -> Result<()>;

    /// Runs before measurement so [`Positioned::layout_info`] sees real dimensions.
    fn prepare_layout(&mut self, ctx: &mut RenderContext<'_>, data: &Value) -> Result<()> {
        self.render(ctx, data)
    }

    fn positioned(&self) -> Option<&dyn Positioned> {
        None
    }

    fn positioned_mut(&mut self) -> Option<&mut dyn Positioned> {
        None
    }

    fn overlay_mut(&mut self) -> Option<&mut crate::builtins::overlay::OverlayState> {
        None
    }

    fn on_attach(&mut self, _id: &str) {}

    fn on_detach(&mut self) {}
}

/// Size an item reports for box-model layout, margins included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutInfo {
    pub position: Position,
    pub width: f64,
    pub height: f64,
}

/// The perpendicular extent handed to a component by the layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutConstraints {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl LayoutConstraints {
    pub fn width(width: f64) -> Self {
        Self {
            width: Some(width),
            height: None,
        }
    }

    pub fn height(height: f64) -> Self {
        Self {
            width: None,
            height: Some(height),
        }
    }
}

pub trait Positioned {
    fn state(&self) -> &ComponentState;

    fn state_mut(&mut self) -> &mut ComponentState;

    /// Rendered but excluded from placement (overlays).
    fn skip_layout(&self) -> bool {
        false
    }

    fn position(&self) -> Position {
        self.state().position
    }

    fn layout_info(
        &self,
        surface: &dyn Surface,
        layer: NodeId,
    ) -> std::result::Result<LayoutInfo, MeasureError> {
        let measured = surface.measure(layer)?;
        Ok(self.state().layout_info(measured))
    }

    /// Moves the fragment to `(x, y)` and stores the perpendicular constraint.
    fn set_layout(
        &mut self,
        surface: &mut dyn Surface,
        layer: NodeId,
        x: f64,
        y: f64,
        constraints: LayoutConstraints,
    ) {
        let actual = if self.state().centered {
            surface.measure(layer).ok()
        } else {
            None
        };
        let (x, y) = self.state().origin(x, y, constraints, actual);
        surface.set_attr(layer, "transform", &translate(x, y));
        self.state_mut().constraints = constraints;
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComponentOptions {
    width: Option<f64>,
    height: Option<f64>,
    margins: Option<MarginsSpec>,
    #[serde(default)]
    centered: bool,
}

/// Placement state shared by every laid-out component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentState {
    pub position: Position,
    /// Explicit width; the measured width is used when unset.
    pub width: Option<f64>,
    /// Explicit height; the measured height is used when unset.
    pub height: Option<f64>,
    pub margins: Margins,
    /// Center inside the perpendicular constraint using the actual rendered size.
    pub centered: bool,
    /// Constraint from the most recent layout pass.
    pub constraints: LayoutConstraints,
}

impl Default for ComponentState {
    fn default() -> Self {
        Self {
            position: Position::Top,
            width: None,
            height: None,
            margins: Margins::ZERO,
            centered: false,
            constraints: LayoutConstraints::default(),
        }
    }
}

impl ComponentState {
    pub fn from_config(config: &ItemConfig) -> Result<Self> {
        let mut state = Self::default();
        state.configure(config)?;
        Ok(state)
    }

    /// Reads `position`, `width`, `height`, `margins` and `centered`. Constraints survive.
    pub fn configure(&mut self, config: &ItemConfig) -> Result<()> {
        let options: ComponentOptions = config.options.parse().map_err(|e| {
            CoreError::invalid_option(config.id_str(), "layout", e.to_string())
        })?;
        for (key, value) in [("width", options.width), ("height", options.height)] {
            if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(CoreError::invalid_option(
                    config.id_str(),
                    key,
                    "expected a non-negative number",
                )
                .into());
            }
        }
        self.position = config.position.unwrap_or(Position::Top);
        self.width = options.width;
        self.height = options.height;
        self.margins = options
            .margins
            .map(|m| m.resolve(Margins::ZERO))
            .unwrap_or(Margins::ZERO);
        self.centered = options.centered;
        Ok(())
    }

    pub fn layout_info(&self, measured: Size) -> LayoutInfo {
        LayoutInfo {
            position: self.position,
            width: self.width.unwrap_or(measured.width) + self.margins.horizontal(),
            height: self.height.unwrap_or(measured.height) + self.margins.vertical(),
        }
    }

    /// Width to draw into: the layout constraint, else the explicit width, else `measured`.
    pub fn box_width(&self, measured: f64) -> f64 {
        self.constraints.width.or(self.width).unwrap_or(measured)
    }

    pub fn box_height(&self, measured: f64) -> f64 {
        self.constraints.height.or(self.height).unwrap_or(measured)
    }

    /// Top-left corner of the fragment for a layout slot at `(x, y)`.
    pub fn origin(
        &self,
        x: f64,
        y: f64,
        constraints: LayoutConstraints,
        actual: Option<Size>,
    ) -> (f64, f64) {
        let m = self.margins;
        match actual {
            Some(actual) if self.centered => {
                let y = match constraints.height {
                    Some(h) => y + (h - actual.height) / 2.0,
                    None => y + m.top,
                };
                let x = match constraints.width {
                    Some(w) => x + (w - actual.width) / 2.0,
                    None => x + m.left,
                };
                (x, y)
            }
            _ => (x + m.left, y + m.top),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tessera_core::geom::size;

    fn config(options: Value) -> ItemConfig {
        ItemConfig::new("Text")
            .id("t")
            .position(Position::Left)
            .options(tessera_core::ItemOptions::from_value(options))
    }

    #[test]
    fn layout_info_adds_margins_to_measured_size() {
        let state = ComponentState::from_config(&config(json!({"margins": {"left": 4, "right": 6}})))
            .unwrap();
        let info = state.layout_info(size(30.0, 12.0));
        assert_eq!(info.position, Position::Left);
        assert_eq!(info.width, 40.0);
        assert_eq!(info.height, 12.0);
    }

    #[test]
    fn explicit_size_overrides_measurement() {
        let state = ComponentState::from_config(&config(json!({"width": 50}))).unwrap();
        assert_eq!(state.layout_info(size(30.0, 12.0)).width, 50.0);
    }

    #[test]
    fn negative_size_is_rejected() {
        let err = ComponentState::from_config(&config(json!({"height": -1}))).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Core(CoreError::InvalidOption { ref key, .. }) if key == "height"
        ));
    }

    #[test]
    fn centered_origin_uses_actual_size() {
        let state = ComponentState::from_config(&config(json!({"centered": true, "margins": 2})))
            .unwrap();
        let (x, y) = state.origin(
            10.0,
            20.0,
            LayoutConstraints::height(100.0),
            Some(size(30.0, 40.0)),
        );
        assert_eq!((x, y), (12.0, 50.0));

        let plain = ComponentState::from_config(&config(json!({"margins": 2}))).unwrap();
        assert_eq!(
            plain.origin(10.0, 20.0, LayoutConstraints::height(100.0), None),
            (12.0, 22.0)
        );
    }
}
