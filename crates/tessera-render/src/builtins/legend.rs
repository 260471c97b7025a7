//! `Legend`: swatch + label entries stacked along the edge the legend sits on.

use super::{css, display_value, parse_options};
use crate::Result;
use crate::item::{ComponentState, Item, Positioned, RenderContext};
use serde::Deserialize;
use serde_json::{Map, Value};
use tessera_core::geom::{fmt_number, translate};
use tessera_core::{ItemConfig, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackDirection {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegendOptions {
    /// Defaults to vertical on the left/right edges and horizontal on top/bottom.
    pub stack_direction: Option<StackDirection>,
    /// Gap between stacked entries.
    pub padding: f64,
    pub swatch_size: f64,
    pub class: Option<String>,
    pub style: Option<Map<String, Value>>,
}

impl Default for LegendOptions {
    fn default() -> Self {
        Self {
            stack_direction: None,
            padding: 5.0,
            swatch_size: 20.0,
            class: None,
            style: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub text: String,
    pub class: Option<String>,
    /// Chart type the entry stands for; `Line*` types get a line swatch.
    pub kind: Option<String>,
}

impl LegendEntry {
    /// Strings, or objects with `text`/`name`, `class` and `type`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Object(map) => {
                let text = map.get("text").or_else(|| map.get("name"))?;
                Some(Self {
                    text: display_value(text),
                    class: map.get("class").and_then(Value::as_str).map(str::to_string),
                    kind: map.get("type").and_then(Value::as_str).map(str::to_string),
                })
            }
            other => Some(Self {
                text: display_value(other),
                class: None,
                kind: None,
            }),
        }
    }

    fn is_line(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| k.starts_with("Line"))
    }
}

pub fn entries(data: &Value) -> Vec<LegendEntry> {
    match data {
        Value::Array(items) => items.iter().filter_map(LegendEntry::from_value).collect(),
        Value::Null => Vec::new(),
        other => LegendEntry::from_value(other).into_iter().collect(),
    }
}

#[derive(Debug, Clone)]
pub struct Legend {
    state: ComponentState,
    options: LegendOptions,
}

pub fn create_legend(config: &ItemConfig) -> Result<Box<dyn Item>> {
    Ok(Box::new(Legend::new(config)?))
}

impl Legend {
    pub fn new(config: &ItemConfig) -> Result<Self> {
        let mut legend = Self {
            state: ComponentState::default(),
            options: LegendOptions::default(),
        };
        legend.configure(config)?;
        Ok(legend)
    }

    pub fn stack_direction(&self) -> StackDirection {
        self.options
            .stack_direction
            .unwrap_or(match self.state.position {
                Position::Left | Position::Right => StackDirection::Vertical,
                Position::Top | Position::Bottom => StackDirection::Horizontal,
            })
    }
}

impl Item for Legend {
    fn configure(&mut self, config: &ItemConfig) -> Result<()> {
        let options: LegendOptions = parse_options(config, "Legend")?;
        if !options.padding.is_finite() || options.padding < 0.0 {
            return Err(tessera_core::Error::invalid_option(
                config.id_str(),
                "padding",
                "expected a non-negative number",
            )
            .into());
        }
        self.state.configure(config)?;
        self.options = options;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>, data: &Value) -> Result<()> {
        let surface = &mut *ctx.surface;
        surface.clear_children(ctx.layer);

        let legend = surface.append_child(ctx.layer, "g");
        let class = match &self.options.class {
            Some(class) => format!("chart-legend {class}"),
            None => "chart-legend".to_string(),
        };
        surface.set_attr(legend, "class", &class);
        if let Some(style) = css(self.options.style.as_ref()) {
            surface.set_attr(legend, "style", &style);
        }

        let size = self.options.swatch_size;
        let half = size / 2.0;
        let direction = self.stack_direction();
        let mut offset = 0.0;
        for entry in entries(data) {
            let group = surface.append_child(legend, "g");
            let group_class = match &entry.class {
                Some(class) => format!("chart-legend-group {class}"),
                None => "chart-legend-group".to_string(),
            };
            surface.set_attr(group, "class", &group_class);

            let swatch = surface.append_child(group, "g");
            surface.set_attr(swatch, "class", "chart-legend-swatch");
            if entry.is_line() {
                let line = surface.append_child(swatch, "line");
                surface.set_attr(line, "x1", "0");
                surface.set_attr(line, "y1", &fmt_number(half));
                surface.set_attr(line, "x2", &fmt_number(size));
                surface.set_attr(line, "y2", &fmt_number(half));
            } else {
                let circle = surface.append_child(swatch, "circle");
                surface.set_attr(circle, "cx", &fmt_number(half));
                surface.set_attr(circle, "cy", &fmt_number(half));
                surface.set_attr(circle, "r", &fmt_number(half));
            }

            let label = surface.append_child(group, "text");
            surface.set_attr(label, "class", "chart-legend-label");
            surface.set_attr(label, "transform", &translate(size + 5.0, 0.0));
            surface.set_attr(label, "alignment-baseline", "before-edge");
            surface.set_text(label, &entry.text);

            let measured = surface.bounding_box(group).unwrap_or_default();
            let (x, y) = match direction {
                StackDirection::Vertical => (0.0, offset),
                StackDirection::Horizontal => (offset, 0.0),
            };
            surface.set_attr(group, "transform", &translate(x, y));
            offset += self.options.padding
                + match direction {
                    StackDirection::Vertical => measured.height,
                    StackDirection::Horizontal => measured.width,
                };
        }
        Ok(())
    }

    fn positioned(&self) -> Option<&dyn Positioned> {
        Some(self)
    }

    fn positioned_mut(&mut self) -> Option<&mut dyn Positioned> {
        Some(self)
    }
}

impl Positioned for Legend {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entries_accept_strings_and_objects() {
        let entries = entries(&json!([
            "Input",
            {"name": "Output", "class": "series-1", "type": "LineChart"},
            null,
            {"class": "no-text"}
        ]));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "Input");
        assert_eq!(entries[1].text, "Output");
        assert_eq!(entries[1].class.as_deref(), Some("series-1"));
        assert!(entries[1].is_line());
        assert!(!entries[0].is_line());
    }

    fn legend(position: &str) -> Legend {
        let config =
            ItemConfig::from_value(&json!({"type": "Legend", "position": position})).unwrap();
        Legend::new(&config).unwrap()
    }

    #[test]
    fn direction_follows_position() {
        assert_eq!(legend("right").stack_direction(), StackDirection::Vertical);
        assert_eq!(legend("bottom").stack_direction(), StackDirection::Horizontal);
    }
}
