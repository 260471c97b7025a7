//! `Labels`: value labels over bars or points, with cross-series collision handling.

use super::bars::{bar_geometry, series_from_value};
use super::{Anchor, display_value, parse_options};
use crate::Result;
use crate::item::{Item, RenderContext};
use crate::labels::{Label, resolve};
use crate::surface::NodeId;
use serde::Deserialize;
use serde_json::Value;
use tessera_core::geom::{BBox, Point, fmt_number, point, translate};
use tessera_core::options::json_f64;
use tessera_core::{Error as CoreError, ItemConfig, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSource {
    /// One label per bar, laid out like `Bars` with the same padding.
    #[default]
    Bars,
    /// One label per value at the center of its band.
    Points,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelsOptions {
    pub padding: f64,
    /// Defaults to `start` on the right, `end` on the left, `middle` otherwise.
    pub anchor: Option<Anchor>,
    /// Distance from the labelled point, away from it in the label's position.
    pub offset: f64,
    pub handle_collisions: bool,
    pub source: LabelSource,
    pub y_max: Option<f64>,
    pub bar_padding: f64,
    /// Fixed number of decimals for label text.
    pub precision: Option<usize>,
    pub class: Option<String>,
}

impl Default for LabelsOptions {
    fn default() -> Self {
        Self {
            padding: 2.0,
            anchor: None,
            offset: 0.0,
            handle_collisions: true,
            source: LabelSource::Bars,
            y_max: None,
            bar_padding: 0.1,
            precision: None,
            class: None,
        }
    }
}

/// `{x, y, text?}` in plot-area coordinates; `text` defaults to `y`.
fn explicit_label(value: &Value) -> Option<(Point, String)> {
    let map = value.as_object()?;
    let x = map.get("x").and_then(json_f64)?;
    let y = map.get("y").and_then(json_f64)?;
    let text = map
        .get("text")
        .map(display_value)
        .unwrap_or_else(|| fmt_number(y));
    Some((point(x, y), text))
}

/// Pre-positioned labels: a flat array of `{x, y, text}` (one series) or an array of such
/// arrays. `None` when the data is a value series instead.
pub fn explicit_labels(data: &Value) -> Option<Vec<Vec<(Point, String)>>> {
    let Value::Array(items) = data else {
        return None;
    };
    let is_label = |v: &Value| v.as_object().is_some_and(|m| m.contains_key("x"));
    let first = items.first()?;
    if is_label(first) {
        return Some(vec![items.iter().filter_map(explicit_label).collect()]);
    }
    match first {
        Value::Array(series) if series.first().is_some_and(is_label) => Some(
            items
                .iter()
                .map(|series| match series {
                    Value::Array(labels) => labels.iter().filter_map(explicit_label).collect(),
                    _ => Vec::new(),
                })
                .collect(),
        ),
        _ => None,
    }
}

/// `offset` pixels away from the point in the direction of `position`.
pub fn offset_by_position(offset: f64, position: Position) -> (f64, f64) {
    match position {
        Position::Top => (0.0, -offset),
        Position::Right => (offset, 0.0),
        Position::Bottom => (0.0, offset),
        Position::Left => (-offset, 0.0),
    }
}

/// Background bounds for text measured at `text`: one pixel of slack on either side plus
/// padding, shifted by half a width for `start`/`end` anchors.
pub fn label_bounds(text: BBox, padding: f64, anchor: Anchor) -> BBox {
    let mut bounds = BBox::new(
        text.x - text.width / 2.0 - 1.0 - padding,
        text.y - 2.0 * padding,
        text.width + 3.0 + 2.0 * padding,
        text.height + 2.0 * padding,
    );
    match anchor {
        Anchor::Start => bounds.x += bounds.width / 2.0,
        Anchor::End => bounds.x -= bounds.width / 2.0,
        Anchor::Middle | Anchor::Inherit => {}
    }
    bounds
}

#[derive(Debug, Clone)]
pub struct Labels {
    position: Position,
    options: LabelsOptions,
}

pub fn create_labels(config: &ItemConfig) -> Result<Box<dyn Item>> {
    let mut labels = Labels {
        position: Position::Top,
        options: LabelsOptions::default(),
    };
    labels.configure(config)?;
    Ok(Box::new(labels))
}

impl Labels {
    pub fn anchor(&self) -> Anchor {
        self.options.anchor.unwrap_or(match self.position {
            Position::Right => Anchor::Start,
            Position::Left => Anchor::End,
            Position::Top | Position::Bottom => Anchor::Middle,
        })
    }

    fn text(&self, value: f64) -> String {
        match self.options.precision {
            Some(precision) => format!("{value:.precision$}"),
            None => fmt_number(value),
        }
    }

    /// Anchor point and text of every label, per series, in plot-area coordinates.
    fn points(&self, data: &Value, width: f64, height: f64) -> Vec<Vec<(Point, String)>> {
        if let Some(explicit) = explicit_labels(data) {
            return explicit;
        }
        let series = series_from_value(data);
        let (padding, centered) = match self.options.source {
            LabelSource::Bars => (self.options.bar_padding, false),
            // Bar tops give the value heights; x is the band center.
            LabelSource::Points => (0.0, true),
        };
        let geometry = bar_geometry(&series, width, height, self.options.y_max, padding);
        let count = series.iter().map(|s| s.values.len()).max().unwrap_or(0);
        let band = width / count.max(1) as f64;
        series
            .iter()
            .zip(geometry)
            .map(|(series, bars)| {
                series
                    .values
                    .iter()
                    .zip(bars)
                    .enumerate()
                    .map(|(i, (&value, bar))| {
                        let p = if centered {
                            point((i as f64 + 0.5) * band, bar.top())
                        } else {
                            self.bar_point(&bar)
                        };
                        (p, self.text(value))
                    })
                    .collect()
            })
            .collect()
    }

    fn bar_point(&self, bar: &BBox) -> Point {
        let middle = bar.top() + bar.height / 2.0;
        match self.position {
            Position::Top => point(bar.x_center(), bar.top()),
            Position::Bottom => point(bar.x_center(), bar.bottom()),
            Position::Left => point(bar.left(), middle),
            Position::Right => point(bar.right(), middle),
        }
    }
}

impl Item for Labels {
    fn configure(&mut self, config: &ItemConfig) -> Result<()> {
        let options: LabelsOptions = parse_options(config, "Labels")?;
        if !options.padding.is_finite() || options.padding < 0.0 {
            return Err(CoreError::invalid_option(
                config.id_str(),
                "padding",
                "expected a non-negative number",
            )
            .into());
        }
        if !(0.0..1.0).contains(&options.bar_padding) {
            return Err(CoreError::invalid_option(
                config.id_str(),
                "barPadding",
                "expected a number in [0, 1)",
            )
            .into());
        }
        self.position = config.position.unwrap_or(Position::Top);
        self.options = options;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>, data: &Value) -> Result<()> {
        let chart = ctx.chart_position;
        let points = self.points(data, chart.width, chart.height);
        let anchor = self.anchor();
        let padding = self.options.padding;
        let (dx, dy) = offset_by_position(self.options.offset, self.position);

        let surface = &mut *ctx.surface;
        surface.clear_children(ctx.layer);
        let root = surface.append_child(ctx.layer, "g");
        let class = match &self.options.class {
            Some(class) => format!("chart-labels {class}"),
            None => "chart-labels".to_string(),
        };
        surface.set_attr(root, "class", &class);

        let mut labels: Vec<Vec<Label>> = Vec::with_capacity(points.len());
        let mut nodes: Vec<Vec<NodeId>> = Vec::with_capacity(points.len());
        for (series_index, series) in points.iter().enumerate() {
            let series_group = surface.append_child(root, "g");
            surface.set_attr(
                series_group,
                "class",
                &format!("chart-series chart-index-{series_index}"),
            );

            let mut series_labels = Vec::with_capacity(series.len());
            let mut series_nodes = Vec::with_capacity(series.len());
            for (p, label_text) in series {
                let group = surface.append_child(series_group, "g");
                surface.set_attr(group, "class", "chart-label");
                let rect = surface.append_child(group, "rect");
                surface.set_attr(rect, "class", "chart-label-bg");
                let text = surface.append_child(group, "text");
                surface.set_attr(text, "class", "chart-label-text");
                surface.set_attr(text, "text-anchor", "start");
                surface.set_attr(text, "x", &fmt_number(p.x + dx));
                surface.set_attr(text, "y", &fmt_number(p.y + dy));
                surface.set_text(text, label_text);

                let label = match surface.bounding_box(text) {
                    Ok(text_bounds) => {
                        let bounds = label_bounds(text_bounds, padding, anchor);
                        surface.set_attr(group, "transform", &translate(bounds.x, bounds.y));
                        surface.set_attr(rect, "x", "0");
                        surface.set_attr(rect, "y", "0");
                        surface.set_attr(rect, "width", &fmt_number(bounds.width));
                        surface.set_attr(rect, "height", &fmt_number(bounds.height));
                        surface.set_attr(text, "x", &fmt_number(padding));
                        surface.set_attr(text, "y", &fmt_number(padding + text_bounds.height));
                        Label::new(bounds)
                    }
                    Err(err) => {
                        tracing::warn!(id = ctx.id, error = %err, "label could not be measured");
                        Label::unmeasured()
                    }
                };
                series_labels.push(label);
                series_nodes.push(group);
            }
            labels.push(series_labels);
            nodes.push(series_nodes);
        }

        if !self.options.handle_collisions {
            return Ok(());
        }

        resolve(&mut labels);
        for (series, series_nodes) in labels.iter().zip(&nodes) {
            for (label, &node) in series.iter().zip(series_nodes) {
                if label.removed {
                    surface.remove(node);
                    continue;
                }
                if let Some(bounds) = label.bounds {
                    surface.set_attr(node, "transform", &translate(bounds.x, bounds.y));
                }
                if let Some(group) = label.group {
                    surface.set_attr(node, "data-group-index", &group.to_string());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_pad_the_measured_text() {
        let text = BBox::new(100.0, 40.0, 20.0, 10.0);
        assert_eq!(
            label_bounds(text, 2.0, Anchor::Middle),
            BBox::new(87.0, 36.0, 27.0, 14.0)
        );
        assert_eq!(label_bounds(text, 2.0, Anchor::Start).x, 100.5);
        assert_eq!(label_bounds(text, 2.0, Anchor::End).x, 73.5);
    }

    #[test]
    fn offset_points_away_from_the_value() {
        assert_eq!(offset_by_position(4.0, Position::Top), (0.0, -4.0));
        assert_eq!(offset_by_position(4.0, Position::Left), (-4.0, 0.0));
    }

    #[test]
    fn explicit_labels_keep_their_coordinates() {
        let labels = explicit_labels(&serde_json::json!([
            [{"x": 10, "y": 20, "text": "a"}, {"x": 30, "y": 5}],
            [{"x": 1, "y": 2}]
        ]))
        .unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0][0], (point(10.0, 20.0), "a".to_string()));
        assert_eq!(labels[0][1].1, "5");
        assert!(explicit_labels(&serde_json::json!([1, 2, 3])).is_none());
    }

    #[test]
    fn anchor_defaults_by_position() {
        let config = ItemConfig::new("Labels").position(Position::Right);
        let mut labels = Labels {
            position: Position::Top,
            options: LabelsOptions::default(),
        };
        labels.configure(&config).unwrap();
        assert_eq!(labels.anchor(), Anchor::Start);
    }
}
