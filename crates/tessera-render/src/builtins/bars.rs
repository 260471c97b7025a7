//! `Bars`: grouped vertical bars filling the plot area.

use super::parse_options;
use crate::Result;
use crate::item::{Item, RenderContext};
use serde::Deserialize;
use serde_json::Value;
use tessera_core::geom::{BBox, fmt_number};
use tessera_core::options::json_f64;
use tessera_core::{Error as CoreError, ItemConfig};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    pub key: Option<String>,
    pub class: Option<String>,
    pub values: Vec<f64>,
}

/// A flat array (numbers or `{y}` objects) is one series; nested arrays or
/// `{key, class, values}` objects are several.
pub fn series_from_value(data: &Value) -> Vec<Series> {
    let Value::Array(items) = data else {
        return Vec::new();
    };
    let nested = items.iter().any(|v| match v {
        Value::Array(_) => true,
        Value::Object(map) => map.contains_key("values"),
        _ => false,
    });
    if !nested {
        return vec![Series {
            values: values(items),
            ..Series::default()
        }];
    }
    items
        .iter()
        .filter_map(|item| match item {
            Value::Array(row) => Some(Series {
                values: values(row),
                ..Series::default()
            }),
            Value::Object(map) => Some(Series {
                key: map.get("key").and_then(Value::as_str).map(str::to_string),
                class: map.get("class").and_then(Value::as_str).map(str::to_string),
                values: match map.get("values") {
                    Some(Value::Array(v)) => values(v),
                    _ => Vec::new(),
                },
            }),
            _ => None,
        })
        .collect()
}

fn values(items: &[Value]) -> Vec<f64> {
    items
        .iter()
        .map(|v| match v {
            Value::Object(map) => map.get("y").and_then(json_f64).unwrap_or(0.0),
            other => json_f64(other).unwrap_or(0.0),
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BarsOptions {
    /// Top of the value scale; the largest value when unset.
    pub y_max: Option<f64>,
    /// Fraction of each band left empty, in `[0, 1)`.
    pub padding: f64,
    pub class: Option<String>,
}

impl Default for BarsOptions {
    fn default() -> Self {
        Self {
            y_max: None,
            padding: 0.1,
            class: None,
        }
    }
}

impl BarsOptions {
    pub fn validate(&self, id: &str) -> Result<()> {
        if !(0.0..1.0).contains(&self.padding) {
            return Err(
                CoreError::invalid_option(id, "padding", "expected a number in [0, 1)").into(),
            );
        }
        if self.y_max.is_some_and(|v| !v.is_finite() || v <= 0.0) {
            return Err(CoreError::invalid_option(id, "yMax", "expected a positive number").into());
        }
        Ok(())
    }
}

/// Bar rectangles per series, in plot-area coordinates.
///
/// Each index gets a band of `width / n`; series share the padded band side by side.
/// Negative values clamp to zero height.
pub fn bar_geometry(
    series: &[Series],
    width: f64,
    height: f64,
    y_max: Option<f64>,
    padding: f64,
) -> Vec<Vec<BBox>> {
    let count = series.iter().map(|s| s.values.len()).max().unwrap_or(0);
    if count == 0 {
        return series.iter().map(|_| Vec::new()).collect();
    }
    let y_max = y_max.unwrap_or_else(|| {
        let max = series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0_f64, f64::max);
        if max > 0.0 { max } else { 1.0 }
    });

    let band = width / count as f64;
    let inner = band * (1.0 - padding);
    let bar_width = inner / series.len() as f64;
    series
        .iter()
        .enumerate()
        .map(|(s, series)| {
            series
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let h = (v.max(0.0) / y_max * height).min(height);
                    let x = i as f64 * band + band * padding / 2.0 + s as f64 * bar_width;
                    BBox::new(x, height - h, bar_width, h)
                })
                .collect()
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct Bars {
    options: BarsOptions,
}

pub fn create_bars(config: &ItemConfig) -> Result<Box<dyn Item>> {
    let mut bars = Bars::default();
    bars.configure(config)?;
    Ok(Box::new(bars))
}

impl Item for Bars {
    fn configure(&mut self, config: &ItemConfig) -> Result<()> {
        let options: BarsOptions = parse_options(config, "Bars")?;
        options.validate(config.id_str())?;
        self.options = options;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>, data: &Value) -> Result<()> {
        let series = series_from_value(data);
        let chart = ctx.chart_position;
        let geometry = bar_geometry(
            &series,
            chart.width,
            chart.height,
            self.options.y_max,
            self.options.padding,
        );

        let surface = &mut *ctx.surface;
        surface.clear_children(ctx.layer);
        let root = surface.append_child(ctx.layer, "g");
        let class = match &self.options.class {
            Some(class) => format!("chart-bars {class}"),
            None => "chart-bars".to_string(),
        };
        surface.set_attr(root, "class", &class);

        for (index, (series, bars)) in series.iter().zip(&geometry).enumerate() {
            let group = surface.append_child(root, "g");
            let mut class = format!("chart-series chart-index-{index}");
            if let Some(extra) = &series.class {
                class.push(' ');
                class.push_str(extra);
            }
            surface.set_attr(group, "class", &class);
            if let Some(key) = &series.key {
                surface.set_attr(group, "data-key", key);
            }
            for bar in bars {
                let rect = surface.append_child(group, "rect");
                surface.set_attr(rect, "class", "chart-bar");
                surface.set_attr(rect, "x", &fmt_number(bar.x));
                surface.set_attr(rect, "y", &fmt_number(bar.y));
                surface.set_attr(rect, "width", &fmt_number(bar.width));
                surface.set_attr(rect, "height", &fmt_number(bar.height));
            }
        }
        Ok(())
    }
}
