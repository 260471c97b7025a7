//! Turns a [`LayoutDescription`] into flat chart/component lists with inferred positions.
//!
//! Position inference, per row:
//! - a single-column row before any multi-column (or layered) row is `top`, later ones `bottom`;
//! - in a multi-column row holding a layered entry, columns before it are `left` and columns
//!   after it are `right`;
//! - in a multi-column row without a layered entry, the first item is `left` and the rest are
//!   `right`, unless charts were already placed in an earlier row (then all are `right`).
//!
//! An explicit `position` on a component wins over the inferred one.
//!
//! Components are ordered inside-out: `top`/`left` entries are added to the front of their
//! bucket, `bottom`/`right` entries to the back, so the first component of each edge is the one
//! closest to the plot area.

use crate::description::{ItemConfig, ItemData, LayoutDescription, LayoutEntry};
use crate::geom::Position;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::VecDeque;

/// A column of the extracted layout grid, by id.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutCell {
    Item(String),
    Layered(Vec<String>),
}

/// Literal `data` payloads pulled out of item configurations, keyed by item id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedData {
    pub charts: IndexMap<String, Value>,
    pub components: IndexMap<String, Value>,
}

impl ExtractedData {
    pub fn chart(&self, id: &str) -> Option<&Value> {
        self.charts.get(id)
    }

    pub fn component(&self, id: &str) -> Option<&Value> {
        self.components.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty() && self.components.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedLayout {
    /// Every item by id, in description order.
    pub items: IndexMap<String, ItemConfig>,
    /// Grid of ids mirroring the rows of the description.
    pub layout: Vec<Vec<Option<LayoutCell>>>,
    pub charts: Vec<ItemConfig>,
    /// Components ordered inside-out (see module docs).
    pub components: Vec<ItemConfig>,
    pub data: ExtractedData,
}

impl ExtractedLayout {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn item_id(row_index: usize, col_index: usize, layer_index: Option<usize>) -> String {
    match layer_index {
        Some(layer) => format!("item-{}-{}-{}", row_index + 1, col_index + 1, layer + 1),
        None => format!("item-{}-{}", row_index + 1, col_index + 1),
    }
}

#[derive(Debug, Default)]
struct Found {
    row: bool,
    charts: bool,
}

pub fn extract_layout(description: Option<&LayoutDescription>) -> Result<ExtractedLayout> {
    let Some(description) = description else {
        return Ok(ExtractedLayout::default());
    };

    let mut out = ExtractedLayout::default();
    let mut components: VecDeque<ItemConfig> = VecDeque::new();
    let mut found = Found::default();

    for (row_index, row) in description.rows.iter().enumerate() {
        let multi = row.len() > 1;
        if multi {
            found.row = true;
        }
        let row_has_layered = row.contains_layered();
        let mut first_item_in_row = true;
        let mut row_components: VecDeque<ItemConfig> = VecDeque::new();
        let mut row_layout = Vec::with_capacity(row.len());

        for (col_index, entry) in row.0.iter().enumerate() {
            let Some(entry) = entry else {
                row_layout.push(None);
                continue;
            };

            match entry {
                LayoutEntry::Layered(charts) => {
                    found.charts = true;
                    found.row = true;

                    let mut chart_ids = Vec::with_capacity(charts.len());
                    for (layer_index, chart) in charts.iter().enumerate() {
                        let Some(chart) = chart else {
                            continue;
                        };
                        let mut chart = chart.clone();
                        let id = chart
                            .id
                            .clone()
                            .unwrap_or_else(|| item_id(row_index, col_index, Some(layer_index)));
                        chart.id = Some(id.clone());
                        take_literal_data(&mut chart, &mut out.data.charts);
                        insert_item(&mut out.items, &chart)?;
                        chart_ids.push(id);
                        out.charts.push(chart);
                    }
                    row_layout.push(Some(LayoutCell::Layered(chart_ids)));
                }
                LayoutEntry::Item(component) => {
                    let mut component = component.clone();
                    let id = component
                        .id
                        .clone()
                        .unwrap_or_else(|| item_id(row_index, col_index, None));
                    component.id = Some(id.clone());

                    let inferred = if multi {
                        if found.charts {
                            Position::Right
                        } else if row_has_layered || first_item_in_row {
                            Position::Left
                        } else {
                            Position::Right
                        }
                    } else if !found.row {
                        Position::Top
                    } else {
                        Position::Bottom
                    };
                    first_item_in_row = false;

                    let position = *component.position.get_or_insert(inferred);
                    tracing::trace!(id = %id, %position, "component position");

                    take_literal_data(&mut component, &mut out.data.components);
                    insert_item(&mut out.items, &component)?;

                    let bucket = if multi {
                        &mut row_components
                    } else {
                        &mut components
                    };
                    match position {
                        Position::Top | Position::Left => bucket.push_front(component),
                        Position::Bottom | Position::Right => bucket.push_back(component),
                    }

                    row_layout.push(Some(LayoutCell::Item(id)));
                }
            }
        }

        components.extend(row_components);
        out.layout.push(row_layout);
    }

    out.components = components.into();
    Ok(out)
}

fn take_literal_data(item: &mut ItemConfig, table: &mut IndexMap<String, Value>) {
    match item.data.take() {
        Some(ItemData::Literal(data)) => {
            table.insert(item.id_str().to_string(), data);
        }
        other => item.data = other,
    }
}

fn insert_item(items: &mut IndexMap<String, ItemConfig>, item: &ItemConfig) -> Result<()> {
    let id = item.id_str().to_string();
    if items.contains_key(&id) {
        return Err(Error::malformed(format!("duplicate item id \"{id}\"")));
    }
    items.insert(id, item.clone());
    Ok(())
}
