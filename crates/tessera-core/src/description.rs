//! Declarative layout descriptions.
//!
//! A description is an ordered list of rows. A row holds one or more columns; a column is
//! either a single chart/component configuration or a *layered* group of charts that share
//! the plot area. A description can be built in Rust or read from JSON:
//!
//! ```
//! use serde_json::json;
//! use tessera_core::description::LayoutDescription;
//!
//! let description = LayoutDescription::from_value(&json!([
//!     {"type": "Title", "text": "Inputs"},
//!     [{"type": "Legend"}, {"_layered": true, "items": [{"type": "Bars"}]}],
//! ]))?;
//! assert_eq!(description.rows.len(), 2);
//! # Ok::<(), tessera_core::Error>(())
//! ```

use crate::geom::Position;
use crate::options::ItemOptions;
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Derives an item's data from the original draw data.
pub type DataFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

#[derive(Clone)]
pub enum ItemData {
    /// Extracted into the per-item data table and removed from the item's options.
    Literal(Value),
    /// Kept on the item and applied to the original data when no slice exists.
    Derived(DataFn),
}

impl fmt::Debug for ItemData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemData::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            ItemData::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

impl PartialEq for ItemData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ItemData::Literal(a), ItemData::Literal(b)) => a == b,
            (ItemData::Derived(a), ItemData::Derived(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Configuration of one chart or component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemConfig {
    pub id: Option<String>,
    pub type_name: Option<String>,
    pub position: Option<Position>,
    pub data: Option<ItemData>,
    pub options: ItemOptions,
}

impl ItemConfig {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(ItemData::Literal(data));
        self
    }

    pub fn derive_data(mut self, f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        self.data = Some(ItemData::Derived(Arc::new(f)));
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key, value.into());
        self
    }

    pub fn options(mut self, options: impl Into<ItemOptions>) -> Self {
        self.options = options.into();
        self
    }

    /// Id assigned by the extractor; empty before extraction when none was given.
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    /// Reads `{"id", "type", "position", "data", ...options}`.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::malformed(format!(
                "expected an item object, found {}",
                json_kind(value)
            )));
        };
        Self::from_map(map.clone())
    }

    fn from_map(mut map: Map<String, Value>) -> Result<Self> {
        let id = match map.remove("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(other) => {
                return Err(Error::malformed(format!(
                    "item id must be a string, found {}",
                    json_kind(&other)
                )));
            }
        };
        let item_id = id.clone().unwrap_or_default();

        let type_name = match map.remove("type") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                return Err(Error::invalid_option(
                    item_id,
                    "type",
                    format!("expected a string, found {}", json_kind(&other)),
                ));
            }
        };

        let position = match map.remove("position") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.parse::<Position>().map_err(|e| {
                Error::invalid_option(item_id.clone(), "position", e.to_string())
            })?),
            Some(other) => {
                return Err(Error::invalid_option(
                    item_id,
                    "position",
                    format!("expected a string, found {}", json_kind(&other)),
                ));
            }
        };

        let data = match map.remove("data") {
            None => None,
            Some(v) => Some(ItemData::Literal(v)),
        };

        Ok(Self {
            id,
            type_name,
            position,
            data,
            options: ItemOptions::from_map(map),
        })
    }
}

/// One column of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutEntry {
    Item(ItemConfig),
    /// Charts drawn on top of each other in the plot area.
    Layered(Vec<Option<ItemConfig>>),
}

impl From<ItemConfig> for LayoutEntry {
    fn from(item: ItemConfig) -> Self {
        LayoutEntry::Item(item)
    }
}

/// Marks `charts` as sharing the plot area.
pub fn layered(charts: impl IntoIterator<Item = ItemConfig>) -> LayoutEntry {
    LayoutEntry::Layered(charts.into_iter().map(Some).collect())
}

/// A row of columns. `None` columns are holes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutRow(pub Vec<Option<LayoutEntry>>);

impl LayoutRow {
    pub fn single(entry: impl Into<LayoutEntry>) -> Self {
        Self(vec![Some(entry.into())])
    }

    pub fn columns<E: Into<LayoutEntry>>(entries: impl IntoIterator<Item = E>) -> Self {
        Self(entries.into_iter().map(|e| Some(e.into())).collect())
    }

    pub fn hole() -> Self {
        Self(vec![None])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_layered(&self) -> bool {
        self.0
            .iter()
            .any(|e| matches!(e, Some(LayoutEntry::Layered(_))))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutDescription {
    pub rows: Vec<LayoutRow>,
}

impl LayoutDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(mut self, entry: impl Into<LayoutEntry>) -> Self {
        self.rows.push(LayoutRow::single(entry));
        self
    }

    pub fn columns<E: Into<LayoutEntry>>(mut self, entries: impl IntoIterator<Item = E>) -> Self {
        self.rows.push(LayoutRow::columns(entries));
        self
    }

    pub fn push(&mut self, row: LayoutRow) {
        self.rows.push(row);
    }

    /// Reads the JSON form. `null` yields an empty description.
    pub fn from_value(value: &Value) -> Result<Self> {
        let rows = match value {
            Value::Null => return Ok(Self::default()),
            Value::Array(rows) => rows,
            other => {
                return Err(Error::malformed(format!(
                    "expected an array of rows, found {}",
                    json_kind(other)
                )));
            }
        };

        let mut out = Self::default();
        for (row_index, row) in rows.iter().enumerate() {
            let row = match row {
                Value::Array(columns) => LayoutRow(
                    columns
                        .iter()
                        .map(|c| entry_from_value(c, row_index))
                        .collect::<Result<Vec<_>>>()?,
                ),
                other => LayoutRow(vec![entry_from_value(other, row_index)?]),
            };
            out.rows.push(row);
        }
        Ok(out)
    }
}

fn entry_from_value(value: &Value, row_index: usize) -> Result<Option<LayoutEntry>> {
    match value {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::Object(map) if map.get("_layered").and_then(Value::as_bool) == Some(true) => {
            let items = match map.get("items") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(Error::malformed(format!(
                        "layered entry in row {} has no \"items\" array",
                        row_index + 1
                    )));
                }
            };
            let charts = items
                .iter()
                .map(|item| match item {
                    Value::Null | Value::Bool(false) => Ok(None),
                    other => ItemConfig::from_value(other).map(Some),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(LayoutEntry::Layered(charts)))
        }
        Value::Object(_) => Ok(Some(LayoutEntry::Item(ItemConfig::from_value(value)?))),
        other => Err(Error::malformed(format!(
            "row {} contains {}, expected an item object, a layered entry or null",
            row_index + 1,
            json_kind(other)
        ))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
