//! Built-in chart, component and overlay types registered by
//! [`TypeRegistry::with_builtins`](crate::TypeRegistry::with_builtins).

pub mod bars;
pub mod labels;
pub mod legend;
pub mod overlay;
pub mod text;

use crate::Result;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tessera_core::geom::fmt_number;
use tessera_core::{Error as CoreError, ItemConfig};

/// `text-anchor` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Start,
    Middle,
    End,
    Inherit,
}

impl Anchor {
    pub fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
            Anchor::Inherit => "inherit",
        }
    }
}

/// Deserializes a builtin's options; failures are reported against the type name.
pub(crate) fn parse_options<T: DeserializeOwned>(
    config: &ItemConfig,
    type_name: &str,
) -> Result<T> {
    config.options.parse().map_err(|e| {
        CoreError::invalid_option(config.id_str(), type_name, e.to_string()).into()
    })
}

/// CSS object -> `key: value; ...;`, or `None` when empty.
pub(crate) fn css(styles: Option<&Map<String, Value>>) -> Option<String> {
    let styles = styles?;
    if styles.is_empty() {
        return None;
    }
    Some(tessera_core::geom::style(
        styles.iter().map(|(k, v)| (k.as_str(), display_value(v))),
    ))
}

/// Strings as-is, numbers JS-style, everything else as JSON.
pub(crate) fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(_) => tessera_core::options::json_f64(v)
            .map(fmt_number)
            .unwrap_or_default(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
