use crate::geom::{Margins, MarginsSpec};
use crate::options::deep_merge_value;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_COMPOSE_MARGINS: Margins = Margins {
    top: 10.0,
    right: 10.0,
    bottom: 10.0,
    left: 10.0,
};

/// Canvas-level settings for a composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComposeConfig {
    /// Space between the canvas edge and the outermost components (or the plot area).
    #[serde(deserialize_with = "deserialize_margins")]
    pub margins: Margins,
    /// Explicit canvas width; takes precedence over the measured container size.
    pub width: Option<f64>,
    /// Explicit canvas height; takes precedence over the measured container size.
    pub height: Option<f64>,
    /// Scale to the container through `viewBox` rather than fixed width/height attributes.
    pub responsive: bool,
    /// Whether the surface sits in an HTML container (required for overlay layers).
    pub container: bool,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            margins: DEFAULT_COMPOSE_MARGINS,
            width: None,
            height: None,
            responsive: true,
            container: true,
        }
    }
}

fn deserialize_margins<'de, D>(deserializer: D) -> std::result::Result<Margins, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let spec = Option::<MarginsSpec>::deserialize(deserializer)?;
    Ok(spec
        .map(|s| s.resolve(DEFAULT_COMPOSE_MARGINS))
        .unwrap_or(DEFAULT_COMPOSE_MARGINS))
}

impl ComposeConfig {
    /// Deep-merges `overrides` onto the defaults.
    pub fn from_value(overrides: &Value) -> Result<Self> {
        let mut base = serde_json::to_value(Self::default())?;
        deep_merge_value(&mut base, overrides);
        Ok(serde_json::from_value(base)?)
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_margins(mut self, margins: impl Into<MarginsSpec>) -> Self {
        self.margins = margins.into().resolve(DEFAULT_COMPOSE_MARGINS);
        self
    }

    pub fn with_responsive(mut self, responsive: bool) -> Self {
        self.responsive = responsive;
        self
    }

    pub fn with_container(mut self, container: bool) -> Self {
        self.container = container;
        self
    }

    /// `0 0 w h` when responsive and both dimensions are explicit.
    pub fn view_box(&self) -> Option<String> {
        match (self.responsive, self.width, self.height) {
            (true, Some(w), Some(h)) if w > 0.0 && h > 0.0 => Some(format!(
                "0 0 {} {}",
                crate::geom::fmt_number(w),
                crate::geom::fmt_number(h)
            )),
            _ => None,
        }
    }

    pub fn preserve_aspect_ratio(&self) -> Option<&'static str> {
        self.responsive.then_some("xMidYMid meet")
    }
}
