#![forbid(unsafe_code)]

//! Draw-cycle engine for composed charts.
//!
//! A [`Compose`] owns a rendering [`Surface`], a [`TypeRegistry`] of chart and component
//! factories, and two item pools (charts and components). Each [`Compose::draw`] extracts a
//! layout from the caller's description, reconciles the pools, measures and places the
//! components around the plot area, and renders every item with its slice of the data.

pub mod builtins;
pub mod compose;
pub mod item;
pub mod labels;
pub mod layout;
pub mod pointer;
pub mod pool;
pub mod registry;
pub mod surface;
pub mod svg;
pub mod text;

pub use compose::{Compose, DrawData, LayoutSource};
pub use item::{Item, LayoutConstraints, LayoutInfo, Positioned, RenderContext};
pub use layout::{ChartPosition, LayoutPart, LayoutResult, Placement};
pub use pointer::{PointerCoordinates, PointerEvent};
pub use pool::LifecycleEvent;
pub use registry::{ItemType, LayerKind, TypeRegistry};
pub use surface::{MeasureError, NodeId, Surface};
pub use svg::Scene;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] tessera_core::Error),
    #[error("rendering surface error: {message}")]
    Surface { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn surface(message: impl Into<String>) -> Self {
        Self::Surface {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Core(tessera_core::Error::Json(err))
    }
}

fn draw_timing_enabled() -> bool {
    static ENABLED: std::sync::OnceLock<bool> = std::sync::OnceLock::new();
    *ENABLED.get_or_init(|| match std::env::var("TESSERA_DRAW_TIMING").as_deref() {
        Ok("1") | Ok("true") => true,
        _ => false,
    })
}
