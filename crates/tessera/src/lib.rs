#![forbid(unsafe_code)]

//! `tessera` composes charts and components into one canvas from a declarative layout.
//!
//! The model (descriptions, extraction, geometry) is re-exported from `tessera-core`.
//!
//! # Features
//!
//! - `render`: the composition controller, box-model layout and SVG scene (`tessera::render`)

pub use tessera_core::*;

#[cfg(feature = "render")]
pub mod render {
    pub use tessera_render::builtins;
    pub use tessera_render::svg::Scene;
    pub use tessera_render::text::{FixedAdvanceMeasurer, TextExtent, TextMeasurer, TextStyle};
    pub use tessera_render::{
        ChartPosition, Compose, DrawData, Item, ItemType, LayerKind, LayoutSource,
        LifecycleEvent, PointerEvent, Positioned, RenderContext, Surface, TypeRegistry,
    };

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Core(#[from] tessera_core::Error),
        #[error(transparent)]
        Render(#[from] tessera_render::Error),
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    fn draw(
        layout: impl Into<LayoutSource>,
        data: serde_json::Value,
        config: tessera_core::ComposeConfig,
    ) -> Result<Compose> {
        let mut compose = Compose::new(layout).with_config(config);
        compose.draw(data)?;
        Ok(compose)
    }

    /// One-shot draw into a fresh [`Scene`], serialized as a standalone `<svg>`.
    ///
    /// The canvas needs explicit `width`/`height` in `config`; a headless scene has no
    /// container to measure.
    pub fn render_svg(
        layout: impl Into<LayoutSource>,
        data: serde_json::Value,
        config: tessera_core::ComposeConfig,
    ) -> Result<String> {
        Ok(draw(layout, data, config)?.to_svg())
    }

    /// Like [`render_svg`], but keeps the HTML container and any overlay layers.
    pub fn render_html(
        layout: impl Into<LayoutSource>,
        data: serde_json::Value,
        config: tessera_core::ComposeConfig,
    ) -> Result<String> {
        Ok(draw(layout, data, config)?.to_html())
    }
}
