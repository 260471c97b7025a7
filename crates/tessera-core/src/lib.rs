#![forbid(unsafe_code)]

//! Headless model for composed charts.
//!
//! - [`description`]: the declarative layout description (rows, columns, layered charts)
//! - [`extract`]: flattening a description into charts, components and per-item data
//! - [`geom`]: positions, margins, bounding boxes and transform strings
//! - [`config`]: canvas-level configuration
//!
//! Rendering, measurement and the draw cycle live in `tessera-render`.

pub mod config;
pub mod description;
pub mod error;
pub mod extract;
pub mod geom;
pub mod options;

pub use config::ComposeConfig;
pub use description::{
    DataFn, ItemConfig, ItemData, LayoutDescription, LayoutEntry, LayoutRow, layered,
};
pub use error::{Error, Result};
pub use extract::{ExtractedData, ExtractedLayout, LayoutCell, extract_layout};
pub use geom::{BBox, Margins, MarginsSpec, Position};
pub use options::ItemOptions;

#[cfg(test)]
mod tests;
