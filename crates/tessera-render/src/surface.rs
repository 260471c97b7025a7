//! The narrow scene-graph interface the engine draws through.

use crate::registry::LayerKind;
use crate::Result;
use tessera_core::ComposeConfig;
use tessera_core::geom::{BBox, Size};

/// Handle to a node owned by a [`Surface`].
///
/// Slots are reused after removal; the generation tells a stale handle from the new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(self) -> usize {
        self.index
    }
}

/// A geometry query that could not be answered (detached or hidden node, ...).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot measure node: {reason}")]
pub struct MeasureError {
    pub reason: String,
}

impl MeasureError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

pub trait Surface {
    /// Whether fragments of `kind` can be created at all.
    fn supports(&self, kind: LayerKind) -> bool {
        let _ = kind;
        true
    }

    /// Creates the fragment an item of `kind` renders into.
    ///
    /// Fails when the surface cannot host that kind (overlays need an HTML container).
    fn append_fragment(&mut self, kind: LayerKind, z_index: i32) -> Result<NodeId>;

    fn append_child(&mut self, parent: NodeId, tag: &str) -> NodeId;

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str);

    fn remove_attr(&mut self, node: NodeId, name: &str);

    fn attr(&self, node: NodeId, name: &str) -> Option<&str>;

    fn set_text(&mut self, node: NodeId, text: &str);

    /// Detaches `node` and its subtree. Removing an already removed node is a no-op.
    fn remove(&mut self, node: NodeId);

    fn clear_children(&mut self, node: NodeId);

    fn is_attached(&self, node: NodeId) -> bool;

    /// Extent of the node's content, ignoring its own transform.
    fn bounding_box(&self, node: NodeId) -> std::result::Result<BBox, MeasureError>;

    fn measure(&self, node: NodeId) -> std::result::Result<Size, MeasureError> {
        self.bounding_box(node).map(|b| b.size())
    }

    /// Re-appends chart and component fragments in the given order (later paints on top).
    fn reorder_fragments(&mut self, order: &[NodeId]);

    /// Applies canvas dimensions and responsive attributes.
    fn set_dimensions(&mut self, width: f64, height: f64, config: &ComposeConfig);

    /// Measured size of the hosting container, if it has one.
    fn container_size(&self) -> Option<Size>;

    /// Bounds of the drawing root in client coordinates, used for pointer hit tests.
    fn client_bounds(&self) -> BBox;
}
