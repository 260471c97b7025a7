//! In-memory SVG scene implementing [`Surface`].
//!
//! The scene is a small generational node arena: a `div` container (when overlays are
//! allowed) holding the `svg` root, chart/component `g` layers under the root and overlay
//! `div` layers beside it. Removed subtrees are freed and their slots reused.
//! Geometry queries are answered from attributes (`rect`, `circle`, `line`), from the text
//! measurer (`text`), and by folding children through their `translate`/`rotate` transforms.

use crate::registry::LayerKind;
use crate::surface::{MeasureError, NodeId, Surface};
use crate::text::{DEFAULT_FONT_SIZE, FixedAdvanceMeasurer, TextMeasurer, TextStyle};
use crate::{Error, Result};
use indexmap::IndexMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tessera_core::ComposeConfig;
use tessera_core::geom::{BBox, Point, Size, fmt_number, point, size, style};

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attrs: IndexMap<String, String>,
    text: Option<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    fn new(tag: &str, parent: Option<NodeId>) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: IndexMap::new(),
            text: None,
            children: Vec::new(),
            parent,
        }
    }
}

/// Arena slot. A freed slot bumps its generation before it is reused.
#[derive(Debug, Clone)]
struct Entry {
    generation: u32,
    node: Option<Node>,
}

impl Entry {
    fn live(node: Node) -> Self {
        Self {
            generation: 0,
            node: Some(node),
        }
    }
}

#[derive(Clone)]
pub struct Scene {
    nodes: Vec<Entry>,
    free: Vec<usize>,
    svg: NodeId,
    container: Option<NodeId>,
    container_size: Option<Size>,
    canvas_size: Size,
    client_origin: Point,
    measurer: Arc<dyn TextMeasurer + Send + Sync>,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.node_count())
            .field("container", &self.container.is_some())
            .field("container_size", &self.container_size)
            .field("canvas_size", &self.canvas_size)
            .finish()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// A scene hosted in an HTML container, so overlay layers can be created.
    pub fn new() -> Self {
        let root = NodeId::new(0, 0);
        let mut scene = Self {
            nodes: vec![Entry::live(Node::new("div", None))],
            free: Vec::new(),
            svg: root,
            container: Some(root),
            container_size: None,
            canvas_size: size(0.0, 0.0),
            client_origin: point(0.0, 0.0),
            measurer: Arc::new(FixedAdvanceMeasurer::default()),
        };
        scene.set_attr(root, "class", "chart-compose-container");
        let svg = scene.append_child(root, "svg");
        scene.svg = svg;
        scene.init_svg_attrs();
        scene
    }

    /// A bare `svg` root; overlay layers are refused.
    pub fn without_container() -> Self {
        let mut scene = Self {
            nodes: vec![Entry::live(Node::new("svg", None))],
            free: Vec::new(),
            svg: NodeId::new(0, 0),
            container: None,
            container_size: None,
            canvas_size: size(0.0, 0.0),
            client_origin: point(0.0, 0.0),
            measurer: Arc::new(FixedAdvanceMeasurer::default()),
        };
        scene.init_svg_attrs();
        scene
    }

    fn init_svg_attrs(&mut self) {
        let svg = self.svg;
        self.set_attr(svg, "xmlns", "http://www.w3.org/2000/svg");
        self.set_attr(svg, "version", "1.1");
        self.set_attr(svg, "class", "chart-compose");
    }

    pub fn with_container_size(mut self, width: f64, height: f64) -> Self {
        self.container_size = Some(size(width, height));
        self
    }

    pub fn with_client_origin(mut self, x: f64, y: f64) -> Self {
        self.client_origin = point(x, y);
        self
    }

    pub fn with_text_measurer(mut self, measurer: Arc<dyn TextMeasurer + Send + Sync>) -> Self {
        self.measurer = measurer;
        self
    }

    /// Simulates a container resize; takes effect on the next draw.
    pub fn resize_container(&mut self, width: f64, height: f64) {
        self.container_size = Some(size(width, height));
    }

    /// Number of live nodes; removed subtrees are freed.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.index)
            .filter(|e| e.generation == id.generation)?
            .node
            .as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.index)
            .filter(|e| e.generation == id.generation)?
            .node
            .as_mut()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let entry = &mut self.nodes[index];
                entry.node = Some(node);
                NodeId::new(index, entry.generation)
            }
            None => {
                self.nodes.push(Entry::live(node));
                NodeId::new(self.nodes.len() - 1, 0)
            }
        }
    }

    /// Frees `id` and its descendants. Handles to them stop resolving.
    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(entry) = self
                .nodes
                .get_mut(id.index)
                .filter(|e| e.generation == id.generation)
            else {
                continue;
            };
            let Some(node) = entry.node.take() else {
                continue;
            };
            entry.generation = entry.generation.wrapping_add(1);
            self.free.push(id.index);
            stack.extend(node.children);
        }
    }

    pub fn svg_root(&self) -> NodeId {
        self.svg
    }

    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.tag.as_str())
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.node(node)?.text.as_deref()
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Serializes the `svg` root.
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        self.write_node(&mut out, self.svg);
        out
    }

    /// Serializes the container (svg plus overlay layers), or the `svg` root without one.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_node(&mut out, self.container.unwrap_or(self.svg));
        out
    }

    fn write_node(&self, out: &mut String, id: NodeId) {
        let Some(node) = self.node(id) else {
            return;
        };
        let _ = write!(out, "<{}", node.tag);
        for (k, v) in &node.attrs {
            let _ = write!(out, r#" {}="{}""#, k, escape_attr(v));
        }
        if node.children.is_empty() && node.text.is_none() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = &node.text {
            out.push_str(&escape_xml(text));
        }
        for &child in &node.children {
            self.write_node(out, child);
        }
        let _ = write!(out, "</{}>", node.tag);
    }

    fn num_attr(&self, node: NodeId, name: &str) -> f64 {
        self.attr(node, name)
            .and_then(|v| v.trim().trim_end_matches("px").parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    fn detach_from_parent(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != node);
        }
        if let Some(n) = self.node_mut(node) {
            n.parent = None;
        }
    }

    fn content_box(&self, node: NodeId) -> Option<BBox> {
        let n = self.node(node)?;
        if n.attrs.get("display").map(String::as_str) == Some("none") {
            return None;
        }
        match n.tag.as_str() {
            "rect" => Some(BBox::new(
                self.num_attr(node, "x"),
                self.num_attr(node, "y"),
                self.num_attr(node, "width"),
                self.num_attr(node, "height"),
            )),
            "circle" => {
                let r = self.num_attr(node, "r");
                Some(BBox::new(
                    self.num_attr(node, "cx") - r,
                    self.num_attr(node, "cy") - r,
                    2.0 * r,
                    2.0 * r,
                ))
            }
            "line" => {
                let (x1, y1) = (self.num_attr(node, "x1"), self.num_attr(node, "y1"));
                let (x2, y2) = (self.num_attr(node, "x2"), self.num_attr(node, "y2"));
                Some(BBox::new(
                    x1.min(x2),
                    y1.min(y2),
                    (x2 - x1).abs(),
                    (y2 - y1).abs(),
                ))
            }
            "text" => self.text_box(node),
            _ => n
                .children
                .iter()
                .filter_map(|&child| {
                    let b = self.content_box(child)?;
                    Some(match self.attr(child, "transform") {
                        Some(t) => apply_transform(b, t),
                        None => b,
                    })
                })
                .reduce(|a, b| a.union(&b)),
        }
    }

    fn text_box(&self, node: NodeId) -> Option<BBox> {
        let text = self.text(node).filter(|t| !t.is_empty())?;
        let font_size = match self.num_attr(node, "font-size") {
            v if v > 0.0 => v,
            _ => DEFAULT_FONT_SIZE,
        };
        let metrics = self.measurer.measure(text, &TextStyle::sized(font_size));
        let (x, y) = (self.num_attr(node, "x"), self.num_attr(node, "y"));
        let left = match self.attr(node, "text-anchor") {
            Some("middle") => x - metrics.width / 2.0,
            Some("end") => x - metrics.width,
            _ => x,
        };
        let baseline = self
            .attr(node, "dominant-baseline")
            .or_else(|| self.attr(node, "alignment-baseline"));
        let top = match baseline {
            Some("hanging") | Some("before-edge") | Some("text-before-edge") => y,
            Some("middle") | Some("central") => y - metrics.height / 2.0,
            _ => y - metrics.height,
        };
        Some(BBox::new(left, top, metrics.width, metrics.height))
    }
}

impl Surface for Scene {
    fn supports(&self, kind: LayerKind) -> bool {
        kind != LayerKind::Overlay || self.container.is_some()
    }

    fn append_fragment(&mut self, kind: LayerKind, z_index: i32) -> Result<NodeId> {
        let (parent, tag, class) = match kind {
            LayerKind::Chart => (self.svg, "g", "chart-layer"),
            LayerKind::Component => (self.svg, "g", "chart-component-layer"),
            LayerKind::Overlay => {
                let Some(container) = self.container else {
                    return Err(Error::surface(
                        "cannot create an overlay layer on a bare svg root; \
                         host the composition in an HTML container",
                    ));
                };
                (container, "div", "chart-overlay-layer")
            }
        };
        let node = self.append_child(parent, tag);
        self.set_attr(node, "class", class);
        if kind != LayerKind::Overlay {
            self.set_attr(node, "data-zIndex", &z_index.to_string());
        }
        Ok(node)
    }

    fn append_child(&mut self, parent: NodeId, tag: &str) -> NodeId {
        if self.node(parent).is_none() {
            // A handle that never resolves; writes through it are no-ops.
            return NodeId::new(usize::MAX, 0);
        }
        let id = self.alloc(Node::new(tag, Some(parent)));
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        id
    }

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.node_mut(node) {
            n.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(n) = self.node_mut(node) {
            n.attrs.shift_remove(name);
        }
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node)?.attrs.get(name).map(String::as_str)
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.node_mut(node) {
            n.text = Some(text.to_string());
        }
    }

    fn remove(&mut self, node: NodeId) {
        if node == self.svg || Some(node) == self.container {
            return;
        }
        self.detach_from_parent(node);
        self.free_subtree(node);
    }

    fn clear_children(&mut self, node: NodeId) {
        let children = match self.node_mut(node) {
            Some(n) => std::mem::take(&mut n.children),
            None => return,
        };
        for child in children {
            self.free_subtree(child);
        }
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let root = self.container.unwrap_or(self.svg);
        let mut cur = node;
        loop {
            if cur == root {
                return true;
            }
            match self.node(cur).and_then(|n| n.parent) {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    fn bounding_box(&self, node: NodeId) -> std::result::Result<BBox, MeasureError> {
        if !self.is_attached(node) {
            return Err(MeasureError::new("node is not attached"));
        }
        if self.attr(node, "display") == Some("none") {
            return Err(MeasureError::new("node is hidden"));
        }
        Ok(self.content_box(node).unwrap_or_default())
    }

    fn reorder_fragments(&mut self, order: &[NodeId]) {
        for &node in order {
            let Some(parent) = self.node(node).and_then(|n| n.parent) else {
                continue;
            };
            if let Some(p) = self.node_mut(parent) {
                p.children.retain(|&c| c != node);
                p.children.push(node);
            }
        }
    }

    fn set_dimensions(&mut self, width: f64, height: f64, config: &ComposeConfig) {
        self.canvas_size = size(width, height);
        let svg = self.svg;

        if let Some(container) = self.container {
            let container_style = if config.responsive {
                let aspect_ratio = match (config.width, config.height) {
                    (Some(w), Some(h)) if w > 0.0 => h / w,
                    _ => 1.0,
                };
                style([
                    ("width", "100%".to_string()),
                    ("height", "0".to_string()),
                    (
                        "padding-top",
                        format!("{}%", fmt_number(aspect_ratio * 100.0)),
                    ),
                    ("position", "relative".to_string()),
                ])
            } else {
                style([("position", "relative")])
            };
            self.set_attr(container, "style", &container_style);
        }

        match config.view_box() {
            Some(view_box) => self.set_attr(svg, "viewBox", &view_box),
            None => self.remove_attr(svg, "viewBox"),
        }
        match config.preserve_aspect_ratio() {
            Some(v) => self.set_attr(svg, "preserveAspectRatio", v),
            None => self.remove_attr(svg, "preserveAspectRatio"),
        }
        if config.responsive && self.container.is_some() {
            self.set_attr(
                svg,
                "style",
                &style([("position", "absolute"), ("top", "0"), ("left", "0")]),
            );
        } else {
            self.remove_attr(svg, "style");
        }
        if config.responsive {
            self.remove_attr(svg, "width");
            self.remove_attr(svg, "height");
        } else {
            self.set_attr(svg, "width", &fmt_number(width));
            self.set_attr(svg, "height", &fmt_number(height));
        }
    }

    fn container_size(&self) -> Option<Size> {
        self.container_size
    }

    fn client_bounds(&self) -> BBox {
        let rendered = self.container_size.unwrap_or(self.canvas_size);
        BBox::new(
            self.client_origin.x,
            self.client_origin.y,
            rendered.width,
            rendered.height,
        )
    }
}

/// Maps `b` through an SVG transform list (`translate`, `rotate`; other functions are ignored).
pub fn apply_transform(b: BBox, transform: &str) -> BBox {
    let ops = parse_transform(transform);
    if ops.is_empty() {
        return b;
    }
    let mut corners = [
        point(b.left(), b.top()),
        point(b.right(), b.top()),
        point(b.right(), b.bottom()),
        point(b.left(), b.bottom()),
    ];
    for op in ops.iter().rev() {
        for c in &mut corners {
            *c = op.apply(*c);
        }
    }
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for c in corners {
        min_x = min_x.min(c.x);
        min_y = min_y.min(c.y);
        max_x = max_x.max(c.x);
        max_y = max_y.max(c.y);
    }
    BBox::new(min_x, min_y, max_x - min_x, max_y - min_y)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TransformOp {
    Translate(f64, f64),
    Rotate(f64, f64, f64),
}

impl TransformOp {
    fn apply(self, p: Point) -> Point {
        match self {
            TransformOp::Translate(dx, dy) => point(p.x + dx, p.y + dy),
            TransformOp::Rotate(deg, cx, cy) => {
                let (sin, cos) = deg.to_radians().sin_cos();
                let (x, y) = (p.x - cx, p.y - cy);
                point(cx + x * cos - y * sin, cy + x * sin + y * cos)
            }
        }
    }
}

fn parse_transform(transform: &str) -> Vec<TransformOp> {
    let mut out = Vec::new();
    for part in transform.split(')') {
        let Some((name, args)) = part.split_once('(') else {
            continue;
        };
        let args: Vec<f64> = args
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.trim_end_matches("px").parse().ok())
            .collect();
        match (name.trim(), args.as_slice()) {
            ("translate", [x]) => out.push(TransformOp::Translate(*x, 0.0)),
            ("translate", [x, y, ..]) => out.push(TransformOp::Translate(*x, *y)),
            ("rotate", [deg]) => out.push(TransformOp::Rotate(*deg, 0.0, 0.0)),
            ("rotate", [deg, cx, cy, ..]) => out.push(TransformOp::Rotate(*deg, *cx, *cy)),
            _ => {}
        }
    }
    out
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    escape_xml(text)
}
