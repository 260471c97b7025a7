//! Box-model layout: measure components, stack them per edge, place the plot area.

use crate::Result;
use crate::item::{LayoutConstraints, LayoutInfo, RenderContext};
use crate::pool::ItemSlot;
use crate::surface::Surface;
use serde::Serialize;
use serde_json::Value;
use tessera_core::geom::{BBox, translate};
use tessera_core::{Margins, Position};

/// The resolved plot area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ChartPosition {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl ChartPosition {
    /// Insets `canvas_width x canvas_height` by `insets` on each side.
    pub fn from_insets(insets: Margins, canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            top: insets.top,
            right: insets.right,
            bottom: insets.bottom,
            left: insets.left,
            width: canvas_width - insets.right - insets.left,
            height: canvas_height - insets.bottom - insets.top,
        }
    }

    /// Margins plus every edge's accumulated component offsets.
    pub fn from_layout(
        margins: Margins,
        layout: &LayoutResult,
        canvas_width: f64,
        canvas_height: f64,
    ) -> Self {
        let mut insets = margins;
        for position in Position::ALL {
            *insets.get_mut(position) += layout.total_offset(position);
        }
        Self::from_insets(insets, canvas_width, canvas_height)
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(self.left, self.top, self.width, self.height)
    }

    pub fn transform(&self) -> String {
        translate(self.left, self.top)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPart {
    /// Height for top/bottom members, width for left/right members.
    pub offset: f64,
    pub id: String,
}

/// Components per edge, in registration order (closest to the plot area first).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    pub top: Vec<LayoutPart>,
    pub right: Vec<LayoutPart>,
    pub bottom: Vec<LayoutPart>,
    pub left: Vec<LayoutPart>,
}

impl LayoutResult {
    pub fn edge(&self, position: Position) -> &[LayoutPart] {
        match position {
            Position::Top => &self.top,
            Position::Right => &self.right,
            Position::Bottom => &self.bottom,
            Position::Left => &self.left,
        }
    }

    pub fn edge_mut(&mut self, position: Position) -> &mut Vec<LayoutPart> {
        match position {
            Position::Top => &mut self.top,
            Position::Right => &mut self.right,
            Position::Bottom => &mut self.bottom,
            Position::Left => &mut self.left,
        }
    }

    pub fn push(&mut self, info: LayoutInfo, id: impl Into<String>) {
        let offset = if info.position.is_horizontal_band() {
            info.height
        } else {
            info.width
        };
        self.edge_mut(info.position).push(LayoutPart {
            offset,
            id: id.into(),
        });
    }

    pub fn total_offset(&self, position: Position) -> f64 {
        self.edge(position).iter().map(|p| p.offset).sum()
    }

    pub fn is_empty(&self) -> bool {
        Position::ALL.iter().all(|&p| self.edge(p).is_empty())
    }
}

/// Where one component goes.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub constraints: LayoutConstraints,
}

/// Measures every laid-out component.
///
/// `inputs[i]` is the demultiplexed data of `slots[i]`. Each component is prepared (rendered)
/// against the provisional `chart_position`, then asked for its size. A component that cannot
/// be measured contributes a zero offset.
pub fn calculate_layout(
    slots: &mut [ItemSlot],
    inputs: &[Value],
    surface: &mut dyn Surface,
    chart_position: ChartPosition,
) -> Result<LayoutResult> {
    let mut out = LayoutResult::default();

    for (slot, data) in slots.iter_mut().zip(inputs) {
        let Some(position) = slot
            .item
            .positioned()
            .filter(|p| !p.skip_layout())
            .map(|p| p.position())
        else {
            continue;
        };

        let mut ctx = RenderContext {
            surface: &mut *surface,
            layer: slot.layer,
            id: &slot.id,
            chart_position,
        };
        slot.item.prepare_layout(&mut ctx, data)?;

        let info = match slot.item.positioned() {
            Some(p) => p.layout_info(&*surface, slot.layer).unwrap_or_else(|err| {
                tracing::warn!(
                    id = %slot.id,
                    %err,
                    "component measurement failed; using zero size"
                );
                LayoutInfo {
                    position,
                    width: 0.0,
                    height: 0.0,
                }
            }),
            None => continue,
        };
        tracing::trace!(
            id = %slot.id,
            position = %info.position,
            width = info.width,
            height = info.height,
            "component layout info"
        );
        out.push(info, slot.id.clone());
    }

    for position in Position::ALL {
        tracing::debug!(
            edge = %position,
            count = out.edge(position).len(),
            offset = out.total_offset(position),
            "layout edge"
        );
    }
    Ok(out)
}

/// Assigns coordinates edge by edge.
///
/// Top and left members stack outwards from the plot area. Right and bottom members start at
/// the plot edge (`canvas - chart inset`) and each member is shifted by the offset of the one
/// before it.
pub fn apply_layout(
    layout: &LayoutResult,
    chart: &ChartPosition,
    width: f64,
    height: f64,
) -> Vec<Placement> {
    let mut out = Vec::new();

    let mut y = chart.top;
    for part in &layout.top {
        y -= part.offset;
        out.push(Placement {
            id: part.id.clone(),
            x: chart.left,
            y,
            constraints: LayoutConstraints::width(chart.width),
        });
    }

    let mut x = width - chart.right;
    let mut previous = 0.0;
    for part in &layout.right {
        x += previous;
        previous = part.offset;
        out.push(Placement {
            id: part.id.clone(),
            x,
            y: chart.top,
            constraints: LayoutConstraints::height(chart.height),
        });
    }

    let mut y = height - chart.bottom;
    let mut previous = 0.0;
    for part in &layout.bottom {
        y += previous;
        previous = part.offset;
        out.push(Placement {
            id: part.id.clone(),
            x: chart.left,
            y,
            constraints: LayoutConstraints::width(chart.width),
        });
    }

    let mut x = chart.left;
    for part in &layout.left {
        x -= part.offset;
        out.push(Placement {
            id: part.id.clone(),
            x,
            y: chart.top,
            constraints: LayoutConstraints::height(chart.height),
        });
    }

    out
}
