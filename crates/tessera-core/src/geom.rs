#![forbid(unsafe_code)]

//! Geometry helpers shared by the extractor, the layout calculator and label placement.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type Unit = euclid::UnknownUnit;

pub type Point = euclid::Point2D<f64, Unit>;
pub type Size = euclid::Size2D<f64, Unit>;
pub type Rect = euclid::Rect<f64, Unit>;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}

pub fn size(width: f64, height: f64) -> Size {
    euclid::size2(width, height)
}

/// Edge of the canvas a component is stacked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Top,
    Right,
    Bottom,
    Left,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Top,
        Position::Right,
        Position::Bottom,
        Position::Left,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Position::Top => "top",
            Position::Right => "right",
            Position::Bottom => "bottom",
            Position::Left => "left",
        }
    }

    /// Top and bottom components contribute their height; left and right their width.
    pub fn is_horizontal_band(self) -> bool {
        matches!(self, Position::Top | Position::Bottom)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePositionError(pub String);

impl fmt::Display for ParsePositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" is not one of top, right, bottom, left",
            self.0
        )
    }
}

impl std::error::Error for ParsePositionError {}

impl FromStr for Position {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Position::Top),
            "right" => Ok(Position::Right),
            "bottom" => Ok(Position::Bottom),
            "left" => Ok(Position::Left),
            other => Err(ParsePositionError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    pub const ZERO: Margins = Margins {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn get(&self, position: Position) -> f64 {
        match position {
            Position::Top => self.top,
            Position::Right => self.right,
            Position::Bottom => self.bottom,
            Position::Left => self.left,
        }
    }

    pub fn get_mut(&mut self, position: Position) -> &mut f64 {
        match position {
            Position::Top => &mut self.top,
            Position::Right => &mut self.right,
            Position::Bottom => &mut self.bottom,
            Position::Left => &mut self.left,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Margins as written by a caller: a single number for every side, or any subset of sides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarginsSpec {
    Uniform(f64),
    Sides {
        #[serde(default)]
        top: Option<f64>,
        #[serde(default)]
        right: Option<f64>,
        #[serde(default)]
        bottom: Option<f64>,
        #[serde(default)]
        left: Option<f64>,
    },
}

impl MarginsSpec {
    /// Missing sides are taken from `defaults`.
    pub fn resolve(&self, defaults: Margins) -> Margins {
        match *self {
            MarginsSpec::Uniform(v) => Margins::uniform(v),
            MarginsSpec::Sides {
                top,
                right,
                bottom,
                left,
            } => Margins {
                top: top.unwrap_or(defaults.top),
                right: right.unwrap_or(defaults.right),
                bottom: bottom.unwrap_or(defaults.bottom),
                left: left.unwrap_or(defaults.left),
            },
        }
    }

    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        MarginsSpec::deserialize(value).ok()
    }
}

impl From<f64> for MarginsSpec {
    fn from(v: f64) -> Self {
        MarginsSpec::Uniform(v)
    }
}

impl From<Margins> for MarginsSpec {
    fn from(m: Margins) -> Self {
        MarginsSpec::Sides {
            top: Some(m.top),
            right: Some(m.right),
            bottom: Some(m.bottom),
            left: Some(m.left),
        }
    }
}

/// Axis-aligned bounding box in surface coordinates (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn x_center(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn size(&self) -> Size {
        size(self.width, self.height)
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BBox::new(left, top, right - left, bottom - top)
    }

    /// Left/right ranges intersect; `other` fully spanning `self` counts.
    pub fn overlaps_horizontally(&self, other: &BBox) -> bool {
        let (a, b) = (self, other);
        let contained = b.left() < a.left() && b.right() > a.right();
        (b.left() >= a.left() && b.left() < a.right())
            || (b.right() > a.left() && b.right() <= a.right())
            || contained
    }

    /// Top/bottom ranges intersect; `other` fully spanning `self` counts.
    pub fn overlaps_vertically(&self, other: &BBox) -> bool {
        let (a, b) = (self, other);
        let contained = b.top() < a.top() && b.bottom() > a.bottom();
        (b.top() >= a.top() && b.top() < a.bottom())
            || (b.bottom() > a.top() && b.bottom() <= a.bottom())
            || contained
    }

    pub fn overlaps(&self, other: &BBox) -> bool {
        self.overlaps_horizontally(other) && self.overlaps_vertically(other)
    }
}

impl From<Rect> for BBox {
    fn from(r: Rect) -> Self {
        BBox::new(r.origin.x, r.origin.y, r.size.width, r.size.height)
    }
}

impl From<BBox> for Rect {
    fn from(b: BBox) -> Self {
        Rect::new(point(b.x, b.y), size(b.width, b.height))
    }
}

/// Formats a number the way JS `Number#toString()` does, without `-0` or float noise.
pub fn fmt_number(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut v = if v.abs() < 1e-9 { 0.0 } else { v };
    let nearest = v.round();
    if (v - nearest).abs() < 1e-6 {
        v = nearest;
    }
    if v == 0.0 {
        return "0".to_string();
    }
    let mut buf = ryu_js::Buffer::new();
    buf.format_finite(v).to_string()
}

pub fn translate(x: f64, y: f64) -> String {
    format!("translate({}, {})", fmt_number(x), fmt_number(y))
}

pub fn rotate(degrees: f64, center: Option<Point>) -> String {
    match center {
        Some(c) => format!(
            "rotate({} {},{})",
            fmt_number(degrees),
            fmt_number(c.x),
            fmt_number(c.y)
        ),
        None => format!("rotate({})", fmt_number(degrees)),
    }
}

/// `[("color", "red"), ("display", "block")]` -> `color: red; display: block;`
pub fn style<K, V>(styles: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let parts = styles
        .into_iter()
        .map(|(k, v)| format!("{}: {}", k.as_ref(), v.as_ref()))
        .collect::<Vec<_>>();
    if parts.is_empty() {
        String::new()
    } else {
        format!("{};", parts.join("; "))
    }
}
