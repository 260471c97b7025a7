//! Pointer translation from client coordinates to plot-area coordinates.

use crate::layout::ChartPosition;
use tessera_core::BBox;
use tessera_core::geom::{Point, point};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerCoordinates {
    /// Position in canvas units.
    pub container: Point,
    /// Position relative to the plot area, clamped to `[0, width] x [0, height]`.
    pub chart: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Enter(PointerCoordinates),
    Move(PointerCoordinates),
    Leave,
}

/// Geometry snapshot read by pointer callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerGeometry {
    pub chart: ChartPosition,
    /// Client-space bounds of the drawing root.
    pub bounds: BBox,
    /// Canvas units per client pixel, per axis.
    pub scale: (f64, f64),
}

impl PointerGeometry {
    pub fn contains(&self, client: Point) -> bool {
        self.bounds.contains_point(client)
    }

    pub fn to_canvas(&self, client: Point) -> Point {
        point(
            (client.x - self.bounds.x) * self.scale.0,
            (client.y - self.bounds.y) * self.scale.1,
        )
    }

    pub fn translate(&self, client: Point) -> PointerCoordinates {
        translate_to_chart(self.to_canvas(client), &self.chart)
    }
}

/// Subtracts the plot origin and clamps to the plot size.
pub fn translate_to_chart(container: Point, chart: &ChartPosition) -> PointerCoordinates {
    let chart_x = if container.x > chart.left + chart.width {
        chart.width
    } else if container.x < chart.left {
        0.0
    } else {
        container.x - chart.left
    };
    let chart_y = if container.y > chart.top + chart.height {
        chart.height
    } else if container.y < chart.top {
        0.0
    } else {
        container.y - chart.top
    };
    PointerCoordinates {
        container,
        chart: point(chart_x, chart_y),
    }
}

/// Enter/move/leave state machine over cached geometry.
///
/// Geometry is re-read on every enter and whenever the cache was invalidated (after a draw).
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    cached: Option<PointerGeometry>,
    was_inside: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn is_inside(&self) -> bool {
        self.was_inside
    }

    pub fn enter(
        &mut self,
        client: Point,
        geometry: impl FnOnce() -> PointerGeometry,
    ) -> Option<PointerEvent> {
        let g = geometry();
        self.cached = Some(g);
        self.was_inside = g.contains(client);
        self.was_inside
            .then(|| PointerEvent::Enter(g.translate(client)))
    }

    pub fn move_to(
        &mut self,
        client: Point,
        geometry: impl FnOnce() -> PointerGeometry,
    ) -> Option<PointerEvent> {
        let g = *self.cached.get_or_insert_with(geometry);
        let inside = g.contains(client);
        let event = match (self.was_inside, inside) {
            (true, true) => Some(PointerEvent::Move(g.translate(client))),
            (true, false) => Some(PointerEvent::Leave),
            (false, true) => Some(PointerEvent::Enter(g.translate(client))),
            (false, false) => None,
        };
        self.was_inside = inside;
        event
    }

    pub fn leave(&mut self) -> Option<PointerEvent> {
        if self.was_inside {
            self.was_inside = false;
            Some(PointerEvent::Leave)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> ChartPosition {
        ChartPosition {
            top: 50.0,
            right: 10.0,
            bottom: 10.0,
            left: 10.0,
            width: 380.0,
            height: 240.0,
        }
    }

    fn geometry() -> PointerGeometry {
        PointerGeometry {
            chart: chart(),
            bounds: BBox::new(100.0, 100.0, 400.0, 300.0),
            scale: (1.0, 1.0),
        }
    }

    #[test]
    fn coordinates_outside_the_plot_are_clamped() {
        let left = translate_to_chart(point(2.0, 60.0), &chart());
        assert_eq!(left.chart, point(0.0, 10.0));
        let right = translate_to_chart(point(395.0, 400.0), &chart());
        assert_eq!(right.chart, point(380.0, 240.0));
        let inside = translate_to_chart(point(110.0, 150.0), &chart());
        assert_eq!(inside.chart, point(100.0, 100.0));
    }

    #[test]
    fn enter_move_leave_sequence() {
        let mut tracker = PointerTracker::new();
        assert!(tracker.enter(point(50.0, 50.0), geometry).is_none());
        assert!(!tracker.is_inside());
        assert!(matches!(
            tracker.move_to(point(150.0, 200.0), geometry),
            Some(PointerEvent::Enter(c)) if c.chart == point(40.0, 50.0)
        ));
        assert!(tracker.is_inside());
        assert!(matches!(
            tracker.move_to(point(160.0, 200.0), geometry),
            Some(PointerEvent::Move(_))
        ));
        assert_eq!(tracker.move_to(point(900.0, 0.0), geometry), Some(PointerEvent::Leave));
        assert!(!tracker.is_inside());
        assert_eq!(tracker.leave(), None);
    }

    #[test]
    fn client_pixels_are_scaled_to_canvas_units() {
        let g = PointerGeometry {
            scale: (2.0, 2.0),
            ..geometry()
        };
        assert_eq!(g.to_canvas(point(150.0, 125.0)), point(100.0, 50.0));
    }
}
