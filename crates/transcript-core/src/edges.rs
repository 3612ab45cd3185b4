//! Ruling edges for table detection.
//!
//! Edges are axis-aligned segments recovered from stroked lines and from
//! the sides of rectangles (cell borders drawn with `re`, thin filled bars).

use crate::geometry::{BBox, Orientation};

/// Primitive an edge was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSource {
    /// A stroked path segment.
    Line,
    /// One side of a rectangle.
    Rect,
}

/// An axis-aligned segment in top-left page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
    pub orientation: Orientation,
    pub source: EdgeSource,
}

impl Edge {
    /// Horizontal edge at `y` spanning `[x0, x1]` (endpoints may be given in any order).
    pub fn horizontal(x0: f64, x1: f64, y: f64, source: EdgeSource) -> Self {
        Self {
            x0: x0.min(x1),
            top: y,
            x1: x0.max(x1),
            bottom: y,
            orientation: Orientation::Horizontal,
            source,
        }
    }

    /// Vertical edge at `x` spanning `[top, bottom]` (endpoints may be given in any order).
    pub fn vertical(x: f64, top: f64, bottom: f64, source: EdgeSource) -> Self {
        Self {
            x0: x,
            top: top.min(bottom),
            x1: x,
            bottom: top.max(bottom),
            orientation: Orientation::Vertical,
            source,
        }
    }

    /// Build an edge from a straight segment, or `None` if the segment is
    /// diagonal beyond `slop`.
    pub fn from_segment(
        (ax, ay): (f64, f64),
        (bx, by): (f64, f64),
        slop: f64,
        source: EdgeSource,
    ) -> Option<Self> {
        if (ay - by).abs() <= slop {
            Some(Self::horizontal(ax, bx, (ay + by) / 2.0, source))
        } else if (ax - bx).abs() <= slop {
            Some(Self::vertical((ax + bx) / 2.0, ay, by, source))
        } else {
            None
        }
    }

    /// Length along the edge's axis.
    pub fn length(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.x1 - self.x0,
            Orientation::Vertical => self.bottom - self.top,
        }
    }
}

/// The four sides of a rectangle: top, bottom, left, right.
pub fn edges_from_rect(rect: &BBox) -> [Edge; 4] {
    [
        Edge::horizontal(rect.x0, rect.x1, rect.top, EdgeSource::Rect),
        Edge::horizontal(rect.x0, rect.x1, rect.bottom, EdgeSource::Rect),
        Edge::vertical(rect.x0, rect.top, rect.bottom, EdgeSource::Rect),
        Edge::vertical(rect.x1, rect.top, rect.bottom, EdgeSource::Rect),
    ]
}
