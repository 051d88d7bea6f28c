use serde::Serialize;

/// Axis-aligned box in normalized page coordinates.
///
/// The `(top, left)` corner is the reference point for every distance and
/// offset in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BoundingBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn anchor(&self) -> Position {
        Position {
            top: self.top,
            left: self.left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

impl Position {
    pub fn component_min(self, other: Position) -> Position {
        Position {
            top: self.top.min(other.top),
            left: self.left.min(other.left),
        }
    }
}

/// Separating-axis test. Boxes that only touch along an edge overlap.
pub fn overlaps(a: &BoundingBox, b: &BoundingBox) -> bool {
    !(a.right() < b.left || b.right() < a.left || a.bottom() < b.top || b.bottom() < a.top)
}

pub fn overlap_area(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let width = (a.right().min(b.right()) - a.left.max(b.left)).max(0.0);
    let height = (a.bottom().min(b.bottom()) - a.top.max(b.top)).max(0.0);
    width * height
}

/// Euclidean distance between the `(top, left)` anchors, not the centers.
pub fn distance(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let vertical = a.top - b.top;
    let horizontal = a.left - b.left;
    (vertical * vertical + horizontal * horizontal).sqrt()
}
