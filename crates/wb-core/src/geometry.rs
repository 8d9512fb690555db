//! Axis-aligned box math shared by layout, hit testing, and selection.
//!
//! Edge conventions:
//! - [`Bounds::intersects`] requires strict overlap on both axes. Boxes that
//!   only touch along an edge do not intersect, and a box with zero width or
//!   height intersects nothing (not even itself).
//! - [`Bounds::contains`] is half-open: inclusive on the min edges, exclusive
//!   on the max edges, so a point on a shared border belongs to exactly one of
//!   two adjacent boxes.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Errors from the pure geometry helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("cannot combine the bounds of zero boxes")]
    EmptyInput,
}

/// A point in the root coordinate space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Four-sided values in CSS order (top, right, bottom, left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sides<T> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T: Copy> Sides<T> {
    pub const fn all(v: T) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    /// Vertical, horizontal (the two-value CSS shorthand).
    pub const fn symmetric(vertical: T, horizontal: T) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Sides<U> {
        Sides {
            top: f(self.top),
            right: f(self.right),
            bottom: f(self.bottom),
            left: f(self.left),
        }
    }
}

/// Resolved pixel edges (padding, border, or margin widths).
pub type Edges = Sides<f32>;

impl Edges {
    pub const ZERO: Edges = Sides::all(0.0);

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// An axis-aligned rectangle in the root coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle spanned by two corner points in any order
    /// (a drag from bottom-right to top-left yields the same box).
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Zero width or zero height.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Half-open point containment.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Strict overlap; degenerate boxes never intersect.
    pub fn intersects(&self, other: &Bounds) -> bool {
        if self.is_degenerate() || other.is_degenerate() {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Whether `other` lies entirely inside `self` (edges may coincide).
    pub fn encloses(&self, other: &Bounds) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Bounds::new(x, y, right - x, bottom - y)
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Bounds {
        Bounds::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Shrink by `edges`, clamping the size at zero.
    pub fn inset(&self, edges: &Edges) -> Bounds {
        Bounds::new(
            self.x + edges.left,
            self.y + edges.top,
            (self.width - edges.horizontal()).max(0.0),
            (self.height - edges.vertical()).max(0.0),
        )
    }

    /// Grow by `edges` (negative margins may shrink the box; size clamps at zero).
    pub fn outset(&self, edges: &Edges) -> Bounds {
        Bounds::new(
            self.x - edges.left,
            self.y - edges.top,
            (self.width + edges.horizontal()).max(0.0),
            (self.height + edges.vertical()).max(0.0),
        )
    }
}

/// `intersects(a, b)` from the selection contract; see [`Bounds::intersects`].
pub fn intersects(a: &Bounds, b: &Bounds) -> bool {
    a.intersects(b)
}

/// `union(a, b)`; see [`Bounds::union`].
pub fn union(a: &Bounds, b: &Bounds) -> Bounds {
    a.union(b)
}

/// `contains(outer, point)`; see [`Bounds::contains`].
pub fn contains(outer: &Bounds, point: Point) -> bool {
    outer.contains(point)
}

/// Left fold of [`union`] over `boxes`.
pub fn combine_bounds<'a, I>(boxes: I) -> Result<Bounds, GeometryError>
where
    I: IntoIterator<Item = &'a Bounds>,
{
    let mut iter = boxes.into_iter();
    let first = *iter.next().ok_or(GeometryError::EmptyInput)?;
    Ok(iter.fold(first, |acc, b| acc.union(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(x: f32, y: f32, w: f32, h: f32) -> Bounds {
        Bounds::new(x, y, w, h)
    }

    #[test]
    fn self_overlap_except_degenerate() {
        let boxes = [b(0.0, 0.0, 10.0, 10.0), b(-5.0, 3.0, 0.5, 100.0)];
        for a in &boxes {
            assert!(intersects(a, a), "{a:?} should overlap itself");
        }

        let flat = b(10.0, 10.0, 0.0, 20.0);
        let line = b(10.0, 10.0, 20.0, 0.0);
        assert!(!intersects(&flat, &flat));
        assert!(!intersects(&line, &line));
        assert!(!intersects(&flat, &b(0.0, 0.0, 100.0, 100.0)));
    }

    #[test]
    fn edge_touching_is_not_overlap() {
        let left = b(0.0, 0.0, 10.0, 10.0);
        let right = b(10.0, 0.0, 10.0, 10.0);
        let below = b(0.0, 10.0, 10.0, 10.0);
        assert!(!intersects(&left, &right));
        assert!(!intersects(&left, &below));
        assert!(intersects(&left, &b(9.5, 9.5, 10.0, 10.0)));
    }

    #[test]
    fn contains_is_half_open() {
        let a = b(0.0, 0.0, 10.0, 10.0);
        assert!(contains(&a, Point::new(0.0, 0.0)));
        assert!(contains(&a, Point::new(9.99, 9.99)));
        assert!(!contains(&a, Point::new(10.0, 5.0)));
        assert!(!contains(&a, Point::new(5.0, 10.0)));

        // A point on a shared border belongs to exactly one neighbour.
        let right = b(10.0, 0.0, 10.0, 10.0);
        let p = Point::new(10.0, 5.0);
        assert_eq!(contains(&a, p) as u8 + contains(&right, p) as u8, 1);
    }

    #[test]
    fn combine_bounds_is_minimal_cover() {
        let boxes = vec![
            b(10.0, 20.0, 5.0, 5.0),
            b(-4.0, 30.0, 2.0, 10.0),
            b(0.0, 0.0, 1.0, 1.0),
        ];
        let all = combine_bounds(&boxes).unwrap();
        for part in &boxes {
            assert!(all.encloses(part), "{all:?} does not enclose {part:?}");
        }
        // Every edge is touched by some input box, so no smaller box works.
        assert_eq!(all.x, -4.0);
        assert_eq!(all.y, 0.0);
        assert_eq!(all.right(), 15.0);
        assert_eq!(all.bottom(), 40.0);
    }

    #[test]
    fn combine_bounds_single_box_is_identity() {
        let only = b(3.0, 4.0, 5.0, 6.0);
        assert_eq!(combine_bounds([&only]).unwrap(), only);
    }

    #[test]
    fn combine_bounds_empty_fails() {
        let none: Vec<Bounds> = Vec::new();
        assert_eq!(combine_bounds(&none), Err(GeometryError::EmptyInput));
    }

    #[test]
    fn from_corners_normalizes() {
        let r = Bounds::from_corners(Point::new(50.0, 40.0), Point::new(10.0, 0.0));
        assert_eq!(r, b(10.0, 0.0, 40.0, 40.0));
    }

    #[test]
    fn inset_clamps_at_zero() {
        let r = b(0.0, 0.0, 10.0, 10.0).inset(&Sides::all(8.0));
        assert_eq!(r, b(8.0, 8.0, 0.0, 0.0));
    }
}
