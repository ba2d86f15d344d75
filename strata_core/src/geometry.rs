// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer boxes in output or scene space.
//!
//! [`Geometry`] is the integer-origin rectangle used for bounding boxes and
//! damage. Floating-point positions use [`kurbo::Point`]; conversion from
//! floating point always rounds outward so a box never under-covers the
//! pixels it describes.

use core::fmt;

use kurbo::{Point, Rect};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Coordinates closer than this to an integer are treated as that integer
/// before outward rounding.
///
/// Rotations by multiples of 90° produce values like `-3e-16` that would
/// otherwise floor to `-1` and grow a box by a whole pixel.
pub const SNAP_EPSILON: f64 = 1e-6;

/// An axis-aligned integer rectangle.
///
/// The origin may be negative. A box with non-positive width or height is
/// empty.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Geometry {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Geometry {
    /// Creates a box from its origin and size.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a box from its left, top, right, and bottom edges.
    #[inline]
    #[must_use]
    pub const fn from_edges(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Returns `true` if the box covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> i32 {
        self.y + self.height
    }

    /// Number of pixels covered.
    #[inline]
    #[must_use]
    pub const fn area(self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }

    /// Returns `true` if the two boxes share at least one pixel.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        !(self.is_empty()
            || other.is_empty()
            || self.right() <= other.x
            || other.right() <= self.x
            || self.bottom() <= other.y
            || other.bottom() <= self.y)
    }

    /// Returns the overlap of the two boxes, or `None` if they do not overlap.
    #[must_use]
    pub fn intersection(self, other: Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self::from_edges(
            self.x.max(other.x),
            self.y.max(other.y),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        ))
    }

    /// Returns the smallest box containing both boxes. Empty boxes are ignored.
    #[must_use]
    pub fn union_bounds(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Returns `true` if the point lies inside the box.
    ///
    /// The left and top edges are inclusive, the right and bottom edges are
    /// exclusive.
    #[must_use]
    pub fn contains_point(self, p: Point) -> bool {
        !self.is_empty()
            && p.x >= f64::from(self.x)
            && p.x < f64::from(self.right())
            && p.y >= f64::from(self.y)
            && p.y < f64::from(self.bottom())
    }

    /// Returns the box moved by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn translated(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            width: self.width,
            height: self.height,
        }
    }

    /// Scales the box, flooring the origin and ceiling the far edges.
    ///
    /// Both edges are scaled independently (rather than the size) so that
    /// adjacent boxes stay adjacent after scaling.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "scaled output coordinates fit in i32"
    )]
    pub fn scaled(self, scale: f64) -> Self {
        let x1 = (f64::from(self.x) * scale).floor() as i32;
        let y1 = (f64::from(self.y) * scale).floor() as i32;
        let x2 = (f64::from(self.right()) * scale).ceil() as i32;
        let y2 = (f64::from(self.bottom()) * scale).ceil() as i32;
        Self::from_edges(x1, y1, x2, y2)
    }

    /// The geometric center of the box.
    #[must_use]
    pub fn center(self) -> Point {
        Point::new(
            f64::from(self.x) + f64::from(self.width) / 2.0,
            f64::from(self.y) + f64::from(self.height) / 2.0,
        )
    }

    /// The four corners in the order top-left, top-right, bottom-left,
    /// bottom-right.
    #[must_use]
    pub fn corners(self) -> [Point; 4] {
        let (x1, y1) = (f64::from(self.x), f64::from(self.y));
        let (x2, y2) = (f64::from(self.right()), f64::from(self.bottom()));
        [
            Point::new(x1, y1),
            Point::new(x2, y1),
            Point::new(x1, y2),
            Point::new(x2, y2),
        ]
    }

    /// Converts to a floating-point rectangle.
    #[must_use]
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.right()),
            f64::from(self.bottom()),
        )
    }

    /// Returns the smallest integer box containing `rect`.
    #[must_use]
    pub fn enclosing_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::enclosing([Point::new(rect.x0, rect.y0), Point::new(rect.x1, rect.y1)])
    }

    /// Returns the smallest integer box containing every point.
    ///
    /// Extremes are floored (minimum) and ceiled (maximum) after snapping
    /// values within [`SNAP_EPSILON`] of an integer. The snap can pull an edge
    /// inward by less than `SNAP_EPSILON`, which is treated as rounding noise
    /// rather than coverage; anything farther from an integer always rounds
    /// outward. An empty input yields an empty box at the origin.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "rounded scene coordinates fit in i32"
    )]
    pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::default();
        };
        let (mut x1, mut y1, mut x2, mut y2) = (first.x, first.y, first.x, first.y);
        for p in iter {
            x1 = x1.min(p.x);
            y1 = y1.min(p.y);
            x2 = x2.max(p.x);
            y2 = y2.max(p.y);
        }
        Self::from_edges(
            snap(x1).floor() as i32,
            snap(y1).floor() as i32,
            snap(x2).ceil() as i32,
            snap(y2).ceil() as i32,
        )
    }
}

impl fmt::Debug for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Geometry({},{} {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Rounds `v` to the nearest integer if it is within [`SNAP_EPSILON`] of it.
fn snap(v: f64) -> f64 {
    let nearest = (v + 0.5).floor();
    if (v - nearest).abs() < SNAP_EPSILON {
        nearest
    } else {
        v
    }
}
