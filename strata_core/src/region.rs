// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage and visibility regions.
//!
//! A [`Region`] is a set of pixels stored as disjoint [`Geometry`] boxes.
//! Every operation keeps the box list normalized: no pixel is covered by two
//! boxes, and empty boxes are never stored. Two regions compare equal when
//! they cover the same pixels, regardless of how those pixels are split into
//! boxes.

use alloc::vec::Vec;
use core::ops::{BitAnd, BitOr, BitOrAssign, Sub};

use kurbo::Point;

use crate::geometry::Geometry;
use crate::output::OutputTransform;

/// A normalized set of disjoint integer boxes.
#[derive(Clone, Debug, Default)]
pub struct Region {
    rects: Vec<Geometry>,
}

impl Region {
    /// Creates an empty region.
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Creates a region covering a single box.
    #[must_use]
    pub fn from_rect(rect: Geometry) -> Self {
        let mut region = Self::new();
        region.union_rect(rect);
        region
    }

    /// Creates a region covering the union of the given boxes.
    #[must_use]
    pub fn from_rects(rects: impl IntoIterator<Item = Geometry>) -> Self {
        let mut region = Self::new();
        for rect in rects {
            region.union_rect(rect);
        }
        region
    }

    /// The disjoint boxes making up the region, in no particular order.
    #[must_use]
    pub fn rects(&self) -> &[Geometry] {
        &self.rects
    }

    /// Returns `true` if the region covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Removes every box.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Number of pixels covered.
    #[must_use]
    pub fn area(&self) -> i64 {
        self.rects.iter().map(|r| r.area()).sum()
    }

    /// The bounding box of the region, or an empty box if the region is empty.
    #[must_use]
    pub fn extents(&self) -> Geometry {
        self.rects
            .iter()
            .fold(Geometry::default(), |acc, r| acc.union_bounds(*r))
    }

    /// Returns `true` if the point lies inside one of the boxes.
    #[must_use]
    pub fn contains_point(&self, p: Point) -> bool {
        self.rects.iter().any(|r| r.contains_point(p))
    }

    /// Adds a box to the region.
    pub fn union_rect(&mut self, rect: Geometry) {
        if rect.is_empty() {
            return;
        }
        let mut pieces = alloc::vec![rect];
        for existing in &self.rects {
            let mut next = Vec::with_capacity(pieces.len());
            for piece in pieces {
                subtract_rect_into(piece, *existing, &mut next);
            }
            pieces = next;
            if pieces.is_empty() {
                return;
            }
        }
        self.rects.extend(pieces);
    }

    /// Adds every box of `other` to the region.
    pub fn union(&mut self, other: &Self) {
        for rect in &other.rects {
            self.union_rect(*rect);
        }
    }

    /// Returns the pixels covered by both regions.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let mut rects = Vec::new();
        for a in &self.rects {
            for b in &other.rects {
                if let Some(i) = a.intersection(*b) {
                    rects.push(i);
                }
            }
        }
        // Pairwise intersections of two disjoint sets are already disjoint.
        Self { rects }
    }

    /// Returns the pixels of the region inside `rect`.
    #[must_use]
    pub fn intersect_rect(&self, rect: Geometry) -> Self {
        Self {
            rects: self
                .rects
                .iter()
                .filter_map(|r| r.intersection(rect))
                .collect(),
        }
    }

    /// Returns the pixels of the region not covered by `other`.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        let mut rects = Vec::new();
        for a in &self.rects {
            let mut pieces = alloc::vec![*a];
            for b in &other.rects {
                let mut next = Vec::with_capacity(pieces.len());
                for piece in pieces {
                    subtract_rect_into(piece, *b, &mut next);
                }
                pieces = next;
                if pieces.is_empty() {
                    break;
                }
            }
            rects.extend(pieces);
        }
        Self { rects }
    }

    /// Returns the pixels of the region outside `rect`.
    #[must_use]
    pub fn subtract_rect(&self, rect: Geometry) -> Self {
        let mut rects = Vec::new();
        for a in &self.rects {
            subtract_rect_into(*a, rect, &mut rects);
        }
        Self { rects }
    }

    /// Moves every box by `(dx, dy)`.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        for r in &mut self.rects {
            *r = r.translated(dx, dy);
        }
    }

    /// Returns a copy moved by `(dx, dy)`.
    #[must_use]
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        let mut out = self.clone();
        out.translate(dx, dy);
        out
    }

    /// Scales every box with [`Geometry::scaled`].
    ///
    /// Outward rounding can make neighbouring boxes overlap, so the result is
    /// rebuilt through [`union_rect`](Self::union_rect).
    #[must_use]
    pub fn scaled(&self, scale: f64) -> Self {
        if scale == 1.0 {
            return self.clone();
        }
        Self::from_rects(self.rects.iter().map(|r| r.scaled(scale)))
    }

    /// Maps the region through an output transform, where `width` and
    /// `height` are the size of the untransformed area.
    #[must_use]
    pub fn transformed(&self, transform: OutputTransform, width: i32, height: i32) -> Self {
        if transform == OutputTransform::Normal {
            return self.clone();
        }
        Self {
            rects: self
                .rects
                .iter()
                .map(|r| transform.apply(*r, width, height))
                .collect(),
        }
    }
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        self.area() == other.area() && self.subtract(other).is_empty()
    }
}

impl Eq for Region {}

impl From<Geometry> for Region {
    fn from(rect: Geometry) -> Self {
        Self::from_rect(rect)
    }
}

impl BitOrAssign<&Region> for Region {
    fn bitor_assign(&mut self, rhs: &Region) {
        self.union(rhs);
    }
}

impl BitOrAssign<Geometry> for Region {
    fn bitor_assign(&mut self, rhs: Geometry) {
        self.union_rect(rhs);
    }
}

impl BitOr for &Region {
    type Output = Region;

    fn bitor(self, rhs: Self) -> Region {
        let mut out = self.clone();
        out.union(rhs);
        out
    }
}

impl BitAnd for &Region {
    type Output = Region;

    fn bitand(self, rhs: Self) -> Region {
        self.intersect(rhs)
    }
}

impl Sub for &Region {
    type Output = Region;

    fn sub(self, rhs: Self) -> Region {
        self.subtract(rhs)
    }
}

/// Pushes the parts of `a` outside `b` (at most four boxes) onto `out`.
fn subtract_rect_into(a: Geometry, b: Geometry, out: &mut Vec<Geometry>) {
    let Some(i) = a.intersection(b) else {
        out.push(a);
        return;
    };
    if i.y > a.y {
        out.push(Geometry::from_edges(a.x, a.y, a.right(), i.y));
    }
    if i.bottom() < a.bottom() {
        out.push(Geometry::from_edges(a.x, i.bottom(), a.right(), a.bottom()));
    }
    if i.x > a.x {
        out.push(Geometry::from_edges(a.x, i.y, i.x, i.bottom()));
    }
    if i.right() < a.right() {
        out.push(Geometry::from_edges(i.right(), i.y, a.right(), i.bottom()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(x: i32, y: i32, w: i32, h: i32) -> Geometry {
        Geometry::new(x, y, w, h)
    }

    fn assert_disjoint(r: &Region) {
        let rects = r.rects();
        for (i, a) in rects.iter().enumerate() {
            assert!(!a.is_empty(), "empty box stored");
            for b in &rects[i + 1..] {
                assert!(!a.intersects(*b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn union_of_overlapping_boxes_is_disjoint() {
        let mut r = Region::from_rect(g(0, 0, 10, 10));
        r.union_rect(g(5, 5, 10, 10));
        assert_disjoint(&r);
        assert_eq!(r.area(), 100 + 100 - 25);
        assert_eq!(r.extents(), g(0, 0, 15, 15));
    }

    #[test]
    fn union_of_contained_box_is_noop() {
        let mut r = Region::from_rect(g(0, 0, 10, 10));
        r.union_rect(g(2, 2, 3, 3));
        assert_eq!(r.rects().len(), 1);
    }

    #[test]
    fn subtract_punches_hole() {
        let r = Region::from_rect(g(0, 0, 10, 10));
        let hole = Region::from_rect(g(3, 3, 4, 4));
        let d = r.subtract(&hole);
        assert_disjoint(&d);
        assert_eq!(d.area(), 100 - 16);
        assert!(!d.contains_point(Point::new(5.0, 5.0)));
        assert!(d.contains_point(Point::new(1.0, 1.0)));
    }

    #[test]
    fn intersect_keeps_overlap_only() {
        let a = Region::from_rects([g(0, 0, 10, 10), g(20, 0, 10, 10)]);
        let b = Region::from_rect(g(5, 5, 20, 20));
        let i = &a & &b;
        assert_eq!(i, Region::from_rects([g(5, 5, 5, 5), g(20, 5, 5, 5)]));
    }

    #[test]
    fn empty_region_is_union_identity() {
        let a = Region::from_rects([g(0, 0, 4, 4), g(10, 10, 2, 2)]);
        let e = Region::new();
        assert_eq!(&a | &e, a);
        assert_eq!(&e | &a, a);
    }

    #[test]
    fn set_operations_are_associative() {
        let a = Region::from_rects([g(0, 0, 10, 10), g(30, 0, 5, 5)]);
        let b = Region::from_rect(g(5, 5, 10, 10));
        let c = Region::from_rects([g(8, 0, 4, 20), g(32, 2, 10, 10)]);

        assert_eq!(&(&a | &b) | &c, &a | &(&b | &c));
        assert_eq!(&(&a & &b) & &c, &a & &(&b & &c));
        // Subtraction: (a - b) - c == a - (b | c).
        assert_eq!(&(&a - &b) - &c, &a - &(&b | &c));
    }

    #[test]
    fn equality_ignores_box_split() {
        let whole = Region::from_rect(g(0, 0, 10, 10));
        let halves = Region::from_rects([g(0, 0, 5, 10), g(5, 0, 5, 10)]);
        assert_eq!(whole, halves);
        assert_ne!(whole, Region::from_rect(g(0, 0, 10, 9)));
    }

    #[test]
    fn scaled_region_stays_disjoint() {
        let r = Region::from_rects([g(0, 0, 1, 1), g(1, 0, 1, 1)]);
        let s = r.scaled(1.5);
        assert_disjoint(&s);
        assert_eq!(s.extents(), g(0, 0, 3, 2));
    }

    #[test]
    fn translate_moves_every_box() {
        let r = Region::from_rects([g(0, 0, 2, 2), g(5, 5, 1, 1)]).translated(-1, 3);
        assert_eq!(r, Region::from_rects([g(-1, 3, 2, 2), g(4, 8, 1, 1)]));
    }

    #[test]
    fn transformed_rotates_boxes() {
        let r = Region::from_rect(g(0, 0, 10, 2));
        let t = r.transformed(OutputTransform::Rotate90, 10, 20);
        assert_eq!(t, Region::from_rect(Geometry::from_edges(18, 0, 20, 10)));
    }
}
