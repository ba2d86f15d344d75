// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometric transforms applied by transformer nodes.
//!
//! A transformer maps the coordinate space of its children (local space) into
//! the coordinate space of its parent (global space). Two variants exist:
//!
//! - [`View2d`]: rotation about the subject's center, non-uniform scale, and
//!   translation.
//! - [`View3d`]: a perspective projection of the children rotated in 3-D
//!   around their center, with content-size dependent depth scaling.
//!
//! Both implement [`NodeTransform`], the capability interface the scene graph
//! dispatches through. [`Transformer`] is the closed set of variants stored in
//! the graph.

use kurbo::Point;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::geometry::Geometry;
use crate::region::Region;
use crate::transform::Transform3d;

/// Boxes a transformer needs to evaluate its mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransformFrame {
    /// Untransformed geometry of the subject the chain is attached to. 2-D
    /// rotation and scaling pivot around its center.
    pub subject: Geometry,
    /// Bounding box of the transformer's children, in local space.
    pub children: Geometry,
}

/// Point mapping, bounding box, and damage capabilities of a transform.
pub trait NodeTransform {
    /// Maps a point from local (children) space to global (parent) space.
    fn to_global(&self, frame: &TransformFrame, p: Point) -> Point;

    /// Maps a point from global space back to local space.
    ///
    /// Returns `None` when the transform is too close to singular to invert,
    /// e.g. a 3-D view rotated edge-on. Callers such as hit-testing treat this
    /// as "outside".
    fn to_local(&self, frame: &TransformFrame, p: Point) -> Option<Point>;

    /// Returns `true` if axis-aligned boxes stay axis-aligned, so mapping
    /// damage box-by-box is exact enough to use.
    fn is_linear(&self) -> bool;

    /// Smallest integer box containing the image of `b` in global space.
    ///
    /// Maps the four corners through [`to_global`](Self::to_global) and
    /// rounds the extremes outward.
    fn bounding_box(&self, frame: &TransformFrame, b: Geometry) -> Geometry {
        Geometry::enclosing(b.corners().map(|c| self.to_global(frame, c)))
    }

    /// Maps local damage into global space.
    ///
    /// Linear transforms map each box and re-union the results. Any other
    /// transform damages its whole bounding box.
    fn transform_damage(&self, frame: &TransformFrame, damage: &Region) -> Region {
        if damage.is_empty() {
            return Region::new();
        }
        if self.is_linear() {
            Region::from_rects(damage.rects().iter().map(|r| self.bounding_box(frame, *r)))
        } else {
            Region::from_rect(self.bounding_box(frame, frame.children))
        }
    }
}

/// Angles smaller than this (radians) count as "no rotation".
const ROTATION_EPSILON: f64 = 1e-3;

/// Planar transform: rotate about the subject's center, scale, translate.
///
/// The angle is in radians; positive values rotate counter-clockwise on
/// screen. Translation is in global pixels, scale is relative to the local
/// frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View2d {
    /// Rotation angle in radians.
    pub angle: f64,
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
    /// Horizontal translation in global pixels.
    pub translation_x: f64,
    /// Vertical translation in global pixels.
    pub translation_y: f64,
    /// Opacity applied when rendering.
    pub alpha: f32,
}

impl View2d {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        angle: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
        translation_x: 0.0,
        translation_y: 0.0,
        alpha: 1.0,
    };
}

impl Default for View2d {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn rotate_xy(x: f64, y: f64, angle: f64) -> (f64, f64) {
    let (s, c) = (angle.sin(), angle.cos());
    (c * x - s * y, s * x + c * y)
}

impl NodeTransform for View2d {
    fn to_global(&self, frame: &TransformFrame, p: Point) -> Point {
        let mid = frame.subject.center();
        let (x, y) = rotate_xy(
            (p.x - mid.x) * self.scale_x,
            (p.y - mid.y) * self.scale_y,
            -self.angle,
        );
        Point::new(
            x + self.translation_x + mid.x,
            y + self.translation_y + mid.y,
        )
    }

    fn to_local(&self, frame: &TransformFrame, p: Point) -> Option<Point> {
        let mid = frame.subject.center();
        let (x, y) = rotate_xy(
            p.x - mid.x - self.translation_x,
            p.y - mid.y - self.translation_y,
            self.angle,
        );
        Some(Point::new(
            x / self.scale_x + mid.x,
            y / self.scale_y + mid.y,
        ))
    }

    fn is_linear(&self) -> bool {
        self.angle.abs() < ROTATION_EPSILON
    }
}

/// Determinants below this make the 3-D inverse mapping report "invalid".
const DEGENERATE_DETERMINANT: f64 = 1e-6;

/// Perspective transform rotating the children in 3-D around their center.
///
/// The combined matrix is
/// `translation · view_proj · depth_scale · rotation · scaling`, applied to
/// center-relative coordinates with the y axis pointing up. The depth scale
/// shrinks z by the content's largest dimension so that rotated content never
/// crosses the near or far plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View3d {
    /// Applied after projection, in global pixels.
    pub translation: Transform3d,
    /// Rotation of the content plane.
    pub rotation: Transform3d,
    /// Scale of the content plane.
    pub scaling: Transform3d,
    /// Projection times camera view. See [`View3d::default_view_proj`].
    pub view_proj: Transform3d,
    /// Opacity applied when rendering.
    pub alpha: f32,
}

impl View3d {
    /// Vertical field of view of the default camera.
    pub const FOV: f64 = core::f64::consts::FRAC_PI_4;

    /// Creates an identity 3-D transform with the default camera.
    #[must_use]
    pub fn new() -> Self {
        Self {
            translation: Transform3d::IDENTITY,
            rotation: Transform3d::IDENTITY,
            scaling: Transform3d::IDENTITY,
            view_proj: Self::default_view_proj(),
            alpha: 1.0,
        }
    }

    /// Perspective projection times a camera placed so that the `z = 0` plane
    /// maps one unit to one pixel.
    #[must_use]
    pub fn default_view_proj() -> Transform3d {
        let half = Self::FOV / 2.0;
        let eye_z = half.cos() / half.sin();
        let view = Transform3d::look_at([0.0, 0.0, eye_z], [0.0; 3], [0.0, 1.0, 0.0]);
        let proj = Transform3d::perspective(Self::FOV, 1.0, 0.1, 100.0);
        proj * view
    }

    /// The full matrix for children spanning `children`.
    #[must_use]
    pub fn total_transform(&self, children: Geometry) -> Transform3d {
        let size = f64::from(children.width.max(children.height).max(1));
        let depth_scale = Transform3d::from_scale(1.0, 1.0, 2.0 / size);
        self.translation * self.view_proj * depth_scale * self.rotation * self.scaling
    }
}

impl Default for View3d {
    fn default() -> Self {
        Self::new()
    }
}

fn center_relative(b: Geometry, p: Point) -> Point {
    Point::new(
        (p.x - f64::from(b.x)) - f64::from(b.width) / 2.0,
        f64::from(b.height) / 2.0 - (p.y - f64::from(b.y)),
    )
}

fn absolute_from_relative(b: Geometry, p: Point) -> Point {
    Point::new(
        p.x + f64::from(b.x) + f64::from(b.width) / 2.0,
        (f64::from(b.height) / 2.0 - p.y) + f64::from(b.y),
    )
}

impl NodeTransform for View3d {
    fn to_global(&self, frame: &TransformFrame, p: Point) -> Point {
        let rel = center_relative(frame.children, p);
        let v = self
            .total_transform(frame.children)
            .transform_vec4([rel.x, rel.y, 0.0, 1.0]);
        let projected = if v[3].abs() < DEGENERATE_DETERMINANT {
            // A zero w only comes from a degenerate matrix; collapse to the
            // center rather than produce infinities.
            Point::ZERO
        } else {
            Point::new(v[0] / v[3], v[1] / v[3])
        };
        absolute_from_relative(frame.children, projected)
    }

    fn to_local(&self, frame: &TransformFrame, p: Point) -> Option<Point> {
        let rel = center_relative(frame.children, p);
        let tr = self.total_transform(frame.children).cols;

        // The source point has z = 0, so its (x, y) solve the 2×2 system
        // built from the x, y and w rows of the projective equations.
        let a = rel.x * tr[0][3] - tr[0][0];
        let b = rel.x * tr[1][3] - tr[1][0];
        let c = rel.y * tr[0][3] - tr[0][1];
        let d = rel.y * tr[1][3] - tr[1][1];
        let det = a * d - b * c;
        if det.abs() < DEGENERATE_DETERMINANT {
            return None;
        }

        let r0 = tr[3][0] - rel.x * tr[3][3];
        let r1 = tr[3][1] - rel.y * tr[3][3];
        let x = (d * r0 - b * r1) / det;
        let y = (a * r1 - c * r0) / det;
        Some(absolute_from_relative(frame.children, Point::new(x, y)))
    }

    fn is_linear(&self) -> bool {
        self.rotation.is_identity_within(1e-9)
    }
}

/// A transform stored in a transformer node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transformer {
    /// Planar rotate/scale/translate.
    View2d(View2d),
    /// Perspective 3-D rotation.
    View3d(View3d),
}

impl Transformer {
    /// Opacity to render the transformed content with.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        match self {
            Self::View2d(t) => t.alpha,
            Self::View3d(t) => t.alpha,
        }
    }

    /// Returns the planar transform, if this is one.
    pub fn as_view_2d_mut(&mut self) -> Option<&mut View2d> {
        match self {
            Self::View2d(t) => Some(t),
            Self::View3d(_) => None,
        }
    }

    /// Returns the 3-D transform, if this is one.
    pub fn as_view_3d_mut(&mut self) -> Option<&mut View3d> {
        match self {
            Self::View3d(t) => Some(t),
            Self::View2d(_) => None,
        }
    }
}

impl From<View2d> for Transformer {
    fn from(t: View2d) -> Self {
        Self::View2d(t)
    }
}

impl From<View3d> for Transformer {
    fn from(t: View3d) -> Self {
        Self::View3d(t)
    }
}

impl NodeTransform for Transformer {
    fn to_global(&self, frame: &TransformFrame, p: Point) -> Point {
        match self {
            Self::View2d(t) => t.to_global(frame, p),
            Self::View3d(t) => t.to_global(frame, p),
        }
    }

    fn to_local(&self, frame: &TransformFrame, p: Point) -> Option<Point> {
        match self {
            Self::View2d(t) => t.to_local(frame, p),
            Self::View3d(t) => t.to_local(frame, p),
        }
    }

    fn is_linear(&self) -> bool {
        match self {
            Self::View2d(t) => t.is_linear(),
            Self::View3d(t) => t.is_linear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use core::f64::consts::{FRAC_PI_2, PI};

    use super::*;

    fn close(a: Point, b: Point, eps: f64) -> bool {
        let (dx, dy) = (a.x - b.x, a.y - b.y);
        dx < eps && dx > -eps && dy < eps && dy > -eps
    }

    fn frame(b: Geometry) -> TransformFrame {
        TransformFrame {
            subject: b,
            children: b,
        }
    }

    fn sample_points(b: Geometry) -> [Point; 5] {
        let c = b.corners();
        [c[0], c[1], c[2], c[3], b.center()]
    }

    #[test]
    fn identity_2d_bounding_box_is_exact() {
        let b = Geometry::new(-20, 30, 200, 100);
        assert_eq!(View2d::IDENTITY.bounding_box(&frame(b), b), b);
    }

    #[test]
    fn identity_3d_bounding_box_is_exact() {
        let b = Geometry::new(10, 20, 300, 200);
        assert_eq!(View3d::new().bounding_box(&frame(b), b), b);
    }

    #[test]
    fn view_2d_round_trips() {
        let b = Geometry::new(100, 50, 400, 300);
        let t = View2d {
            angle: 0.7,
            scale_x: 1.5,
            scale_y: 0.5,
            translation_x: 30.0,
            translation_y: -12.0,
            alpha: 1.0,
        };
        let f = frame(b);
        for p in sample_points(b) {
            let back = t.to_local(&f, t.to_global(&f, p));
            assert!(back.is_some_and(|q| close(q, p, 1e-3)), "{p:?} -> {back:?}");
        }
    }

    #[test]
    fn view_3d_round_trips() {
        let b = Geometry::new(0, 0, 640, 480);
        let mut t = View3d::new();
        t.rotation = Transform3d::from_rotation_x(0.4) * Transform3d::from_rotation_z(0.3);
        t.scaling = Transform3d::from_scale(0.8, 1.2, 1.0);
        t.translation = Transform3d::from_translation(25.0, -10.0, 0.0);
        let f = frame(b);
        for p in sample_points(b) {
            let back = t.to_local(&f, t.to_global(&f, p));
            assert!(back.is_some_and(|q| close(q, p, 1e-3)), "{p:?} -> {back:?}");
        }
    }

    #[test]
    fn rotation_90_about_center_keeps_square_bounds() {
        let b = Geometry::new(0, 0, 10, 10);
        let t = View2d {
            angle: FRAC_PI_2,
            ..View2d::IDENTITY
        };
        let damage = Region::from_rect(b);
        let mapped = t.transform_damage(&frame(b), &damage);
        assert_eq!(mapped, Region::from_rect(b));
        assert_eq!(mapped.extents(), b);
    }

    #[test]
    fn bounding_box_contains_every_corner() {
        let b = Geometry::new(5, 7, 123, 45);
        let f = frame(b);
        let t = View2d {
            angle: 0.33,
            scale_x: 1.7,
            scale_y: 0.9,
            translation_x: 3.5,
            translation_y: 8.25,
            alpha: 1.0,
        };
        let bbox = t.bounding_box(&f, b);
        for c in b.corners() {
            let g = t.to_global(&f, c);
            assert!(
                g.x >= f64::from(bbox.x) - 1e-6
                    && g.x <= f64::from(bbox.right()) + 1e-6
                    && g.y >= f64::from(bbox.y) - 1e-6
                    && g.y <= f64::from(bbox.bottom()) + 1e-6,
                "{g:?} outside {bbox:?}"
            );
        }
    }

    #[test]
    fn edge_on_3d_reports_invalid() {
        let b = Geometry::new(0, 0, 100, 100);
        let mut t = View3d::new();
        t.rotation = Transform3d::from_rotation_y(FRAC_PI_2);
        // The content collapses onto the vertical line through its center.
        assert_eq!(t.to_local(&frame(b), Point::new(50.0, 30.0)), None);
    }

    #[test]
    fn scaled_2d_damage_maps_per_box() {
        let b = Geometry::new(0, 0, 100, 100);
        let t = View2d {
            scale_x: 0.5,
            scale_y: 0.5,
            ..View2d::IDENTITY
        };
        let damage = Region::from_rect(Geometry::new(0, 0, 10, 10));
        let mapped = t.transform_damage(&frame(b), &damage);
        // Scaled by half towards the center (50, 50).
        assert_eq!(mapped, Region::from_rect(Geometry::new(25, 25, 5, 5)));
    }

    #[test]
    fn rotated_damage_falls_back_to_bounding_box() {
        let b = Geometry::new(0, 0, 100, 100);
        let t = View2d {
            angle: PI / 6.0,
            ..View2d::IDENTITY
        };
        let f = frame(b);
        let damage = Region::from_rect(Geometry::new(0, 0, 10, 10));
        let mapped = t.transform_damage(&f, &damage);
        assert_eq!(mapped, Region::from_rect(t.bounding_box(&f, b)));
    }

    #[test]
    fn translated_3d_is_linear() {
        let b = Geometry::new(0, 0, 100, 100);
        let mut t = View3d::new();
        t.translation = Transform3d::from_translation(10.0, 0.0, 0.0);
        assert!(t.is_linear(), "no rotation means box-by-box damage");
        let mapped = t.bounding_box(&frame(b), b);
        assert_eq!(mapped, Geometry::new(10, 0, 100, 100));
    }
}
