// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display output identification and buffer orientation.
//!
//! [`OutputId`] is a lightweight handle identifying a specific display.
//! [`OutputTransform`] describes how the output's buffer is rotated or
//! flipped relative to its logical orientation, and [`OutputInfo`] bundles the
//! properties the frame loop reads from a device each frame.

use core::fmt;

use crate::geometry::Geometry;

/// Identifies a specific display output.
///
/// Devices assign output IDs to distinguish multiple displays. Core code
/// passes them through without interpreting the value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OutputId(pub u32);

impl fmt::Debug for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputId({})", self.0)
    }
}

/// Rotation and reflection of an output's buffer.
///
/// Rotations are counter-clockwise, matching `wl_output.transform`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OutputTransform {
    /// No transform.
    #[default]
    Normal,
    /// Rotated by 90°.
    Rotate90,
    /// Rotated by 180°.
    Rotate180,
    /// Rotated by 270°.
    Rotate270,
    /// Flipped around the vertical axis.
    Flipped,
    /// Flipped, then rotated by 90°.
    Flipped90,
    /// Flipped, then rotated by 180°.
    Flipped180,
    /// Flipped, then rotated by 270°.
    Flipped270,
}

impl OutputTransform {
    /// Returns `true` if the transform swaps width and height.
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        matches!(
            self,
            Self::Rotate90 | Self::Rotate270 | Self::Flipped90 | Self::Flipped270
        )
    }

    /// Returns the transform that undoes this one.
    ///
    /// Only the pure 90° and 270° rotations differ from their inverse; every
    /// flipped variant is its own inverse.
    #[must_use]
    pub const fn invert(self) -> Self {
        match self {
            Self::Rotate90 => Self::Rotate270,
            Self::Rotate270 => Self::Rotate90,
            other => other,
        }
    }

    /// Returns the size of a `width`×`height` buffer after applying the
    /// transform.
    #[must_use]
    pub const fn transformed_size(self, width: i32, height: i32) -> (i32, i32) {
        if self.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Maps a box inside a `width`×`height` area through the transform.
    #[must_use]
    pub const fn apply(self, b: Geometry, width: i32, height: i32) -> Geometry {
        let (x1, y1, x2, y2) = (b.x, b.y, b.right(), b.bottom());
        match self {
            Self::Normal => b,
            Self::Rotate90 => Geometry::from_edges(height - y2, x1, height - y1, x2),
            Self::Rotate180 => Geometry::from_edges(width - x2, height - y2, width - x1, height - y1),
            Self::Rotate270 => Geometry::from_edges(y1, width - x2, y2, width - x1),
            Self::Flipped => Geometry::from_edges(width - x2, y1, width - x1, y2),
            Self::Flipped90 => Geometry::from_edges(height - y2, width - x2, height - y1, width - x1),
            Self::Flipped180 => Geometry::from_edges(x1, height - y2, x2, height - y1),
            Self::Flipped270 => Geometry::from_edges(y1, x1, y2, x2),
        }
    }
}

/// Properties of an output as seen by the frame loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputInfo {
    /// Which output.
    pub id: OutputId,
    /// Buffer width in pixels, after applying `transform`.
    pub width: i32,
    /// Buffer height in pixels, after applying `transform`.
    pub height: i32,
    /// Scale factor between logical and buffer pixels.
    pub scale: f64,
    /// Buffer orientation.
    pub transform: OutputTransform,
    /// Position of the output in the global layout, in logical pixels.
    pub layout_origin: (i32, i32),
}

impl OutputInfo {
    /// Creates an unscaled, untransformed output at the layout origin.
    #[must_use]
    pub const fn new(id: OutputId, width: i32, height: i32) -> Self {
        Self {
            id,
            width,
            height,
            scale: 1.0,
            transform: OutputTransform::Normal,
            layout_origin: (0, 0),
        }
    }

    /// The whole output in the device's damage space (buffer pixels).
    #[must_use]
    pub const fn damage_box(&self) -> Geometry {
        Geometry::new(0, 0, self.width, self.height)
    }

    /// The whole output in output-local logical coordinates.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "logical output size fits in i32"
    )]
    pub fn relative_geometry(&self) -> Geometry {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        Geometry::new(
            0,
            0,
            (f64::from(self.width) / scale) as i32,
            (f64::from(self.height) / scale) as i32,
        )
    }

    /// The output's rectangle in the global layout.
    #[must_use]
    pub fn layout_geometry(&self) -> Geometry {
        let (x, y) = self.layout_origin;
        self.relative_geometry().translated(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_swaps_quarter_turns_only() {
        assert_eq!(OutputTransform::Rotate90.invert(), OutputTransform::Rotate270);
        assert_eq!(OutputTransform::Rotate270.invert(), OutputTransform::Rotate90);
        assert_eq!(OutputTransform::Flipped90.invert(), OutputTransform::Flipped90);
        assert_eq!(OutputTransform::Rotate180.invert(), OutputTransform::Rotate180);
    }

    #[test]
    fn rotate90_maps_top_left_strip() {
        // A 10×2 strip along the top of a 10×20 area (width=10, height=20).
        let b = Geometry::new(0, 0, 10, 2);
        assert_eq!(
            OutputTransform::Rotate90.apply(b, 10, 20),
            Geometry::from_edges(18, 0, 20, 10)
        );
    }

    #[test]
    fn transform_then_invert_is_identity() {
        let b = Geometry::new(3, 4, 5, 6);
        for t in [
            OutputTransform::Normal,
            OutputTransform::Rotate90,
            OutputTransform::Rotate180,
            OutputTransform::Rotate270,
            OutputTransform::Flipped,
            OutputTransform::Flipped90,
            OutputTransform::Flipped180,
            OutputTransform::Flipped270,
        ] {
            let (w, h) = (20, 30);
            let mapped = t.apply(b, w, h);
            let (tw, th) = t.transformed_size(w, h);
            assert_eq!(t.invert().apply(mapped, tw, th), b, "{t:?}");
        }
    }

    #[test]
    fn relative_geometry_divides_by_scale() {
        let mut info = OutputInfo::new(OutputId(0), 3840, 2160);
        info.scale = 2.0;
        info.layout_origin = (100, 0);
        assert_eq!(info.relative_geometry(), Geometry::new(0, 0, 1920, 1080));
        assert_eq!(info.layout_geometry(), Geometry::new(100, 0, 1920, 1080));
    }
}
