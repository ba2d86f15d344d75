// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer contract and render targets.
//!
//! The [`Renderer`] is treated as a black box: the frame loop begins a pass
//! on a target buffer, clears regions, lets render instances and effect hooks
//! draw, and submits. It also allocates the auxiliary buffers used by
//! postprocessing and the depth attachments managed by the
//! [`DepthBufferPool`](crate::depth::DepthBufferPool).

use strata_core::geometry::Geometry;
use strata_core::output::OutputTransform;
use strata_core::region::Region;

use crate::error::RenderError;
use crate::resource::{BufferId, ColorTransform, DepthAttachment};

/// A straight-alpha RGBA color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque yellow, used to highlight repainted areas.
    pub const YELLOW: Self = Self::rgb(1.0, 1.0, 0.0);

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// A buffer to render into, together with the part of the layout it shows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderTarget {
    /// The buffer.
    pub buffer: BufferId,
    /// The logical area shown by the buffer.
    pub geometry: Geometry,
    /// Buffer pixels per logical pixel.
    pub scale: f64,
    /// Buffer orientation.
    pub transform: OutputTransform,
}

impl RenderTarget {
    /// Returns a copy showing an area moved by `(dx, dy)`.
    #[must_use]
    pub fn translated(mut self, dx: i32, dy: i32) -> Self {
        self.geometry = self.geometry.translated(dx, dy);
        self
    }

    /// Maps a logical region into the buffer's pixel space, clipped to the
    /// target.
    #[must_use]
    pub fn region_to_buffer(&self, region: &Region) -> Region {
        region
            .translated(-self.geometry.x, -self.geometry.y)
            .scaled(self.scale)
            .intersect_rect(
                Geometry::new(0, 0, self.geometry.width, self.geometry.height)
                    .scaled(self.scale),
            )
    }
}

/// Parameters for [`Renderer::begin_pass`].
#[derive(Clone, Copy, Debug)]
pub struct PassDescriptor<'a> {
    /// Where to render.
    pub target: &'a RenderTarget,
    /// The logical region that will be repainted.
    pub damage: &'a Region,
    /// Color transform to apply on submission.
    pub color_transform: Option<ColorTransform>,
}

/// The GPU side of the frame loop.
pub trait Renderer {
    /// Starts recording a pass.
    ///
    /// An error leaves nothing recorded.
    fn begin_pass(&mut self, desc: &PassDescriptor<'_>) -> Result<(), RenderError>;

    /// Fills `region` (buffer coordinates) of the current pass with `color`.
    fn clear(&mut self, region: &Region, color: Color);

    /// Submits the recorded pass.
    fn submit(&mut self) -> Result<(), RenderError>;

    /// Allocates an auxiliary buffer.
    fn allocate_buffer(&mut self, width: i32, height: i32) -> Result<BufferId, RenderError>;

    /// Frees an auxiliary buffer.
    fn free_buffer(&mut self, buffer: BufferId);

    /// Creates a depth attachment and binds it to `framebuffer`.
    fn create_depth(
        &mut self,
        framebuffer: BufferId,
        width: i32,
        height: i32,
    ) -> Result<DepthAttachment, RenderError>;

    /// Frees a depth attachment.
    fn free_depth(&mut self, depth: DepthAttachment);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_to_buffer_removes_origin_and_scales() {
        let target = RenderTarget {
            buffer: BufferId(1),
            geometry: Geometry::new(100, 0, 50, 50),
            scale: 2.0,
            transform: OutputTransform::Normal,
        };
        let damage = Region::from_rect(Geometry::new(110, 10, 10, 10));
        assert_eq!(
            target.region_to_buffer(&damage),
            Region::from_rect(Geometry::new(20, 20, 20, 20))
        );
    }

    #[test]
    fn region_to_buffer_clips_to_target() {
        let target = RenderTarget {
            buffer: BufferId(1),
            geometry: Geometry::new(0, 0, 50, 50),
            scale: 1.0,
            transform: OutputTransform::Normal,
        };
        let damage = Region::from_rect(Geometry::new(40, 40, 20, 20));
        assert_eq!(
            target.region_to_buffer(&damage),
            Region::from_rect(Geometry::new(40, 40, 10, 10))
        );
    }
}
