// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opaque handles for renderer- and device-managed resources.

use core::fmt;

/// An opaque handle to a renderable buffer (a swapchain buffer or an
/// auxiliary buffer allocated by the renderer).
///
/// Buffer handles are assigned by the device or renderer and passed through
/// the frame loop without interpretation. [`BufferId::DEFAULT`] names the
/// backend's own framebuffer, which never needs a depth attachment from the
/// pool.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(pub u64);

impl BufferId {
    /// The backend's default framebuffer.
    pub const DEFAULT: Self = Self(0);

    /// Returns `true` for [`BufferId::DEFAULT`].
    #[inline]
    #[must_use]
    pub const fn is_default(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferId({})", self.0)
    }
}

/// An opaque handle to a depth attachment created by the renderer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthAttachment(pub u64);

impl fmt::Debug for DepthAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DepthAttachment({})", self.0)
    }
}

/// An opaque color transform (e.g. an ICC profile) applied by the renderer
/// when a pass is submitted.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorTransform(pub u64);

impl fmt::Debug for ColorTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColorTransform({})", self.0)
    }
}
