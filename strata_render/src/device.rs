// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output device contract.
//!
//! An [`OutputDevice`] is the display side of one output: it owns the
//! swapchain, accepts commits, and schedules frame callbacks. Backends (DRM,
//! nested Wayland, headless) implement it; the frame loop only ever talks to
//! the trait, which also makes recording test doubles straightforward.
//!
//! Device *signals* (vblank, hardware damage, state requests, presentation
//! feedback, gamma changes) are not part of this trait. The event loop
//! delivers them by calling the matching `on_*` method of
//! [`RenderManager`](crate::manager::RenderManager).

use strata_core::output::{OutputInfo, OutputTransform};
use strata_core::region::Region;

use crate::error::DeviceError;
use crate::pass::Renderer;
use crate::resource::BufferId;

/// A buffer handed out by the swapchain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcquiredBuffer {
    /// The buffer to render into.
    pub buffer: BufferId,
    /// Number of frames since the buffer's contents were last presented, or
    /// 0 if unknown.
    pub age: i32,
}

/// Pending output state, built up during a frame and committed at the end.
///
/// `None` fields are left unchanged by a commit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputState {
    /// Damage in buffer coordinates, already mapped through the inverse of
    /// the output transform.
    pub damage: Region,
    /// Buffer to present.
    pub buffer: Option<BufferId>,
    /// `true` once a gamma LUT has been written into the state.
    pub gamma_lut: bool,
    /// New mode, in physical pixels.
    pub mode: Option<(i32, i32)>,
    /// New scale factor.
    pub scale: Option<f64>,
    /// New buffer orientation.
    pub transform: Option<OutputTransform>,
    /// Enables or disables the output.
    pub enabled: Option<bool>,
}

/// The display side of one output.
pub trait OutputDevice {
    /// Current properties of the output.
    fn info(&self) -> OutputInfo;

    /// Returns `true` if the device itself wants a new frame, e.g. after a
    /// hardware cursor moved on a backend without cursor planes.
    fn needs_frame(&self) -> bool;

    /// Asks the device to deliver a frame event at the next vblank.
    fn schedule_frame(&mut self);

    /// Returns `true` if client buffers may be handed to the display
    /// directly.
    fn direct_scanout_allowed(&self) -> bool;

    /// Makes sure the primary swapchain can hold buffers for `state`.
    fn configure_swapchain(&mut self, state: &OutputState) -> Result<(), DeviceError>;

    /// Takes the next free buffer from the swapchain.
    fn acquire_buffer(&mut self) -> Result<AcquiredBuffer, DeviceError>;

    /// Gives an acquired buffer back without presenting it.
    fn release_buffer(&mut self, buffer: BufferId);

    /// Writes the pending gamma LUT into `state`.
    fn apply_gamma(&mut self, state: &mut OutputState) -> Result<(), DeviceError>;

    /// Tells the gamma client that its LUT cannot be used on this output.
    fn reject_gamma(&mut self);

    /// Checks whether `state` would be accepted, without applying it.
    fn test_state(&mut self, state: &OutputState) -> Result<(), DeviceError>;

    /// Applies `state`.
    fn commit_state(&mut self, state: &OutputState) -> Result<(), DeviceError>;

    /// Draws software cursors into the current render pass, limited to
    /// `damage` (buffer coordinates).
    fn add_software_cursors(&mut self, renderer: &mut dyn Renderer, damage: &Region) {
        _ = (renderer, damage);
    }
}
