// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage bookkeeping and buffer acquisition for one output.
//!
//! [`SwapchainDamageManager`] decides whether a repaint needs a new frame at
//! all, acquires a buffer from the device's swapchain, works out how much of
//! that buffer is stale, and, once the frame has been drawn, submits and
//! commits it.
//!
//! Damage enters in output-local logical coordinates and is stored in the
//! device's damage space: logical coordinates multiplied by the output scale.

use strata_core::geometry::Geometry;
use strata_core::output::OutputInfo;
use strata_core::region::Region;
use strata_core::trace::SkipReason;

use crate::damage::DamageRing;
use crate::device::{OutputDevice, OutputState};
use crate::error::{DeviceError, RenderError};
use crate::pass::Renderer;
use crate::resource::BufferId;

/// One frame in flight: an acquired buffer and the state to commit with it.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameObject {
    /// State to commit. Its damage is in buffer coordinates.
    pub state: OutputState,
    /// The acquired buffer.
    pub buffer: BufferId,
    /// Age of the acquired buffer.
    pub buffer_age: i32,
}

/// Per-output damage ring, frame damage, and repaint scheduling.
#[derive(Clone, Debug)]
pub struct SwapchainDamageManager {
    ring: DamageRing,
    frame_damage: Region,
    force_next_frame: bool,
    constant_redraw: i32,
    pending_gamma: bool,
}

impl SwapchainDamageManager {
    /// Creates a manager sized for `info`.
    #[must_use]
    pub fn new(info: &OutputInfo) -> Self {
        Self {
            ring: DamageRing::new(info.width, info.height),
            frame_damage: Region::new(),
            force_next_frame: false,
            constant_redraw: 0,
            pending_gamma: false,
        }
    }

    /// The damage history.
    #[must_use]
    pub fn ring(&self) -> &DamageRing {
        &self.ring
    }

    /// Damage collected for the next frame (or the frame being painted), in
    /// device damage space.
    #[must_use]
    pub fn frame_damage(&self) -> &Region {
        &self.frame_damage
    }

    /// Returns `true` if the next [`start_frame`](Self::start_frame) will
    /// produce a frame even without damage.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        self.force_next_frame
    }

    /// Returns `true` while constant redraw is requested.
    #[must_use]
    pub fn constant_redraw(&self) -> bool {
        self.constant_redraw > 0
    }

    /// Returns `true` if a gamma LUT waits to be applied.
    #[must_use]
    pub fn gamma_pending(&self) -> bool {
        self.pending_gamma
    }

    /// Forces the next frame and asks the device for a frame event.
    pub fn schedule_repaint(&mut self, device: &mut dyn OutputDevice) {
        device.schedule_frame();
        self.force_next_frame = true;
    }

    /// Handles the device asking for a new frame.
    pub fn on_needs_frame(&mut self, device: &mut dyn OutputDevice) {
        self.schedule_repaint(device);
    }

    /// Handles damage reported by the device itself, in damage space.
    pub fn on_device_damage(&mut self, device: &mut dyn OutputDevice, damage: &Region) {
        if self.ring.add(damage) {
            self.schedule_repaint(device);
        }
    }

    /// Handles an external request to change the output's state.
    pub fn on_request_state(&mut self, device: &mut dyn OutputDevice, state: &OutputState) {
        if let Err(err) = device.commit_state(state) {
            log::error!("failed to commit requested output state: {err}");
        }
        self.update_bounds(&device.info());
        self.damage_whole(device);
        self.schedule_repaint(device);
    }

    /// Handles a client setting a new gamma LUT.
    pub fn on_gamma_changed(&mut self, device: &mut dyn OutputDevice) {
        self.pending_gamma = true;
        self.schedule_repaint(device);
    }

    /// Resizes the damage ring to the output's transformed resolution.
    pub fn update_bounds(&mut self, info: &OutputInfo) {
        self.ring.set_bounds(info.width, info.height);
    }

    /// Adds output-local logical damage, scheduling a repaint if `repaint`.
    pub fn damage(&mut self, device: &mut dyn OutputDevice, region: &Region, repaint: bool) {
        if region.is_empty() {
            return;
        }
        let scaled = region.scaled(device.info().scale);
        self.frame_damage.union(&scaled);
        self.ring.add(&scaled);
        if repaint {
            self.schedule_repaint(device);
        }
    }

    /// Adds a single box of output-local logical damage.
    pub fn damage_box(&mut self, device: &mut dyn OutputDevice, b: Geometry, repaint: bool) {
        if b.is_empty() {
            return;
        }
        self.damage(device, &Region::from_rect(b), repaint);
    }

    /// Damages the whole output and schedules a repaint.
    pub fn damage_whole(&mut self, device: &mut dyn OutputDevice) {
        let whole = device.info().relative_geometry();
        self.damage_box(device, whole, true);
    }

    /// Takes (`true`) or drops (`false`) one constant-redraw request.
    pub fn set_redraw_always(&mut self, device: &mut dyn OutputDevice, always: bool) {
        self.constant_redraw += if always { 1 } else { -1 };
        if self.constant_redraw > 1 {
            return;
        }
        if self.constant_redraw < 0 {
            log::error!("constant redraw counter dropped below zero");
            self.constant_redraw = 0;
            return;
        }
        self.schedule_repaint(device);
    }

    /// Damage scheduled for the next frame, in output-local logical
    /// coordinates.
    #[must_use]
    pub fn scheduled_damage(&self, info: &OutputInfo) -> Region {
        self.frame_damage.scaled(1.0 / info.scale)
    }

    /// Starts a frame if one is needed.
    ///
    /// Returns [`SkipReason::Idle`] if nothing requires a new frame, and
    /// [`SkipReason::DeviceError`] if the gamma LUT, the swapchain, or buffer
    /// acquisition failed. Device errors are logged; the next vblank retries.
    pub fn start_frame(
        &mut self,
        device: &mut dyn OutputDevice,
        no_damage_tracking: bool,
    ) -> Result<FrameObject, SkipReason> {
        let needs_frame = self.force_next_frame
            || device.needs_frame()
            || !self.ring.current().is_empty()
            || self.constant_redraw > 0;
        self.force_next_frame = false;
        if !needs_frame {
            return Err(SkipReason::Idle);
        }

        let mut state = OutputState::default();
        if let Err(err) = self.try_apply_gamma(device, &mut state) {
            log::error!("failed to apply gamma to output state: {err}");
            return Err(SkipReason::DeviceError);
        }

        let info = device.info();
        state.damage = self
            .ring
            .current()
            .transformed(info.transform.invert(), info.width, info.height);
        if let Err(err) = device.configure_swapchain(&state) {
            log::error!("failed to configure primary swapchain for {:?}: {err}", info.id);
            return Err(SkipReason::DeviceError);
        }
        let acquired = match device.acquire_buffer() {
            Ok(acquired) => acquired,
            Err(err) => {
                log::error!("{err}");
                return Err(SkipReason::DeviceError);
            }
        };

        // Accumulate only now that the frame will be rendered; a skipped
        // frame must not leak its history into the next one.
        self.frame_damage
            .union(&self.ring.buffer_damage(acquired.age));
        if no_damage_tracking {
            self.frame_damage.union_rect(info.damage_box());
        }

        Ok(FrameObject {
            state,
            buffer: acquired.buffer,
            buffer_age: acquired.age,
        })
    }

    fn try_apply_gamma(
        &mut self,
        device: &mut dyn OutputDevice,
        state: &mut OutputState,
    ) -> Result<(), DeviceError> {
        if !self.pending_gamma {
            return Ok(());
        }
        self.pending_gamma = false;
        device.apply_gamma(state)?;
        if device.test_state(state).is_err() {
            state.gamma_lut = false;
            device.reject_gamma();
        }
        Ok(())
    }

    /// Submits the recorded pass and commits the frame.
    ///
    /// The damage ring only rotates once the commit succeeded, so a failed
    /// frame is retried against the same history. On any failure the buffer
    /// goes back to the device unpresented.
    pub fn swap_buffers(
        &mut self,
        device: &mut dyn OutputDevice,
        renderer: &mut dyn Renderer,
        mut frame: FrameObject,
    ) -> Result<(), RenderError> {
        self.frame_damage.clear();
        if let Err(err) = renderer.submit() {
            log::error!("failed to submit render pass: {err}");
            device.release_buffer(frame.buffer);
            return Err(err);
        }

        frame.state.buffer = Some(frame.buffer);
        let committed = device
            .test_state(&frame.state)
            .and_then(|()| device.commit_state(&frame.state));
        if let Err(err) = committed {
            log::error!("{err}");
            device.release_buffer(frame.buffer);
            return Err(err.into());
        }
        self.ring.rotate();
        Ok(())
    }

    /// Gives up on a started frame without presenting it.
    pub fn abandon_frame(&mut self, device: &mut dyn OutputDevice, frame: FrameObject) {
        device.release_buffer(frame.buffer);
    }
}
