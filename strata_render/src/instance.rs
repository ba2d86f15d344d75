// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-instance contract between the scene graph and the frame loop.
//!
//! The scene graph is owned outside this crate. For each output it produces
//! an ordered list of [`RenderInstance`]s (front to back) through an
//! [`InstanceSource`]. Instances report damage asynchronously by pushing it
//! into the [`DamageQueue`] they were generated with, and the frame loop
//! drains the queue whenever it runs.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use strata_core::output::{OutputId, OutputInfo};
use strata_core::region::Region;
use strata_core::trace::ScanoutOutcome;

use crate::device::OutputDevice;
use crate::pass::{RenderTarget, Renderer};

/// Result of asking an instance to present its buffer directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectScanout {
    /// The buffer was handed to the display; no compositing is needed.
    Success,
    /// The instance does not cover the output, or is invisible; ask the next.
    Skip,
    /// The instance would cover the output but the device refused its buffer.
    Failed,
}

impl From<DirectScanout> for ScanoutOutcome {
    fn from(result: DirectScanout) -> Self {
        match result {
            DirectScanout::Success => Self::Success,
            DirectScanout::Skip => Self::Skip,
            DirectScanout::Failed => Self::Failed,
        }
    }
}

/// One draw request recorded by a render instance.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderInstruction {
    /// Position of the recording instance in the instance list. Filled in by
    /// the frame loop.
    pub instance: usize,
    /// Where to draw.
    pub target: RenderTarget,
    /// Logical region to draw.
    pub damage: Region,
}

impl RenderInstruction {
    /// Creates an instruction for the calling instance.
    #[must_use]
    pub fn new(target: RenderTarget, damage: Region) -> Self {
        Self {
            instance: 0,
            target,
            damage,
        }
    }
}

/// A renderable piece of the scene on one output.
pub trait RenderInstance {
    /// Records the instructions needed to repaint `damage` on `target`.
    ///
    /// Instances are asked front to back. An instance that is opaque over
    /// part of `damage` removes that part so instances behind it skip it.
    fn schedule_instructions(
        &mut self,
        instructions: &mut Vec<RenderInstruction>,
        target: &RenderTarget,
        damage: &mut Region,
    );

    /// Draws one instruction previously recorded by this instance.
    fn render(&mut self, renderer: &mut dyn Renderer, instruction: &RenderInstruction);

    /// Updates visibility state and removes the area this instance occludes
    /// from `visible` (layout coordinates).
    fn compute_visibility(&mut self, output: OutputId, visible: &mut Region) {
        _ = (output, visible);
    }

    /// Tries to hand this instance's buffer to the display directly.
    fn try_scanout(&mut self, device: &mut dyn OutputDevice) -> DirectScanout {
        _ = device;
        DirectScanout::Skip
    }
}

/// Produces render instances for an output.
pub trait InstanceSource {
    /// Builds the instance list for `output`, front to back.
    ///
    /// Instances keep a clone of `damage` and push damage into it in layout
    /// coordinates.
    fn generate_render_instances(
        &mut self,
        output: &OutputInfo,
        damage: &DamageQueue,
    ) -> Vec<Box<dyn RenderInstance>>;
}

/// Shared buffer of damage pushed by render instances, in layout coordinates.
#[derive(Clone, Debug, Default)]
pub struct DamageQueue {
    pending: Rc<RefCell<Region>>,
}

impl DamageQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds damage.
    pub fn push(&self, damage: &Region) {
        self.pending.borrow_mut().union(damage);
    }

    /// Returns `true` if nothing has been pushed since the last take.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Removes and returns everything pushed so far.
    #[must_use]
    pub fn take(&self) -> Region {
        core::mem::take(&mut *self.pending.borrow_mut())
    }
}

/// Asks each instance in turn to scan out, stopping at the first answer
/// other than [`DirectScanout::Skip`].
pub fn try_scanout_from_list(
    instances: &mut [Box<dyn RenderInstance>],
    device: &mut dyn OutputDevice,
) -> DirectScanout {
    for instance in instances {
        let result = instance.try_scanout(device);
        if result != DirectScanout::Skip {
            return result;
        }
    }
    DirectScanout::Skip
}

/// Runs [`RenderInstance::compute_visibility`] on every instance, starting
/// from `visible` (layout coordinates) shifted by `-offset`.
pub fn compute_visibility_from_list(
    instances: &mut [Box<dyn RenderInstance>],
    output: OutputId,
    visible: &mut Region,
    offset: (i32, i32),
) {
    visible.translate(-offset.0, -offset.1);
    for instance in instances {
        instance.compute_visibility(output, visible);
    }
    visible.translate(offset.0, offset.1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{AcquiredBuffer, OutputState};
    use crate::error::DeviceError;
    use crate::resource::BufferId;
    use strata_core::geometry::Geometry;

    struct Fixed {
        answer: DirectScanout,
        asked: Rc<RefCell<u32>>,
        covers: Geometry,
    }

    impl RenderInstance for Fixed {
        fn schedule_instructions(
            &mut self,
            _: &mut Vec<RenderInstruction>,
            _: &RenderTarget,
            _: &mut Region,
        ) {
        }

        fn render(&mut self, _: &mut dyn Renderer, _: &RenderInstruction) {}

        fn compute_visibility(&mut self, _: OutputId, visible: &mut Region) {
            *visible = visible.subtract_rect(self.covers);
        }

        fn try_scanout(&mut self, _: &mut dyn OutputDevice) -> DirectScanout {
            *self.asked.borrow_mut() += 1;
            self.answer
        }
    }

    fn fixed(answer: DirectScanout, asked: &Rc<RefCell<u32>>) -> Box<dyn RenderInstance> {
        Box::new(Fixed {
            answer,
            asked: asked.clone(),
            covers: Geometry::new(0, 0, 10, 10),
        })
    }

    struct NullDevice;

    impl OutputDevice for NullDevice {
        fn info(&self) -> OutputInfo {
            OutputInfo::new(OutputId(0), 10, 10)
        }
        fn needs_frame(&self) -> bool {
            false
        }
        fn schedule_frame(&mut self) {}
        fn direct_scanout_allowed(&self) -> bool {
            true
        }
        fn configure_swapchain(&mut self, _: &OutputState) -> Result<(), DeviceError> {
            Ok(())
        }
        fn acquire_buffer(&mut self) -> Result<AcquiredBuffer, DeviceError> {
            Err(DeviceError::AcquireBuffer)
        }
        fn release_buffer(&mut self, _: BufferId) {}
        fn apply_gamma(&mut self, _: &mut OutputState) -> Result<(), DeviceError> {
            Ok(())
        }
        fn reject_gamma(&mut self) {}
        fn test_state(&mut self, _: &OutputState) -> Result<(), DeviceError> {
            Ok(())
        }
        fn commit_state(&mut self, _: &OutputState) -> Result<(), DeviceError> {
            Ok(())
        }
    }

    #[test]
    fn scanout_stops_at_first_non_skip() {
        let asked = Rc::new(RefCell::new(0));
        let mut list = alloc::vec![
            fixed(DirectScanout::Skip, &asked),
            fixed(DirectScanout::Failed, &asked),
            fixed(DirectScanout::Success, &asked),
        ];
        let result = try_scanout_from_list(&mut list, &mut NullDevice);
        assert_eq!(result, DirectScanout::Failed);
        assert_eq!(*asked.borrow(), 2);
    }

    #[test]
    fn empty_list_skips() {
        assert_eq!(
            try_scanout_from_list(&mut [], &mut NullDevice),
            DirectScanout::Skip
        );
    }

    #[test]
    fn visibility_is_computed_in_offset_space() {
        let asked = Rc::new(RefCell::new(0));
        let mut list = alloc::vec![fixed(DirectScanout::Skip, &asked)];
        let mut visible = Region::from_rect(Geometry::new(100, 0, 20, 10));
        compute_visibility_from_list(&mut list, OutputId(0), &mut visible, (100, 0));
        assert_eq!(visible, Region::from_rect(Geometry::new(110, 0, 10, 10)));
    }

    #[test]
    fn damage_queue_is_shared_between_clones() {
        let queue = DamageQueue::new();
        let pusher = queue.clone();
        pusher.push(&Region::from_rect(Geometry::new(0, 0, 5, 5)));
        assert!(!queue.is_empty());
        assert_eq!(queue.take().area(), 25);
        assert!(pusher.is_empty(), "take drains every clone");
    }

    #[test]
    fn scanout_outcome_maps_one_to_one() {
        assert_eq!(ScanoutOutcome::from(DirectScanout::Failed), ScanoutOutcome::Failed);
    }
}
