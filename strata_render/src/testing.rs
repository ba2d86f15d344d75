// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording test doubles shared by the unit tests of this crate.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use strata_core::geometry::Geometry;
use strata_core::output::{OutputId, OutputInfo};
use strata_core::region::Region;

use crate::device::{AcquiredBuffer, OutputDevice, OutputState};
use crate::error::{DeviceError, RenderError};
use crate::instance::{DirectScanout, RenderInstance, RenderInstruction};
use crate::pass::{Color, PassDescriptor, RenderTarget, Renderer};
use crate::resource::{BufferId, DepthAttachment};

/// Something observable that happened on the GPU side.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Op {
    Begin { buffer: BufferId, damage: Region },
    Clear { region: Region, color: Color },
    Draw { name: &'static str, damage: Region },
    Filter { source: BufferId, dest: BufferId },
    Submit,
}

pub(crate) type OpLog = Rc<RefCell<Vec<Op>>>;

pub(crate) struct MockDevice {
    pub(crate) info: OutputInfo,
    pub(crate) needs_frame: bool,
    pub(crate) scanout_allowed: bool,
    pub(crate) buffer_age: i32,
    pub(crate) fail_configure: bool,
    pub(crate) fail_acquire: bool,
    pub(crate) fail_gamma: bool,
    pub(crate) fail_test: bool,
    pub(crate) fail_commit: bool,
    pub(crate) scheduled: u32,
    pub(crate) next_buffer: u64,
    pub(crate) configured: Vec<OutputState>,
    pub(crate) released: Vec<BufferId>,
    pub(crate) commits: Vec<OutputState>,
    pub(crate) gamma_rejected: u32,
    pub(crate) cursor_damage: Vec<Region>,
}

impl MockDevice {
    pub(crate) fn new(width: i32, height: i32) -> Self {
        Self {
            info: OutputInfo::new(OutputId(0), width, height),
            needs_frame: false,
            scanout_allowed: true,
            buffer_age: 1,
            fail_configure: false,
            fail_acquire: false,
            fail_gamma: false,
            fail_test: false,
            fail_commit: false,
            scheduled: 0,
            next_buffer: 10,
            configured: Vec::new(),
            released: Vec::new(),
            commits: Vec::new(),
            gamma_rejected: 0,
            cursor_damage: Vec::new(),
        }
    }
}

impl OutputDevice for MockDevice {
    fn info(&self) -> OutputInfo {
        self.info
    }

    fn needs_frame(&self) -> bool {
        self.needs_frame
    }

    fn schedule_frame(&mut self) {
        self.scheduled += 1;
    }

    fn direct_scanout_allowed(&self) -> bool {
        self.scanout_allowed
    }

    fn configure_swapchain(&mut self, state: &OutputState) -> Result<(), DeviceError> {
        if self.fail_configure {
            return Err(DeviceError::SwapchainConfig);
        }
        self.configured.push(state.clone());
        Ok(())
    }

    fn acquire_buffer(&mut self) -> Result<AcquiredBuffer, DeviceError> {
        if self.fail_acquire {
            return Err(DeviceError::AcquireBuffer);
        }
        self.next_buffer += 1;
        Ok(AcquiredBuffer {
            buffer: BufferId(self.next_buffer),
            age: self.buffer_age,
        })
    }

    fn release_buffer(&mut self, buffer: BufferId) {
        self.released.push(buffer);
    }

    fn apply_gamma(&mut self, state: &mut OutputState) -> Result<(), DeviceError> {
        if self.fail_gamma {
            return Err(DeviceError::Gamma);
        }
        state.gamma_lut = true;
        Ok(())
    }

    fn reject_gamma(&mut self) {
        self.gamma_rejected += 1;
    }

    fn test_state(&mut self, _: &OutputState) -> Result<(), DeviceError> {
        if self.fail_test {
            return Err(DeviceError::Test);
        }
        Ok(())
    }

    fn commit_state(&mut self, state: &OutputState) -> Result<(), DeviceError> {
        if self.fail_commit {
            return Err(DeviceError::Commit);
        }
        if let Some((width, height)) = state.mode {
            self.info.width = width;
            self.info.height = height;
        }
        self.commits.push(state.clone());
        Ok(())
    }

    fn add_software_cursors(&mut self, _: &mut dyn Renderer, damage: &Region) {
        self.cursor_damage.push(damage.clone());
    }
}

pub(crate) struct MockRenderer {
    pub(crate) ops: OpLog,
    pub(crate) fail_begin: bool,
    pub(crate) fail_submit: bool,
    pub(crate) fail_allocate: bool,
    pub(crate) next_buffer: u64,
    pub(crate) live_buffers: Vec<BufferId>,
    pub(crate) depth: Vec<(BufferId, i32, i32)>,
}

impl MockRenderer {
    pub(crate) fn new(ops: &OpLog) -> Self {
        Self {
            ops: ops.clone(),
            fail_begin: false,
            fail_submit: false,
            fail_allocate: false,
            next_buffer: 100,
            live_buffers: Vec::new(),
            depth: Vec::new(),
        }
    }
}

impl Renderer for MockRenderer {
    fn begin_pass(&mut self, desc: &PassDescriptor<'_>) -> Result<(), RenderError> {
        if self.fail_begin {
            return Err(RenderError::BeginPass);
        }
        self.ops.borrow_mut().push(Op::Begin {
            buffer: desc.target.buffer,
            damage: desc.damage.clone(),
        });
        Ok(())
    }

    fn clear(&mut self, region: &Region, color: Color) {
        self.ops.borrow_mut().push(Op::Clear {
            region: region.clone(),
            color,
        });
    }

    fn submit(&mut self) -> Result<(), RenderError> {
        if self.fail_submit {
            return Err(RenderError::Submit);
        }
        self.ops.borrow_mut().push(Op::Submit);
        Ok(())
    }

    fn allocate_buffer(&mut self, width: i32, height: i32) -> Result<BufferId, RenderError> {
        if self.fail_allocate {
            return Err(RenderError::Allocate { width, height });
        }
        self.next_buffer += 1;
        let id = BufferId(self.next_buffer);
        self.live_buffers.push(id);
        Ok(id)
    }

    fn free_buffer(&mut self, buffer: BufferId) {
        self.live_buffers.retain(|b| *b != buffer);
    }

    fn create_depth(
        &mut self,
        framebuffer: BufferId,
        width: i32,
        height: i32,
    ) -> Result<DepthAttachment, RenderError> {
        self.depth.push((framebuffer, width, height));
        Ok(DepthAttachment(self.depth.len() as u64))
    }

    fn free_depth(&mut self, _: DepthAttachment) {}
}

/// An instance covering a fixed box (layout coordinates).
pub(crate) struct MockInstance {
    pub(crate) name: &'static str,
    pub(crate) bounds: Geometry,
    pub(crate) opaque: bool,
    pub(crate) scanout: DirectScanout,
    pub(crate) ops: OpLog,
    pub(crate) visible: Rc<RefCell<Option<Region>>>,
}

impl MockInstance {
    pub(crate) fn boxed(
        name: &'static str,
        bounds: Geometry,
        ops: &OpLog,
    ) -> Box<dyn RenderInstance> {
        Box::new(Self {
            name,
            bounds,
            opaque: true,
            scanout: DirectScanout::Skip,
            ops: ops.clone(),
            visible: Rc::default(),
        })
    }
}

impl RenderInstance for MockInstance {
    fn schedule_instructions(
        &mut self,
        instructions: &mut Vec<RenderInstruction>,
        target: &RenderTarget,
        damage: &mut Region,
    ) {
        let mine = damage.intersect_rect(self.bounds);
        if mine.is_empty() {
            return;
        }
        instructions.push(RenderInstruction::new(*target, mine));
        if self.opaque {
            *damage = damage.subtract_rect(self.bounds);
        }
    }

    fn render(&mut self, _: &mut dyn Renderer, instruction: &RenderInstruction) {
        self.ops.borrow_mut().push(Op::Draw {
            name: self.name,
            damage: instruction.damage.clone(),
        });
    }

    fn compute_visibility(&mut self, _: OutputId, visible: &mut Region) {
        *self.visible.borrow_mut() = Some(visible.intersect_rect(self.bounds));
        *visible = visible.subtract_rect(self.bounds);
    }

    fn try_scanout(&mut self, _: &mut dyn OutputDevice) -> DirectScanout {
        self.scanout
    }
}
