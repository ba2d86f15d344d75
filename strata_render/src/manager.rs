// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-output frame orchestrator.
//!
//! [`RenderManager`] owns everything needed to turn the current scene into a
//! frame on one output and sequences it:
//!
//! ```text
//!   vblank ─► on_frame ─► delay? ──yes──► (timer) ─┐
//!                           │ no                   │
//!                           ▼                      ▼
//!                         paint ◄──────────────────┘
//!                           │
//!   Pre + Damage hooks ─► direct scanout? ──success──► done
//!                           │
//!                           ▼
//!   start_frame ──none──► skip
//!       │
//!       ▼
//!   bind buffers ─► scene pass ─► Overlay hooks ─► postprocessing
//!       ─► inhibit ─► software cursors ─► submit/commit ─► Post hooks
//! ```
//!
//! Everything runs on the event-loop thread. Deferred work (whole-output
//! damage after a configuration change, visibility recomputation) is
//! coalesced into [`IdleTasks`] and executed by [`RenderManager::run_idle`].

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use strata_core::delay::{DelayConfig, FrameTiming, RepaintDelayController};
use strata_core::geometry::Geometry;
use strata_core::output::OutputInfo;
use strata_core::region::Region;
use strata_core::scene::{SceneChanges, UpdateFlags};
use strata_core::time::{Duration, HostTime};
use strata_core::trace::{
    DelayAdjustEvent, FrameOutcome, FrameSkippedEvent, FrameStartEvent, FrameSummaryBuilder,
    ScanoutEvent, SkipReason, SubmitEvent, SubmitFailedEvent, Tracer,
};

use crate::config::RenderConfig;
use crate::depth::DepthBufferPool;
use crate::device::{OutputDevice, OutputState};
use crate::effects::{EffectHook, EffectRegistry, EffectStage, HookId};
use crate::error::RenderError;
use crate::instance::{
    DamageQueue, DirectScanout, InstanceSource, RenderInstance, RenderInstruction,
    compute_visibility_from_list, try_scanout_from_list,
};
use crate::pass::{Color, PassDescriptor, RenderTarget, Renderer};
use crate::postprocess::{PostFilter, PostId, PostprocessChain};
use crate::resource::ColorTransform;
use crate::swapchain::{FrameObject, SwapchainDamageManager};

bitflags::bitflags! {
    /// Deferred work waiting for the event loop to go idle.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct IdleTasks: u8 {
        /// Damage the whole output once more.
        const DAMAGE_WHOLE         = 0b0000_0001;
        /// Recompute the visibility of every render instance.
        const RECOMPUTE_VISIBILITY = 0b0000_0010;
    }
}

/// What [`RenderManager::on_frame`] did with a frame event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameAction {
    /// The session is inactive; nothing was done.
    Ignored,
    /// The output was painted right away.
    Painted(FrameOutcome),
    /// The caller should call [`RenderManager::paint`] after this many
    /// milliseconds.
    Delayed {
        /// Delay in milliseconds.
        delay_ms: u32,
    },
}

/// Frame orchestrator for one output.
pub struct RenderManager<D, R> {
    device: D,
    renderer: R,
    config: RenderConfig,
    swapchain: SwapchainDamageManager,
    effects: EffectRegistry,
    postprocess: PostprocessChain,
    depth: DepthBufferPool,
    delay: RepaintDelayController,
    instances: Vec<Box<dyn RenderInstance>>,
    pushed_damage: DamageQueue,
    idle: IdleTasks,
    inhibit: i32,
    color_transform: Option<ColorTransform>,
    session_active: bool,
    frame_index: u64,
}

impl<D, R> fmt::Debug for RenderManager<D, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderManager")
            .field("config", &self.config)
            .field("swapchain", &self.swapchain)
            .field("effects", &self.effects)
            .field("postprocess", &self.postprocess)
            .field("depth", &self.depth)
            .field("delay", &self.delay)
            .field("instances", &self.instances.len())
            .field("idle", &self.idle)
            .field("inhibit", &self.inhibit)
            .field("frame_index", &self.frame_index)
            .finish_non_exhaustive()
    }
}

impl<D: OutputDevice, R: Renderer> RenderManager<D, R> {
    /// Creates the orchestrator and schedules a first repaint.
    pub fn new(mut device: D, renderer: R, config: RenderConfig) -> Self {
        let mut swapchain = SwapchainDamageManager::new(&device.info());
        swapchain.schedule_repaint(&mut device);
        Self {
            device,
            renderer,
            config,
            swapchain,
            effects: EffectRegistry::new(),
            postprocess: PostprocessChain::new(),
            depth: DepthBufferPool::new(),
            delay: RepaintDelayController::new(config.delay),
            instances: Vec::new(),
            pushed_damage: DamageQueue::new(),
            idle: IdleTasks::empty(),
            inhibit: 0,
            color_transform: None,
            session_active: true,
            frame_index: 0,
        }
    }

    /// The output device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The output device, mutably.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The renderer, mutably.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Current configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Damage and swapchain state.
    pub fn swapchain(&self) -> &SwapchainDamageManager {
        &self.swapchain
    }

    /// The repaint delay controller.
    pub fn delay(&self) -> &RepaintDelayController {
        &self.delay
    }

    /// The depth buffer pool.
    pub fn depth_buffers(&self) -> &DepthBufferPool {
        &self.depth
    }

    /// The postprocessing chain.
    pub fn postprocess(&self) -> &PostprocessChain {
        &self.postprocess
    }

    /// The registered effect hooks.
    pub fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    /// Number of render instances.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Deferred work waiting for [`run_idle`](Self::run_idle).
    pub fn pending_idle(&self) -> IdleTasks {
        self.idle
    }

    /// Returns `true` while rendering is inhibited.
    pub fn is_inhibited(&self) -> bool {
        self.inhibit > 0
    }

    // -- Scene ---------------------------------------------------------------

    /// Generates the first instance list.
    pub fn start_rendering(&mut self, source: &mut dyn InstanceSource) {
        self.update_scene(source, UpdateFlags::CHILDREN_LIST);
    }

    /// Reacts to a scene update: instance lists are regenerated on
    /// `CHILDREN_LIST` or `ENABLED`, and visibility is recomputed on idle for
    /// those and `GEOMETRY`.
    pub fn update_scene(&mut self, source: &mut dyn InstanceSource, flags: UpdateFlags) {
        let regenerate_on = UpdateFlags::CHILDREN_LIST | UpdateFlags::ENABLED;
        let info = self.device.info();
        if flags.intersects(regenerate_on) {
            log::debug!("output {:?}: regenerating instances", info.id);
            self.instances = source.generate_render_instances(&info, &self.pushed_damage);
        }
        if flags.intersects(regenerate_on | UpdateFlags::GEOMETRY) {
            self.idle |= IdleTasks::RECOMPUTE_VISIBILITY;
        }
    }

    /// Applies drained scene changes: updates instances and damages the
    /// output with the root damage.
    pub fn apply_scene_changes(&mut self, source: &mut dyn InstanceSource, changes: &SceneChanges) {
        self.update_scene(source, changes.flags);
        self.damage_from_layout(&changes.damage);
    }

    /// Damages the output with a region in layout coordinates.
    pub fn damage_from_layout(&mut self, region: &Region) {
        let (ox, oy) = self.device.info().layout_origin;
        self.damage(&region.translated(-ox, -oy), true);
    }

    /// Applies damage pushed by render instances.
    pub fn flush_pushed_damage(&mut self) {
        if !self.pushed_damage.is_empty() {
            let pushed = self.pushed_damage.take();
            self.damage_from_layout(&pushed);
        }
    }

    /// Runs deferred work. Call when the event loop goes idle.
    pub fn run_idle(&mut self) {
        self.flush_pushed_damage();
        let tasks = core::mem::take(&mut self.idle);
        if tasks.contains(IdleTasks::DAMAGE_WHOLE) {
            self.swapchain.damage_whole(&mut self.device);
        }
        if tasks.contains(IdleTasks::RECOMPUTE_VISIBILITY) {
            let info = self.device.info();
            log::debug!("output {:?}: recomputing visibility", info.id);
            let mut visible = Region::from_rect(info.layout_geometry());
            compute_visibility_from_list(&mut self.instances, info.id, &mut visible, (0, 0));
        }
    }

    // -- Damage --------------------------------------------------------------

    /// Adds output-local logical damage, scheduling a repaint if `repaint`.
    pub fn damage(&mut self, region: &Region, repaint: bool) {
        self.swapchain.damage(&mut self.device, region, repaint);
    }

    /// Adds a box of output-local logical damage.
    pub fn damage_box(&mut self, b: Geometry, repaint: bool) {
        self.swapchain.damage_box(&mut self.device, b, repaint);
    }

    /// Damages the whole output.
    pub fn damage_whole(&mut self) {
        self.swapchain.damage_whole(&mut self.device);
    }

    /// Damages the whole output now and once more when the event loop goes
    /// idle.
    pub fn damage_whole_idle(&mut self) {
        self.damage_whole();
        self.idle |= IdleTasks::DAMAGE_WHOLE;
    }

    /// Forces a repaint at the next vblank.
    pub fn schedule_redraw(&mut self) {
        self.swapchain.schedule_repaint(&mut self.device);
    }

    /// Damage scheduled for the next frame, in output-local logical
    /// coordinates.
    pub fn scheduled_damage(&self) -> Region {
        self.swapchain.scheduled_damage(&self.device.info())
    }

    // -- Settings ------------------------------------------------------------

    /// Replaces the configuration.
    pub fn set_config(&mut self, config: RenderConfig) {
        if config.delay != self.config.delay {
            self.delay.set_config(config.delay);
        }
        let repaint = config.background_color != self.config.background_color
            || config.damage_debug != self.config.damage_debug;
        self.config = config;
        if repaint {
            self.damage_whole_idle();
        }
    }

    /// Changes the background color.
    pub fn set_background_color(&mut self, color: Color) {
        self.set_config(RenderConfig {
            background_color: color,
            ..self.config
        });
    }

    /// Changes the repaint delay settings.
    pub fn set_delay_config(&mut self, delay: DelayConfig) {
        self.set_config(RenderConfig {
            delay,
            ..self.config
        });
    }

    /// Sets or clears the color transform applied to every pass.
    pub fn set_color_transform(&mut self, transform: Option<ColorTransform>) {
        self.color_transform = transform;
        self.damage_whole_idle();
    }

    /// Takes (`true`) or drops (`false`) one constant-redraw request.
    pub fn set_redraw_always(&mut self, always: bool) {
        self.swapchain.set_redraw_always(&mut self.device, always);
    }

    /// Takes (`true`) or drops (`false`) one rendering inhibition. While any
    /// is held, frames are painted black.
    pub fn add_inhibit(&mut self, add: bool) {
        self.inhibit += if add { 1 } else { -1 };
        if self.inhibit == 0 {
            self.damage_whole_idle();
        }
    }

    /// Takes (`true`) or drops (`false`) one requirement for depth buffers.
    pub fn set_depth_required(&mut self, required: bool) {
        self.depth.set_required(&mut self.renderer, required);
    }

    /// Marks the session active or inactive. Frame events are ignored while
    /// inactive.
    pub fn set_session_active(&mut self, active: bool) {
        let resumed = active && !self.session_active;
        self.session_active = active;
        if resumed {
            self.damage_whole_idle();
        }
    }

    // -- Hooks ---------------------------------------------------------------

    /// Registers an effect hook.
    pub fn add_effect(&mut self, stage: EffectStage, hook: EffectHook) -> HookId {
        self.effects.register(stage, hook)
    }

    /// Unregisters an effect hook.
    pub fn remove_effect(&mut self, id: HookId) -> bool {
        self.effects.unregister(id)
    }

    /// Appends a postprocessing filter.
    pub fn add_post(&mut self, filter: PostFilter) -> PostId {
        let id = self.postprocess.add(filter);
        self.damage_whole_idle();
        id
    }

    /// Removes a postprocessing filter.
    pub fn remove_post(&mut self, id: PostId) -> bool {
        let removed = self.postprocess.remove(id);
        if removed {
            if self.postprocess.is_empty() {
                self.postprocess.release(&mut self.renderer);
            }
            self.damage_whole_idle();
        }
        removed
    }

    // -- Device signals ------------------------------------------------------

    /// Handles the device asking for a new frame.
    pub fn on_needs_frame(&mut self) {
        self.swapchain.on_needs_frame(&mut self.device);
    }

    /// Handles damage reported by the device, in damage space.
    pub fn on_device_damage(&mut self, damage: &Region) {
        self.swapchain.on_device_damage(&mut self.device, damage);
    }

    /// Handles a request to change the output's state.
    pub fn on_request_state(&mut self, state: &OutputState) {
        self.swapchain.on_request_state(&mut self.device, state);
    }

    /// Handles a gamma LUT change.
    pub fn on_gamma_changed(&mut self) {
        self.swapchain.on_gamma_changed(&mut self.device);
    }

    /// Handles presentation feedback carrying the refresh interval.
    pub fn on_present(&mut self, refresh: Duration) {
        self.delay.set_refresh(refresh);
    }

    /// Handles a vblank frame event.
    pub fn on_frame(&mut self, now: HostTime, tracer: &mut Tracer<'_>) -> FrameAction {
        if !self.session_active {
            return FrameAction::Ignored;
        }
        self.frame_index += 1;
        let output = self.device.info().id;

        let old_delay = self.delay.delay();
        let timing = self.delay.start_frame(now);
        let delay_ms = self.delay.delay();
        if timing != FrameTiming::Unknown {
            tracer.delay_adjust(&DelayAdjustEvent {
                frame_index: self.frame_index,
                output,
                timing,
                old_delay_ms: old_delay,
                new_delay_ms: delay_ms,
                consecutive_decrease: self.delay.consecutive_decrease(),
            });
        }
        tracer.frame_start(&FrameStartEvent {
            frame_index: self.frame_index,
            output,
            now,
            delay_ms,
        });

        if delay_ms < 1 {
            FrameAction::Painted(self.paint(now, tracer))
        } else {
            FrameAction::Delayed { delay_ms }
        }
    }

    // -- Painting ------------------------------------------------------------

    /// Returns `true` if the fast path that hands a client buffer directly to
    /// the display may be tried.
    pub fn can_scanout(&self) -> bool {
        self.inhibit == 0
            && self.effects.can_scanout()
            && self.postprocess.can_scanout()
            && self.device.direct_scanout_allowed()
            && self.color_transform.is_none()
            && self.config.allow_direct_scanout
    }

    /// Repaints the output, including every hook.
    pub fn paint(&mut self, now: HostTime, tracer: &mut Tracer<'_>) -> FrameOutcome {
        let info = self.device.info();
        let mut summary = FrameSummaryBuilder::new(self.frame_index, info.id, now);
        summary.set_delay(self.delay.delay());

        let outcome = self.paint_frame(&info, now, tracer, &mut summary);
        if let FrameOutcome::Skipped(reason) = outcome {
            tracer.frame_skipped(&FrameSkippedEvent {
                frame_index: self.frame_index,
                output: info.id,
                reason,
            });
        }
        summary.set_outcome(outcome);
        tracer.frame_summary(&summary.finish());
        outcome
    }

    fn paint_frame(
        &mut self,
        info: &OutputInfo,
        now: HostTime,
        tracer: &mut Tracer<'_>,
        summary: &mut FrameSummaryBuilder,
    ) -> FrameOutcome {
        self.flush_pushed_damage();
        for stage in [EffectStage::Pre, EffectStage::Damage] {
            let mut extra = Region::new();
            self.effects.run(
                stage,
                info,
                &mut extra,
                Some(&mut self.renderer as &mut dyn Renderer),
                None,
            );
            self.swapchain.damage(&mut self.device, &extra, true);
        }

        if self.do_direct_scanout(info, tracer) {
            return FrameOutcome::ScannedOut;
        }

        let frame = match self
            .swapchain
            .start_frame(&mut self.device, self.config.no_damage_tracking)
        {
            Ok(frame) => frame,
            Err(reason) => {
                self.delay.skip_frame();
                return FrameOutcome::Skipped(reason);
            }
        };
        summary.set_buffer_age(frame.buffer_age);

        let target = match self.bind_output(info, &frame, now) {
            Ok(target) => target,
            Err(err) => {
                log::error!("failed to prepare output buffers: {err}");
                self.abandon(frame);
                return FrameOutcome::Skipped(SkipReason::PassFailed);
            }
        };
        let Some(mut swap_damage) = self.render_scene(info, &target) else {
            self.abandon(frame);
            return FrameOutcome::Skipped(SkipReason::PassFailed);
        };

        self.effects.run(
            EffectStage::Overlay,
            info,
            &mut swap_damage,
            Some(&mut self.renderer as &mut dyn Renderer),
            Some(&target),
        );
        if !self.postprocess.is_empty() {
            swap_damage.union_rect(info.damage_box());
        }
        self.postprocess.run(&mut self.renderer);
        if self.inhibit > 0 {
            self.renderer
                .clear(&Region::from_rect(info.damage_box()), Color::BLACK);
        }

        self.device
            .add_software_cursors(&mut self.renderer, &swap_damage);

        #[cfg(feature = "trace-rich")]
        {
            let rects: Vec<strata_core::trace::DamageRect> =
                swap_damage.rects().iter().map(|r| (*r).into()).collect();
            tracer.damage_rects(self.frame_index, &rects);
        }

        let buffer_age = frame.buffer_age;
        let result = self
            .swapchain
            .swap_buffers(&mut self.device, &mut self.renderer, frame);
        self.postprocess.set_current_buffer(None);

        let outcome = match result {
            Ok(()) => {
                tracer.submit(&SubmitEvent {
                    frame_index: self.frame_index,
                    output: info.id,
                    submitted_at: now,
                    buffer_age,
                    damage_rects: u32::try_from(swap_damage.rects().len()).unwrap_or(u32::MAX),
                    damage_area: swap_damage.area(),
                });
                summary.set_damage_area(swap_damage.area());
                FrameOutcome::Presented
            }
            Err(_) => {
                tracer.submit_failed(&SubmitFailedEvent {
                    frame_index: self.frame_index,
                    output: info.id,
                });
                self.delay.skip_frame();
                FrameOutcome::SubmitFailed
            }
        };

        self.post_paint(info);
        outcome
    }

    fn do_direct_scanout(&mut self, info: &OutputInfo, tracer: &mut Tracer<'_>) -> bool {
        if !self.can_scanout() {
            return false;
        }
        let result = try_scanout_from_list(&mut self.instances, &mut self.device);
        tracer.scanout(&ScanoutEvent {
            frame_index: self.frame_index,
            output: info.id,
            outcome: result.into(),
        });
        result == DirectScanout::Success
    }

    /// Points postprocessing at the acquired buffer and prepares the scene
    /// target.
    fn bind_output(
        &mut self,
        info: &OutputInfo,
        frame: &FrameObject,
        now: HostTime,
    ) -> Result<RenderTarget, RenderError> {
        self.postprocess
            .allocate(&mut self.renderer, info.width, info.height)?;
        self.postprocess.set_current_buffer(Some(frame.buffer));
        let buffer = self.postprocess.target_buffer().unwrap_or(frame.buffer);
        self.depth
            .ensure(&mut self.renderer, buffer, info.width, info.height, now)?;

        let (ox, oy) = info.layout_origin;
        Ok(RenderTarget {
            buffer,
            geometry: info.relative_geometry(),
            scale: info.scale,
            transform: info.transform,
        }
        .translated(ox, oy))
    }

    /// Runs the main scene pass and returns the swap damage in buffer
    /// pixels, or `None` if the pass could not begin.
    fn render_scene(&mut self, info: &OutputInfo, target: &RenderTarget) -> Option<Region> {
        let (ox, oy) = info.layout_origin;
        let damage = self
            .swapchain
            .scheduled_damage(info)
            .intersect_rect(info.relative_geometry())
            .translated(ox, oy);

        let desc = PassDescriptor {
            target,
            damage: &damage,
            color_transform: self.color_transform,
        };
        if let Err(err) = self.renderer.begin_pass(&desc) {
            log::error!("{err}");
            return None;
        }

        let mut instructions: Vec<RenderInstruction> = Vec::new();
        let mut background = damage.clone();
        for (idx, instance) in self.instances.iter_mut().enumerate() {
            let start = instructions.len();
            instance.schedule_instructions(&mut instructions, target, &mut background);
            for instruction in &mut instructions[start..] {
                instruction.instance = idx;
            }
        }
        self.renderer.clear(
            &target.region_to_buffer(&background),
            self.config.background_color,
        );
        for instruction in instructions.iter().rev() {
            if let Some(instance) = self.instances.get_mut(instruction.instance) {
                instance.render(&mut self.renderer, instruction);
            }
        }

        let mut swap_damage = damage
            .translated(-ox, -oy)
            .scaled(info.scale)
            .intersect_rect(info.damage_box());
        if self.config.damage_debug {
            let yellow = Region::from_rect(info.damage_box()).subtract(&swap_damage);
            swap_damage.union_rect(info.damage_box());
            self.renderer.clear(&yellow, Color::YELLOW);
        }
        Some(swap_damage)
    }

    /// Gives the buffer back before anything was recorded into it.
    fn abandon(&mut self, frame: FrameObject) {
        self.postprocess.set_current_buffer(None);
        self.swapchain.abandon_frame(&mut self.device, frame);
        self.delay.skip_frame();
    }

    fn post_paint(&mut self, info: &OutputInfo) {
        let mut unused = Region::new();
        self.effects.run(
            EffectStage::Post,
            info,
            &mut unused,
            Some(&mut self.renderer as &mut dyn Renderer),
            None,
        );
        if self.swapchain.constant_redraw() {
            self.swapchain.schedule_repaint(&mut self.device);
        }
    }
}
