// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-output effect hooks.
//!
//! Other subsystems attach callbacks to four stages of a repaint without the
//! frame loop knowing who they are:
//!
//! | Stage                      | Runs                                       |
//! |----------------------------|--------------------------------------------|
//! | [`EffectStage::Pre`]       | before the scanout decision                |
//! | [`EffectStage::Damage`]    | right after `Pre`, to add damage           |
//! | [`EffectStage::Overlay`]   | after the scene, before postprocessing     |
//! | [`EffectStage::Post`]      | after the frame has been submitted         |
//!
//! Hooks run in registration order. A hook may unregister any hook, itself
//! included, while a stage is running; the removal takes effect immediately
//! for the rest of the run.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use strata_core::output::OutputInfo;
use strata_core::region::Region;

use crate::pass::{RenderTarget, Renderer};

/// When an effect hook runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectStage {
    /// Before anything else in the repaint.
    Pre,
    /// Collects extra damage for the repaint.
    Damage,
    /// Draws on top of the scene, before postprocessing.
    Overlay,
    /// After submission, for cleanup and telemetry.
    Post,
}

impl EffectStage {
    /// Every stage, in execution order.
    pub const ALL: [Self; 4] = [Self::Pre, Self::Damage, Self::Overlay, Self::Post];

    const fn index(self) -> usize {
        match self {
            Self::Pre => 0,
            Self::Damage => 1,
            Self::Overlay => 2,
            Self::Post => 3,
        }
    }
}

/// Identifies a registered effect hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HookId(u32);

/// What a running hook can see and touch.
pub struct EffectContext<'a> {
    /// The output being repainted.
    pub output: &'a OutputInfo,
    /// The stage being run.
    pub stage: EffectStage,
    /// During `Pre` and `Damage`: output-local logical damage to add to the
    /// frame. During `Overlay`: the swap damage in buffer pixels, which hooks
    /// may grow. Unused during `Post`.
    pub damage: &'a mut Region,
    /// The renderer, with a pass in progress during `Overlay`.
    pub renderer: Option<&'a mut dyn Renderer>,
    /// The pass target during `Overlay`.
    pub target: Option<&'a RenderTarget>,
    id: HookId,
    removed: &'a mut Vec<HookId>,
}

impl fmt::Debug for EffectContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectContext")
            .field("output", &self.output.id)
            .field("stage", &self.stage)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl EffectContext<'_> {
    /// The running hook.
    #[must_use]
    pub fn id(&self) -> HookId {
        self.id
    }

    /// Unregisters the running hook.
    pub fn remove_self(&mut self) {
        let id = self.id;
        self.remove(id);
    }

    /// Unregisters a hook. Hooks later in the current run are skipped.
    pub fn remove(&mut self, id: HookId) {
        if !self.removed.contains(&id) {
            self.removed.push(id);
        }
    }
}

/// A callback run at one stage of every repaint.
pub type EffectHook = Box<dyn FnMut(&mut EffectContext<'_>)>;

struct Entry {
    id: HookId,
    hook: EffectHook,
}

/// Ordered hook lists, one per [`EffectStage`].
#[derive(Default)]
pub struct EffectRegistry {
    stages: [Vec<Entry>; 4],
    next_id: u32,
}

impl fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("pre", &self.stages[0].len())
            .field("damage", &self.stages[1].len())
            .field("overlay", &self.stages[2].len())
            .field("post", &self.stages[3].len())
            .finish_non_exhaustive()
    }
}

impl EffectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a hook at the end of `stage`.
    pub fn register(&mut self, stage: EffectStage, hook: EffectHook) -> HookId {
        let id = HookId(self.next_id);
        self.next_id += 1;
        self.stages[stage.index()].push(Entry { id, hook });
        id
    }

    /// Removes a hook from whichever stage holds it.
    ///
    /// Returns `false` if the hook was not registered.
    pub fn unregister(&mut self, id: HookId) -> bool {
        let mut found = false;
        for list in &mut self.stages {
            let before = list.len();
            list.retain(|e| e.id != id);
            found |= list.len() != before;
        }
        found
    }

    /// Number of hooks registered for `stage`.
    #[must_use]
    pub fn len(&self, stage: EffectStage) -> usize {
        self.stages[stage.index()].len()
    }

    /// Returns `true` if no hook is registered for any stage.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.iter().all(Vec::is_empty)
    }

    /// Returns `true` if nothing needs the composited frame, i.e. no
    /// `Overlay` or `Post` hook is registered.
    #[must_use]
    pub fn can_scanout(&self) -> bool {
        self.len(EffectStage::Overlay) == 0 && self.len(EffectStage::Post) == 0
    }

    /// Runs every hook of `stage` in registration order.
    pub fn run(
        &mut self,
        stage: EffectStage,
        output: &OutputInfo,
        damage: &mut Region,
        mut renderer: Option<&mut dyn Renderer>,
        target: Option<&RenderTarget>,
    ) {
        let mut removed = Vec::new();
        for entry in &mut self.stages[stage.index()] {
            if removed.contains(&entry.id) {
                continue;
            }
            let mut ctx = EffectContext {
                output,
                stage,
                damage: &mut *damage,
                renderer: renderer.as_mut().map(|r| &mut **r as &mut dyn Renderer),
                target,
                id: entry.id,
                removed: &mut removed,
            };
            (entry.hook)(&mut ctx);
        }
        for id in removed {
            self.unregister(id);
        }
    }
}
