// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Postprocessing filters with ping-pong auxiliary buffers.
//!
//! While at least one filter is registered, the scene is rendered into a
//! separate *scene buffer* instead of the swapchain buffer. Filters then run
//! in order, each reading the previous filter's output:
//!
//! ```text
//!   1 filter:   scene ─► output
//!   2 filters:  scene ─► aux0 ─► output
//!   3 filters:  scene ─► aux0 ─► aux1 ─► output
//!   4 filters:  scene ─► aux0 ─► aux1 ─► aux0 ─► output
//! ```
//!
//! The scene buffer is never written by a filter. Only the damaged part of the
//! scene is repainted each frame, so the scene buffer must stay fully valid
//! from one frame to the next.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::error::RenderError;
use crate::pass::Renderer;
use crate::resource::BufferId;

/// A filter reading one buffer and writing another: `(renderer, source,
/// destination)`.
pub type PostFilter = Box<dyn FnMut(&mut dyn Renderer, BufferId, BufferId)>;

/// Identifies a registered filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PostId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct AuxBuffers {
    scene: BufferId,
    aux: [BufferId; 2],
    width: i32,
    height: i32,
}

/// The ordered filter list and the buffers it renders through.
#[derive(Default)]
pub struct PostprocessChain {
    filters: Vec<(PostId, PostFilter)>,
    next_id: u32,
    buffers: Option<AuxBuffers>,
    output_buffer: Option<BufferId>,
}

impl fmt::Debug for PostprocessChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostprocessChain")
            .field("filters", &self.filters.len())
            .field("buffers", &self.buffers)
            .field("output_buffer", &self.output_buffer)
            .finish_non_exhaustive()
    }
}

impl PostprocessChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter.
    pub fn add(&mut self, filter: PostFilter) -> PostId {
        let id = PostId(self.next_id);
        self.next_id += 1;
        self.filters.push((id, filter));
        id
    }

    /// Removes a filter. Returns `false` if it was not registered.
    pub fn remove(&mut self, id: PostId) -> bool {
        let before = self.filters.len();
        self.filters.retain(|(f, _)| *f != id);
        self.filters.len() != before
    }

    /// Number of registered filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if no filter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns `true` if the chain does not need the composited frame.
    #[must_use]
    pub fn can_scanout(&self) -> bool {
        self.is_empty()
    }

    /// Makes sure the scene and auxiliary buffers exist at the given size.
    ///
    /// Does nothing while the chain is empty. Buffers of a different size are
    /// freed and reallocated.
    pub fn allocate(
        &mut self,
        renderer: &mut dyn Renderer,
        width: i32,
        height: i32,
    ) -> Result<(), RenderError> {
        if self.filters.is_empty() {
            return Ok(());
        }
        if self
            .buffers
            .is_some_and(|b| b.width == width && b.height == height)
        {
            return Ok(());
        }
        self.release(renderer);

        let scene = renderer.allocate_buffer(width, height)?;
        let aux0 = match renderer.allocate_buffer(width, height) {
            Ok(b) => b,
            Err(e) => {
                renderer.free_buffer(scene);
                return Err(e);
            }
        };
        let aux1 = match renderer.allocate_buffer(width, height) {
            Ok(b) => b,
            Err(e) => {
                renderer.free_buffer(scene);
                renderer.free_buffer(aux0);
                return Err(e);
            }
        };
        self.buffers = Some(AuxBuffers {
            scene,
            aux: [aux0, aux1],
            width,
            height,
        });
        Ok(())
    }

    /// Frees the scene and auxiliary buffers.
    pub fn release(&mut self, renderer: &mut dyn Renderer) {
        if let Some(b) = self.buffers.take() {
            renderer.free_buffer(b.scene);
            renderer.free_buffer(b.aux[0]);
            renderer.free_buffer(b.aux[1]);
        }
    }

    /// Sets the buffer the last filter writes to.
    pub fn set_current_buffer(&mut self, buffer: Option<BufferId>) {
        self.output_buffer = buffer;
    }

    /// The buffer the scene should be rendered into: the scene buffer while
    /// filters are registered, the output buffer otherwise.
    #[must_use]
    pub fn target_buffer(&self) -> Option<BufferId> {
        match self.buffers {
            Some(b) if !self.filters.is_empty() => Some(b.scene),
            _ => self.output_buffer,
        }
    }

    /// The `(source, destination)` pair of each filter, in order.
    ///
    /// Empty until both [`allocate`](Self::allocate) and
    /// [`set_current_buffer`](Self::set_current_buffer) have been called.
    #[must_use]
    pub fn passes(&self) -> Vec<(BufferId, BufferId)> {
        let (Some(b), Some(output)) = (self.buffers, self.output_buffer) else {
            return Vec::new();
        };
        let last = self.filters.len().saturating_sub(1);
        let mut source = b.scene;
        (0..self.filters.len())
            .map(|i| {
                let dest = if i == last { output } else { b.aux[i % 2] };
                let pass = (source, dest);
                source = dest;
                pass
            })
            .collect()
    }

    /// Runs every filter, ending in the output buffer.
    pub fn run(&mut self, renderer: &mut dyn Renderer) {
        let passes = self.passes();
        for ((_, filter), (source, dest)) in self.filters.iter_mut().zip(passes) {
            filter(renderer, source, dest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::{Color, PassDescriptor};
    use crate::resource::DepthAttachment;
    use alloc::rc::Rc;
    use core::cell::RefCell;
    use strata_core::region::Region;

    #[derive(Default)]
    struct Buffers {
        next: u64,
        live: Vec<BufferId>,
        fail_after: Option<usize>,
    }

    impl Renderer for Buffers {
        fn begin_pass(&mut self, _: &PassDescriptor<'_>) -> Result<(), RenderError> {
            Ok(())
        }
        fn clear(&mut self, _: &Region, _: Color) {}
        fn submit(&mut self) -> Result<(), RenderError> {
            Ok(())
        }
        fn allocate_buffer(&mut self, width: i32, height: i32) -> Result<BufferId, RenderError> {
            if self.fail_after.is_some_and(|n| self.live.len() >= n) {
                return Err(RenderError::Allocate { width, height });
            }
            self.next += 1;
            let id = BufferId(100 + self.next);
            self.live.push(id);
            Ok(id)
        }
        fn free_buffer(&mut self, buffer: BufferId) {
            self.live.retain(|b| *b != buffer);
        }
        fn create_depth(
            &mut self,
            _: BufferId,
            _: i32,
            _: i32,
        ) -> Result<DepthAttachment, RenderError> {
            Ok(DepthAttachment(0))
        }
        fn free_depth(&mut self, _: DepthAttachment) {}
    }

    const OUT: BufferId = BufferId(1);

    type PassLog = Rc<RefCell<Vec<(u64, u64)>>>;

    fn chain_with(n: usize, renderer: &mut Buffers) -> (PostprocessChain, PassLog) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut chain = PostprocessChain::new();
        for _ in 0..n {
            let log = log.clone();
            chain.add(Box::new(move |_, src, dst| log.borrow_mut().push((src.0, dst.0))));
        }
        chain.allocate(renderer, 64, 64).unwrap();
        chain.set_current_buffer(Some(OUT));
        (chain, log)
    }

    #[test]
    fn empty_chain_renders_straight_to_output() {
        let mut renderer = Buffers::default();
        let (chain, _) = chain_with(0, &mut renderer);
        assert!(renderer.live.is_empty(), "nothing allocated");
        assert_eq!(chain.target_buffer(), Some(OUT));
        assert!(chain.can_scanout());
    }

    #[test]
    fn single_filter_reads_scene_writes_output() {
        let mut renderer = Buffers::default();
        let (mut chain, log) = chain_with(1, &mut renderer);
        assert_eq!(chain.target_buffer(), Some(BufferId(101)));
        chain.run(&mut renderer);
        assert_eq!(*log.borrow(), [(101, 1)]);
    }

    #[test]
    fn even_chain_ping_pongs_through_aux() {
        let mut renderer = Buffers::default();
        let (mut chain, log) = chain_with(4, &mut renderer);
        chain.run(&mut renderer);
        assert_eq!(*log.borrow(), [(101, 102), (102, 103), (103, 102), (102, 1)]);
    }

    #[test]
    fn odd_chain_never_writes_scene_buffer() {
        let mut renderer = Buffers::default();
        let (mut chain, log) = chain_with(3, &mut renderer);
        chain.run(&mut renderer);
        assert_eq!(*log.borrow(), [(101, 102), (102, 103), (103, 1)]);
        assert!(
            log.borrow().iter().all(|&(_, dst)| dst != 101),
            "scene buffer stays intact"
        );
    }

    #[test]
    fn resize_reallocates_and_same_size_does_not() {
        let mut renderer = Buffers::default();
        let (mut chain, _) = chain_with(1, &mut renderer);
        chain.allocate(&mut renderer, 64, 64).unwrap();
        assert_eq!(renderer.live, [BufferId(101), BufferId(102), BufferId(103)]);

        chain.allocate(&mut renderer, 32, 32).unwrap();
        assert_eq!(renderer.live, [BufferId(104), BufferId(105), BufferId(106)]);
        assert_eq!(chain.target_buffer(), Some(BufferId(104)));
    }

    #[test]
    fn failed_allocation_frees_partial_buffers() {
        let mut renderer = Buffers {
            fail_after: Some(2),
            ..Buffers::default()
        };
        let mut chain = PostprocessChain::new();
        chain.add(Box::new(|_, _, _| {}));
        let err = chain.allocate(&mut renderer, 8, 8).unwrap_err();
        assert_eq!(err, RenderError::Allocate { width: 8, height: 8 });
        assert!(renderer.live.is_empty(), "no leaked buffers");
        assert!(chain.passes().is_empty());
    }

    #[test]
    fn removing_last_filter_restores_output_target() {
        let mut renderer = Buffers::default();
        let (mut chain, _) = chain_with(1, &mut renderer);
        let id = PostId(0);
        assert!(chain.remove(id));
        assert!(!chain.remove(id));
        assert_eq!(chain.target_buffer(), Some(OUT));
    }
}
