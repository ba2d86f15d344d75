// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small pool of depth attachments keyed by framebuffer.
//!
//! Some effects render in 3D and need a depth buffer on whatever framebuffer
//! they draw into. Depth attachments are expensive, so at most
//! [`MAX_DEPTH_BUFFERS`] exist at once; when the pool is full the least
//! recently attached one is moved to the new framebuffer.
//!
//! The pool is only active while something has declared it
//! [required](DepthBufferPool::set_required). Once the last requirement is
//! dropped every attachment is freed.

use alloc::vec::Vec;

use strata_core::time::HostTime;

use crate::error::RenderError;
use crate::pass::Renderer;
use crate::resource::{BufferId, DepthAttachment};

/// Maximum number of live depth attachments.
pub const MAX_DEPTH_BUFFERS: usize = 3;

/// One pooled depth attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthEntry {
    /// The attachment, if one has been created.
    pub attachment: Option<DepthAttachment>,
    /// Framebuffer the attachment is bound to.
    pub framebuffer: Option<BufferId>,
    /// Attachment width.
    pub width: i32,
    /// Attachment height.
    pub height: i32,
    /// When the attachment was last (re)bound.
    pub last_used: HostTime,
}

impl DepthEntry {
    const EMPTY: Self = Self {
        attachment: None,
        framebuffer: None,
        width: 0,
        height: 0,
        last_used: HostTime(0),
    };
}

/// Bounded LRU cache of depth attachments.
#[derive(Clone, Debug, Default)]
pub struct DepthBufferPool {
    entries: Vec<DepthEntry>,
    required: i32,
}

impl DepthBufferPool {
    /// Creates an inactive, empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The pooled entries.
    #[must_use]
    pub fn entries(&self) -> &[DepthEntry] {
        &self.entries
    }

    /// Returns `true` while at least one requirement is held.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required > 0
    }

    /// Takes (`true`) or drops (`false`) one requirement on the pool.
    ///
    /// When no requirement is left, every attachment is freed.
    pub fn set_required(&mut self, renderer: &mut dyn Renderer, required: bool) {
        self.required += if required { 1 } else { -1 };
        if self.required <= 0 {
            self.free_all(renderer);
        }
    }

    /// Makes sure `framebuffer` has a `width`×`height` depth attachment.
    ///
    /// Does nothing for the default framebuffer, which brings its own depth
    /// buffer, or while the pool is not required.
    pub fn ensure(
        &mut self,
        renderer: &mut dyn Renderer,
        framebuffer: BufferId,
        width: i32,
        height: i32,
        now: HostTime,
    ) -> Result<(), RenderError> {
        if framebuffer.is_default() || self.required <= 0 {
            return Ok(());
        }
        let idx = self.find(framebuffer);
        let entry = &mut self.entries[idx];
        if entry.framebuffer == Some(framebuffer)
            && entry.width == width
            && entry.height == height
        {
            return Ok(());
        }

        if let Some(old) = entry.attachment.take() {
            renderer.free_depth(old);
        }
        *entry = DepthEntry::EMPTY;
        let attachment = renderer.create_depth(framebuffer, width, height)?;
        *entry = DepthEntry {
            attachment: Some(attachment),
            framebuffer: Some(framebuffer),
            width,
            height,
            last_used: now,
        };
        Ok(())
    }

    /// Frees every attachment and empties the pool.
    pub fn free_all(&mut self, renderer: &mut dyn Renderer) {
        for entry in self.entries.drain(..) {
            if let Some(attachment) = entry.attachment {
                renderer.free_depth(attachment);
            }
        }
    }

    /// Index of the entry to use for `framebuffer`: its own, a fresh one, or
    /// the least recently used.
    fn find(&mut self, framebuffer: BufferId) -> usize {
        if let Some(idx) = self
            .entries
            .iter()
            .position(|e| e.framebuffer == Some(framebuffer))
        {
            return idx;
        }
        if self.entries.len() < MAX_DEPTH_BUFFERS {
            self.entries.push(DepthEntry::EMPTY);
            return self.entries.len() - 1;
        }
        self.entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.last_used)
            .map_or(0, |(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::{Color, PassDescriptor};
    use strata_core::region::Region;

    #[derive(Default)]
    struct DepthRenderer {
        next: u64,
        created: Vec<(BufferId, i32, i32)>,
        freed: Vec<DepthAttachment>,
        fail: bool,
    }

    impl Renderer for DepthRenderer {
        fn begin_pass(&mut self, _: &PassDescriptor<'_>) -> Result<(), RenderError> {
            Ok(())
        }
        fn clear(&mut self, _: &Region, _: Color) {}
        fn submit(&mut self) -> Result<(), RenderError> {
            Ok(())
        }
        fn allocate_buffer(&mut self, _: i32, _: i32) -> Result<BufferId, RenderError> {
            Ok(BufferId(1))
        }
        fn free_buffer(&mut self, _: BufferId) {}
        fn create_depth(
            &mut self,
            framebuffer: BufferId,
            width: i32,
            height: i32,
        ) -> Result<DepthAttachment, RenderError> {
            if self.fail {
                return Err(RenderError::Depth { width, height });
            }
            self.next += 1;
            self.created.push((framebuffer, width, height));
            Ok(DepthAttachment(self.next))
        }
        fn free_depth(&mut self, depth: DepthAttachment) {
            self.freed.push(depth);
        }
    }

    fn required_pool(renderer: &mut DepthRenderer) -> DepthBufferPool {
        let mut pool = DepthBufferPool::new();
        pool.set_required(renderer, true);
        pool
    }

    #[test]
    fn inactive_pool_and_default_framebuffer_are_ignored() {
        let mut renderer = DepthRenderer::default();
        let mut pool = DepthBufferPool::new();
        pool.ensure(&mut renderer, BufferId(5), 10, 10, HostTime(1)).unwrap();
        pool.set_required(&mut renderer, true);
        pool.ensure(&mut renderer, BufferId::DEFAULT, 10, 10, HostTime(1))
            .unwrap();
        assert!(renderer.created.is_empty());
        assert!(pool.entries().is_empty());
    }

    #[test]
    fn same_framebuffer_and_size_is_reused() {
        let mut renderer = DepthRenderer::default();
        let mut pool = required_pool(&mut renderer);
        pool.ensure(&mut renderer, BufferId(5), 10, 10, HostTime(1)).unwrap();
        pool.ensure(&mut renderer, BufferId(5), 10, 10, HostTime(2)).unwrap();
        assert_eq!(renderer.created.len(), 1);
        assert_eq!(pool.entries()[0].last_used, HostTime(1));
    }

    #[test]
    fn resize_replaces_attachment() {
        let mut renderer = DepthRenderer::default();
        let mut pool = required_pool(&mut renderer);
        pool.ensure(&mut renderer, BufferId(5), 10, 10, HostTime(1)).unwrap();
        pool.ensure(&mut renderer, BufferId(5), 20, 10, HostTime(2)).unwrap();
        assert_eq!(renderer.freed, [DepthAttachment(1)]);
        assert_eq!(pool.entries().len(), 1);
        assert_eq!(pool.entries()[0].width, 20);
        assert_eq!(pool.entries()[0].last_used, HostTime(2));
    }

    #[test]
    fn fourth_framebuffer_evicts_least_recently_used() {
        let mut renderer = DepthRenderer::default();
        let mut pool = required_pool(&mut renderer);
        pool.ensure(&mut renderer, BufferId(1), 10, 10, HostTime(30)).unwrap();
        pool.ensure(&mut renderer, BufferId(2), 10, 10, HostTime(10)).unwrap();
        pool.ensure(&mut renderer, BufferId(3), 10, 10, HostTime(20)).unwrap();
        pool.ensure(&mut renderer, BufferId(4), 10, 10, HostTime(40)).unwrap();

        assert_eq!(pool.entries().len(), MAX_DEPTH_BUFFERS);
        assert_eq!(renderer.freed, [DepthAttachment(2)]);
        let bound: Vec<_> = pool.entries().iter().map(|e| e.framebuffer).collect();
        assert_eq!(
            bound,
            [Some(BufferId(1)), Some(BufferId(4)), Some(BufferId(3))]
        );
    }

    #[test]
    fn dropping_last_requirement_frees_everything() {
        let mut renderer = DepthRenderer::default();
        let mut pool = required_pool(&mut renderer);
        pool.set_required(&mut renderer, true);
        pool.ensure(&mut renderer, BufferId(1), 10, 10, HostTime(1)).unwrap();
        pool.ensure(&mut renderer, BufferId(2), 10, 10, HostTime(2)).unwrap();

        pool.set_required(&mut renderer, false);
        assert_eq!(pool.entries().len(), 2, "still required once");
        pool.set_required(&mut renderer, false);
        assert!(!pool.is_required());
        assert!(pool.entries().is_empty());
        assert_eq!(renderer.freed.len(), 2);
    }

    #[test]
    fn failed_creation_leaves_no_stale_binding() {
        let mut renderer = DepthRenderer::default();
        let mut pool = required_pool(&mut renderer);
        pool.ensure(&mut renderer, BufferId(1), 10, 10, HostTime(1)).unwrap();
        renderer.fail = true;
        let err = pool.ensure(&mut renderer, BufferId(1), 20, 20, HostTime(2));
        assert_eq!(err, Err(RenderError::Depth { width: 20, height: 20 }));
        assert_eq!(pool.entries()[0].framebuffer, None);
        assert_eq!(pool.entries()[0].attachment, None);
    }
}
