// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage history for partial re-rendering of swapchain buffers.
//!
//! A swapchain hands out buffers whose contents are some number of frames old.
//! [`DamageRing`] remembers the damage of the last [`PREVIOUS_LEN`] frames so
//! that only the pixels that changed since a buffer was last drawn need to be
//! repainted.

use strata_core::geometry::Geometry;
use strata_core::region::Region;

/// Number of past frames whose damage is remembered.
pub const PREVIOUS_LEN: usize = 2;

/// Current and historical damage for one output, in buffer pixels.
#[derive(Clone, Debug, Default)]
pub struct DamageRing {
    width: i32,
    height: i32,
    current: Region,
    previous: [Region; PREVIOUS_LEN],
    previous_idx: usize,
}

impl DamageRing {
    /// Creates a ring covering a `width`×`height` buffer.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// The whole buffer.
    #[must_use]
    pub fn bounds(&self) -> Geometry {
        Geometry::new(0, 0, self.width, self.height)
    }

    /// Damage accumulated since the last [`rotate`](Self::rotate).
    #[must_use]
    pub fn current(&self) -> &Region {
        &self.current
    }

    /// Changes the buffer size. A real change damages the whole buffer.
    pub fn set_bounds(&mut self, width: i32, height: i32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.add_whole();
    }

    /// Adds damage, clipped to the buffer.
    ///
    /// Returns `true` if any pixel inside the buffer was damaged.
    pub fn add(&mut self, damage: &Region) -> bool {
        let clipped = damage.intersect_rect(self.bounds());
        if clipped.is_empty() {
            return false;
        }
        self.current.union(&clipped);
        true
    }

    /// Adds a single box of damage. See [`add`](Self::add).
    pub fn add_box(&mut self, damage: Geometry) -> bool {
        self.add(&Region::from_rect(damage))
    }

    /// Damages the whole buffer.
    pub fn add_whole(&mut self) {
        self.current = Region::from_rect(self.bounds());
    }

    /// Ends a frame: the current damage becomes the most recent history entry.
    pub fn rotate(&mut self) {
        self.previous_idx = (self.previous_idx + PREVIOUS_LEN - 1) % PREVIOUS_LEN;
        self.previous[self.previous_idx] = core::mem::take(&mut self.current);
    }

    /// Returns the pixels that are stale in a buffer of the given age.
    ///
    /// An age of 1 means the buffer holds the previous frame, so only the
    /// current damage is stale. Unknown ages (0 or less) and ages older than
    /// the history damage the whole buffer.
    #[must_use]
    pub fn buffer_damage(&self, buffer_age: i32) -> Region {
        let history = usize::try_from(buffer_age)
            .ok()
            .and_then(|age| age.checked_sub(1))
            .filter(|&n| n <= PREVIOUS_LEN);
        let Some(history) = history else {
            return Region::from_rect(self.bounds());
        };

        let mut damage = self.current.clone();
        for i in 0..history {
            damage.union(&self.previous[(self.previous_idx + i) % PREVIOUS_LEN]);
        }
        damage.intersect_rect(self.bounds())
    }
}
