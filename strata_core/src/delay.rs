// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adaptive repaint delay.
//!
//! After a vblank asks for a new frame, the compositor may wait a few
//! milliseconds before rendering so that clients get a chance to submit
//! fresher content. The [`RepaintDelayController`] picks that wait: it creeps
//! the delay up by one millisecond at a time while frames keep landing on
//! time, and backs off exponentially when they do not.
//!
//! # Algorithm
//!
//! At every frame start the time since the previous frame start is compared
//! against 1.5× the refresh interval:
//!
//! - **On time**: if at least `increase_window` has passed since the last
//!   adjustment, the delay grows by 1 ms and the window shrinks by a quarter
//!   (never below 200 ms). The exponential back-off resets.
//! - **Missed**: the delay shrinks by the back-off step, which then doubles
//!   (up to 32 ms). Unless the controller has just reached a new stable
//!   state, the window doubles too (up to 30 s), making the next increase
//!   more cautious.
//!
//! A skipped frame makes the next measurement meaningless, so it is ignored.

use crate::time::{Duration, HostTime};

/// Smallest interval between two delay increases.
pub const MIN_INCREASE_WINDOW: Duration = Duration::from_millis(200);

/// Largest interval between two delay increases.
pub const MAX_INCREASE_WINDOW: Duration = Duration::from_millis(30_000);

/// Largest back-off step after consecutive misses, in milliseconds.
pub const MAX_CONSECUTIVE_DECREASE: u32 = 32;

/// Frames that must pass after an increase before a miss stops widening the
/// increase window.
const STABILITY_FRAMES: i32 = 20;

/// Configuration for the [`RepaintDelayController`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DelayConfig {
    /// Time reserved for rendering, in milliseconds. The delay never exceeds
    /// the refresh interval minus this. `None` disables the delay entirely.
    pub max_render_time: Option<u32>,
    /// Adapt the delay to observed frame timing. When `false` the delay is
    /// pinned to its upper bound.
    pub dynamic_delay: bool,
}

impl DelayConfig {
    /// Always render immediately.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            max_render_time: None,
            dynamic_delay: false,
        }
    }

    /// Always wait until `max_render_time` ms before the next vblank.
    #[must_use]
    pub const fn fixed(max_render_time: u32) -> Self {
        Self {
            max_render_time: Some(max_render_time),
            dynamic_delay: false,
        }
    }

    /// Adapt the delay, never leaving less than `max_render_time` ms to
    /// render.
    #[must_use]
    pub const fn dynamic(max_render_time: u32) -> Self {
        Self {
            max_render_time: Some(max_render_time),
            dynamic_delay: true,
        }
    }
}

/// How the previous frame was judged by
/// [`RepaintDelayController::start_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameTiming {
    /// No usable measurement: first frame, a skipped frame, or an unknown
    /// refresh interval.
    Unknown,
    /// The previous frame was presented within 1.5 refresh intervals.
    OnTime,
    /// The previous frame took longer than 1.5 refresh intervals.
    Missed,
}

/// Adaptive controller for the repaint delay of one output.
#[derive(Clone, Debug)]
pub struct RepaintDelayController {
    config: DelayConfig,
    /// Unclamped delay in milliseconds.
    delay: i64,
    increase_window: Duration,
    last_increase: HostTime,
    /// Counts down after an increase; a miss while it is non-negative
    /// widens the increase window.
    stability: i32,
    consecutive_decrease: u32,
    last_pageflip: Option<HostTime>,
    refresh: Duration,
}

impl RepaintDelayController {
    /// Creates a controller with zero delay and an unknown refresh interval.
    #[must_use]
    pub fn new(config: DelayConfig) -> Self {
        Self {
            config,
            delay: 0,
            increase_window: MIN_INCREASE_WINDOW,
            last_increase: HostTime(0),
            stability: 0,
            consecutive_decrease: 1,
            last_pageflip: None,
            refresh: Duration::ZERO,
        }
    }

    /// Records the start of a frame at `now` and adapts the delay to how long
    /// the previous frame took.
    pub fn start_frame(&mut self, now: HostTime) -> FrameTiming {
        let Some(last_pageflip) = self.last_pageflip.replace(now) else {
            return FrameTiming::Unknown;
        };
        if self.refresh.is_zero() {
            return FrameTiming::Unknown;
        }

        let threshold = self.refresh.mul_ratio(3, 2);
        let frame_len = now.saturating_duration_since(last_pageflip);
        if frame_len <= threshold {
            if now.saturating_duration_since(self.last_increase) >= self.increase_window {
                self.increase_window = self
                    .increase_window
                    .mul_ratio(3, 4)
                    .clamp(MIN_INCREASE_WINDOW, MAX_INCREASE_WINDOW);
                self.update_delay(1);
                self.last_increase = now;
                self.stability = STABILITY_FRAMES;
            } else {
                self.stability -= 1;
            }
            self.consecutive_decrease = 1;
            FrameTiming::OnTime
        } else {
            self.update_delay(-i64::from(self.consecutive_decrease));
            self.consecutive_decrease =
                (self.consecutive_decrease * 2).min(MAX_CONSECUTIVE_DECREASE);
            if self.stability >= 0 {
                self.increase_window = self
                    .increase_window
                    .mul_ratio(2, 1)
                    .clamp(MIN_INCREASE_WINDOW, MAX_INCREASE_WINDOW);
            }
            self.last_increase = now;
            FrameTiming::Missed
        }
    }

    /// Marks the upcoming frame as skipped so its duration is not measured.
    pub fn skip_frame(&mut self) {
        self.last_pageflip = None;
    }

    /// The delay to wait before rendering, in milliseconds.
    #[must_use]
    pub fn delay(&self) -> u32 {
        let (min, max) = self.bounds();
        u32::try_from(self.delay.clamp(min, max)).unwrap_or(0)
    }

    /// Updates the refresh interval, typically from a present event.
    pub fn set_refresh(&mut self, refresh: Duration) {
        self.refresh = refresh;
    }

    /// Returns the current refresh interval.
    #[must_use]
    pub fn refresh(&self) -> Duration {
        self.refresh
    }

    /// Replaces the configuration; the delay is re-clamped on the next read.
    pub fn set_config(&mut self, config: DelayConfig) {
        self.config = config;
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> DelayConfig {
        self.config
    }

    /// Returns the current back-off step in milliseconds.
    #[must_use]
    pub fn consecutive_decrease(&self) -> u32 {
        self.consecutive_decrease
    }

    /// Returns the current interval between delay increases.
    #[must_use]
    pub fn increase_window(&self) -> Duration {
        self.increase_window
    }

    /// Returns the start time of the previous frame, if it is usable.
    #[must_use]
    pub fn last_pageflip(&self) -> Option<HostTime> {
        self.last_pageflip
    }

    /// `[min, max]` the delay is held in, in milliseconds.
    fn bounds(&self) -> (i64, i64) {
        let Some(max_render_time) = self.config.max_render_time else {
            return (0, 0);
        };
        let refresh_ms = i64::try_from(self.refresh.as_millis()).unwrap_or(i64::MAX);
        let budget = (refresh_ms - i64::from(max_render_time)).max(0);
        if self.config.dynamic_delay {
            (0, budget)
        } else {
            (budget, budget)
        }
    }

    fn update_delay(&mut self, delta: i64) {
        let (min, max) = self.bounds();
        self.delay = (self.delay + delta).clamp(min, max);
    }
}
