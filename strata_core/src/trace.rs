// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the frame loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! frame orchestrator calls at each step of a repaint. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] collects what happened during one repaint and
//! produces a [`FrameSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`DamageRect`] events and the
//!   corresponding `TraceSink` method.

use crate::delay::FrameTiming;
use crate::output::OutputId;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a repaint produced no frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Nothing was damaged and no repaint was forced.
    Idle,
    /// The device failed to configure the swapchain, acquire a buffer, or
    /// apply gamma.
    DeviceError,
    /// The renderer could not begin a pass on the acquired buffer.
    PassFailed,
}

/// Result of a direct scanout attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScanoutOutcome {
    /// A buffer was handed straight to the display.
    Success,
    /// No instance was able to scan out; the frame is composited.
    Skip,
    /// An instance tried and the device rejected it.
    Failed,
}

/// How a repaint ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameOutcome {
    /// A composited frame was committed.
    Presented,
    /// A client buffer was scanned out directly.
    ScannedOut,
    /// No frame was produced.
    Skipped(SkipReason),
    /// The render pass or the commit failed after a buffer was acquired.
    SubmitFailed,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a vblank asks an output for a new frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStartEvent {
    /// Monotonic repaint counter for this output.
    pub frame_index: u64,
    /// Which output.
    pub output: OutputId,
    /// Host time of the frame event.
    pub now: HostTime,
    /// Delay chosen before rendering, in milliseconds.
    pub delay_ms: u32,
}

/// Emitted when the repaint delay controller judged the previous frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelayAdjustEvent {
    /// Repaint counter.
    pub frame_index: u64,
    /// Which output.
    pub output: OutputId,
    /// How the previous frame was judged.
    pub timing: FrameTiming,
    /// Delay before the adjustment, in milliseconds.
    pub old_delay_ms: u32,
    /// Delay after the adjustment, in milliseconds.
    pub new_delay_ms: u32,
    /// Back-off step after the adjustment, in milliseconds.
    pub consecutive_decrease: u32,
}

/// Emitted when a repaint produces no frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSkippedEvent {
    /// Repaint counter.
    pub frame_index: u64,
    /// Which output.
    pub output: OutputId,
    /// Why no frame was produced.
    pub reason: SkipReason,
}

/// Emitted after a direct scanout attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanoutEvent {
    /// Repaint counter.
    pub frame_index: u64,
    /// Which output.
    pub output: OutputId,
    /// What happened.
    pub outcome: ScanoutOutcome,
}

/// Emitted when a composited frame is committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitEvent {
    /// Repaint counter.
    pub frame_index: u64,
    /// Which output.
    pub output: OutputId,
    /// Host time of the repaint.
    pub submitted_at: HostTime,
    /// Age of the buffer that was rendered into.
    pub buffer_age: i32,
    /// Number of rectangles in the repainted damage.
    pub damage_rects: u32,
    /// Number of pixels repainted.
    pub damage_area: i64,
}

/// Emitted when submitting or committing an acquired buffer fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitFailedEvent {
    /// Repaint counter.
    pub frame_index: u64,
    /// Which output.
    pub output: OutputId,
}

/// Per-repaint summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSummary {
    /// Repaint counter.
    pub frame_index: u64,
    /// Which output.
    pub output: OutputId,
    /// Host time of the repaint.
    pub now: HostTime,
    /// Repaint delay in effect, in milliseconds.
    pub delay_ms: u32,
    /// How the repaint ended.
    pub outcome: FrameOutcome,
    /// Age of the acquired buffer, if one was acquired.
    pub buffer_age: Option<i32>,
    /// Number of pixels repainted (0 unless presented).
    pub damage_area: i64,
}

/// An axis-aligned damage rectangle.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

#[cfg(feature = "trace-rich")]
impl From<crate::geometry::Geometry> for DamageRect {
    fn from(g: crate::geometry::Geometry) -> Self {
        Self {
            x: g.x,
            y: g.y,
            width: u32::try_from(g.width).unwrap_or(0),
            height: u32::try_from(g.height).unwrap_or(0),
        }
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the frame loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a vblank asks for a frame.
    fn on_frame_start(&mut self, e: &FrameStartEvent) {
        _ = e;
    }

    /// Called after the repaint delay controller judged the previous frame.
    fn on_delay_adjust(&mut self, e: &DelayAdjustEvent) {
        _ = e;
    }

    /// Called when a repaint produces no frame.
    fn on_frame_skipped(&mut self, e: &FrameSkippedEvent) {
        _ = e;
    }

    /// Called after a direct scanout attempt.
    fn on_scanout(&mut self, e: &ScanoutEvent) {
        _ = e;
    }

    /// Called when a composited frame is committed.
    fn on_submit(&mut self, e: &SubmitEvent) {
        _ = e;
    }

    /// Called when submitting an acquired buffer fails.
    fn on_submit_failed(&mut self, e: &SubmitFailedEvent) {
        _ = e;
    }

    /// Called with a per-repaint summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called with the repainted damage rectangles (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        _ = (frame_index, rects);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameStartEvent`].
    #[inline]
    pub fn frame_start(&mut self, e: &FrameStartEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_start(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DelayAdjustEvent`].
    #[inline]
    pub fn delay_adjust(&mut self, e: &DelayAdjustEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_delay_adjust(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSkippedEvent`].
    #[inline]
    pub fn frame_skipped(&mut self, e: &FrameSkippedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_skipped(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ScanoutEvent`].
    #[inline]
    pub fn scanout(&mut self, e: &ScanoutEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_scanout(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SubmitEvent`].
    #[inline]
    pub fn submit(&mut self, e: &SubmitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_submit(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SubmitFailedEvent`].
    #[inline]
    pub fn submit_failed(&mut self, e: &SubmitFailedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_submit_failed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits damage rectangles (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        if let Some(s) = &mut self.sink {
            s.on_damage_rects(frame_index, rects);
        }
    }

    /// Returns `true` if events are being delivered somewhere.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects what happened during one repaint and produces a [`FrameSummary`].
///
/// The outcome defaults to [`SkipReason::Idle`] until something else is
/// recorded.
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    frame_index: u64,
    output: OutputId,
    now: HostTime,
    delay_ms: u32,
    outcome: FrameOutcome,
    buffer_age: Option<i32>,
    damage_area: i64,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for one repaint.
    #[must_use]
    pub fn new(frame_index: u64, output: OutputId, now: HostTime) -> Self {
        Self {
            frame_index,
            output,
            now,
            delay_ms: 0,
            outcome: FrameOutcome::Skipped(SkipReason::Idle),
            buffer_age: None,
            damage_area: 0,
        }
    }

    /// Records the repaint delay in effect.
    pub fn set_delay(&mut self, delay_ms: u32) {
        self.delay_ms = delay_ms;
    }

    /// Records the age of the acquired buffer.
    pub fn set_buffer_age(&mut self, age: i32) {
        self.buffer_age = Some(age);
    }

    /// Records the number of repainted pixels.
    pub fn set_damage_area(&mut self, area: i64) {
        self.damage_area = area;
    }

    /// Records how the repaint ended.
    pub fn set_outcome(&mut self, outcome: FrameOutcome) {
        self.outcome = outcome;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        FrameSummary {
            frame_index: self.frame_index,
            output: self.output,
            now: self.now,
            delay_ms: self.delay_ms,
            outcome: self.outcome,
            buffer_age: self.buffer_age,
            damage_area: match self.outcome {
                FrameOutcome::Presented => self.damage_area,
                _ => 0,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
