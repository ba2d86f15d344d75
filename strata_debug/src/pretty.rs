// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use strata_core::time::HostTime;
use strata_core::trace::{
    DamageRect, DelayAdjustEvent, FrameOutcome, FrameSkippedEvent, FrameStartEvent, FrameSummary,
    ScanoutEvent, SkipReason, SubmitEvent, SubmitFailedEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn host_us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

pub(crate) fn reason_name(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::Idle => "idle",
        SkipReason::DeviceError => "device-error",
        SkipReason::PassFailed => "pass-failed",
    }
}

pub(crate) fn outcome_name(outcome: FrameOutcome) -> &'static str {
    match outcome {
        FrameOutcome::Presented => "presented",
        FrameOutcome::ScannedOut => "scanout",
        FrameOutcome::Skipped(reason) => reason_name(reason),
        FrameOutcome::SubmitFailed => "submit-failed",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_start(&mut self, e: &FrameStartEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] frame={} output={} now={:.1}µs delay={}ms",
            e.frame_index,
            e.output.0,
            host_us(e.now),
            e.delay_ms,
        );
    }

    fn on_delay_adjust(&mut self, e: &DelayAdjustEvent) {
        let _ = writeln!(
            self.writer,
            "[delay] frame={} {:?} {}ms -> {}ms step={}ms",
            e.frame_index, e.timing, e.old_delay_ms, e.new_delay_ms, e.consecutive_decrease,
        );
    }

    fn on_frame_skipped(&mut self, e: &FrameSkippedEvent) {
        let _ = writeln!(
            self.writer,
            "[skip] frame={} reason={}",
            e.frame_index,
            reason_name(e.reason),
        );
    }

    fn on_scanout(&mut self, e: &ScanoutEvent) {
        let _ = writeln!(
            self.writer,
            "[scanout] frame={} {:?}",
            e.frame_index, e.outcome,
        );
    }

    fn on_submit(&mut self, e: &SubmitEvent) {
        let _ = writeln!(
            self.writer,
            "[submit] frame={} at {:.1}µs age={} damage={}px in {} rects",
            e.frame_index,
            host_us(e.submitted_at),
            e.buffer_age,
            e.damage_area,
            e.damage_rects,
        );
    }

    fn on_submit_failed(&mut self, e: &SubmitFailedEvent) {
        let _ = writeln!(
            self.writer,
            "[submit] frame={} output={} FAILED",
            e.frame_index, e.output.0,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let age = s
            .buffer_age
            .map_or_else(|| "-".to_owned(), |age| age.to_string());
        let _ = writeln!(
            self.writer,
            "[summary] frame={} output={} delay={}ms outcome={} age={age} damage={}px",
            s.frame_index,
            s.output.0,
            s.delay_ms,
            outcome_name(s.outcome),
            s.damage_area,
        );
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        let _ = writeln!(
            self.writer,
            "[damage] frame={frame_index} rects={}",
            rects.len(),
        );
    }
}
