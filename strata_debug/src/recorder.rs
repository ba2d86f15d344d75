// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Damage rectangles ([`on_damage_rects`](TraceSink::on_damage_rects)) are
//! stored as a count and their total area.

use strata_core::delay::FrameTiming;
use strata_core::output::OutputId;
use strata_core::time::HostTime;
use strata_core::trace::{
    DamageRect, DelayAdjustEvent, FrameOutcome, FrameSkippedEvent, FrameStartEvent, FrameSummary,
    ScanoutEvent, ScanoutOutcome, SkipReason, SubmitEvent, SubmitFailedEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_START: u8 = 1;
const TAG_DELAY_ADJUST: u8 = 2;
const TAG_FRAME_SKIPPED: u8 = 3;
const TAG_SCANOUT: u8 = 4;
const TAG_SUBMIT: u8 = 5;
const TAG_SUBMIT_FAILED: u8 = 6;
const TAG_FRAME_SUMMARY: u8 = 7;
const TAG_DAMAGE_RECTS: u8 = 8;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_header(&mut self, tag: u8, frame_index: u64, output: OutputId) {
        self.write_u8(tag);
        self.write_u64(frame_index);
        self.write_u32(output.0);
    }

    fn write_option_i32(&mut self, v: Option<i32>) {
        self.write_u8(u8::from(v.is_some()));
        self.write_i32(v.unwrap_or(0));
    }

    fn write_timing(&mut self, t: FrameTiming) {
        self.write_u8(match t {
            FrameTiming::Unknown => 0,
            FrameTiming::OnTime => 1,
            FrameTiming::Missed => 2,
        });
    }

    fn write_reason(&mut self, r: SkipReason) {
        self.write_u8(match r {
            SkipReason::Idle => 0,
            SkipReason::DeviceError => 1,
            SkipReason::PassFailed => 2,
        });
    }

    fn write_scanout(&mut self, o: ScanoutOutcome) {
        self.write_u8(match o {
            ScanoutOutcome::Success => 0,
            ScanoutOutcome::Skip => 1,
            ScanoutOutcome::Failed => 2,
        });
    }

    fn write_outcome(&mut self, o: FrameOutcome) {
        match o {
            FrameOutcome::Presented => self.write_u8(0),
            FrameOutcome::ScannedOut => self.write_u8(1),
            FrameOutcome::Skipped(reason) => {
                self.write_u8(2);
                self.write_reason(reason);
                return;
            }
            FrameOutcome::SubmitFailed => self.write_u8(3),
        }
        self.write_u8(0);
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_start(&mut self, e: &FrameStartEvent) {
        self.write_header(TAG_FRAME_START, e.frame_index, e.output);
        self.write_u64(e.now.nanos());
        self.write_u32(e.delay_ms);
    }

    fn on_delay_adjust(&mut self, e: &DelayAdjustEvent) {
        self.write_header(TAG_DELAY_ADJUST, e.frame_index, e.output);
        self.write_timing(e.timing);
        self.write_u32(e.old_delay_ms);
        self.write_u32(e.new_delay_ms);
        self.write_u32(e.consecutive_decrease);
    }

    fn on_frame_skipped(&mut self, e: &FrameSkippedEvent) {
        self.write_header(TAG_FRAME_SKIPPED, e.frame_index, e.output);
        self.write_reason(e.reason);
    }

    fn on_scanout(&mut self, e: &ScanoutEvent) {
        self.write_header(TAG_SCANOUT, e.frame_index, e.output);
        self.write_scanout(e.outcome);
    }

    fn on_submit(&mut self, e: &SubmitEvent) {
        self.write_header(TAG_SUBMIT, e.frame_index, e.output);
        self.write_u64(e.submitted_at.nanos());
        self.write_i32(e.buffer_age);
        self.write_u32(e.damage_rects);
        self.write_i64(e.damage_area);
    }

    fn on_submit_failed(&mut self, e: &SubmitFailedEvent) {
        self.write_header(TAG_SUBMIT_FAILED, e.frame_index, e.output);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_header(TAG_FRAME_SUMMARY, s.frame_index, s.output);
        self.write_u64(s.now.nanos());
        self.write_u32(s.delay_ms);
        self.write_outcome(s.outcome);
        self.write_option_i32(s.buffer_age);
        self.write_i64(s.damage_area);
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        self.write_u8(TAG_DAMAGE_RECTS);
        self.write_u64(frame_index);
        self.write_u32(u32::try_from(rects.len()).unwrap_or(u32::MAX));
        let area: u64 = rects
            .iter()
            .map(|r| u64::from(r.width) * u64::from(r.height))
            .sum();
        self.write_u64(area);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`FrameStartEvent`].
    FrameStart(FrameStartEvent),
    /// A [`DelayAdjustEvent`].
    DelayAdjust(DelayAdjustEvent),
    /// A [`FrameSkippedEvent`].
    FrameSkipped(FrameSkippedEvent),
    /// A [`ScanoutEvent`].
    Scanout(ScanoutEvent),
    /// A [`SubmitEvent`].
    Submit(SubmitEvent),
    /// A [`SubmitFailedEvent`].
    SubmitFailed(SubmitFailedEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
    /// Damage rectangles of a frame, reduced to count and area.
    DamageRects {
        /// Frame counter.
        frame_index: u64,
        /// Number of rectangles.
        count: u32,
        /// Sum of the rectangle areas in buffer pixels.
        area: u64,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_i64(&mut self) -> Option<i64> {
        self.take().map(i64::from_le_bytes)
    }

    fn read_header(&mut self) -> Option<(u64, OutputId)> {
        Some((self.read_u64()?, OutputId(self.read_u32()?)))
    }

    fn read_option_i32(&mut self) -> Option<Option<i32>> {
        let present = self.read_u8()?;
        let val = self.read_i32()?;
        Some((present != 0).then_some(val))
    }

    fn read_timing(&mut self) -> Option<FrameTiming> {
        Some(match self.read_u8()? {
            1 => FrameTiming::OnTime,
            2 => FrameTiming::Missed,
            _ => FrameTiming::Unknown,
        })
    }

    fn read_reason(&mut self) -> Option<SkipReason> {
        Some(match self.read_u8()? {
            0 => SkipReason::Idle,
            1 => SkipReason::DeviceError,
            _ => SkipReason::PassFailed,
        })
    }

    fn read_scanout(&mut self) -> Option<ScanoutOutcome> {
        Some(match self.read_u8()? {
            0 => ScanoutOutcome::Success,
            1 => ScanoutOutcome::Skip,
            _ => ScanoutOutcome::Failed,
        })
    }

    fn read_outcome(&mut self) -> Option<FrameOutcome> {
        let kind = self.read_u8()?;
        let reason = self.read_reason()?;
        Some(match kind {
            0 => FrameOutcome::Presented,
            1 => FrameOutcome::ScannedOut,
            2 => FrameOutcome::Skipped(reason),
            _ => FrameOutcome::SubmitFailed,
        })
    }

    fn decode_frame_start(&mut self) -> Option<RecordedEvent> {
        let (frame_index, output) = self.read_header()?;
        Some(RecordedEvent::FrameStart(FrameStartEvent {
            frame_index,
            output,
            now: HostTime(self.read_u64()?),
            delay_ms: self.read_u32()?,
        }))
    }

    fn decode_delay_adjust(&mut self) -> Option<RecordedEvent> {
        let (frame_index, output) = self.read_header()?;
        Some(RecordedEvent::DelayAdjust(DelayAdjustEvent {
            frame_index,
            output,
            timing: self.read_timing()?,
            old_delay_ms: self.read_u32()?,
            new_delay_ms: self.read_u32()?,
            consecutive_decrease: self.read_u32()?,
        }))
    }

    fn decode_frame_skipped(&mut self) -> Option<RecordedEvent> {
        let (frame_index, output) = self.read_header()?;
        Some(RecordedEvent::FrameSkipped(FrameSkippedEvent {
            frame_index,
            output,
            reason: self.read_reason()?,
        }))
    }

    fn decode_scanout(&mut self) -> Option<RecordedEvent> {
        let (frame_index, output) = self.read_header()?;
        Some(RecordedEvent::Scanout(ScanoutEvent {
            frame_index,
            output,
            outcome: self.read_scanout()?,
        }))
    }

    fn decode_submit(&mut self) -> Option<RecordedEvent> {
        let (frame_index, output) = self.read_header()?;
        Some(RecordedEvent::Submit(SubmitEvent {
            frame_index,
            output,
            submitted_at: HostTime(self.read_u64()?),
            buffer_age: self.read_i32()?,
            damage_rects: self.read_u32()?,
            damage_area: self.read_i64()?,
        }))
    }

    fn decode_submit_failed(&mut self) -> Option<RecordedEvent> {
        let (frame_index, output) = self.read_header()?;
        Some(RecordedEvent::SubmitFailed(SubmitFailedEvent {
            frame_index,
            output,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        let (frame_index, output) = self.read_header()?;
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index,
            output,
            now: HostTime(self.read_u64()?),
            delay_ms: self.read_u32()?,
            outcome: self.read_outcome()?,
            buffer_age: self.read_option_i32()?,
            damage_area: self.read_i64()?,
        }))
    }

    fn decode_damage_rects(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DamageRects {
            frame_index: self.read_u64()?,
            count: self.read_u32()?,
            area: self.read_u64()?,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_FRAME_START => self.decode_frame_start(),
            TAG_DELAY_ADJUST => self.decode_delay_adjust(),
            TAG_FRAME_SKIPPED => self.decode_frame_skipped(),
            TAG_SCANOUT => self.decode_scanout(),
            TAG_SUBMIT => self.decode_submit(),
            TAG_SUBMIT_FAILED => self.decode_submit_failed(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            TAG_DAMAGE_RECTS => self.decode_damage_rects(),
            // Unknown tag: the rest of the buffer cannot be framed.
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
