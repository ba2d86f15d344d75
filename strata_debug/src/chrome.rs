// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Each output becomes a process (`pid`). Events that carry no timestamp of
//! their own are placed at the start of the frame they belong to.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use strata_core::time::HostTime;

use crate::pretty::{outcome_name, reason_name};
use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Start of the most recent frame; delay adjustments are recorded before
    // the frame start they belong to.
    let mut frame_ts = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FrameStart(e) => {
                frame_ts = to_us(e.now);
                events.push(json!({
                    "ph": "i",
                    "name": "FrameStart",
                    "cat": "Frame",
                    "ts": frame_ts,
                    "pid": e.output.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "frame_index": e.frame_index,
                        "delay_ms": e.delay_ms,
                    }
                }));
            }
            RecordedEvent::DelayAdjust(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": "RepaintDelay",
                    "cat": "Delay",
                    "ts": frame_ts,
                    "pid": e.output.0,
                    "tid": 0,
                    "args": {
                        "delay_ms": e.new_delay_ms,
                        "step_ms": e.consecutive_decrease,
                    }
                }));
            }
            RecordedEvent::FrameSkipped(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSkipped",
                    "cat": "Frame",
                    "ts": frame_ts,
                    "pid": e.output.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "frame_index": e.frame_index,
                        "reason": reason_name(e.reason),
                    }
                }));
            }
            RecordedEvent::Scanout(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "DirectScanout",
                    "cat": "Frame",
                    "ts": frame_ts,
                    "pid": e.output.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "frame_index": e.frame_index,
                        "outcome": format!("{:?}", e.outcome),
                    }
                }));
            }
            RecordedEvent::Submit(e) => {
                let ts = to_us(e.submitted_at);
                events.push(json!({
                    "ph": "X",
                    "name": "Render",
                    "cat": "Frame",
                    "ts": frame_ts,
                    "dur": (ts - frame_ts).max(0.0),
                    "pid": e.output.0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                        "buffer_age": e.buffer_age,
                        "damage_rects": e.damage_rects,
                        "damage_area": e.damage_area,
                    }
                }));
            }
            RecordedEvent::SubmitFailed(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "SubmitFailed",
                    "cat": "Frame",
                    "ts": frame_ts,
                    "pid": e.output.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSummary",
                    "cat": "Summary",
                    "ts": to_us(s.now),
                    "pid": s.output.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "frame_index": s.frame_index,
                        "delay_ms": s.delay_ms,
                        "outcome": outcome_name(s.outcome),
                        "buffer_age": s.buffer_age,
                        "damage_area": s.damage_area,
                    }
                }));
            }
            RecordedEvent::DamageRects {
                frame_index,
                count,
                area,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "DamageRects",
                    "cat": "Rich",
                    "ts": frame_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": frame_index,
                        "count": count,
                        "area": area,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn to_us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use strata_core::delay::FrameTiming;
    use strata_core::output::OutputId;
    use strata_core::trace::{
        DelayAdjustEvent, FrameOutcome, FrameSkippedEvent, FrameStartEvent, FrameSummary,
        SkipReason, SubmitEvent, TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_delay_adjust(&DelayAdjustEvent {
            frame_index: 0,
            output: OutputId(1),
            timing: FrameTiming::OnTime,
            old_delay_ms: 2,
            new_delay_ms: 3,
            consecutive_decrease: 1,
        });
        rec.on_frame_start(&FrameStartEvent {
            frame_index: 0,
            output: OutputId(1),
            now: HostTime(1_000_000),
            delay_ms: 3,
        });
        rec.on_submit(&SubmitEvent {
            frame_index: 0,
            output: OutputId(1),
            submitted_at: HostTime(1_500_000),
            buffer_age: 1,
            damage_rects: 1,
            damage_area: 100,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "C");
        assert_eq!(parsed[0]["args"]["delay_ms"], 3);

        assert_eq!(parsed[1]["name"], "FrameStart");
        assert_eq!(parsed[1]["pid"], 1);
        assert_eq!(parsed[1]["ts"], 1000.0);

        // The render slice spans frame start to submission.
        assert_eq!(parsed[2]["ph"], "X");
        assert_eq!(parsed[2]["ts"], 1000.0);
        assert_eq!(parsed[2]["dur"], 500.0);
    }

    #[test]
    fn skipped_frames_carry_reason() {
        let mut rec = RecorderSink::new();
        rec.on_frame_skipped(&FrameSkippedEvent {
            frame_index: 2,
            output: OutputId(0),
            reason: SkipReason::Idle,
        });
        rec.on_frame_summary(&FrameSummary {
            frame_index: 2,
            output: OutputId(0),
            now: HostTime(0),
            delay_ms: 0,
            outcome: FrameOutcome::Skipped(SkipReason::Idle),
            buffer_age: None,
            damage_area: 0,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["args"]["reason"], "idle");
        assert_eq!(parsed[1]["args"]["outcome"], "idle");
        assert!(parsed[1]["args"]["buffer_age"].is_null());
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
