// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for compositor frame production.
//!
//! `strata_core` provides the device-independent half of a compositor's
//! per-output frame loop: integer geometry and damage regions, a scene graph
//! whose nodes can carry stacks of 2D and 3D view transforms, and the
//! adaptive repaint delay that decides how long to wait after a vblank before
//! rendering. It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   SceneGraph mutations ──► damage (parent space)
//!       │                        │
//!       │         transformers   ▼
//!       │         ───────────► transform_damage ──► root damage
//!       ▼                                              │
//!   dirty channels ──► SceneGraph::drain_updates() ◄───┘
//!                              │
//!                              ▼
//!                        SceneChanges ──► frame orchestrator
//!
//!   vblank ──► RepaintDelayController::start_frame() ──► delay()
//! ```
//!
//! **[`geometry`]** and **[`region`]**: integer boxes and normalized sets of
//! disjoint boxes, used for every damage computation.
//!
//! **[`scene`]**: struct-of-arrays scene graph with generational handles,
//! transform chains, hit testing, and damage propagation.
//!
//! **[`dirty`]**: dirty-tracking channels via `understory_dirty`. GEOMETRY
//! propagates to ancestors, ENABLED to descendants, and CHILDREN_LIST is
//! local.
//!
//! **[`delay`]**: the repaint delay controller.
//!
//! **[`output`]**: output identity, buffer orientation, and size.
//!
//! **[`time`]**: monotonic host time in nanoseconds.
//!
//! **[`transform`]**: 4×4 matrix type used by 3D views.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-loop instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates damage-rect
//!   events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod delay;
pub mod dirty;
pub mod geometry;
pub mod output;
pub mod region;
pub mod scene;
pub mod time;
pub mod trace;
pub mod transform;
