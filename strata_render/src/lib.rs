// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-output frame production for strata.
//!
//! This crate turns [`strata_core`]'s scene and damage types into frames on a
//! display. Devices and GPU renderers stay behind two traits,
//! [`OutputDevice`](device::OutputDevice) and [`Renderer`](pass::Renderer),
//! so the frame loop runs the same against real backends and test doubles.
//!
//! # Architecture
//!
//! ```text
//!   OutputDevice events ──► RenderManager ◄── InstanceSource (scene)
//!                              │
//!        ┌─────────────┬───────┼──────────┬──────────────┐
//!        ▼             ▼       ▼          ▼              ▼
//!   Swapchain     EffectRegistry  Postprocess   DepthBufferPool  RepaintDelay
//!   DamageManager  (4 stages)     Chain         (≤ 3, LRU)       Controller
//!        │
//!        ▼
//!   DamageRing (buffer-age history)
//! ```
//!
//! - [`manager`]: the frame orchestrator.
//! - [`swapchain`] and [`damage`]: frame damage, buffer age, submit/commit.
//! - [`effects`]: hooks that run at fixed points of each frame.
//! - [`postprocess`]: full-screen filters applied after the scene pass.
//! - [`depth`]: depth attachments for off-screen framebuffers.
//! - [`instance`]: render instances and direct scanout.
//! - [`device`], [`pass`], [`resource`], [`error`]: the backend seams.
//! - [`config`]: per-output settings.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables frame-loop trace events.
//! - `trace-rich` (disabled by default, implies `trace`): Also reports the
//!   damage rectangles of each submitted frame.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod damage;
pub mod depth;
pub mod device;
pub mod effects;
pub mod error;
pub mod instance;
pub mod manager;
pub mod pass;
pub mod postprocess;
pub mod resource;
pub mod swapchain;

#[cfg(test)]
mod testing;
