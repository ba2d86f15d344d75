// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types returned by device and renderer collaborators.
//!
//! None of these are fatal. The frame loop logs them and abandons the current
//! frame; the next vblank retries.

/// A transient failure reported by an [`OutputDevice`](crate::device::OutputDevice).
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The primary swapchain could not be configured for the output state.
    #[error("failed to configure the primary swapchain")]
    SwapchainConfig,
    /// No buffer could be acquired from the swapchain.
    #[error("failed to acquire a buffer from the swapchain")]
    AcquireBuffer,
    /// The pending gamma LUT could not be written into the output state.
    #[error("failed to apply gamma to the output state")]
    Gamma,
    /// The device rejected the output state during a test commit.
    #[error("output state test failed")]
    Test,
    /// The device rejected the output state during a real commit.
    #[error("output commit failed")]
    Commit,
}

/// A failure reported by a [`Renderer`](crate::pass::Renderer).
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// A render pass could not be started on the target buffer.
    #[error("failed to begin a render pass")]
    BeginPass,
    /// The recorded render pass could not be submitted.
    #[error("failed to submit the render pass")]
    Submit,
    /// An auxiliary buffer could not be allocated.
    #[error("failed to allocate a {width}x{height} auxiliary buffer")]
    Allocate {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },
    /// A depth attachment could not be created.
    #[error("failed to create a {width}x{height} depth attachment")]
    Depth {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },
    /// A device operation failed while rendering.
    #[error(transparent)]
    Device(#[from] DeviceError),
}
