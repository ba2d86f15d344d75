// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-output frame loop configuration.

use strata_core::delay::DelayConfig;

use crate::pass::Color;

/// Settings read by the [`RenderManager`](crate::manager::RenderManager).
///
/// Loading these from a file is up to the compositor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderConfig {
    /// Color painted where no content covers the damage.
    pub background_color: Color,
    /// Repaint the whole output every frame instead of only the damage.
    /// Useful for backends that misreport buffer age.
    pub no_damage_tracking: bool,
    /// Paint the area outside each frame's damage yellow.
    pub damage_debug: bool,
    /// Allow handing client buffers to the display directly.
    pub allow_direct_scanout: bool,
    /// Repaint delay settings.
    pub delay: DelayConfig,
}

impl RenderConfig {
    /// Dark grey background, damage tracking and direct scanout on, repaint
    /// delay disabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            background_color: Color::rgb(0.1, 0.1, 0.1),
            no_damage_tracking: false,
            damage_debug: false,
            allow_direct_scanout: true,
            delay: DelayConfig::disabled(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::new()
    }
}
