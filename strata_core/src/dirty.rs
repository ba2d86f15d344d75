// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants for the scene graph.
//!
//! The scene graph uses multi-channel dirty tracking (via [`understory_dirty`])
//! to decide which render-instance caches a structural or geometric change
//! invalidates. Each channel mirrors one [`UpdateFlags`] bit.
//!
//! # Propagation semantics
//!
//! - **Upward**: [`GEOMETRY`] has dependency edges from parent to child.
//!   A child's bounding box feeds its parent's, so marking a node with
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) also marks every
//!   ancestor.
//!
//! - **Downward**: [`ENABLED`] has dependency edges from child to parent.
//!   Disabling a node hides its whole subtree, so eager marking reaches all
//!   descendants.
//!
//! - **Local**: [`CHILDREN_LIST`] is marked on the node whose child list
//!   changed and is never propagated.
//!
//! # Consumption
//!
//! [`SceneGraph::drain_updates`](crate::scene::SceneGraph::drain_updates)
//! drains every channel and reports the result as
//! [`SceneChanges`](crate::scene::SceneChanges).
//!
//! [`UpdateFlags`]: crate::scene::UpdateFlags

use understory_dirty::Channel;

/// A node's child list changed; render instances must be regenerated.
pub const CHILDREN_LIST: Channel = Channel::new(0);

/// A node's bounding box changed; visibility must be recomputed.
pub const GEOMETRY: Channel = Channel::new(1);

/// A node was enabled or disabled; render instances must be regenerated.
pub const ENABLED: Channel = Channel::new(2);
