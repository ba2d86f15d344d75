// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene graph with per-node transform chains.
//!
//! A *node* is one of four kinds (see [`NodeKind`]):
//!
//! - **Content**: a leaf with its own box, e.g. a surface.
//! - **Group**: a plain container.
//! - **Subject**: a container that transformers can be stacked on, usually a
//!   whole window.
//! - **Transformer**: an interior node inserted between a subject and its
//!   content by [`SceneGraph::add_transformer`]. It maps its children through
//!   a [`Transformer`] (a [`View2d`] or a [`View3d`]).
//!
//! Nodes live in struct-of-arrays storage and are addressed by generational
//! [`NodeId`] handles that become stale when the node is destroyed.
//!
//! # Transform chains
//!
//! Transformers on a subject are ordered by z-order. The lowest z-order sits
//! directly above the subject's content, the highest directly below the
//! subject:
//!
//! ```text
//!   subject ─► t(z=10) ─► t(z=5) ─► t(z=1) ─► content…
//! ```
//!
//! Adding or removing a transformer splices it into that path, damages the
//! subject's on-screen bounds before and after, and marks the affected nodes
//! so render instances get regenerated.
//!
//! # Damage
//!
//! Damage reported on a node (in its parent's space) walks up the tree. Each
//! transformer on the way records it in local space for its cached contents
//! and forwards it through [`NodeTransform::transform_damage`]. Damage that
//! reaches the root is collected by [`SceneGraph::drain_updates`].

mod chain;
mod graph;
mod id;
mod transformer;
mod update;

pub use graph::{ChainEntry, NodeKind, SceneGraph, TransformerNode};
pub use id::{INVALID, NodeId};
pub use transformer::{NodeTransform, TransformFrame, Transformer, View2d, View3d};
pub use update::{SceneChanges, UpdateFlags};
