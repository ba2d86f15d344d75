// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draining accumulated scene changes.
//!
//! Mutations on the [`SceneGraph`] mark dirty channels and accumulate damage
//! as they happen. [`SceneGraph::drain_updates`] collects both in one pass so
//! the frame orchestrator can decide whether render instances need to be
//! regenerated, visibility recomputed, or just some pixels repainted.
//!
//! Like the rest of the graph, [`SceneChanges`] reports raw slot indices so
//! consumers can match them against the indices of handles they hold.

use alloc::vec::Vec;

use super::graph::SceneGraph;
use crate::dirty;
use crate::region::Region;

bitflags::bitflags! {
    /// Categories of change reported by [`SceneGraph::drain_updates`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct UpdateFlags: u8 {
        /// Some node's child list changed.
        const CHILDREN_LIST = 0b0000_0001;
        /// Some node's bounding box changed.
        const GEOMETRY      = 0b0000_0010;
        /// Some node was enabled or disabled.
        const ENABLED       = 0b0000_0100;
    }
}

/// The changes accumulated since the previous [`SceneGraph::drain_updates`].
#[derive(Clone, Debug, Default)]
pub struct SceneChanges {
    /// Union of the categories below that are non-empty.
    pub flags: UpdateFlags,
    /// Damage that reached the root, in root coordinates.
    pub damage: Region,
    /// Nodes whose child list changed.
    pub children_changed: Vec<u32>,
    /// Nodes whose bounding box may have changed, including ancestors.
    pub geometry_changed: Vec<u32>,
    /// Nodes whose effective enabled state may have changed, including
    /// descendants.
    pub enabled_changed: Vec<u32>,
    /// Nodes created since the last drain.
    pub added: Vec<u32>,
    /// Nodes destroyed since the last drain.
    pub removed: Vec<u32>,
}

impl SceneChanges {
    /// Returns `true` if render instances must be regenerated.
    #[must_use]
    pub fn needs_regeneration(&self) -> bool {
        self.flags
            .intersects(UpdateFlags::CHILDREN_LIST | UpdateFlags::ENABLED)
    }

    /// Returns `true` if nothing changed and nothing was damaged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.damage.is_empty()
    }
}

impl SceneGraph {
    /// Drains every dirty channel and the accumulated root damage.
    pub fn drain_updates(&mut self) -> SceneChanges {
        let mut changes = SceneChanges {
            children_changed: self
                .dirty
                .drain(dirty::CHILDREN_LIST)
                .deterministic()
                .run()
                .collect(),
            geometry_changed: self
                .dirty
                .drain(dirty::GEOMETRY)
                .affected()
                .deterministic()
                .run()
                .collect(),
            enabled_changed: self
                .dirty
                .drain(dirty::ENABLED)
                .affected()
                .deterministic()
                .run()
                .collect(),
            damage: core::mem::take(&mut self.pending_damage),
            ..SceneChanges::default()
        };
        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);

        // Slots freed since the marks were made no longer mean anything.
        let live = |idx: &u32| self.is_live_index(*idx);
        changes.children_changed.retain(live);
        changes.geometry_changed.retain(live);
        changes.enabled_changed.retain(live);

        changes
            .flags
            .set(UpdateFlags::CHILDREN_LIST, !changes.children_changed.is_empty());
        changes
            .flags
            .set(UpdateFlags::GEOMETRY, !changes.geometry_changed.is_empty());
        changes
            .flags
            .set(UpdateFlags::ENABLED, !changes.enabled_changed.is_empty());
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;

    #[test]
    fn first_drain_reports_initial_structure() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let content = graph.create_content(Geometry::new(0, 0, 10, 10));
        graph.add_child(root, content);

        let changes = graph.drain_updates();
        assert!(changes.flags.contains(UpdateFlags::CHILDREN_LIST));
        assert!(changes.children_changed.contains(&root.index()));
        assert!(changes.added.contains(&content.index()));
        assert_eq!(changes.damage, Region::from_rect(Geometry::new(0, 0, 10, 10)));

        assert!(graph.drain_updates().is_empty(), "second drain sees nothing");
    }

    #[test]
    fn geometry_change_reaches_ancestors() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph.create_group();
        let content = graph.create_content(Geometry::new(0, 0, 10, 10));
        graph.add_child(root, group);
        graph.add_child(group, content);
        let _ = graph.drain_updates();

        graph.set_geometry(content, Geometry::new(5, 5, 10, 10));
        let changes = graph.drain_updates();
        assert_eq!(changes.flags, UpdateFlags::GEOMETRY);
        assert!(changes.geometry_changed.contains(&group.index()));
        assert!(changes.geometry_changed.contains(&root.index()));
        assert_eq!(
            changes.damage,
            Region::from_rects([Geometry::new(0, 0, 10, 10), Geometry::new(5, 5, 10, 10)])
        );
    }

    #[test]
    fn disabling_reaches_descendants_and_needs_regeneration() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph.create_group();
        let content = graph.create_content(Geometry::new(0, 0, 4, 4));
        graph.add_child(root, group);
        graph.add_child(group, content);
        let _ = graph.drain_updates();

        graph.set_enabled(group, false);
        let changes = graph.drain_updates();
        assert!(changes.needs_regeneration());
        assert!(changes.enabled_changed.contains(&content.index()));
        assert_eq!(changes.damage, Region::from_rect(Geometry::new(0, 0, 4, 4)));
    }
}
