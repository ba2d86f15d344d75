// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays scene storage with allocation, topology, and damage.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Point;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{INVALID, NodeId};
use super::transformer::{NodeTransform, TransformFrame, Transformer};
use crate::dirty;
use crate::geometry::Geometry;
use crate::region::Region;

/// One transformer attached to a subject, as listed by
/// [`SceneGraph::transformers`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainEntry {
    /// The transformer node.
    pub node: NodeId,
    /// Stacking priority; lower values sit closer to the content.
    pub z_order: i32,
    /// Name the transformer was registered under.
    pub name: String,
}

/// State of a transformer node.
#[derive(Clone, Debug)]
pub struct TransformerNode {
    /// The transform applied to the node's children.
    pub transformer: Transformer,
    /// Slot of the subject this transformer belongs to.
    pub(crate) subject: u32,
    /// Local-space damage not yet re-rendered into the cached contents.
    pub(crate) cached_damage: Region,
    /// Child box and scale the cached contents were last prepared for.
    pub(crate) cached_size: Option<(Geometry, f64)>,
}

/// What a node is.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// A leaf with its own geometry, e.g. a surface.
    Content {
        /// Box in parent coordinates.
        geometry: Geometry,
    },
    /// A plain container.
    Group,
    /// A container that transformers can be stacked on.
    ///
    /// The chain is sorted by ascending z-order. The first entry is the
    /// innermost transformer, directly above the subject's content; the last
    /// entry is the outermost, directly below the subject.
    Subject {
        /// Attached transformers.
        chain: Vec<ChainEntry>,
    },
    /// Maps its children through a [`Transformer`].
    Transformer(TransformerNode),
}

/// Struct-of-arrays storage for the scene.
///
/// Nodes are addressed by [`NodeId`] handles. Each node occupies a slot in
/// parallel arrays; destroyed nodes are recycled via a free list, and
/// generation counters prevent stale handle access. Parent links are plain
/// indices used for lookup and splicing only.
///
/// Children are ordered front to back: the first child is drawn on top and is
/// hit-tested first.
///
/// The graph is created with a root group. Damage that reaches the root is
/// accumulated and reported by [`drain_updates`](Self::drain_updates); damage
/// on nodes not attached under the root goes nowhere.
#[derive(Debug)]
pub struct SceneGraph {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) children: Vec<Vec<u32>>,

    // -- Properties --
    pub(crate) kind: Vec<NodeKind>,
    pub(crate) enabled: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    pub(crate) root: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) pending_damage: Region,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates a graph containing only an empty root group.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = Self {
            parent: Vec::new(),
            children: Vec::new(),
            kind: Vec::new(),
            enabled: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            root: INVALID,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_damage: Region::new(),
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        };
        graph.root = graph.alloc(NodeKind::Group).idx;
        graph
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.handle(self.root)
    }

    // -- Allocation API --

    /// Creates a detached leaf with the given geometry.
    pub fn create_content(&mut self, geometry: Geometry) -> NodeId {
        self.alloc(NodeKind::Content { geometry })
    }

    /// Creates a detached, empty group.
    pub fn create_group(&mut self) -> NodeId {
        self.alloc(NodeKind::Group)
    }

    /// Creates a detached subject that transformers can be attached to.
    pub fn create_subject(&mut self) -> NodeId {
        self.alloc(NodeKind::Subject { chain: Vec::new() })
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// If the node is attached, its bounding box is damaged first.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, the node is the root, the node has
    /// children, or the node is a transformer (use
    /// [`remove_transformer`](Self::remove_transformer)).
    pub fn destroy_node(&mut self, id: NodeId) {
        self.validate(id);
        let idx = id.idx;
        assert!(idx != self.root, "cannot destroy the root node");
        assert!(
            self.children[idx as usize].is_empty(),
            "cannot destroy node with children"
        );
        assert!(
            !matches!(self.kind[idx as usize], NodeKind::Transformer(_)),
            "transformers are removed through their subject"
        );

        if self.parent[idx as usize] != INVALID {
            self.damage_bbox(idx);
            let p = self.parent[idx as usize];
            self.unlink_from_parent(idx);
            self.dirty.mark(p, dirty::CHILDREN_LIST);
            self.dirty.mark_with(p, dirty::GEOMETRY, &EagerPolicy);
        }
        self.free_slot(idx);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.is_live_index(id.idx) && self.generation[id.idx as usize] == id.generation
    }

    // -- Topology API --

    /// Adds `child` as the back-most child of `parent`.
    ///
    /// See [`insert_child`](Self::insert_child).
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        let len = self.children[self.content_parent(parent.idx) as usize].len();
        self.insert_child(parent, len, child);
    }

    /// Inserts `child` at position `index` (0 = front) among the children of
    /// `parent`, then damages the child's bounding box.
    ///
    /// Children added to a subject that has transformers attach under the
    /// innermost transformer, so they are transformed along with the rest of
    /// the subject's content.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, `child` already has a parent,
    /// `parent` is a content leaf, or `index` is out of range.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID && c != self.root,
            "child already has a parent"
        );
        assert!(
            !matches!(self.kind[parent.idx as usize], NodeKind::Content { .. }),
            "content nodes cannot have children"
        );
        let p = self.content_parent(parent.idx);

        self.children[p as usize].insert(index, c);
        self.link(p, c);
        self.dirty.mark(p, dirty::CHILDREN_LIST);
        self.dirty.mark_with(p, dirty::GEOMETRY, &EagerPolicy);
        self.dirty.mark_with(c, dirty::ENABLED, &EagerPolicy);
        self.damage_bbox(c);
    }

    /// Detaches `child` from its parent after damaging its bounding box.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, the node has no parent, or the node is a
    /// transformer.
    pub fn remove_from_parent(&mut self, child: NodeId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "node has no parent");
        assert!(
            !matches!(self.kind[c as usize], NodeKind::Transformer(_)),
            "transformers are removed through their subject"
        );

        self.damage_bbox(c);
        let p = self.parent[c as usize];
        self.unlink_from_parent(c);
        self.dirty.mark(p, dirty::CHILDREN_LIST);
        self.dirty.mark_with(p, dirty::GEOMETRY, &EagerPolicy);
        self.dirty.mark_with(c, dirty::ENABLED, &EagerPolicy);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.handle(p))
    }

    /// Returns the children of a node, front to back.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.validate(id);
        self.children[id.idx as usize]
            .iter()
            .map(|&c| self.handle(c))
    }

    // -- Properties --

    /// Returns what kind of node this is.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        self.validate(id);
        &self.kind[id.idx as usize]
    }

    /// Moves or resizes a content leaf, damaging both the old and new area.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node is not a content leaf.
    pub fn set_geometry(&mut self, id: NodeId, geometry: Geometry) {
        self.validate(id);
        let idx = id.idx;
        let NodeKind::Content { geometry: current } = &self.kind[idx as usize] else {
            panic!("only content nodes have their own geometry");
        };
        if *current == geometry {
            return;
        }
        self.damage_bbox(idx);
        self.kind[idx as usize] = NodeKind::Content { geometry };
        self.dirty.mark_with(idx, dirty::GEOMETRY, &EagerPolicy);
        self.damage_bbox(idx);
    }

    /// Enables or disables a node and its subtree.
    ///
    /// Disabled subtrees are not hit-tested and their damage is dropped, so
    /// the area is damaged while the subtree is still visible.
    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) {
        self.validate(id);
        let idx = id.idx;
        if self.enabled[idx as usize] == enabled {
            return;
        }
        if enabled {
            self.enabled[idx as usize] = true;
            self.damage_bbox(idx);
        } else {
            self.damage_bbox(idx);
            self.enabled[idx as usize] = false;
        }
        self.dirty.mark_with(idx, dirty::ENABLED, &EagerPolicy);
    }

    /// Returns the node's own enabled flag.
    #[must_use]
    pub fn is_enabled(&self, id: NodeId) -> bool {
        self.validate(id);
        self.enabled[id.idx as usize]
    }

    /// Returns `true` if the node and all of its ancestors are enabled.
    #[must_use]
    pub fn is_effectively_enabled(&self, id: NodeId) -> bool {
        self.validate(id);
        let mut idx = id.idx;
        while idx != INVALID {
            if !self.enabled[idx as usize] {
                return false;
            }
            idx = self.parent[idx as usize];
        }
        true
    }

    // -- Geometry --

    /// Bounding box of the node in its parent's coordinates.
    #[must_use]
    pub fn bounding_box(&self, id: NodeId) -> Geometry {
        self.validate(id);
        self.bbox_at(id.idx)
    }

    /// Union of the children's bounding boxes, in the node's own coordinates.
    #[must_use]
    pub fn children_bounding_box(&self, id: NodeId) -> Geometry {
        self.validate(id);
        self.children_bbox_at(id.idx)
    }

    /// Maps a point from the node's local space to its parent's space.
    ///
    /// Only transformers have a local space distinct from their parent's.
    #[must_use]
    pub fn to_global(&self, id: NodeId, p: Point) -> Point {
        self.validate(id);
        self.to_global_at(id.idx, p)
    }

    /// Maps a point from the parent's space into the node's local space.
    ///
    /// Returns `None` where the node's transform cannot be inverted.
    #[must_use]
    pub fn to_local(&self, id: NodeId, p: Point) -> Option<Point> {
        self.validate(id);
        self.to_local_at(id.idx, p)
    }

    /// Maps a point in the node's local space all the way to root space.
    #[must_use]
    pub fn to_root(&self, id: NodeId, p: Point) -> Point {
        self.validate(id);
        let mut idx = id.idx;
        let mut p = p;
        while idx != INVALID {
            p = self.to_global_at(idx, p);
            idx = self.parent[idx as usize];
        }
        p
    }

    /// Maps a point in root space into the node's local space.
    #[must_use]
    pub fn from_root(&self, id: NodeId, p: Point) -> Option<Point> {
        self.validate(id);
        let mut path = Vec::new();
        let mut idx = id.idx;
        while idx != INVALID {
            path.push(idx);
            idx = self.parent[idx as usize];
        }
        path.iter()
            .rev()
            .try_fold(p, |p, &idx| self.to_local_at(idx, p))
    }

    /// Returns the front-most enabled content leaf under `p` (root space).
    ///
    /// Points that a transformer cannot map back count as misses.
    #[must_use]
    pub fn hit_test(&self, p: Point) -> Option<NodeId> {
        self.hit_at(self.root, p).map(|idx| self.handle(idx))
    }

    // -- Damage --

    /// Damages `region` of a node, expressed in its parent's coordinates.
    ///
    /// The damage is carried up to the root, passing through each enclosing
    /// transformer's damage mapping and recording it in that transformer's
    /// cached contents. Damage in a disabled or detached subtree is dropped.
    pub fn damage_node(&mut self, id: NodeId, region: &Region) {
        self.validate(id);
        self.damage_from(id.idx, region.clone());
    }

    /// Damages the node's whole bounding box.
    pub fn damage_whole_node(&mut self, id: NodeId) {
        self.validate(id);
        self.damage_bbox(id.idx);
    }

    // -- Internal helpers --

    pub(crate) fn handle(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    pub(crate) fn is_live_index(&self, idx: u32) -> bool {
        idx < self.len && !self.free_list.contains(&idx)
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            self.is_alive(id),
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot. The generation was bumped on free.
            self.parent[idx as usize] = INVALID;
            self.children[idx as usize].clear();
            self.kind[idx as usize] = kind;
            self.enabled[idx as usize] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.children.push(Vec::new());
            self.kind.push(kind);
            self.enabled.push(true);
            self.generation.push(0);
            idx
        };
        self.pending_added.push(idx);
        self.handle(idx)
    }

    pub(crate) fn free_slot(&mut self, idx: u32) {
        self.dirty.remove_key(idx);
        self.generation[idx as usize] += 1;
        self.kind[idx as usize] = NodeKind::Group;
        self.free_list.push(idx);
        self.pending_removed.push(idx);
    }

    /// Adds the dirty edges for `c` becoming a child of `p`. Geometry flows
    /// up, enablement flows down.
    pub(crate) fn link(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        let _ = self.dirty.add_dependency(p, c, dirty::GEOMETRY);
        let _ = self.dirty.add_dependency(c, p, dirty::ENABLED);
    }

    /// Removes the dirty edges added by [`link`](Self::link) and clears the
    /// parent link. Leaves the parent's child list alone.
    pub(crate) fn unlink(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = INVALID;
        self.dirty.remove_dependency(p, c, dirty::GEOMETRY);
        self.dirty.remove_dependency(c, p, dirty::ENABLED);
    }

    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        self.children[p as usize].retain(|&c| c != idx);
        self.unlink(p, idx);
    }

    /// The node new children of `idx` actually attach to.
    fn content_parent(&self, idx: u32) -> u32 {
        match &self.kind[idx as usize] {
            NodeKind::Subject { chain } => chain.first().map_or(idx, |e| e.node.idx),
            _ => idx,
        }
    }

    pub(crate) fn bbox_at(&self, idx: u32) -> Geometry {
        match &self.kind[idx as usize] {
            NodeKind::Content { geometry } => *geometry,
            NodeKind::Group | NodeKind::Subject { .. } => self.children_bbox_at(idx),
            NodeKind::Transformer(t) => {
                let frame = self.frame_at(idx);
                t.transformer.bounding_box(&frame, frame.children)
            }
        }
    }

    pub(crate) fn children_bbox_at(&self, idx: u32) -> Geometry {
        self.children[idx as usize]
            .iter()
            .fold(Geometry::default(), |acc, &c| {
                acc.union_bounds(self.bbox_at(c))
            })
    }

    /// The untransformed box of a subject's content.
    fn subject_box(&self, subject: u32) -> Geometry {
        self.children_bbox_at(self.content_parent(subject))
    }

    /// The boxes a transformer node evaluates its transform against.
    pub(crate) fn frame_at(&self, idx: u32) -> TransformFrame {
        let subject = match &self.kind[idx as usize] {
            NodeKind::Transformer(t) => self.subject_box(t.subject),
            _ => Geometry::default(),
        };
        TransformFrame {
            subject,
            children: self.children_bbox_at(idx),
        }
    }

    fn to_global_at(&self, idx: u32, p: Point) -> Point {
        match &self.kind[idx as usize] {
            NodeKind::Transformer(t) => t.transformer.to_global(&self.frame_at(idx), p),
            _ => p,
        }
    }

    fn to_local_at(&self, idx: u32, p: Point) -> Option<Point> {
        match &self.kind[idx as usize] {
            NodeKind::Transformer(t) => t.transformer.to_local(&self.frame_at(idx), p),
            _ => Some(p),
        }
    }

    fn hit_at(&self, idx: u32, p: Point) -> Option<u32> {
        if !self.enabled[idx as usize] {
            return None;
        }
        if let NodeKind::Content { geometry } = &self.kind[idx as usize] {
            return geometry.contains_point(p).then_some(idx);
        }
        let local = self.to_local_at(idx, p)?;
        self.children[idx as usize]
            .iter()
            .find_map(|&c| self.hit_at(c, local))
    }

    pub(crate) fn damage_bbox(&mut self, idx: u32) {
        let bbox = self.bbox_at(idx);
        self.damage_from(idx, Region::from_rect(bbox));
    }

    /// Carries `damage`, expressed in the parent space of `idx`, up to the
    /// root.
    fn damage_from(&mut self, idx: u32, mut damage: Region) {
        let mut cur = idx;
        loop {
            if damage.is_empty() || !self.enabled[cur as usize] {
                return;
            }
            let parent = self.parent[cur as usize];
            if parent == INVALID {
                if cur == self.root {
                    self.pending_damage |= &damage;
                }
                return;
            }
            if matches!(self.kind[parent as usize], NodeKind::Transformer(_)) {
                let frame = self.frame_at(parent);
                if let NodeKind::Transformer(t) = &mut self.kind[parent as usize] {
                    t.cached_damage |= &damage;
                    damage = t.transformer.transform_damage(&frame, &damage);
                }
            }
            cur = parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::scene::transformer::View2d;

    fn attached_content(graph: &mut SceneGraph, g: Geometry) -> NodeId {
        let root = graph.root();
        let c = graph.create_content(g);
        graph.add_child(root, c);
        c
    }

    #[test]
    fn create_and_destroy() {
        let mut graph = SceneGraph::new();
        let id = graph.create_group();
        assert!(graph.is_alive(id));
        graph.destroy_node(id);
        assert!(!graph.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut graph = SceneGraph::new();
        let a = graph.create_group();
        graph.destroy_node(a);
        let b = graph.create_group();
        assert!(!graph.is_alive(a));
        assert!(graph.is_alive(b));
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
    }

    #[test]
    fn children_are_ordered_front_to_back() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.create_group();
        let b = graph.create_group();
        let c = graph.create_group();
        graph.add_child(root, a);
        graph.add_child(root, c);
        graph.insert_child(root, 1, b);
        let kids: Vec<_> = graph.children(root).collect();
        assert_eq!(kids, vec![a, b, c]);
        assert_eq!(graph.parent(b), Some(root));
    }

    #[test]
    fn group_bounding_box_unions_children() {
        let mut graph = SceneGraph::new();
        attached_content(&mut graph, Geometry::new(0, 0, 10, 10));
        attached_content(&mut graph, Geometry::new(20, 5, 10, 10));
        assert_eq!(
            graph.bounding_box(graph.root()),
            Geometry::new(0, 0, 30, 15)
        );
    }

    #[test]
    fn hit_test_prefers_front_child() {
        let mut graph = SceneGraph::new();
        let front = attached_content(&mut graph, Geometry::new(0, 0, 10, 10));
        let back = attached_content(&mut graph, Geometry::new(5, 0, 10, 10));
        assert_eq!(graph.hit_test(Point::new(7.0, 5.0)), Some(front));
        assert_eq!(graph.hit_test(Point::new(12.0, 5.0)), Some(back));
        assert_eq!(graph.hit_test(Point::new(50.0, 5.0)), None);

        graph.set_enabled(front, false);
        assert_eq!(graph.hit_test(Point::new(7.0, 5.0)), Some(back));
    }

    #[test]
    fn damage_on_detached_node_is_dropped() {
        let mut graph = SceneGraph::new();
        let c = graph.create_content(Geometry::new(0, 0, 10, 10));
        graph.damage_whole_node(c);
        assert!(graph.drain_updates().damage.is_empty());
    }

    #[test]
    fn damage_under_disabled_ancestor_is_dropped() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph.create_group();
        let c = graph.create_content(Geometry::new(0, 0, 10, 10));
        graph.add_child(root, group);
        graph.add_child(group, c);
        graph.set_enabled(group, false);
        let _ = graph.drain_updates();

        graph.damage_node(c, &Region::from_rect(Geometry::new(0, 0, 2, 2)));
        assert!(graph.drain_updates().damage.is_empty());
    }

    #[test]
    fn damage_passes_through_transformer() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let subject = graph.create_subject();
        let c = graph.create_content(Geometry::new(0, 0, 100, 100));
        graph.add_child(root, subject);
        graph.add_child(subject, c);
        let t = graph.add_transformer(
            subject,
            View2d {
                translation_x: 50.0,
                ..View2d::IDENTITY
            },
            0,
            "slide",
        );
        let _ = graph.drain_updates();
        let _ = graph.prepare_contents(t, 1.0);

        graph.damage_node(c, &Region::from_rect(Geometry::new(0, 0, 10, 10)));
        let changes = graph.drain_updates();
        assert_eq!(
            changes.damage,
            Region::from_rect(Geometry::new(50, 0, 10, 10))
        );
        assert_eq!(
            graph.prepare_contents(t, 1.0),
            Region::from_rect(Geometry::new(0, 0, 10, 10))
        );
    }

    #[test]
    fn set_geometry_damages_old_and_new() {
        let mut graph = SceneGraph::new();
        let c = attached_content(&mut graph, Geometry::new(0, 0, 10, 10));
        let _ = graph.drain_updates();
        graph.set_geometry(c, Geometry::new(100, 0, 10, 10));
        let damage = graph.drain_updates().damage;
        assert_eq!(damage.area(), 200);
    }

    #[test]
    fn remove_from_parent_damages_and_detaches() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let c = attached_content(&mut graph, Geometry::new(0, 0, 10, 10));
        let _ = graph.drain_updates();
        graph.remove_from_parent(c);
        assert_eq!(graph.parent(c), None);
        assert!(graph.children(root).next().is_none());
        let changes = graph.drain_updates();
        assert_eq!(changes.damage, Region::from_rect(Geometry::new(0, 0, 10, 10)));
        assert!(changes.children_changed.contains(&root.index()));
    }

    #[test]
    #[should_panic(expected = "cannot destroy node with children")]
    fn destroy_with_children_panics() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_group();
        let child = graph.create_group();
        graph.add_child(parent, child);
        graph.destroy_node(parent);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics() {
        let mut graph = SceneGraph::new();
        let id = graph.create_group();
        graph.destroy_node(id);
        let _ = graph.bounding_box(id);
    }

    #[test]
    fn to_root_and_back_through_transformer() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let subject = graph.create_subject();
        let c = graph.create_content(Geometry::new(0, 0, 100, 50));
        graph.add_child(root, subject);
        graph.add_child(subject, c);
        let t = graph.add_transformer(
            subject,
            View2d {
                angle: 0.5,
                scale_x: 2.0,
                ..View2d::IDENTITY
            },
            0,
            "spin",
        );
        let p = Point::new(10.0, 20.0);
        let global = graph.to_root(t, p);
        let back = graph.from_root(t, global);
        let near = |a: f64, b: f64| a - b < 1e-3 && b - a < 1e-3;
        assert!(
            back.is_some_and(|b| near(b.x, p.x) && near(b.y, p.y)),
            "{back:?}"
        );
    }
}
