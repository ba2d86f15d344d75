// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transform chains: stacks of transformers spliced between a subject and its
//! content.
//!
//! A subject's chain is kept sorted by ascending z-order. The lowest z-order
//! sits directly above the content, the highest directly below the subject:
//!
//! ```text
//! subject ─▶ t(z=10) ─▶ t(z=5) ─▶ t(z=1) ─▶ content…
//! ```
//!
//! Every splice damages the subject's bounding box before and after the
//! change, so both the area being vacated and the newly covered area are
//! repainted, and marks [`CHILDREN_LIST`](crate::dirty::CHILDREN_LIST) so
//! render instances are rebuilt.

use alloc::string::String;

use understory_dirty::EagerPolicy;

use super::graph::{ChainEntry, NodeKind, SceneGraph, TransformerNode};
use super::id::{INVALID, NodeId};
use super::transformer::Transformer;
use crate::dirty;
use crate::geometry::Geometry;
use crate::region::Region;

impl SceneGraph {
    /// Attaches a transformer to `subject` and returns the new node.
    ///
    /// The node is inserted before the first chain entry whose z-order is at
    /// least `z_order`; it adopts that entry's children (or the subject's, if
    /// it becomes the outermost) and becomes their parent's only child.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or `subject` is not a subject node.
    pub fn add_transformer(
        &mut self,
        subject: NodeId,
        transformer: impl Into<Transformer>,
        z_order: i32,
        name: &str,
    ) -> NodeId {
        self.validate(subject);
        let s = subject.idx;
        let (pos, parent) = match &self.kind[s as usize] {
            NodeKind::Subject { chain } => {
                let pos = chain
                    .iter()
                    .position(|e| e.z_order >= z_order)
                    .unwrap_or(chain.len());
                let parent = chain.get(pos).map_or(s, |e| e.node.idx);
                (pos, parent)
            }
            _ => panic!("transformers can only be attached to subject nodes"),
        };

        self.damage_bbox(s);

        let node = self.alloc(NodeKind::Transformer(TransformerNode {
            transformer: transformer.into(),
            subject: s,
            cached_damage: Region::new(),
            cached_size: None,
        }));
        let t = node.idx;

        let adopted = core::mem::take(&mut self.children[parent as usize]);
        for &c in &adopted {
            self.unlink(parent, c);
            self.link(t, c);
        }
        self.children[t as usize] = adopted;
        self.children[parent as usize].push(t);
        self.link(parent, t);

        if let NodeKind::Subject { chain } = &mut self.kind[s as usize] {
            chain.insert(
                pos,
                ChainEntry {
                    node,
                    z_order,
                    name: String::from(name),
                },
            );
        }

        self.dirty.mark(t, dirty::CHILDREN_LIST);
        self.dirty.mark(parent, dirty::CHILDREN_LIST);
        self.dirty.mark_with(t, dirty::GEOMETRY, &EagerPolicy);
        self.damage_bbox(s);

        log::debug!("attached transformer {name:?} (z {z_order}) as {node:?}");
        node
    }

    /// Detaches a transformer and frees its node.
    ///
    /// The transformer's children take its place in its parent's child list.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, the node is not a transformer, or the
    /// transformer has no parent.
    pub fn remove_transformer(&mut self, node: NodeId) {
        self.validate(node);
        let t = node.idx;
        let s = match &self.kind[t as usize] {
            NodeKind::Transformer(tn) => tn.subject,
            _ => panic!("node is not a transformer"),
        };

        self.damage_bbox(s);

        let parent = self.parent[t as usize];
        assert!(parent != INVALID, "transformer is missing a parent");

        let adopted = core::mem::take(&mut self.children[t as usize]);
        for &c in &adopted {
            self.unlink(t, c);
            self.link(parent, c);
        }
        self.unlink(parent, t);

        let siblings = &mut self.children[parent as usize];
        if let Some(i) = siblings.iter().position(|&c| c == t) {
            let tail = siblings.split_off(i + 1);
            siblings.pop();
            siblings.extend(adopted);
            siblings.extend(tail);
        }

        if let NodeKind::Subject { chain } = &mut self.kind[s as usize] {
            chain.retain(|e| e.node != node);
        }

        self.dirty.mark(parent, dirty::CHILDREN_LIST);
        self.dirty.mark_with(parent, dirty::GEOMETRY, &EagerPolicy);
        self.damage_bbox(s);
        self.free_slot(t);

        log::debug!("removed transformer {node:?}");
    }

    /// Removes the transformer registered under `name`, if any.
    pub fn remove_transformer_by_name(&mut self, subject: NodeId, name: &str) -> bool {
        match self.transformer_by_name(subject, name) {
            Some(node) => {
                self.remove_transformer(node);
                true
            }
            None => false,
        }
    }

    /// Looks up a transformer by the name it was registered under.
    #[must_use]
    pub fn transformer_by_name(&self, subject: NodeId, name: &str) -> Option<NodeId> {
        self.transformers(subject)
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.node)
    }

    /// The chain attached to `subject`, innermost first.
    ///
    /// Returns an empty slice for nodes that are not subjects.
    #[must_use]
    pub fn transformers(&self, subject: NodeId) -> &[ChainEntry] {
        self.validate(subject);
        match &self.kind[subject.idx as usize] {
            NodeKind::Subject { chain } => chain,
            _ => &[],
        }
    }

    /// Returns the transform of a transformer node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node is not a transformer.
    #[must_use]
    pub fn transformer(&self, node: NodeId) -> &Transformer {
        self.validate(node);
        match &self.kind[node.idx as usize] {
            NodeKind::Transformer(tn) => &tn.transformer,
            _ => panic!("node is not a transformer"),
        }
    }

    /// Returns the transform of a transformer node for modification.
    ///
    /// Changes made through this reference are not damaged; bracket them with
    /// [`begin_transform_update`](Self::begin_transform_update) and
    /// [`end_transform_update`](Self::end_transform_update), or use
    /// [`update_transformer`](Self::update_transformer).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node is not a transformer.
    pub fn transformer_mut(&mut self, node: NodeId) -> &mut Transformer {
        self.validate(node);
        match &mut self.kind[node.idx as usize] {
            NodeKind::Transformer(tn) => &mut tn.transformer,
            _ => panic!("node is not a transformer"),
        }
    }

    /// Damages the area the subject covers before a transform change.
    pub fn begin_transform_update(&mut self, node: NodeId) {
        let s = self.subject_of(node);
        self.damage_bbox(s);
    }

    /// Damages the area the subject covers after a transform change and marks
    /// its geometry as changed.
    pub fn end_transform_update(&mut self, node: NodeId) {
        let s = self.subject_of(node);
        self.dirty.mark_with(node.idx, dirty::GEOMETRY, &EagerPolicy);
        self.damage_bbox(s);
    }

    /// Applies `f` to a transformer's transform, damaging before and after.
    pub fn update_transformer(&mut self, node: NodeId, f: impl FnOnce(&mut Transformer)) {
        self.begin_transform_update(node);
        f(self.transformer_mut(node));
        self.end_transform_update(node);
    }

    /// Returns the part of a transformer's cached contents that must be
    /// re-rendered before drawing it at `scale`, and forgets it.
    ///
    /// The region is in the transformer's local coordinates. The first call,
    /// and any call after the child box or scale changed, returns the whole
    /// child box.
    pub fn prepare_contents(&mut self, node: NodeId, scale: f64) -> Region {
        self.validate(node);
        let t = node.idx;
        let children: Geometry = self.children_bbox_at(t);
        let NodeKind::Transformer(tn) = &mut self.kind[t as usize] else {
            panic!("node is not a transformer");
        };
        if tn.cached_size != Some((children, scale)) {
            tn.cached_damage |= children;
            tn.cached_size = Some((children, scale));
        }
        core::mem::take(&mut tn.cached_damage)
    }

    /// Slot of the subject a transformer belongs to.
    fn subject_of(&self, node: NodeId) -> u32 {
        self.validate(node);
        match &self.kind[node.idx as usize] {
            NodeKind::Transformer(tn) => tn.subject,
            _ => panic!("node is not a transformer"),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use kurbo::Point;

    use super::*;
    use crate::scene::transformer::View2d;

    fn subject_with_content(graph: &mut SceneGraph) -> (NodeId, NodeId) {
        let root = graph.root();
        let subject = graph.create_subject();
        let content = graph.create_content(Geometry::new(0, 0, 100, 100));
        graph.add_child(root, subject);
        graph.add_child(subject, content);
        (subject, content)
    }

    fn z_orders(graph: &SceneGraph, subject: NodeId) -> Vec<i32> {
        graph.transformers(subject).iter().map(|e| e.z_order).collect()
    }

    fn only_child(graph: &SceneGraph, id: NodeId) -> NodeId {
        let kids: Vec<_> = graph.children(id).collect();
        assert_eq!(kids.len(), 1, "{id:?} should have exactly one child");
        kids[0]
    }

    #[test]
    fn middle_z_order_splices_between_neighbours() {
        let mut graph = SceneGraph::new();
        let (subject, content) = subject_with_content(&mut graph);
        let t1 = graph.add_transformer(subject, View2d::IDENTITY, 1, "low");
        let t10 = graph.add_transformer(subject, View2d::IDENTITY, 10, "high");
        assert_eq!(only_child(&graph, t10), t1);

        let t5 = graph.add_transformer(subject, View2d::IDENTITY, 5, "mid");
        assert_eq!(z_orders(&graph, subject), vec![1, 5, 10]);

        // subject → t10 → t5 → t1 → content
        assert_eq!(only_child(&graph, subject), t10);
        assert_eq!(only_child(&graph, t10), t5);
        assert_eq!(only_child(&graph, t5), t1);
        assert_eq!(only_child(&graph, t1), content);
        assert_eq!(graph.parent(t1), Some(t5));
    }

    #[test]
    fn removal_reattaches_children_to_former_parent() {
        let mut graph = SceneGraph::new();
        let (subject, content) = subject_with_content(&mut graph);
        let t1 = graph.add_transformer(subject, View2d::IDENTITY, 1, "low");
        let t5 = graph.add_transformer(subject, View2d::IDENTITY, 5, "mid");
        let t10 = graph.add_transformer(subject, View2d::IDENTITY, 10, "high");

        graph.remove_transformer(t5);
        assert!(!graph.is_alive(t5));
        assert_eq!(z_orders(&graph, subject), vec![1, 10]);
        assert_eq!(only_child(&graph, t10), t1);
        assert_eq!(graph.parent(t1), Some(t10));

        assert!(graph.remove_transformer_by_name(subject, "high"));
        assert!(graph.remove_transformer_by_name(subject, "low"));
        assert!(!graph.remove_transformer_by_name(subject, "low"));
        assert_eq!(only_child(&graph, subject), content);
        assert_eq!(graph.parent(content), Some(subject));
    }

    #[test]
    fn removal_keeps_sibling_order() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let subject = graph.create_subject();
        graph.add_child(root, subject);
        let a = graph.create_content(Geometry::new(0, 0, 10, 10));
        let b = graph.create_content(Geometry::new(10, 0, 10, 10));
        graph.add_child(subject, a);
        graph.add_child(subject, b);

        let t = graph.add_transformer(subject, View2d::IDENTITY, 0, "t");
        let kids: Vec<_> = graph.children(t).collect();
        assert_eq!(kids, vec![a, b]);

        graph.remove_transformer(t);
        let kids: Vec<_> = graph.children(subject).collect();
        assert_eq!(kids, vec![a, b]);
    }

    #[test]
    fn splices_damage_before_and_after_and_flag_children() {
        let mut graph = SceneGraph::new();
        let (subject, _) = subject_with_content(&mut graph);
        let _ = graph.drain_updates();

        let t = graph.add_transformer(
            subject,
            View2d {
                translation_x: 200.0,
                ..View2d::IDENTITY
            },
            0,
            "slide",
        );
        let changes = graph.drain_updates();
        assert!(changes.children_changed.contains(&t.index()));
        assert!(changes.children_changed.contains(&subject.index()));
        assert_eq!(
            changes.damage,
            Region::from_rects([Geometry::new(0, 0, 100, 100), Geometry::new(200, 0, 100, 100)])
        );

        graph.remove_transformer(t);
        let changes = graph.drain_updates();
        assert!(changes.children_changed.contains(&subject.index()));
        assert!(!changes.children_changed.contains(&t.index()));
        assert_eq!(changes.damage.area(), 2 * 100 * 100);
    }

    #[test]
    fn content_added_to_subject_goes_under_innermost() {
        let mut graph = SceneGraph::new();
        let (subject, _) = subject_with_content(&mut graph);
        let inner = graph.add_transformer(subject, View2d::IDENTITY, 1, "inner");
        let _outer = graph.add_transformer(subject, View2d::IDENTITY, 2, "outer");
        let popup = graph.create_content(Geometry::new(10, 10, 5, 5));
        graph.add_child(subject, popup);
        assert_eq!(graph.parent(popup), Some(inner));
    }

    #[test]
    fn transform_update_damages_old_and_new_area() {
        let mut graph = SceneGraph::new();
        let (subject, _) = subject_with_content(&mut graph);
        let t = graph.add_transformer(subject, View2d::IDENTITY, 0, "slide");
        let _ = graph.drain_updates();

        graph.update_transformer(t, |tr| {
            if let Some(v) = tr.as_view_2d_mut() {
                v.translation_y = 300.0;
            }
        });
        let changes = graph.drain_updates();
        assert!(changes.geometry_changed.contains(&subject.index()));
        assert_eq!(
            changes.damage,
            Region::from_rects([Geometry::new(0, 0, 100, 100), Geometry::new(0, 300, 100, 100)])
        );
        assert_eq!(graph.bounding_box(subject), Geometry::new(0, 300, 100, 100));
        assert!(graph.hit_test(Point::new(50.0, 350.0)).is_some(), "moved content is hit");
    }

    #[test]
    fn prepare_contents_tracks_size_and_scale() {
        let mut graph = SceneGraph::new();
        let (subject, content) = subject_with_content(&mut graph);
        let t = graph.add_transformer(subject, View2d::IDENTITY, 0, "cache");
        let whole = Region::from_rect(Geometry::new(0, 0, 100, 100));

        assert_eq!(graph.prepare_contents(t, 1.0), whole);
        assert!(graph.prepare_contents(t, 1.0).is_empty());

        graph.damage_node(content, &Region::from_rect(Geometry::new(1, 1, 2, 2)));
        assert_eq!(
            graph.prepare_contents(t, 1.0),
            Region::from_rect(Geometry::new(1, 1, 2, 2))
        );

        assert_eq!(graph.prepare_contents(t, 2.0), whole);

        graph.set_geometry(content, Geometry::new(0, 0, 50, 50));
        assert_eq!(graph.prepare_contents(t, 2.0), whole);
    }

    #[test]
    fn transformer_by_name_finds_entry() {
        let mut graph = SceneGraph::new();
        let (subject, _) = subject_with_content(&mut graph);
        let t = graph.add_transformer(subject, View2d::IDENTITY, 3, "zoom");
        assert_eq!(graph.transformer_by_name(subject, "zoom"), Some(t));
        assert_eq!(graph.transformer_by_name(subject, "spin"), None);
        assert_eq!(graph.transformer(t), &Transformer::View2d(View2d::IDENTITY));
    }
}
