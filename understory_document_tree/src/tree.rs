// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, traversal, and position queries.

use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::types::{DocumentPosition, NodeId};

/// Root→node chain. Most UI trees are shallow enough to stay inline.
type Ancestry = SmallVec<[NodeId; 16]>;

/// Structural document tree.
///
/// Nodes are stored in slots and addressed by generational [`NodeId`]s. Unlike
/// `understory_box_tree`, there is no commit step: structural changes are
/// visible to queries as soon as the mutating call returns.
///
/// ## Example
///
/// ```rust
/// use understory_document_tree::Tree;
///
/// let mut tree = Tree::new();
/// let root = tree.insert(None);
/// let a = tree.insert(Some(root));
/// let b = tree.insert_before(root, Some(a));
///
/// assert_eq!(tree.children_of(root), &[b, a]);
/// tree.remove(a);
/// assert!(!tree.is_alive(a));
/// ```
#[derive(Clone, Default)]
pub struct Tree {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(generation: u32) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
        }
    }
}

impl Tree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new node as the last child of `parent` (or as a new root if `None`).
    ///
    /// A new root starts a detached tree: its nodes are disconnected from every
    /// other root's nodes.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is stale.
    pub fn insert(&mut self, parent: Option<NodeId>) -> NodeId {
        let id = self.alloc();
        if let Some(p) = parent {
            self.node_mut(p).children.push(id);
            self.node_mut(id).parent = Some(p);
        }
        id
    }

    /// Insert a new child of `parent` directly before `reference`.
    ///
    /// Appends when `reference` is `None` or is not currently a child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is stale.
    pub fn insert_before(&mut self, parent: NodeId, reference: Option<NodeId>) -> NodeId {
        let id = self.alloc();
        let children = &mut self.node_mut(parent).children;
        let at = reference
            .and_then(|r| children.iter().position(|&c| c == r))
            .unwrap_or(children.len());
        children.insert(at, id);
        self.node_mut(id).parent = Some(parent);
        id
    }

    /// Remove a node (and its subtree) from the tree.
    ///
    /// Every removed [`NodeId`] becomes stale immediately. Stale ids are ignored.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        let children = self.node(id).children.clone();
        for child in children {
            self.remove(child);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Move `id` (with its subtree) to be the last child of `new_parent`, or a new root.
    ///
    /// Ignored if either id is stale, or if `new_parent` lies inside the subtree of `id`.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(p) = new_parent
            && (!self.is_alive(p) || self.contains(id, p))
        {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        if let Some(p) = new_parent {
            self.node_mut(p).children.push(id);
            self.node_mut(id).parent = Some(p);
        }
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .map(|n| n.generation == id.1)
            .unwrap_or(false)
    }

    /// Returns the parent of a node if live, or `None` for roots or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        if !self.is_alive(id) {
            return None;
        }
        self.node(id).parent
    }

    /// Get the children of a node, or empty slice if node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        if !self.is_alive(id) {
            return &[];
        }
        &self.node(id).children
    }

    /// Returns the root of the tree containing `id`, or `None` if `id` is stale.
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        if !self.is_alive(id) {
            return None;
        }
        let mut cur = id;
        while let Some(p) = self.node(cur).parent {
            cur = p;
        }
        Some(cur)
    }

    /// Number of ancestors of `id` (roots have depth 0), or `None` if `id` is stale.
    pub fn depth_of(&self, id: NodeId) -> Option<usize> {
        if !self.is_alive(id) {
            return None;
        }
        let mut depth = 0;
        let mut cur = id;
        while let Some(p) = self.node(cur).parent {
            depth += 1;
            cur = p;
        }
        Some(depth)
    }

    /// Returns true if `ancestor` is `node` or one of its ancestors.
    ///
    /// Always false when either id is stale.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if !self.is_alive(ancestor) || !self.is_alive(node) {
            return false;
        }
        let mut cur = Some(node);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.node(c).parent;
        }
        false
    }

    /// Describe where `b` sits relative to `a`.
    ///
    /// - Same live node: empty flags.
    /// - `b` is a descendant of `a`: [`CONTAINED_BY`](DocumentPosition::CONTAINED_BY) | [`FOLLOWING`](DocumentPosition::FOLLOWING).
    /// - `b` is an ancestor of `a`: [`CONTAINS`](DocumentPosition::CONTAINS) | [`PRECEDING`](DocumentPosition::PRECEDING).
    /// - Otherwise, within one tree: [`FOLLOWING`](DocumentPosition::FOLLOWING) if `b` comes later
    ///   in a depth-first pre-order walk, [`PRECEDING`](DocumentPosition::PRECEDING) if earlier.
    /// - Different trees, or either id stale:
    ///   [`DISCONNECTED`](DocumentPosition::DISCONNECTED) |
    ///   [`IMPLEMENTATION_SPECIFIC`](DocumentPosition::IMPLEMENTATION_SPECIFIC) plus a
    ///   preceding/following bit that is consistent for the pair but otherwise meaningless.
    pub fn compare_document_position(&self, a: NodeId, b: NodeId) -> DocumentPosition {
        if !self.is_alive(a) || !self.is_alive(b) {
            return disconnected(a, b);
        }
        if a == b {
            return DocumentPosition::empty();
        }

        let path_a = self.ancestry(a);
        let path_b = self.ancestry(b);
        if path_a[0] != path_b[0] {
            return disconnected(path_a[0], path_b[0]);
        }

        let common = path_a
            .iter()
            .zip(path_b.iter())
            .take_while(|(x, y)| x == y)
            .count();
        if common == path_a.len() {
            return DocumentPosition::CONTAINED_BY | DocumentPosition::FOLLOWING;
        }
        if common == path_b.len() {
            return DocumentPosition::CONTAINS | DocumentPosition::PRECEDING;
        }

        // Both chains diverge below the deepest shared ancestor; order the two
        // branches by their position among that ancestor's children.
        let siblings = &self.node(path_a[common - 1]).children;
        let branch_a = siblings.iter().position(|&c| c == path_a[common]);
        let branch_b = siblings.iter().position(|&c| c == path_b[common]);
        if branch_a < branch_b {
            DocumentPosition::FOLLOWING
        } else {
            DocumentPosition::PRECEDING
        }
    }

    /// Get the next node in depth-first traversal order.
    ///
    /// Returns `None` if no next node exists or if the current node is stale.
    /// This is a standard tree traversal that does not wrap around or leave the
    /// current node's tree.
    pub fn next_depth_first(&self, current: NodeId) -> Option<NodeId> {
        if !self.is_alive(current) {
            return None;
        }
        if let Some(&first_child) = self.node(current).children.first() {
            return Some(first_child);
        }

        let mut node = current;
        while let Some(parent) = self.parent_of(node) {
            if let Some(next_sibling) = self.sibling_at(node, 1) {
                return Some(next_sibling);
            }
            node = parent;
        }
        None
    }

    /// Get the previous node in reverse depth-first traversal order.
    ///
    /// Returns `None` if no previous node exists or if the current node is stale.
    pub fn prev_depth_first(&self, current: NodeId) -> Option<NodeId> {
        if !self.is_alive(current) {
            return None;
        }
        match self.sibling_at(current, -1) {
            Some(prev_sibling) => Some(self.last_in_subtree(prev_sibling)),
            None => self.parent_of(current),
        }
    }

    // --- internals ---

    fn alloc(&mut self) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation));
            (idx, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation)));
            self.generations.push(generation);
            (self.nodes.len() - 1, generation)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        NodeId::new(idx as u32, generation)
    }

    /// Access a node; panics if `id` is stale.
    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        assert!(self.is_alive(id), "dangling NodeId");
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(parent).children.retain(|c| *c != id);
        self.node_mut(id).parent = None;
    }

    /// Root→`id` chain (inclusive). `id` must be live.
    fn ancestry(&self, id: NodeId) -> Ancestry {
        let mut out = Ancestry::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            out.push(c);
            cur = self.node(c).parent;
        }
        out.reverse();
        out
    }

    fn sibling_at(&self, node: NodeId, offset: isize) -> Option<NodeId> {
        let parent = self.parent_of(node)?;
        let siblings = &self.node(parent).children;
        let pos = siblings.iter().position(|&id| id == node)?;
        siblings.get(pos.checked_add_signed(offset)?).copied()
    }

    fn last_in_subtree(&self, node: NodeId) -> NodeId {
        let mut cur = node;
        while let Some(&last_child) = self.node(cur).children.last() {
            cur = last_child;
        }
        cur
    }
}

fn disconnected(a: NodeId, b: NodeId) -> DocumentPosition {
    let direction = if a.arbitrary_before(b) {
        DocumentPosition::FOLLOWING
    } else {
        DocumentPosition::PRECEDING
    };
    DocumentPosition::DISCONNECTED | DocumentPosition::IMPLEMENTATION_SPECIFIC | direction
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// body
    /// ├── header
    /// │   └── title
    /// └── main
    ///     ├── first
    ///     └── second
    struct Page {
        tree: Tree,
        body: NodeId,
        header: NodeId,
        title: NodeId,
        main: NodeId,
        first: NodeId,
        second: NodeId,
    }

    fn page() -> Page {
        let mut tree = Tree::new();
        let body = tree.insert(None);
        let header = tree.insert(Some(body));
        let title = tree.insert(Some(header));
        let main = tree.insert(Some(body));
        let first = tree.insert(Some(main));
        let second = tree.insert(Some(main));
        Page {
            tree,
            body,
            header,
            title,
            main,
            first,
            second,
        }
    }

    #[test]
    fn same_node_has_no_position_bits() {
        let p = page();
        assert_eq!(
            p.tree.compare_document_position(p.title, p.title),
            DocumentPosition::empty()
        );
    }

    #[test]
    fn siblings_and_cousins_follow_pre_order() {
        let p = page();
        assert_eq!(
            p.tree.compare_document_position(p.first, p.second),
            DocumentPosition::FOLLOWING
        );
        assert_eq!(
            p.tree.compare_document_position(p.second, p.first),
            DocumentPosition::PRECEDING
        );
        // `title` is deeper than `first` but sits in an earlier branch.
        assert_eq!(
            p.tree.compare_document_position(p.title, p.first),
            DocumentPosition::FOLLOWING
        );
        assert_eq!(
            p.tree.compare_document_position(p.second, p.header),
            DocumentPosition::PRECEDING
        );
    }

    #[test]
    fn ancestors_contain_descendants() {
        let p = page();
        assert_eq!(
            p.tree.compare_document_position(p.body, p.second),
            DocumentPosition::CONTAINED_BY | DocumentPosition::FOLLOWING
        );
        assert_eq!(
            p.tree.compare_document_position(p.second, p.main),
            DocumentPosition::CONTAINS | DocumentPosition::PRECEDING
        );
        assert!(p.tree.contains(p.body, p.title));
        assert!(p.tree.contains(p.title, p.title));
        assert!(!p.tree.contains(p.main, p.title));
    }

    #[test]
    fn separate_roots_are_disconnected_but_consistent() {
        let mut p = page();
        let detached = p.tree.insert(None);
        let child = p.tree.insert(Some(detached));

        let ab = p.tree.compare_document_position(p.first, child);
        let ba = p.tree.compare_document_position(child, p.first);
        for pos in [ab, ba] {
            assert!(pos.contains(
                DocumentPosition::DISCONNECTED | DocumentPosition::IMPLEMENTATION_SPECIFIC
            ));
        }
        // One direction says following, the other preceding.
        assert_eq!(
            ab.contains(DocumentPosition::FOLLOWING),
            ba.contains(DocumentPosition::PRECEDING)
        );
    }

    #[test]
    fn stale_ids_are_disconnected() {
        let mut p = page();
        p.tree.remove(p.second);
        let pos = p.tree.compare_document_position(p.first, p.second);
        assert!(pos.contains(DocumentPosition::DISCONNECTED));
        let pos = p.tree.compare_document_position(p.second, p.second);
        assert!(pos.contains(DocumentPosition::DISCONNECTED));
    }

    #[test]
    fn remove_drops_whole_subtree() {
        let mut p = page();
        p.tree.remove(p.main);
        assert!(!p.tree.is_alive(p.main));
        assert!(!p.tree.is_alive(p.first));
        assert!(!p.tree.is_alive(p.second));
        assert_eq!(p.tree.children_of(p.body), &[p.header]);
        // Removing again is a no-op.
        p.tree.remove(p.main);
        assert_eq!(p.tree.children_of(p.body), &[p.header]);
    }

    #[test]
    fn liveness_insert_remove_reuse() {
        let mut tree = Tree::new();
        let root = tree.insert(None);
        let a = tree.insert(Some(root));
        tree.remove(a);
        let b = tree.insert(Some(root));
        // Slot is reused but the old id stays stale.
        assert_eq!(a.idx(), b.idx());
        assert_ne!(a, b);
        assert!(!tree.is_alive(a));
        assert!(tree.is_alive(b));
        assert_eq!(tree.parent_of(a), None);
        assert_eq!(tree.parent_of(b), Some(root));
    }

    #[test]
    fn insert_before_places_node() {
        let mut p = page();
        let lead = p.tree.insert_before(p.main, Some(p.first));
        assert_eq!(p.tree.children_of(p.main), &[lead, p.first, p.second]);
        assert_eq!(
            p.tree.compare_document_position(lead, p.first),
            DocumentPosition::FOLLOWING
        );
        // A reference that is not a child appends.
        let tail = p.tree.insert_before(p.main, Some(p.title));
        assert_eq!(p.tree.children_of(p.main).last(), Some(&tail));
    }

    #[test]
    fn reparent_moves_subtree_and_rejects_cycles() {
        let mut p = page();
        p.tree.reparent(p.header, Some(p.main));
        assert_eq!(p.tree.children_of(p.main), &[p.first, p.second, p.header]);
        assert_eq!(p.tree.depth_of(p.title), Some(3));
        assert_eq!(
            p.tree.compare_document_position(p.second, p.title),
            DocumentPosition::FOLLOWING
        );

        // Moving `main` under its own descendant is refused.
        p.tree.reparent(p.main, Some(p.title));
        assert_eq!(p.tree.parent_of(p.main), Some(p.body));

        // Detaching makes a new root.
        p.tree.reparent(p.main, None);
        assert_eq!(p.tree.root_of(p.first), Some(p.main));
        assert!(
            p.tree
                .compare_document_position(p.body, p.first)
                .contains(DocumentPosition::DISCONNECTED)
        );
    }

    #[test]
    fn depth_first_walks_document_order() {
        let p = page();
        let mut order = vec![p.body];
        let mut cur = p.body;
        while let Some(next) = p.tree.next_depth_first(cur) {
            order.push(next);
            cur = next;
        }
        assert_eq!(
            order,
            vec![p.body, p.header, p.title, p.main, p.first, p.second]
        );

        let mut back = vec![p.second];
        let mut cur = p.second;
        while let Some(prev) = p.tree.prev_depth_first(cur) {
            back.push(prev);
            cur = prev;
        }
        back.reverse();
        assert_eq!(back, order);
    }

    #[test]
    fn traversal_agrees_with_position_query() {
        let p = page();
        let mut cur = p.body;
        while let Some(next) = p.tree.next_depth_first(cur) {
            assert!(
                p.tree
                    .compare_document_position(cur, next)
                    .contains(DocumentPosition::FOLLOWING),
                "each step of the walk should move forward"
            );
            cur = next;
        }
    }

    #[test]
    fn accessors_respect_liveness() {
        let mut p = page();
        p.tree.remove(p.header);
        assert_eq!(p.tree.children_of(p.title), &[] as &[NodeId]);
        assert_eq!(p.tree.root_of(p.title), None);
        assert_eq!(p.tree.depth_of(p.title), None);
        assert_eq!(p.tree.next_depth_first(p.title), None);
        assert_eq!(p.tree.prev_depth_first(p.title), None);
        assert_eq!(p.tree.depth_of(p.second), Some(2));
    }
}
