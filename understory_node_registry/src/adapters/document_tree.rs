// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapter for Understory Document Tree.
//!
//! ## Feature
//!
//! Enable with `document_tree_adapter` (on by default).
//!
//! ## Notes
//!
//! [`DocumentOrder`] is the comparator to use when handles are
//! [`understory_document_tree::NodeId`]s and no custom order is wanted. It borrows the
//! tree only for the duration of a read, so build it right where the ordered read happens,
//! after the host has finished mutating the tree for the pass.

use alloc::vec::Vec;
use core::hash::Hash;

use understory_document_tree::{DocumentPosition, NodeId, Tree};

use crate::error::UnorderableNodes;
use crate::manager::NodeManager;
use crate::order::{Comparator, NodeOrder};
use crate::view::OrderedView;

/// Document-order comparator over the nodes of one [`Tree`].
#[derive(Clone, Copy, Debug)]
pub struct DocumentOrder<'t> {
    tree: &'t Tree,
}

impl<'t> DocumentOrder<'t> {
    /// Compare nodes by their position in `tree`.
    pub fn new(tree: &'t Tree) -> Self {
        Self { tree }
    }
}

impl Comparator<NodeId> for DocumentOrder<'_> {
    fn compare(&self, a: &NodeId, b: &NodeId) -> NodeOrder {
        position_to_order(self.tree.compare_document_position(*a, *b))
    }
}

/// Map `compare_document_position(a, b)` flags to the order of `a` relative to `b`.
///
/// Disconnection is checked first, so nodes in different trees are never coerced
/// into an arbitrary order.
pub fn position_to_order(position: DocumentPosition) -> NodeOrder {
    if position.intersects(DocumentPosition::DISCONNECTED | DocumentPosition::IMPLEMENTATION_SPECIFIC)
    {
        NodeOrder::Unorderable
    } else if position.intersects(DocumentPosition::FOLLOWING | DocumentPosition::CONTAINED_BY) {
        NodeOrder::Before
    } else if position.intersects(DocumentPosition::PRECEDING | DocumentPosition::CONTAINS) {
        NodeOrder::After
    } else {
        NodeOrder::Equal
    }
}

/// Registered nodes of `manager` in document order of `tree`.
pub fn ordered_nodes<K>(
    manager: &NodeManager<K, NodeId>,
    tree: &Tree,
) -> Result<Vec<NodeId>, UnorderableNodes>
where
    K: Eq + Hash + Clone,
{
    manager.ordered_nodes(&DocumentOrder::new(tree))
}

/// Refresh `view` against `manager` in document order of `tree`.
pub fn refresh_view<'v, K>(
    view: &'v mut OrderedView<K, NodeId>,
    manager: &NodeManager<K, NodeId>,
    tree: &Tree,
) -> Result<&'v [NodeId], UnorderableNodes>
where
    K: Eq + Hash + Clone,
{
    view.refresh(manager, &DocumentOrder::new(tree))
}
