// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the document tree: node identifiers and position flags.

/// Identifier for a node in the tree (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Arbitrary but stable ordering used for nodes that share no tree.
    pub(crate) fn arbitrary_before(self, other: Self) -> bool {
        (self.0, self.1) < (other.0, other.1)
    }
}

bitflags::bitflags! {
    /// Relationship of another node to a reference node.
    ///
    /// Returned by [`Tree::compare_document_position(a, b)`](crate::Tree::compare_document_position),
    /// where the flags describe `b` as seen from `a`. The bit values match the ones used by
    /// web documents, so code written against that relation ports over directly.
    ///
    /// An empty set means both arguments are the same live node.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DocumentPosition: u8 {
        /// The nodes are not in the same tree (or one of them is stale).
        const DISCONNECTED = 0b0000_0001;
        /// The other node precedes the reference node.
        const PRECEDING = 0b0000_0010;
        /// The other node follows the reference node.
        const FOLLOWING = 0b0000_0100;
        /// The other node is an ancestor of the reference node.
        const CONTAINS = 0b0000_1000;
        /// The other node is a descendant of the reference node.
        const CONTAINED_BY = 0b0001_0000;
        /// The preceding/following bit carries no structural meaning.
        ///
        /// Always set together with [`DocumentPosition::DISCONNECTED`].
        const IMPLEMENTATION_SPECIFIC = 0b0010_0000;
    }
}
