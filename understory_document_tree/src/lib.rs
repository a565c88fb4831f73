// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Document Tree: structural positions for UI nodes.
//!
//! Understory Document Tree is the structural half of a rendered UI: an arena of nodes
//! with a parent and an ordered list of children, and nothing else.
//! It answers one question well: where does a node sit in the document relative to another node?
//!
//! - Nodes are addressed by generational [`NodeId`]s; removing a node makes its id stale
//!   and a reused slot never aliases an old id.
//! - [`Tree::compare_document_position`] reports the relationship between two nodes as
//!   [`DocumentPosition`] flags with the same meaning as the platform relation used by web
//!   documents (preceding/following, contains/contained-by, disconnected).
//! - Several roots may coexist. Each root starts its own detached tree, and nodes in
//!   different trees are reported as disconnected.
//!
//! ## Not a renderer
//!
//! There is no geometry, styling, or attribute storage here.
//! Hosts keep whatever per-node data they need in their own maps, keyed by [`NodeId`],
//! and use this tree only for structure and ordering.
//! For spatial queries see `understory_box_tree`.
//!
//! ## API overview
//!
//! - [`Tree::insert`] / [`Tree::insert_before`] → [`NodeId`]
//! - [`Tree::remove`] drops a whole subtree; [`Tree::reparent`] moves one.
//! - [`Tree::parent_of`], [`Tree::children_of`], [`Tree::root_of`], [`Tree::depth_of`].
//! - [`Tree::next_depth_first`] and [`Tree::prev_depth_first`] walk the tree in document order.
//! - [`Tree::compare_document_position`] and [`Tree::contains`] relate two nodes.
//!
//! ## Example
//!
//! ```rust
//! use understory_document_tree::{DocumentPosition, Tree};
//!
//! let mut tree = Tree::new();
//! let body = tree.insert(None);
//! let header = tree.insert(Some(body));
//! let footer = tree.insert(Some(body));
//!
//! // `footer` follows `header` in document order.
//! assert_eq!(
//!     tree.compare_document_position(header, footer),
//!     DocumentPosition::FOLLOWING
//! );
//! // `body` contains both.
//! assert!(
//!     tree.compare_document_position(header, body)
//!         .contains(DocumentPosition::CONTAINS | DocumentPosition::PRECEDING)
//! );
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod tree;
mod types;

pub use tree::Tree;
pub use types::{DocumentPosition, NodeId};
