// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Node Registry: collect rendered nodes by key and read them in document order.
//!
//! ## Overview
//!
//! A container often needs to know which nodes its descendants rendered, and in what order
//! they appear in the document, without the descendants reporting their positions.
//! This crate provides the shared registry for that and two ways to read it:
//!
//! - [`NodeManager`]: one scope's registry. Descendants register `key → handle` through a
//!   [`Binding`]; the host reads an unordered [`Snapshot`] or a sequence ordered by a
//!   caller-supplied [`Comparator`](order::Comparator).
//! - [`OrderedView`]: a reader's cached ordered sequence that sorts again only after a
//!   flush changed the registry.
//! - [`FirstMatch`]: a scope of [`Target`]s that runs exactly one handler, the one of the
//!   whitelisted field that comes first in document order.
//!
//! ## Passes
//!
//! Registration is two-phase. Calls made during a pass are staged; [`NodeManager::flush`]
//! applies them once every participant has committed its own structure, and returns a
//! [`Commit`] with the net change. Readers only ever see flushed state.
//!
//! ## Ordering
//!
//! Handles are opaque to the registry. Ordered reads take a comparator that answers
//! [`NodeOrder`](order::NodeOrder) for two handles. Sorting is stable, and a pair the
//! comparator cannot order fails the read with [`UnorderableNodes`] instead of guessing.
//! With the `document_tree_adapter` feature, [`adapters::document_tree::DocumentOrder`]
//! orders [`understory_document_tree`] nodes by tree position.
//!
//! ## Example
//!
//! ```rust
//! use understory_node_registry::order::NodeOrder;
//! use understory_node_registry::{NamespaceGenerator, NodeManager, OrderedView};
//!
//! let mut namespaces = NamespaceGenerator::default();
//! let list: NodeManager<&str, u32> = NodeManager::new(&mut namespaces);
//!
//! // Each item binds its key and reports the node it rendered.
//! let mut second = list.bind("second");
//! let mut first = list.bind("first");
//! second.set(Some(20));
//! first.set(Some(10));
//! second.commit();
//! first.commit();
//!
//! // Commit barrier for the pass.
//! let commit = list.flush();
//! assert_eq!(commit.registered.len(), 2);
//!
//! let by_position = |a: &u32, b: &u32| NodeOrder::from_ordering(a.cmp(b));
//! let mut view = OrderedView::new();
//! assert_eq!(view.refresh(&list, &by_position).unwrap(), &[10, 20]);
//!
//! // Unmounting an item unregisters it at the next flush.
//! drop(first);
//! list.flush();
//! assert_eq!(view.refresh(&list, &by_position).unwrap(), &[20]);
//! ```
//!
//! ## Features
//!
//! - `document_tree_adapter` (default): [`adapters::document_tree`].
//! - `tracing`: debug events for flushes and resolutions, warnings for failed ordered reads.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod adapters;
mod binding;
pub mod error;
pub mod first_match;
mod manager;
mod namespace;
pub mod order;
mod view;

pub use binding::Binding;
pub use error::UnorderableNodes;
pub use first_match::{FirstMatch, FirstMatchOptions, MatchHandler, Resolution, Target};
pub use manager::{Commit, NodeManager, Snapshot};
pub use namespace::{Namespace, NamespaceGenerator};
pub use view::OrderedView;
