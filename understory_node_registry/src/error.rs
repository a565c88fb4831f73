// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Only ordering can fail. Everything else that looks like an error at first
//! glance is a valid operation in this crate:
//!
//! - registering a key twice overwrites the earlier handle,
//! - unregistering an absent key does nothing,
//! - resolving a first match without candidates invokes no handler.

use thiserror::Error;

/// Two registered handles have no defined order relative to each other.
///
/// Raised by [`sort_nodes`](crate::order::sort_nodes) and everything built on it when the
/// comparator answers [`NodeOrder::Unorderable`](crate::order::NodeOrder::Unorderable), for
/// example because the nodes live in disjoint trees or one of them was detached.
///
/// `first` and `second` are the positions of the offending pair in the sequence that was
/// handed to the sorter (for registry reads, the order of [`NodeManager::snapshot`]'s values,
/// which is unspecified).
///
/// [`NodeManager::snapshot`]: crate::NodeManager::snapshot
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
#[error("cannot sort the given nodes: entries {first} and {second} have no defined order")]
pub struct UnorderableNodes {
    /// Input position of the left-hand node of the failing comparison.
    pub first: usize,
    /// Input position of the right-hand node of the failing comparison.
    pub second: usize,
}
