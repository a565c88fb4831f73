// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordering: the comparator contract and the sorting built on it.
//!
//! ## Overview
//!
//! A [`Comparator`] answers how two handles relate in document order with a
//! [`NodeOrder`]. Unlike [`core::cmp::Ordering`] it has a fourth answer,
//! [`NodeOrder::Unorderable`], for pairs that have no defined relationship
//! (disjoint trees, detached nodes).
//!
//! [`sort_nodes`] and [`first_in_order`] treat that answer as a failure and
//! return [`UnorderableNodes`] instead of guessing an order.
//!
//! ## Custom orders
//!
//! Any `Fn(&H, &H) -> NodeOrder` is a comparator, so custom orders plug in
//! without a wrapper type:
//!
//! ```rust
//! use understory_node_registry::order::{NodeOrder, sort_nodes};
//!
//! let by_len = |a: &&str, b: &&str| NodeOrder::from_ordering(a.len().cmp(&b.len()));
//! let sorted = sort_nodes(&["ccc", "a", "bb"], &by_len).unwrap();
//! assert_eq!(sorted, ["a", "bb", "ccc"]);
//! ```

use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::error::UnorderableNodes;

/// Relative document order of two handles, `a` compared to `b`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeOrder {
    /// `a` comes first: it precedes `b` or contains it.
    Before,
    /// `b` comes first.
    After,
    /// Same node.
    Equal,
    /// No defined relationship; sorting must fail.
    Unorderable,
}

impl NodeOrder {
    /// Lift a total order into a node order.
    pub fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Self::Before,
            Ordering::Greater => Self::After,
            Ordering::Equal => Self::Equal,
        }
    }

    /// Swap `Before` and `After`.
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            Self::Before => Self::After,
            Self::After => Self::Before,
            other => other,
        }
    }
}

/// Compares two handles by document order.
///
/// Implementations should be consistent (`compare(a, b)` is the
/// [reverse](NodeOrder::reverse) of `compare(b, a)`), but the sorting helpers in
/// this module never panic when they are not.
pub trait Comparator<H: ?Sized> {
    /// Compare `a` to `b`.
    fn compare(&self, a: &H, b: &H) -> NodeOrder;
}

impl<H: ?Sized, F> Comparator<H> for F
where
    F: Fn(&H, &H) -> NodeOrder,
{
    fn compare(&self, a: &H, b: &H) -> NodeOrder {
        self(a, b)
    }
}

/// Stable sort of `nodes` by `cmp`, returned as a new sequence.
///
/// `Equal` pairs keep their input order. The first `Unorderable` answer aborts
/// the sort; the error names the input positions of the pair.
pub fn sort_nodes<H, C>(nodes: &[H], cmp: &C) -> Result<Vec<H>, UnorderableNodes>
where
    H: Clone,
    C: Comparator<H> + ?Sized,
{
    // Sort positions rather than handles so failures can report input indices.
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    let mut scratch = order.clone();
    let mut width = 1;
    while width < order.len() {
        let mut start = 0;
        while start < order.len() {
            let mid = (start + width).min(order.len());
            let end = (start + 2 * width).min(order.len());
            merge(
                &order[start..mid],
                &order[mid..end],
                &mut scratch[start..end],
                |i, j| cmp.compare(&nodes[i], &nodes[j]),
            )?;
            start = end;
        }
        core::mem::swap(&mut order, &mut scratch);
        width *= 2;
    }
    Ok(order.into_iter().map(|i| nodes[i].clone()).collect())
}

fn merge(
    left: &[usize],
    right: &[usize],
    out: &mut [usize],
    cmp: impl Fn(usize, usize) -> NodeOrder,
) -> Result<(), UnorderableNodes> {
    let (mut i, mut j, mut k) = (0, 0, 0);
    while i < left.len() && j < right.len() {
        match cmp(left[i], right[j]) {
            NodeOrder::Before | NodeOrder::Equal => {
                out[k] = left[i];
                i += 1;
            }
            NodeOrder::After => {
                out[k] = right[j];
                j += 1;
            }
            NodeOrder::Unorderable => {
                return Err(UnorderableNodes {
                    first: left[i],
                    second: right[j],
                });
            }
        }
        k += 1;
    }
    let rest = &left[i..];
    out[k..k + rest.len()].copy_from_slice(rest);
    out[k + rest.len()..].copy_from_slice(&right[j..]);
    Ok(())
}

/// Position of the first node of `nodes` in `cmp` order, or `None` when empty.
///
/// Equivalent to taking the head of [`sort_nodes`] without sorting. On `Equal`
/// the earlier input wins.
pub fn first_in_order<H, C>(nodes: &[H], cmp: &C) -> Result<Option<usize>, UnorderableNodes>
where
    C: Comparator<H> + ?Sized,
{
    let mut best: Option<usize> = None;
    for (i, node) in nodes.iter().enumerate() {
        let Some(b) = best else {
            best = Some(i);
            continue;
        };
        match cmp.compare(&nodes[b], node) {
            NodeOrder::Before | NodeOrder::Equal => {}
            NodeOrder::After => best = Some(i),
            NodeOrder::Unorderable => {
                return Err(UnorderableNodes {
                    first: b,
                    second: i,
                });
            }
        }
    }
    Ok(best)
}
