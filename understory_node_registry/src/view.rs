// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cached ordered view over a registry.

use alloc::rc::Weak;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::hash::Hash;

use crate::error::UnorderableNodes;
use crate::manager::{NodeManager, State};
use crate::order::Comparator;

/// A reader's cached, document-ordered copy of a registry's handles.
///
/// The cache is keyed by registry identity and epoch. [`OrderedView::refresh`]
/// sorts again only when that key changed, which happens at most once per flushed pass
/// and whenever the view is pointed at a different registry. Identity is the registry
/// instance itself, so two registries that share a namespace never share results.
///
/// The view does not notice structural moves that happen without a registry change.
/// Call [`OrderedView::invalidate`] after such moves, or after switching to a
/// comparator whose inputs changed.
///
/// ```rust
/// use understory_node_registry::order::NodeOrder;
/// use understory_node_registry::{Namespace, NodeManager, OrderedView};
///
/// let nodes: NodeManager<&str, u32> = NodeManager::with_namespace(Namespace::from("list"));
/// nodes.register("c", 30);
/// nodes.register("a", 10);
/// nodes.flush();
///
/// let by_value = |a: &u32, b: &u32| NodeOrder::from_ordering(a.cmp(b));
/// let mut view = OrderedView::new();
/// assert_eq!(view.refresh(&nodes, &by_value).unwrap(), &[10, 30]);
/// ```
pub struct OrderedView<K, H> {
    nodes: Vec<H>,
    /// Registry and epoch of the last successful sort. The weak reference pins the
    /// allocation, so a dropped registry's address is never mistaken for a new one.
    computed_for: Option<(Weak<RefCell<State<K, H>>>, u64)>,
}

impl<K, H: Clone> Clone for OrderedView<K, H> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            computed_for: self.computed_for.clone(),
        }
    }
}

impl<K, H: core::fmt::Debug> core::fmt::Debug for OrderedView<K, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrderedView")
            .field("nodes", &self.nodes)
            .field("epoch", &self.computed_for.as_ref().map(|(_, epoch)| *epoch))
            .finish_non_exhaustive()
    }
}

impl<K, H> Default for OrderedView<K, H> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            computed_for: None,
        }
    }
}

impl<K, H> OrderedView<K, H> {
    /// Create an empty view; the first refresh always sorts.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last successfully computed sequence.
    pub fn nodes(&self) -> &[H] {
        &self.nodes
    }

    /// Force the next refresh to sort again.
    pub fn invalidate(&mut self) {
        self.computed_for = None;
    }

    /// True if the next refresh against `manager` would sort again.
    pub fn is_stale_for(&self, manager: &NodeManager<K, H>) -> bool {
        match &self.computed_for {
            Some((registry, epoch)) => *epoch != manager.epoch() || !manager.is_registry(registry),
            None => true,
        }
    }
}

impl<K, H> OrderedView<K, H>
where
    K: Eq + Hash + Clone,
    H: Clone + PartialEq,
{
    /// Bring the view up to date with `manager`'s flushed state, sorting with `cmp`.
    ///
    /// On failure the previous sequence is kept and the view stays stale, so the next
    /// refresh retries.
    pub fn refresh<C>(
        &mut self,
        manager: &NodeManager<K, H>,
        cmp: &C,
    ) -> Result<&[H], UnorderableNodes>
    where
        C: Comparator<H> + ?Sized,
    {
        if self.is_stale_for(manager) {
            // Read the key first: the sort sees the state of that same epoch.
            let key = (manager.downgrade(), manager.epoch());
            self.nodes = manager.ordered_nodes(cmp)?;
            self.computed_for = Some(key);
        }
        Ok(&self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::{Namespace, NamespaceGenerator};
    use crate::order::NodeOrder;
    use core::cell::Cell;

    fn ascending(a: &u32, b: &u32) -> NodeOrder {
        NodeOrder::from_ordering(a.cmp(b))
    }

    #[test]
    fn sorts_once_per_flushed_change() {
        let nodes: NodeManager<&str, u32> = NodeManager::with_namespace(Namespace::from("a"));
        nodes.register("three", 3);
        nodes.register("one", 1);
        nodes.flush();

        let calls = Cell::new(0);
        let counting = |a: &u32, b: &u32| {
            calls.set(calls.get() + 1);
            ascending(a, b)
        };
        let mut view = OrderedView::new();
        assert_eq!(view.refresh(&nodes, &counting).unwrap(), &[1, 3]);
        let after_first = calls.get();
        assert!(after_first > 0);

        // Nothing flushed: cached.
        view.refresh(&nodes, &counting).unwrap();
        assert_eq!(calls.get(), after_first);

        // Staged but unflushed writes do not invalidate.
        nodes.register("two", 2);
        assert!(!view.is_stale_for(&nodes));
        nodes.flush();
        assert!(view.is_stale_for(&nodes));
        assert_eq!(view.refresh(&nodes, &counting).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn different_registry_is_never_reused() {
        let left: NodeManager<&str, u32> = NodeManager::with_namespace(Namespace::from("left"));
        let right: NodeManager<&str, u32> = NodeManager::with_namespace(Namespace::from("right"));
        left.register("x", 1);
        right.register("y", 2);
        left.flush();
        right.flush();
        // Same epoch in both registries.
        assert_eq!(left.epoch(), right.epoch());

        let mut view = OrderedView::new();
        assert_eq!(view.refresh(&left, &ascending).unwrap(), &[1]);
        assert_eq!(view.refresh(&right, &ascending).unwrap(), &[2]);
    }

    #[test]
    fn registries_sharing_a_namespace_stay_apart() {
        // Fresh generators all start from the same token.
        let left: NodeManager<&str, u32> = NodeManager::new(&mut NamespaceGenerator::default());
        let right: NodeManager<&str, u32> = NodeManager::new(&mut NamespaceGenerator::default());
        assert_eq!(left.namespace(), right.namespace());
        left.register("x", 1);
        right.register("y", 2);
        left.flush();
        right.flush();
        assert_eq!(left.epoch(), right.epoch());

        let mut view = OrderedView::new();
        assert_eq!(view.refresh(&left, &ascending).unwrap(), &[1]);
        assert!(view.is_stale_for(&right));
        assert_eq!(view.refresh(&right, &ascending).unwrap(), &[2]);

        // Clones are the same registry and reuse the cached sequence.
        assert!(!view.is_stale_for(&right.clone()));
        assert!(view.is_stale_for(&left));
    }

    #[test]
    fn failed_refresh_keeps_previous_nodes() {
        let nodes: NodeManager<&str, u32> = NodeManager::with_namespace(Namespace::from("a"));
        nodes.register("one", 1);
        nodes.register("two", 2);
        nodes.flush();

        let mut view = OrderedView::new();
        view.refresh(&nodes, &ascending).unwrap();

        nodes.register("three", 3);
        nodes.flush();
        let never = |_: &u32, _: &u32| NodeOrder::Unorderable;
        assert!(view.refresh(&nodes, &never).is_err());
        assert_eq!(view.nodes(), &[1, 2]);
        assert!(view.is_stale_for(&nodes));

        // Explicit invalidation re-sorts even without a registry change.
        view.refresh(&nodes, &ascending).unwrap();
        view.invalidate();
        let descending = |a: &u32, b: &u32| ascending(a, b).reverse();
        assert_eq!(view.refresh(&nodes, &descending).unwrap(), &[3, 2, 1]);
    }
}
