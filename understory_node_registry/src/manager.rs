// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The node registry and its stage/flush protocol.
//!
//! ## Phases
//!
//! A [`NodeManager`] separates writes from reads the way a UI framework separates
//! render from commit:
//!
//! 1. **Stage.** During a pass, descendants call [`NodeManager::register`] and
//!    [`NodeManager::unregister`] (usually through a [`Binding`]). Staged calls are
//!    queued and invisible to readers.
//! 2. **Flush.** Once every participant has committed its own structure, the host calls
//!    [`NodeManager::flush`]. Staged calls are applied in order, the last write per key
//!    wins, and the registry epoch advances at most once.
//! 3. **Read.** [`NodeManager::snapshot`], [`NodeManager::ordered_nodes`], and
//!    [`OrderedView`](crate::OrderedView) only ever see flushed state, so a reader never
//!    observes half of a pass.
//!
//! The manager is single-threaded (`Rc` + `RefCell`). Cloning a manager hands out
//! another reference to the same registry, like passing a context value down a tree.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::binding::Binding;
use crate::error::UnorderableNodes;
use crate::namespace::{Namespace, NamespaceGenerator};
use crate::order::{Comparator, sort_nodes};

/// Owned copy of the registry mapping. Changing it never affects the registry.
pub type Snapshot<K, H> = HashMap<K, H>;

/// Keys touched by one [`NodeManager::flush`], grouped by net effect.
///
/// Only net changes are reported: a key registered and unregistered within the same
/// pass shows up nowhere. Order within each list follows the first staged call for
/// that key.
#[derive(Clone, Debug)]
pub struct Commit<K> {
    /// Keys that had no handle before the flush and have one now.
    pub registered: SmallVec<[K; 4]>,
    /// Keys whose handle changed to a different value.
    pub replaced: SmallVec<[K; 4]>,
    /// Keys that had a handle before the flush and have none now.
    pub unregistered: SmallVec<[K; 4]>,
    /// Registry epoch after the flush.
    pub epoch: u64,
}

impl<K> Commit<K> {
    fn new(epoch: u64) -> Self {
        Self {
            registered: SmallVec::new(),
            replaced: SmallVec::new(),
            unregistered: SmallVec::new(),
            epoch,
        }
    }

    /// True if the flush did not change the mapping.
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty() && self.replaced.is_empty() && self.unregistered.is_empty()
    }
}

pub(crate) enum Staged<K, H> {
    Register(K, H),
    Unregister(K),
}

pub(crate) struct State<K, H> {
    namespace: Namespace,
    nodes: HashMap<K, H>,
    pending: Vec<Staged<K, H>>,
    epoch: u64,
}

impl<K, H> State<K, H> {
    pub(crate) fn stage(&mut self, op: Staged<K, H>) {
        self.pending.push(op);
    }
}

/// A registry of rendered nodes for one scope.
///
/// `K` is the registration key and `H` the node handle. Handles are opaque here;
/// only the [`Comparator`] handed to an ordered read looks at them.
///
/// ## Example
///
/// ```rust
/// use understory_node_registry::{NamespaceGenerator, NodeManager};
///
/// let mut namespaces = NamespaceGenerator::default();
/// let nodes: NodeManager<&str, u32> = NodeManager::new(&mut namespaces);
///
/// nodes.register("email", 7);
/// // Staged writes are invisible until the pass is flushed.
/// assert!(nodes.is_empty());
///
/// let commit = nodes.flush();
/// assert_eq!(commit.registered.as_slice(), &["email"]);
/// assert_eq!(nodes.get(&"email"), Some(7));
/// ```
pub struct NodeManager<K, H> {
    state: Rc<RefCell<State<K, H>>>,
}

impl<K, H> Clone for NodeManager<K, H> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<K, H> core::fmt::Debug for NodeManager<K, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("NodeManager")
            .field("namespace", &state.namespace)
            .field("nodes", &state.nodes.len())
            .field("pending", &state.pending.len())
            .field("epoch", &state.epoch)
            .finish()
    }
}

impl<K, H> NodeManager<K, H> {
    /// Create a registry scoped by a freshly generated namespace.
    pub fn new(namespaces: &mut NamespaceGenerator) -> Self {
        Self::with_namespace(namespaces.next())
    }

    /// Create a registry scoped by an explicit namespace.
    pub fn with_namespace(namespace: Namespace) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                namespace,
                nodes: HashMap::new(),
                pending: Vec::new(),
                epoch: 0,
            })),
        }
    }

    /// The scope token of this registry.
    pub fn namespace(&self) -> Namespace {
        self.state.borrow().namespace.clone()
    }

    /// Number of flushes that changed the mapping.
    pub fn epoch(&self) -> u64 {
        self.state.borrow().epoch
    }

    /// True if staged calls are waiting for [`NodeManager::flush`].
    pub fn has_pending(&self) -> bool {
        !self.state.borrow().pending.is_empty()
    }

    /// Number of registered keys as of the last flush.
    pub fn len(&self) -> usize {
        self.state.borrow().nodes.len()
    }

    /// True if no key was registered as of the last flush.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().nodes.is_empty()
    }

    /// Stage `key → handle`, replacing any handle already registered for `key`.
    pub fn register(&self, key: K, handle: H) {
        self.state.borrow_mut().stage(Staged::Register(key, handle));
    }

    /// Stage removal of `key`. Removing an absent key is a no-op.
    pub fn unregister(&self, key: K) {
        self.state.borrow_mut().stage(Staged::Unregister(key));
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<State<K, H>>> {
        Rc::downgrade(&self.state)
    }

    /// True if `registry` was downgraded from this manager or one of its clones.
    pub(crate) fn is_registry(&self, registry: &Weak<RefCell<State<K, H>>>) -> bool {
        core::ptr::eq(registry.as_ptr(), Rc::as_ptr(&self.state))
    }
}

impl<K, H> NodeManager<K, H>
where
    K: Eq + Hash + Clone,
    H: Clone + PartialEq,
{
    /// Apply every staged call, in order, and report the net change.
    ///
    /// This is the commit barrier: call it once all participants of a pass have
    /// committed. The epoch advances only if the mapping changed.
    pub fn flush(&self) -> Commit<K> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let pending = core::mem::take(&mut state.pending);

        // Value of each touched key before the first staged call that touched it.
        let mut before: HashMap<K, Option<H>> = HashMap::new();
        let mut touched: Vec<K> = Vec::new();
        for op in pending {
            let key = match &op {
                Staged::Register(key, _) | Staged::Unregister(key) => key,
            };
            if !before.contains_key(key) {
                before.insert(key.clone(), state.nodes.get(key).cloned());
                touched.push(key.clone());
            }
            match op {
                Staged::Register(key, handle) => {
                    state.nodes.insert(key, handle);
                }
                Staged::Unregister(key) => {
                    state.nodes.remove(&key);
                }
            }
        }

        let mut commit = Commit::new(state.epoch);
        for key in touched {
            let old = before.remove(&key).flatten();
            match (old, state.nodes.get(&key)) {
                (None, Some(_)) => commit.registered.push(key),
                (Some(_), None) => commit.unregistered.push(key),
                (Some(old), Some(new)) if old != *new => commit.replaced.push(key),
                _ => {}
            }
        }
        if !commit.is_empty() {
            state.epoch += 1;
            commit.epoch = state.epoch;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            namespace = %state.namespace,
            epoch = state.epoch,
            registered = commit.registered.len(),
            replaced = commit.replaced.len(),
            unregistered = commit.unregistered.len(),
            "flushed node registry"
        );
        commit
    }

    /// Handle registered for `key` as of the last flush.
    pub fn get(&self, key: &K) -> Option<H> {
        self.state.borrow().nodes.get(key).cloned()
    }

    /// True if `key` was registered as of the last flush.
    pub fn contains_key(&self, key: &K) -> bool {
        self.state.borrow().nodes.contains_key(key)
    }

    /// Copy of the mapping as of the last flush.
    pub fn snapshot(&self) -> Snapshot<K, H> {
        self.state.borrow().nodes.clone()
    }

    /// Registered handles sorted by `cmp`, as of the last flush.
    ///
    /// Keys are ignored. Fails if `cmp` finds two handles unorderable.
    pub fn ordered_nodes<C>(&self, cmp: &C) -> Result<Vec<H>, UnorderableNodes>
    where
        C: Comparator<H> + ?Sized,
    {
        let handles: Vec<H> = self.state.borrow().nodes.values().cloned().collect();
        let sorted = sort_nodes(&handles, cmp);
        #[cfg(feature = "tracing")]
        if let Err(err) = &sorted {
            tracing::warn!(namespace = %self.namespace(), %err, "ordered read failed");
        }
        sorted
    }

    /// Create a registration binding for `key`.
    ///
    /// See [`Binding`] for the lifecycle it follows.
    pub fn bind(&self, key: K) -> Binding<K, H> {
        Binding::new(self, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::NodeOrder;
    use alloc::vec;

    fn manager() -> NodeManager<&'static str, u32> {
        NodeManager::with_namespace(Namespace::from("test"))
    }

    #[test]
    fn staged_writes_are_invisible_until_flush() {
        let nodes = manager();
        nodes.register("a", 1);
        assert!(nodes.has_pending());
        assert!(nodes.is_empty());
        assert_eq!(nodes.epoch(), 0);

        let commit = nodes.flush();
        assert!(!nodes.has_pending());
        assert_eq!(commit.registered.as_slice(), &["a"]);
        assert_eq!(commit.epoch, 1);
        assert_eq!(nodes.get(&"a"), Some(1));
    }

    #[test]
    fn last_write_per_key_wins() {
        let nodes = manager();
        nodes.register("a", 1);
        nodes.register("b", 2);
        nodes.register("a", 3);
        nodes.unregister("b");
        nodes.register("c", 4);
        nodes.unregister("c");
        nodes.register("c", 5);
        let commit = nodes.flush();

        let expected: Snapshot<&str, u32> = [("a", 3), ("c", 5)].into_iter().collect();
        assert_eq!(nodes.snapshot(), expected);
        assert_eq!(commit.registered.as_slice(), &["a", "c"]);
        assert!(commit.unregistered.is_empty(), "b never became visible");
        // One batch, one epoch step.
        assert_eq!(nodes.epoch(), 1);
    }

    #[test]
    fn register_overwrites_and_reports_replacement() {
        let nodes = manager();
        nodes.register("a", 1);
        nodes.flush();
        nodes.register("a", 2);
        let commit = nodes.flush();
        assert_eq!(commit.replaced.as_slice(), &["a"]);
        assert_eq!(nodes.get(&"a"), Some(2));
    }

    #[test]
    fn unregister_is_idempotent() {
        let nodes = manager();
        nodes.register("a", 1);
        nodes.register("b", 2);
        nodes.flush();

        nodes.unregister("a");
        nodes.unregister("a");
        let commit = nodes.flush();
        assert_eq!(commit.unregistered.as_slice(), &["a"]);
        let once = nodes.snapshot();

        nodes.unregister("a");
        let commit = nodes.flush();
        assert!(commit.is_empty());
        assert_eq!(nodes.snapshot(), once);
        assert_eq!(nodes.epoch(), 2);
    }

    #[test]
    fn unchanged_flush_keeps_epoch() {
        let nodes = manager();
        nodes.register("a", 1);
        nodes.flush();
        // Re-registering the same handle is not a change.
        nodes.register("a", 1);
        assert!(nodes.flush().is_empty());
        // Neither is an empty pass.
        assert!(nodes.flush().is_empty());
        assert_eq!(nodes.epoch(), 1);
    }

    #[test]
    fn snapshot_is_detached() {
        let nodes = manager();
        nodes.register("a", 1);
        nodes.flush();
        let mut snap = nodes.snapshot();
        snap.insert("b", 2);
        snap.remove(&"a");
        assert_eq!(nodes.get(&"a"), Some(1));
        assert!(!nodes.contains_key(&"b"));
    }

    #[test]
    fn clones_share_one_registry() {
        let nodes = manager();
        let handed_down = nodes.clone();
        handed_down.register("a", 1);
        nodes.flush();
        assert_eq!(handed_down.get(&"a"), Some(1));
        assert_eq!(handed_down.namespace(), nodes.namespace());
    }

    #[test]
    fn ordered_nodes_uses_supplied_comparator() {
        let nodes = manager();
        nodes.register("three", 3);
        nodes.register("one", 1);
        nodes.register("two", 2);
        nodes.flush();

        let ascending = |a: &u32, b: &u32| NodeOrder::from_ordering(a.cmp(b));
        assert_eq!(nodes.ordered_nodes(&ascending), Ok(vec![1, 2, 3]));
        let descending = |a: &u32, b: &u32| NodeOrder::from_ordering(b.cmp(a));
        assert_eq!(nodes.ordered_nodes(&descending), Ok(vec![3, 2, 1]));
    }

    #[test]
    fn ordered_nodes_ignores_pending_writes() {
        let nodes = manager();
        nodes.register("one", 1);
        nodes.flush();
        nodes.register("two", 2);
        let ascending = |a: &u32, b: &u32| NodeOrder::from_ordering(a.cmp(b));
        assert_eq!(nodes.ordered_nodes(&ascending), Ok(vec![1]));
    }

    #[test]
    fn generated_namespaces_differ() {
        let mut namespaces = NamespaceGenerator::default();
        let a: NodeManager<u8, u8> = NodeManager::new(&mut namespaces);
        let b: NodeManager<u8, u8> = NodeManager::new(&mut namespaces);
        assert_ne!(a.namespace(), b.namespace());
    }
}
