// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registration bindings: a per-consumer handle slot tied to a registry key.

use alloc::rc::Weak;
use core::cell::RefCell;

use crate::manager::{NodeManager, Staged, State};

/// A handle slot that keeps one registry key in sync with its owner.
///
/// The owner writes the node it currently renders into the slot with
/// [`Binding::set`] and calls [`Binding::commit`] when its own pass commits:
///
/// - a handle that differs from the last committed one stages `register(key, handle)`,
///   so each distinct handle is registered exactly once;
/// - an empty slot stages `unregister(key)` once, which covers a node that is
///   conditionally removed while its owner stays mounted;
/// - dropping the binding always stages `unregister(key)`, whatever happened before.
///
/// The binding holds the registry weakly. Once the registry itself is gone,
/// every operation is a no-op.
///
/// ```rust
/// use understory_node_registry::{Namespace, NodeManager};
///
/// let nodes: NodeManager<&str, u32> = NodeManager::with_namespace(Namespace::from("form"));
/// let mut slot = nodes.bind("conditional");
///
/// slot.set(Some(3));
/// slot.commit();
/// nodes.flush();
/// assert_eq!(nodes.get(&"conditional"), Some(3));
///
/// // The owner stops rendering the node but stays mounted.
/// slot.set(None);
/// slot.commit();
/// nodes.flush();
/// assert!(!nodes.contains_key(&"conditional"));
/// ```
pub struct Binding<K, H> {
    registry: Weak<RefCell<State<K, H>>>,
    /// Always `Some` until the binding is dropped.
    key: Option<K>,
    slot: Option<H>,
    /// Slot value at the last commit; `None` before the first commit.
    committed: Option<Option<H>>,
}

impl<K: core::fmt::Debug, H: core::fmt::Debug> core::fmt::Debug for Binding<K, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("slot", &self.slot)
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}

impl<K, H> Binding<K, H> {
    pub(crate) fn new(manager: &NodeManager<K, H>, key: K) -> Self {
        Self {
            registry: manager.downgrade(),
            key: Some(key),
            slot: None,
            committed: None,
        }
    }

    /// The registry key this binding writes.
    pub fn key(&self) -> &K {
        self.key.as_ref().expect("key is only taken on drop")
    }

    /// The handle currently in the slot (committed or not).
    pub fn get(&self) -> Option<&H> {
        self.slot.as_ref()
    }

    /// Put a handle into the slot, or empty it. Takes effect at the next [`Binding::commit`].
    pub fn set(&mut self, handle: Option<H>) {
        self.slot = handle;
    }

    /// Empty the slot. Same as `set(None)`.
    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Stage `op`. Returns false once the registry is gone.
    fn stage(&self, op: Staged<K, H>) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        registry.borrow_mut().stage(op);
        true
    }
}

impl<K: Clone, H: Clone + PartialEq> Binding<K, H> {
    /// Commit the owner's pass: stage whatever the slot change requires.
    ///
    /// Returns true if a registry call was staged. Committing an unchanged slot
    /// stages nothing, and neither does any commit after the registry was dropped.
    pub fn commit(&mut self) -> bool {
        if self.committed.as_ref() == Some(&self.slot) {
            return false;
        }
        let key = self.key().clone();
        let staged = match &self.slot {
            Some(handle) => self.stage(Staged::Register(key, handle.clone())),
            None => self.stage(Staged::Unregister(key)),
        };
        self.committed = Some(self.slot.clone());
        staged
    }
}

impl<K, H> Drop for Binding<K, H> {
    fn drop(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            registry_alive = self.registry.strong_count() > 0,
            "binding dropped; unregistering"
        );
        if let Some(key) = self.key.take() {
            self.stage(Staged::Unregister(key));
        }
    }
}
