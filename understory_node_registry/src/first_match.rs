// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! First-match resolution: run the handler of whichever whitelisted field renders first.
//!
//! ## Overview
//!
//! A form often wants to act on "the first field that currently shows an error" (scroll
//! to it, focus it) without knowing which fields exist or how they are nested.
//! [`FirstMatch`] is the scope that collects candidate fields; each field takes a
//! [`Target`] binding, registers the node it renders, and may provide a handler.
//!
//! On every [`FirstMatch::flush`] with `active` set, the registered fields are
//! intersected with the whitelist in [`FirstMatchOptions::ids`]. If anything is
//! left, exactly one handler runs: the one of the candidate that comes first in document
//! order, called with that candidate's node.
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use understory_node_registry::order::NodeOrder;
//! use understory_node_registry::{FirstMatch, FirstMatchOptions, NamespaceGenerator};
//!
//! let mut namespaces = NamespaceGenerator::default();
//! let form: FirstMatch<u32> = FirstMatch::new(
//!     FirstMatchOptions {
//!         name: "signup".into(),
//!         ids: vec!["email".into(), "password".into()],
//!         ..FirstMatchOptions::default()
//!     },
//!     &mut namespaces,
//! );
//!
//! let hit = Rc::new(RefCell::new(None));
//! let seen = Rc::clone(&hit);
//! let mut email = form.target("email", None);
//! let mut password = form.target("password", Some(Rc::new(move |node: &u32| {
//!     *seen.borrow_mut() = Some(*node);
//! })));
//! assert_eq!(password.marker(), Some("signup.password"));
//!
//! // Handles are positions here; the password field renders first.
//! email.set(Some(20));
//! password.set(Some(10));
//! email.commit();
//! password.commit();
//!
//! let by_position = |a: &u32, b: &u32| NodeOrder::from_ordering(a.cmp(b));
//! let resolved = form.flush(&by_position).unwrap().unwrap();
//! assert_eq!(resolved.field, "password");
//! assert_eq!(*hit.borrow(), Some(10));
//! ```

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use crate::binding::Binding;
use crate::error::UnorderableNodes;
use crate::manager::NodeManager;
use crate::namespace::{Namespace, NamespaceGenerator};
use crate::order::{Comparator, first_in_order};

/// Callback run with the node of the field that matched first.
pub type MatchHandler<H> = Rc<dyn Fn(&H)>;

/// Configuration of a [`FirstMatch`] scope.
#[derive(Clone, Debug)]
pub struct FirstMatchOptions {
    /// Scope name; prefixes each target's [marker](Target::marker).
    pub name: String,
    /// Whether flushes resolve at all.
    pub active: bool,
    /// Field ids eligible for resolution.
    pub ids: Vec<String>,
}

impl Default for FirstMatchOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            active: true,
            ids: Vec::new(),
        }
    }
}

/// The registered node of one field plus the handler to run when it matches.
#[derive(Clone)]
struct TargetEntry<H> {
    node: H,
    handler: MatchHandler<H>,
}

impl<H: PartialEq> PartialEq for TargetEntry<H> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && Rc::ptr_eq(&self.handler, &other.handler)
    }
}

impl<H: core::fmt::Debug> core::fmt::Debug for TargetEntry<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TargetEntry")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

/// Outcome of a flush that ran a handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution<H> {
    /// Field whose handler ran.
    pub field: String,
    /// Node the handler was called with.
    pub node: H,
}

/// Scope that resolves the first whitelisted field in document order.
///
/// See the [module docs](self) for an example.
pub struct FirstMatch<H> {
    options: FirstMatchOptions,
    targets: NodeManager<String, TargetEntry<H>>,
}

impl<H> core::fmt::Debug for FirstMatch<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FirstMatch")
            .field("options", &self.options)
            .field("targets", &self.targets)
            .finish()
    }
}

impl<H: Clone + PartialEq + 'static> FirstMatch<H> {
    /// Create a scope with a freshly generated namespace.
    pub fn new(options: FirstMatchOptions, namespaces: &mut NamespaceGenerator) -> Self {
        Self {
            options,
            targets: NodeManager::new(namespaces),
        }
    }

    /// Current configuration.
    pub fn options(&self) -> &FirstMatchOptions {
        &self.options
    }

    /// Turn resolution on or off for subsequent flushes.
    pub fn set_active(&mut self, active: bool) {
        self.options.active = active;
    }

    /// Replace the whitelist for subsequent flushes.
    pub fn set_ids(&mut self, ids: Vec<String>) {
        self.options.ids = ids;
    }

    /// Scope token of the underlying registry.
    pub fn namespace(&self) -> Namespace {
        self.targets.namespace()
    }

    /// Fields with a registered node, as of the last flush. Unordered.
    pub fn registered_fields(&self) -> Vec<String> {
        self.targets.snapshot().into_keys().collect()
    }

    /// Create the binding for one field.
    ///
    /// Without a handler the field still participates, and matching it does nothing.
    pub fn target(&self, field: impl Into<String>, on_match: Option<MatchHandler<H>>) -> Target<H> {
        let field = field.into();
        let marker = (!self.options.name.is_empty())
            .then(|| format!("{}.{}", self.options.name, field));
        let handler: MatchHandler<H> = match on_match {
            Some(handler) => handler,
            None => Rc::new(|_: &H| {}),
        };
        Target {
            binding: self.targets.bind(field),
            handler,
            marker,
        }
    }

    /// Commit barrier for the pass, followed by resolution.
    ///
    /// Returns `Ok(None)` when inactive or when no whitelisted field has a node.
    /// Otherwise exactly one handler has run when this returns `Ok(Some(..))`.
    /// The handler runs after the registry is released, so it may stage changes
    /// for the next pass.
    pub fn flush<C>(&self, cmp: &C) -> Result<Option<Resolution<H>>, UnorderableNodes>
    where
        C: Comparator<H> + ?Sized,
    {
        self.targets.flush();
        if !self.options.active {
            return Ok(None);
        }

        let registered = self.targets.snapshot();
        let candidates: Vec<(&String, &TargetEntry<H>)> = self
            .options
            .ids
            .iter()
            .filter_map(|id| registered.get_key_value(id))
            .collect();
        let nodes: Vec<H> = candidates.iter().map(|(_, e)| e.node.clone()).collect();

        let first = match first_in_order(&nodes, cmp) {
            Ok(Some(i)) => i,
            Ok(None) => return Ok(None),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(name = %self.options.name, %err, "first match is unorderable");
                return Err(err);
            }
        };
        let (field, entry) = candidates[first];

        #[cfg(feature = "tracing")]
        tracing::debug!(
            name = %self.options.name,
            field = %field,
            candidates = candidates.len(),
            "resolved first match"
        );
        (entry.handler)(&entry.node);
        Ok(Some(Resolution {
            field: field.clone(),
            node: entry.node.clone(),
        }))
    }
}

/// Binding for one field of a [`FirstMatch`] scope.
///
/// Works like [`Binding`]: set the rendered node, commit with the owner, and drop
/// to unregister.
pub struct Target<H> {
    binding: Binding<String, TargetEntry<H>>,
    handler: MatchHandler<H>,
    marker: Option<String>,
}

impl<H: core::fmt::Debug> core::fmt::Debug for Target<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Target")
            .field("binding", &self.binding)
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

impl<H: Clone + PartialEq> Target<H> {
    /// Field id of this target.
    pub fn field(&self) -> &str {
        self.binding.key()
    }

    /// `"{name}.{field}"`, for tagging the rendered node. `None` in an unnamed scope.
    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    /// The node currently in the slot.
    pub fn get(&self) -> Option<&H> {
        self.binding.get().map(|e| &e.node)
    }

    /// Put the rendered node into the slot, or empty it.
    pub fn set(&mut self, node: Option<H>) {
        let handler = &self.handler;
        self.binding.set(node.map(|node| TargetEntry {
            node,
            handler: Rc::clone(handler),
        }));
    }

    /// Commit the owner's pass. See [`Binding::commit`].
    pub fn commit(&mut self) -> bool {
        self.binding.commit()
    }
}
