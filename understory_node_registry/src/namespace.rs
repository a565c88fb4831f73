// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Namespace tokens that tell registry scopes apart.
//!
//! Every [`NodeManager`](crate::NodeManager) is scoped by a [`Namespace`]. Readers such as
//! [`OrderedView`](crate::OrderedView) key their caches by it, so a reader that moves from
//! one scope to another never reuses results computed for the first.
//!
//! Tokens come from an explicit [`NamespaceGenerator`] owned by the host. There is no
//! process-wide counter; two hosts that need distinct tokens share a generator or use
//! different seeds.

use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;

/// Scope token for a registry instance.
///
/// Cloning is cheap (reference counted).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(Rc<str>);

impl Namespace {
    /// Create an explicit namespace from arbitrary text.
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self(Rc::from(name))
    }

    /// The token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Namespace {
    fn from(name: &str) -> Self {
        Self(Rc::from(name))
    }
}

impl From<String> for Namespace {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Generated tokens are 8 base-32 digits, i.e. 40 bits.
const TOKEN_DIGITS: usize = 8;
const TOKEN_MASK: u64 = (1 << (5 * TOKEN_DIGITS)) - 1;
const ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Source of unique [`Namespace`] tokens.
///
/// Tokens look random but are derived from a counter through a bijection on 40 bits,
/// so one generator never hands out the same token twice within 2^40 calls.
///
/// ```rust
/// use understory_node_registry::NamespaceGenerator;
///
/// let mut namespaces = NamespaceGenerator::with_seed(7);
/// let a = namespaces.next();
/// let b = namespaces.next();
/// assert_ne!(a, b);
/// assert_eq!(a.as_str().len(), 8);
/// ```
#[derive(Clone, Debug, Default)]
pub struct NamespaceGenerator {
    counter: u64,
}

impl NamespaceGenerator {
    /// Create a generator whose sequence starts at `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            counter: seed & TOKEN_MASK,
        }
    }

    /// Produce the next token.
    #[allow(
        clippy::should_implement_trait,
        reason = "the generator never ends, so `Iterator` would only add an `Option` to unwrap."
    )]
    pub fn next(&mut self) -> Namespace {
        let value = scramble(self.counter);
        self.counter = (self.counter + 1) & TOKEN_MASK;

        let mut token = String::with_capacity(TOKEN_DIGITS);
        for digit in (0..TOKEN_DIGITS).rev() {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "masked to five bits."
            )]
            let bits = ((value >> (5 * digit)) & 0b1_1111) as usize;
            token.push(char::from(ALPHABET[bits]));
        }
        Namespace::new(token)
    }
}

/// Invertible mix of the low 40 bits: odd multiplications and xor-shifts, all mod 2^40.
fn scramble(mut x: u64) -> u64 {
    x = x.wrapping_mul(0x9E37_79B9_7F4A_7C15) & TOKEN_MASK;
    x ^= x >> 20;
    x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9) & TOKEN_MASK;
    x ^= x >> 17;
    x
}
