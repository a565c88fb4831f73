// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapters to integrate with other Understory crates.
//!
//! Each adapter is gated behind a feature flag so the registry core stays free of
//! any particular tree implementation.
//!
//! ## Available Adapters
//!
//! - [`document_tree`] (`document_tree_adapter` feature, on by default): the default
//!   document-order comparator for [`understory_document_tree`] nodes.

#[cfg(feature = "document_tree_adapter")]
pub mod document_tree;
