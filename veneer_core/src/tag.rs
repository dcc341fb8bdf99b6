// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Processed-mark bookkeeping (the element tagger).
//!
//! A mark records that a specific watch already processed a node, so
//! repeated scans over the same subtree are idempotent. The mark is stored
//! as a `data-veneer-<id>` attribute on the node itself: it travels with the
//! node, is garbage-collected with it, and its absence is the *only*
//! re-processing trigger. Setting the attribute is the mark's one side
//! effect.
//!
//! Used exclusively by [`WatchedInjector`](crate::watch::WatchedInjector);
//! enhancements never need it directly.

use alloc::format;
use alloc::string::String;

use crate::host::{HostDocument, NodeId};

/// Returns the attribute name carrying the mark for a watch id.
#[must_use]
pub fn mark_attr(descriptor: &str) -> String {
    format!("data-veneer-{descriptor}")
}

/// Marks a node as processed by the given watch.
pub fn mark(dom: &mut dyn HostDocument, node: NodeId, descriptor: &str) {
    dom.set_attr(node, &mark_attr(descriptor), "1");
}

/// Returns whether a node already carries the given watch's mark.
#[must_use]
pub fn is_marked(dom: &dyn HostDocument, node: NodeId, descriptor: &str) -> bool {
    dom.attr(node, &mark_attr(descriptor)).is_some()
}

/// Clears the given watch's mark, making the node eligible again.
pub fn unmark(dom: &mut dyn HostDocument, node: NodeId, descriptor: &str) {
    dom.remove_attr(node, &mark_attr(descriptor));
}
