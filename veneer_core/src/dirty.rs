// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutation-channel constants.
//!
//! The injector coalesces host mutation batches through multi-channel dirty
//! tracking (via [`understory_dirty`]), keyed by watch registration index.
//! A mutation batch never maps 1:1 onto work: the host may rewrite a whole
//! list section at once, adding and removing qualifying nodes in the same
//! batch. Marking a channel therefore means "this watch's subtree must be
//! re-scanned", not "process exactly these records".
//!
//! # Channels
//!
//! - [`CHILD_LIST`] — nodes were added to or removed from the watched
//!   subtree.
//! - [`ATTRIBUTES`] — attributes (including classes) changed somewhere in
//!   the watched subtree. Hover changes are routed through this channel too,
//!   since a hover transition changes which rows qualify for removable
//!   watches exactly the way an attribute flip does.
//!
//! # Consumption
//!
//! Adapters mark channels via
//! [`WatchedInjector::note_mutation`](crate::watch::WatchedInjector::note_mutation);
//! each [`process`](crate::watch::WatchedInjector::process) call drains both
//! channels and re-scans every affected watch once.

use understory_dirty::Channel;

/// Child nodes were added or removed under a watched root.
pub const CHILD_LIST: Channel = Channel::new(0);

/// Attributes changed under a watched root (hover transitions included).
pub const ATTRIBUTES: Channel = Channel::new(1);
