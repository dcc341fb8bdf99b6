// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The watch/inject engine.
//!
//! One [`WatchedInjector`] drives every DOM-driven enhancement. Each
//! registered [`Enhancement`] names a root [`Anchor`] and a predicate; the
//! engine scans the root's subtree for qualifying nodes and injects each one
//! exactly once. Host mutation batches are coalesced through dirty channels
//! (see [`dirty`](crate::dirty)) and answered with *re-scans*, never with
//! per-record processing — a single host update can add and remove
//! qualifying nodes in ways the raw records do not describe.
//!
//! # Idempotence
//!
//! A qualifying node is marked (see [`tag`](crate::tag)) *before* its
//! enhancement is built. An insertion performed by `build` re-triggers the
//! observer and thus another scan, which then finds the node already marked;
//! marking after building would loop forever. Predicates must be pure so
//! repeated scans are safe.
//!
//! # Ordering and isolation
//!
//! Watches are evaluated in registration order; within one pass, candidates
//! are visited in document order. A `build` failure is traced and the pass
//! continues with the next candidate — one bad enhancement must not stop
//! the others or crash the watch loop.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use understory_dirty::{Channel, CycleHandling, DirtyTracker};

use crate::dirty;
use crate::host::{Anchor, HostDocument, NodeId};
use crate::tag;
use crate::trace::{BuildFailedEvent, InjectEvent, ScanEvent, ScanTrigger, TeardownEvent, Tracer};

/// An enhancement's construction failed.
///
/// Carried back to the engine, traced, and forgotten; never user-visible.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildError {
    reason: String,
}

impl BuildError {
    /// Creates an error with a failure description.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the failure description.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl core::fmt::Display for BuildError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "enhancement build failed: {}", self.reason)
    }
}

impl core::error::Error for BuildError {}

/// One enhancement definition, registered with the engine.
///
/// Implementations must keep `matches` pure and side-effect-free, and must
/// keep `build` local to the passed node and its own injected subtree.
pub trait Enhancement {
    /// Unique descriptor id (also the processed-mark key).
    fn id(&self) -> &'static str;

    /// The anchor whose subtree this enhancement watches.
    fn root(&self) -> Anchor;

    /// Returns whether the node currently qualifies.
    fn matches(&self, dom: &dyn HostDocument, node: NodeId) -> bool;

    /// Builds the enhancement for a qualifying node.
    ///
    /// Returns the injected node, if the enhancement has one (removable
    /// watches need it for teardown; class-only enhancements return
    /// `Ok(None)`).
    fn build(&mut self, dom: &mut dyn HostDocument, node: NodeId)
    -> Result<Option<NodeId>, BuildError>;

    /// Whether the enhancement is torn down when its node stops qualifying.
    fn removable(&self) -> bool {
        false
    }
}

impl core::fmt::Debug for dyn Enhancement + '_ {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Enhancement").field("id", &self.id()).finish()
    }
}

/// A live removable injection, tracked for teardown.
#[derive(Clone, Copy, Debug)]
struct Injection {
    watch: u32,
    target: NodeId,
    injected: Option<NodeId>,
}

/// The mutation-driven injection engine.
#[derive(Debug)]
pub struct WatchedInjector {
    watches: Vec<Box<dyn Enhancement>>,
    dirty: DirtyTracker<u32>,
    active: Vec<Injection>,
}

impl Default for WatchedInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchedInjector {
    /// Creates an engine with no watches.
    #[must_use]
    pub fn new() -> Self {
        Self {
            watches: Vec::new(),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            active: Vec::new(),
        }
    }

    /// Registers an enhancement. Evaluation follows registration order.
    ///
    /// # Panics
    ///
    /// Panics if the descriptor id is already registered — ids key the
    /// processed marks, so a duplicate would corrupt idempotence.
    pub fn register(&mut self, enhancement: Box<dyn Enhancement>) {
        assert!(
            self.watches.iter().all(|w| w.id() != enhancement.id()),
            "duplicate descriptor id"
        );
        self.watches.push(enhancement);
    }

    /// Returns the anchors the engine needs mutation observation on.
    ///
    /// Deduplicated, in registration order; adapters attach one observer
    /// per returned anchor.
    #[must_use]
    pub fn observed_roots(&self) -> Vec<Anchor> {
        let mut roots: Vec<Anchor> = Vec::new();
        for watch in &self.watches {
            if !roots.contains(&watch.root()) {
                roots.push(watch.root());
            }
        }
        roots
    }

    /// Records a host mutation batch under `root` on the given channel.
    ///
    /// Cheap: only marks dirty state. The work happens in [`process`].
    ///
    /// [`process`]: Self::process
    pub fn note_mutation(&mut self, root: Anchor, channel: Channel) {
        for (idx, watch) in self.watches.iter().enumerate() {
            if watch.root() == root {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "watch count is tiny; u32 keys mirror the dirty tracker"
                )]
                self.dirty.mark(idx as u32, channel);
            }
        }
    }

    /// Performs the initial synchronous scan over every watch.
    pub fn scan_all(&mut self, dom: &mut dyn HostDocument, tracer: &mut Tracer<'_>) {
        for idx in 0..self.watches.len() {
            self.scan_watch(idx, dom, tracer, ScanTrigger::Initial);
        }
        // Anything marked while building is already handled; start clean.
        let _ = self.drain_affected();
    }

    /// Re-scans every watch whose channels were marked since the last call.
    ///
    /// Each affected watch is scanned at most once per call, in
    /// registration order.
    pub fn process(&mut self, dom: &mut dyn HostDocument, tracer: &mut Tracer<'_>) {
        for idx in self.drain_affected() {
            self.scan_watch(idx as usize, dom, tracer, ScanTrigger::Mutation);
        }
    }

    /// Tears down every live removable injection (the engine half of the
    /// overlay's stop hook).
    pub fn teardown_all(&mut self, dom: &mut dyn HostDocument, tracer: &mut Tracer<'_>) {
        let active = core::mem::take(&mut self.active);
        for record in active {
            self.teardown(record, dom, tracer);
        }
    }

    /// Drains both mutation channels into a deduplicated, ordered watch set.
    fn drain_affected(&mut self) -> Vec<u32> {
        let mut affected: Vec<u32> = self
            .dirty
            .drain(dirty::CHILD_LIST)
            .affected()
            .deterministic()
            .run()
            .collect();
        affected.extend(
            self.dirty
                .drain(dirty::ATTRIBUTES)
                .affected()
                .deterministic()
                .run(),
        );
        affected.sort_unstable();
        affected.dedup();
        affected
    }

    /// Runs one scan pass for one watch: teardown of stale removable
    /// injections, then mark-and-build for new qualifying candidates.
    fn scan_watch(
        &mut self,
        idx: usize,
        dom: &mut dyn HostDocument,
        tracer: &mut Tracer<'_>,
        trigger: ScanTrigger,
    ) {
        let descriptor = self.watches[idx].id();
        let mut torn_down = 0;

        // Teardown pass: removable injections whose target left the
        // document or stopped qualifying.
        if self.watches[idx].removable() {
            let mut i = 0;
            while i < self.active.len() {
                let record = self.active[i];
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "watch count is tiny; u32 keys mirror the dirty tracker"
                )]
                let is_this_watch = record.watch == idx as u32;
                if is_this_watch
                    && (!dom.is_attached(record.target)
                        || !self.watches[idx].matches(dom, record.target))
                {
                    self.active.swap_remove(i);
                    self.teardown(record, dom, tracer);
                    torn_down += 1;
                } else {
                    i += 1;
                }
            }
        }

        // Candidates: the root anchor plus its subtree, in document order.
        let Some(root) = dom.anchor(self.watches[idx].root()) else {
            // Missing anchor: the enhancement is simply never satisfied.
            tracer.scan(ScanEvent {
                descriptor,
                trigger,
                candidates: 0,
                injected: 0,
                torn_down,
            });
            return;
        };
        let mut candidates = dom.descendants(root);
        candidates.insert(0, root);

        let mut injected = 0;
        for node in &candidates {
            let node = *node;
            if !self.watches[idx].matches(dom, node) || tag::is_marked(dom, node, descriptor) {
                continue;
            }
            // Mark first: the build's own insertions re-trigger observation,
            // and the follow-up scan must find this node already processed.
            tag::mark(dom, node, descriptor);
            match self.watches[idx].build(dom, node) {
                Ok(new_node) => {
                    injected += 1;
                    tracer.injected(InjectEvent {
                        descriptor,
                        target: node,
                    });
                    if self.watches[idx].removable() {
                        #[expect(
                            clippy::cast_possible_truncation,
                            reason = "watch count is tiny; u32 keys mirror the dirty tracker"
                        )]
                        self.active.push(Injection {
                            watch: idx as u32,
                            target: node,
                            injected: new_node,
                        });
                    }
                }
                Err(err) => {
                    tracer.build_failed(BuildFailedEvent {
                        descriptor,
                        target: node,
                        reason: err.reason(),
                    });
                }
            }
        }

        tracer.scan(ScanEvent {
            descriptor,
            trigger,
            candidates: candidates.len(),
            injected,
            torn_down,
        });
    }

    /// Removes one injection's node and clears its target's mark.
    fn teardown(&self, record: Injection, dom: &mut dyn HostDocument, tracer: &mut Tracer<'_>) {
        if let Some(node) = record.injected
            && dom.is_attached(node)
        {
            dom.remove(node);
        }
        let descriptor = self.watches[record.watch as usize].id();
        if dom.is_attached(record.target) {
            tag::unmark(dom, record.target, descriptor);
        }
        tracer.torn_down(TeardownEvent {
            descriptor,
            target: record.target,
        });
    }
}
