// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Watch/inject engine for progressive webmail enhancement.
//!
//! `veneer_core` augments a server-rendered webmail interface without owning
//! any of its logic: the host keeps mutating the document (lists repopulate,
//! bodies load in the background, themes flip) and the engine reacts,
//! injecting supplementary UI exactly once per qualifying occurrence and
//! removing it when the occurrence stops qualifying. It is `no_std`
//! compatible (with `alloc`) and platform-free: all document access goes
//! through the [`host`] adapter traits.
//!
//! # Architecture
//!
//! The crate is organized around one watch loop plus a few interaction
//! primitives the catalog composes:
//!
//! ```text
//!   Adapter (observer batches, input, timer firings)
//!       │
//!       ▼
//!   Overlay::on_* ──► WatchedInjector ──► scan ──► mark ──► build
//!       │                  ▲                        (tag)   (catalog)
//!       │                  └── dirty channels
//!       ├──► GestureRecognizer ──► SwipeDirection
//!       ├──► TimedAction slots (undo-send, quick-fill, theme-sync)
//!       └──► ToggleGroup (search chips)
//! ```
//!
//! **[`host`]** — Adapter traits ([`HostDocument`](host::HostDocument),
//! [`HostCommands`](host::HostCommands), [`TimerHost`](host::TimerHost)),
//! node handles, anchors, and the declarative [`NodeSpec`](host::NodeSpec)
//! injected markup is built from.
//!
//! **[`watch`]** — The [`WatchedInjector`](watch::WatchedInjector):
//! idempotent mutation-driven scanning, mark-before-build, per-candidate
//! failure isolation, removable-injection teardown.
//!
//! **[`tag`]** — Processed-mark bookkeeping on the nodes themselves.
//!
//! **[`dirty`]** — Mutation channel constants (via `understory_dirty`);
//! batches coalesce into "re-scan this watch", never per-record work.
//!
//! **[`gesture`]** — Pure swipe classification with a vertical-scroll guard.
//!
//! **[`timer`]** — Single-flight [`TimedAction`](timer::TimedAction) slots
//! where cancellation wins any race against firing.
//!
//! **[`toggle`]** — At-most-one-active [`ToggleGroup`](toggle::ToggleGroup).
//!
//! **[`identity`]** — Pure initials/color derivation for avatars.
//!
//! **[`catalog`]** — The enhancement descriptors and markup builders.
//!
//! **[`overlay`]** — The application context: constructed once, explicit
//! [`start`](overlay::Overlay::start)/[`stop`](overlay::Overlay::stop)
//! lifecycle, and the `on_*` entry points adapters feed.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) and the zero-cost-ish
//! [`Tracer`](trace::Tracer) wrapper for watch-loop diagnostics.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod catalog;
pub mod dirty;
pub mod gesture;
pub mod host;
pub mod identity;
pub mod overlay;
pub mod tag;
pub mod timer;
pub mod toggle;
pub mod trace;
pub mod watch;
