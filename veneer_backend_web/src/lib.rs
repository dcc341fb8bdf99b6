// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web adapter for veneer.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WebHost`]: the engine's adapter traits over the live DOM
//! - [`WebOverlay`]: wiring — `MutationObserver`s, input listeners, timers
//! - [`ConsoleSink`]: a [`TraceSink`] that logs engine events to the console
//!
//! The typical entry point is [`WebOverlay::attach`], which builds the
//! overlay, runs the initial scan, and connects observers and listeners in
//! one call.
//!
//! [`TraceSink`]: veneer_core::trace::TraceSink

#![no_std]

extern crate alloc;

mod document;
mod observer;
mod timers;

pub use document::WebHost;
pub use observer::WebOverlay;
pub use veneer_core::overlay::{Overlay, OverlayConfig};

use alloc::format;

use veneer_core::trace::{BuildFailedEvent, ScanEvent, TimerEvent, TraceSink};

/// Logs engine events to the browser console.
///
/// Scans are logged only when they did something; a busy mailbox produces a
/// steady stream of empty re-scans that would drown everything else out.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl TraceSink for ConsoleSink {
    fn scan(&mut self, event: ScanEvent) {
        if event.injected > 0 || event.torn_down > 0 {
            web_sys::console::debug_1(
                &format!(
                    "veneer: scan {} ({:?}): {} candidates, +{} -{}",
                    event.descriptor,
                    event.trigger,
                    event.candidates,
                    event.injected,
                    event.torn_down,
                )
                .into(),
            );
        }
    }

    fn build_failed(&mut self, event: BuildFailedEvent<'_>) {
        web_sys::console::warn_1(
            &format!(
                "veneer: {} build failed on {:?}: {}",
                event.descriptor, event.target, event.reason,
            )
            .into(),
        );
    }

    fn timer_stale(&mut self, event: TimerEvent) {
        web_sys::console::debug_1(
            &format!("veneer: stale timer {:?} ({})", event.id, event.slot).into(),
        );
    }
}
