// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the watch loop.
//!
//! [`TraceSink`] has one method per engine event, each defaulting to a
//! no-op, so a sink implements only the events it cares about. [`Tracer`]
//! wraps an optional `&mut dyn TraceSink`: one `Option` branch per call when
//! a sink is installed, nothing otherwise.
//!
//! Build failures are reported here as well — a bad enhancement is logged
//! and skipped, never allowed to abort the scan (there is no user-visible
//! error surface for this layer).

use crate::gesture::SwipeDirection;
use crate::host::{Command, NodeId, TimerId};

/// What caused a watch scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScanTrigger {
    /// The initial synchronous scan at startup.
    Initial,
    /// A host mutation batch.
    Mutation,
}

/// Emitted after one watch finished one scan pass.
#[derive(Clone, Copy, Debug)]
pub struct ScanEvent {
    /// The watch's descriptor id.
    pub descriptor: &'static str,
    /// What caused the scan.
    pub trigger: ScanTrigger,
    /// Candidates examined.
    pub candidates: usize,
    /// Enhancements injected during this pass.
    pub injected: usize,
    /// Removable enhancements torn down during this pass.
    pub torn_down: usize,
}

/// Emitted when an enhancement is injected for a qualifying node.
#[derive(Clone, Copy, Debug)]
pub struct InjectEvent {
    /// The watch's descriptor id.
    pub descriptor: &'static str,
    /// The qualifying node.
    pub target: NodeId,
}

/// Emitted when a removable enhancement is torn down.
#[derive(Clone, Copy, Debug)]
pub struct TeardownEvent {
    /// The watch's descriptor id.
    pub descriptor: &'static str,
    /// The node that stopped qualifying (or left the document).
    pub target: NodeId,
}

/// Emitted when an enhancement's `build` fails.
#[derive(Clone, Copy, Debug)]
pub struct BuildFailedEvent<'a> {
    /// The watch's descriptor id.
    pub descriptor: &'static str,
    /// The node being enhanced.
    pub target: NodeId,
    /// Failure description.
    pub reason: &'a str,
}

/// Emitted on timed-action slot state changes.
#[derive(Clone, Copy, Debug)]
pub struct TimerEvent {
    /// The slot name ("undo-send", "quick-fill", "theme-sync").
    pub slot: &'static str,
    /// The platform timer involved.
    pub id: TimerId,
}

/// Emitted when a touch pair is classified.
#[derive(Clone, Copy, Debug)]
pub struct GestureEvent {
    /// The classification outcome.
    pub direction: SwipeDirection,
}

/// Emitted when the overlay dispatches a host command.
#[derive(Clone, Copy, Debug)]
pub struct CommandEvent {
    /// The dispatched command.
    pub command: Command,
}

/// Receives engine events. All methods default to no-ops.
pub trait TraceSink {
    /// A watch finished a scan pass.
    fn scan(&mut self, event: ScanEvent) {
        let _ = event;
    }

    /// An enhancement was injected.
    fn injected(&mut self, event: InjectEvent) {
        let _ = event;
    }

    /// A removable enhancement was torn down.
    fn torn_down(&mut self, event: TeardownEvent) {
        let _ = event;
    }

    /// An enhancement's build failed and was skipped.
    fn build_failed(&mut self, event: BuildFailedEvent<'_>) {
        let _ = event;
    }

    /// A timed-action slot scheduled a timer.
    fn timer_scheduled(&mut self, event: TimerEvent) {
        let _ = event;
    }

    /// A timed-action slot was cancelled.
    fn timer_cancelled(&mut self, event: TimerEvent) {
        let _ = event;
    }

    /// A timed-action slot's timer fired and its effect ran.
    fn timer_fired(&mut self, event: TimerEvent) {
        let _ = event;
    }

    /// A delivered timer id matched no pending slot (cancelled or
    /// superseded while in flight).
    fn timer_stale(&mut self, event: TimerEvent) {
        let _ = event;
    }

    /// A touch pair was classified.
    fn gesture(&mut self, event: GestureEvent) {
        let _ = event;
    }

    /// A host command was dispatched.
    fn command(&mut self, event: CommandEvent) {
        let _ = event;
    }
}

/// Cheap dispatch wrapper over an optional [`TraceSink`].
#[derive(Debug, Default)]
pub struct Tracer<'a> {
    sink: Option<&'a mut (dyn TraceSink + 'static)>,
}

impl core::fmt::Debug for dyn TraceSink + '_ {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("TraceSink")
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer over an optional sink.
    #[must_use]
    pub fn new(sink: Option<&'a mut (dyn TraceSink + 'static)>) -> Self {
        Self { sink }
    }

    /// Creates a tracer that drops every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// See [`TraceSink::scan`].
    pub fn scan(&mut self, event: ScanEvent) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.scan(event);
        }
    }

    /// See [`TraceSink::injected`].
    pub fn injected(&mut self, event: InjectEvent) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.injected(event);
        }
    }

    /// See [`TraceSink::torn_down`].
    pub fn torn_down(&mut self, event: TeardownEvent) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.torn_down(event);
        }
    }

    /// See [`TraceSink::build_failed`].
    pub fn build_failed(&mut self, event: BuildFailedEvent<'_>) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.build_failed(event);
        }
    }

    /// See [`TraceSink::timer_scheduled`].
    pub fn timer_scheduled(&mut self, event: TimerEvent) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.timer_scheduled(event);
        }
    }

    /// See [`TraceSink::timer_cancelled`].
    pub fn timer_cancelled(&mut self, event: TimerEvent) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.timer_cancelled(event);
        }
    }

    /// See [`TraceSink::timer_fired`].
    pub fn timer_fired(&mut self, event: TimerEvent) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.timer_fired(event);
        }
    }

    /// See [`TraceSink::timer_stale`].
    pub fn timer_stale(&mut self, event: TimerEvent) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.timer_stale(event);
        }
    }

    /// See [`TraceSink::gesture`].
    pub fn gesture(&mut self, event: GestureEvent) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.gesture(event);
        }
    }

    /// See [`TraceSink::command`].
    pub fn command(&mut self, event: CommandEvent) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.command(event);
        }
    }
}
