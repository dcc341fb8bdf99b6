// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-flight timed actions.
//!
//! A [`TimedAction`] is one *logical slot* of delayed work (the undo-send
//! window, the quick-reply fill, the theme attribute sync). At most one
//! platform timer is outstanding per slot: scheduling while a timer is
//! pending first cancels it, so only the latest schedule can ever fire.
//!
//! # Cancellation wins the race
//!
//! [`cancel`](TimedAction::cancel) both deregisters the platform timer and
//! forgets its id. If the platform had already queued the firing before the
//! cancel (the classic clear-after-elapse race), the delivery arrives with
//! an id that no longer matches and [`complete`](TimedAction::complete)
//! rejects it as stale. The effect therefore runs *at most once*, and never
//! after a cancel — the guard sits at the last possible moment, delivery.
//!
//! The slot holds no effect closure. The caller keys whatever state the
//! effect needs to the slot and runs it only when `complete` returns `true`.

use crate::host::{TimerHost, TimerId};

/// A cancellable, single-flight delayed action slot.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimedAction {
    pending: Option<TimerId>,
}

impl TimedAction {
    /// Creates an idle slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Returns whether a timer is outstanding.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Schedules the slot's action `delay_ms` from now.
    ///
    /// Any previously pending timer is cancelled first (superseded): its
    /// effect can no longer fire. Returns the id of the new timer.
    pub fn schedule(&mut self, timers: &mut dyn TimerHost, delay_ms: u32) -> TimerId {
        if let Some(prior) = self.pending.take() {
            timers.cancel_timer(prior);
        }
        let id = timers.schedule_timer(delay_ms);
        self.pending = Some(id);
        id
    }

    /// Cancels the pending timer, if any.
    ///
    /// Returns the cancelled timer's id, or `None` if the slot was idle.
    /// After this returns, the slot's effect cannot run even if a firing was
    /// already in flight.
    pub fn cancel(&mut self, timers: &mut dyn TimerHost) -> Option<TimerId> {
        let id = self.pending.take()?;
        timers.cancel_timer(id);
        Some(id)
    }

    /// Resolves a delivered firing against the slot.
    ///
    /// Returns `true` exactly when `fired` is the still-pending timer — the
    /// caller should then run the slot's effect. A stale id (cancelled or
    /// superseded) returns `false` and must be ignored. A live firing clears
    /// the slot: the action has committed.
    pub fn complete(&mut self, fired: TimerId) -> bool {
        if self.pending == Some(fired) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    /// Minimal timer host: hands out sequential ids, records cancels.
    #[derive(Default)]
    struct SeqTimers {
        next: u64,
        cancelled: Vec<TimerId>,
    }

    impl TimerHost for SeqTimers {
        fn schedule_timer(&mut self, _delay_ms: u32) -> TimerId {
            let id = TimerId::from_raw(self.next);
            self.next += 1;
            id
        }

        fn cancel_timer(&mut self, id: TimerId) {
            self.cancelled.push(id);
        }
    }

    #[test]
    fn fires_once_then_clears() {
        let mut timers = SeqTimers::default();
        let mut slot = TimedAction::new();
        let id = slot.schedule(&mut timers, 8000);
        assert!(slot.is_pending());
        assert!(slot.complete(id));
        assert!(!slot.is_pending());
        // A duplicate delivery of the same id is stale.
        assert!(!slot.complete(id));
    }

    #[test]
    fn cancel_prevents_fire() {
        let mut timers = SeqTimers::default();
        let mut slot = TimedAction::new();
        let id = slot.schedule(&mut timers, 8000);
        assert_eq!(slot.cancel(&mut timers), Some(id));
        assert_eq!(timers.cancelled, [id]);
        // Even a delivery that was already in flight is rejected.
        assert!(!slot.complete(id));
    }

    #[test]
    fn reschedule_supersedes_prior() {
        let mut timers = SeqTimers::default();
        let mut slot = TimedAction::new();
        let first = slot.schedule(&mut timers, 8000);
        let second = slot.schedule(&mut timers, 8000);
        // The first was cancelled at the platform and rejected on delivery.
        assert_eq!(timers.cancelled, [first]);
        assert!(!slot.complete(first));
        // Only the second can fire.
        assert!(slot.complete(second));
    }

    #[test]
    fn cancel_on_idle_slot_reports_nothing() {
        let mut timers = SeqTimers::default();
        let mut slot = TimedAction::new();
        assert_eq!(slot.cancel(&mut timers), None);
        assert!(timers.cancelled.is_empty());
    }
}
