// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutually-exclusive toggle groups.
//!
//! A [`ToggleGroup`] keeps the "at most one active" invariant over an
//! ordered set of members (the search filter chips). The group owns only the
//! selection state; effects — class flips, scope-selector updates, input
//! focus — are applied by the caller from the returned [`ToggleTransition`],
//! deactivation first, then activation.
//!
//! Re-activating the already-active member is defined as a toggle-*off*, not
//! a no-op: clicking the active chip again clears the filter.

use alloc::vec::Vec;

/// The visible state changes produced by one [`ToggleGroup::activate`] call.
///
/// Apply `deactivated` before `activated`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToggleTransition<M> {
    /// The member that lost the active state, if any.
    pub deactivated: Option<M>,
    /// The member that gained the active state, if any.
    pub activated: Option<M>,
}

// Derived `Default` would bound `M: Default`; the empty transition needs no
// such bound.
impl<M> Default for ToggleTransition<M> {
    fn default() -> Self {
        Self {
            deactivated: None,
            activated: None,
        }
    }
}

/// An ordered member set with an at-most-one-active pointer.
#[derive(Clone, Debug)]
pub struct ToggleGroup<M> {
    members: Vec<M>,
    active: Option<M>,
}

impl<M: Copy + PartialEq> ToggleGroup<M> {
    /// Creates a group over the given members, none active.
    #[must_use]
    pub fn new(members: impl IntoIterator<Item = M>) -> Self {
        Self {
            members: members.into_iter().collect(),
            active: None,
        }
    }

    /// Returns the members in registration order.
    #[must_use]
    pub fn members(&self) -> &[M] {
        &self.members
    }

    /// Returns the active member, if any.
    #[must_use]
    pub fn active(&self) -> Option<M> {
        self.active
    }

    /// Activates a member, deactivating any other active member first.
    ///
    /// Activating the member that is already active toggles it off. An
    /// unknown member produces an empty transition.
    pub fn activate(&mut self, member: M) -> ToggleTransition<M> {
        if !self.members.contains(&member) {
            return ToggleTransition::default();
        }
        let previous = self.active;
        if previous == Some(member) {
            self.active = None;
            return ToggleTransition {
                deactivated: previous,
                activated: None,
            };
        }
        self.active = Some(member);
        ToggleTransition {
            deactivated: previous,
            activated: Some(member),
        }
    }

    /// Deactivates a member if it is the active one.
    ///
    /// Returns whether anything changed; no further effect is implied.
    pub fn deactivate(&mut self, member: M) -> bool {
        if self.active == Some(member) {
            self.active = None;
            true
        } else {
            false
        }
    }
}
