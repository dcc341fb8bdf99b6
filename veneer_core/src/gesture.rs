// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Directional swipe classification.
//!
//! A gesture is a touch-start/touch-end point pair. Classification is a pure
//! function of the two points plus a minimum-displacement threshold:
//!
//! - Predominantly vertical motion (`|dy| > |dx|`) is [`None`] — vertical
//!   drags belong to the host's scrolling and must not be hijacked.
//! - Horizontal motion below the threshold is [`None`].
//! - Otherwise the sign of `dx` decides [`Right`] or [`Left`].
//!
//! Nothing is retained past classification; simultaneous touches are the
//! adapter's problem (it samples only the first touch point).
//!
//! [`None`]: SwipeDirection::None
//! [`Left`]: SwipeDirection::Left
//! [`Right`]: SwipeDirection::Right

use kurbo::Point;

/// Minimum horizontal displacement, in device-independent pixels, for a
/// motion to count as a swipe.
pub const DEFAULT_SWIPE_THRESHOLD: f64 = 60.0;

/// Outcome of classifying a touch pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SwipeDirection {
    /// Not a swipe (vertical, too short, or no recorded start).
    #[default]
    None,
    /// Leftward swipe (`dx < 0`).
    Left,
    /// Rightward swipe (`dx > 0`).
    Right,
}

/// Classifies a start/end point pair against a displacement threshold.
#[must_use]
pub fn classify(start: Point, end: Point, threshold: f64) -> SwipeDirection {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    if dy.abs() > dx.abs() || dx.abs() < threshold {
        return SwipeDirection::None;
    }
    if dx > 0.0 {
        SwipeDirection::Right
    } else {
        SwipeDirection::Left
    }
}

/// Pairs touch starts with touch ends and classifies the motion.
///
/// A second start before an end replaces the origin (a fresh gesture); an
/// end without a start classifies as [`SwipeDirection::None`].
#[derive(Clone, Copy, Debug)]
pub struct GestureRecognizer {
    origin: Option<Point>,
    threshold: f64,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(DEFAULT_SWIPE_THRESHOLD)
    }
}

impl GestureRecognizer {
    /// Creates a recognizer with the given displacement threshold.
    #[must_use]
    pub const fn new(threshold: f64) -> Self {
        Self {
            origin: None,
            threshold,
        }
    }

    /// Records the origin of a new gesture.
    pub fn on_start(&mut self, point: Point) {
        self.origin = Some(point);
    }

    /// Ends the gesture and returns its classification.
    ///
    /// The recorded origin is consumed; the recognizer is ready for the next
    /// gesture immediately.
    pub fn on_end(&mut self, point: Point) -> SwipeDirection {
        match self.origin.take() {
            Some(origin) => classify(origin, point, self.threshold),
            None => SwipeDirection::None,
        }
    }
}
