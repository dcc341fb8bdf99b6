// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setTimeout`-backed timers.
//!
//! [`WebTimers`] hands out monotonically increasing [`TimerId`]s, one per
//! `setTimeout` call, and keeps each callback closure alive until the timer
//! fires or is cancelled. Fired ids are delivered through a dispatch hook
//! installed during wiring (see [`WebOverlay`](crate::WebOverlay)); the
//! engine tells a live firing from a stale one by the id alone, so ids are
//! never reused.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use veneer_core::host::TimerId;

// Direct global bindings work in both window and worker scopes and avoid
// fetching the Window object on every call.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(handle: i32);
}

/// Receives fired timer ids from the platform.
pub(crate) type TimerDispatch = Rc<dyn Fn(TimerId)>;

struct PendingTimer {
    id: TimerId,
    handle: i32,
    /// Keeps the JS callback alive until the timer resolves.
    _closure: Closure<dyn FnMut()>,
}

/// The timer half of the web host.
pub(crate) struct WebTimers {
    next: Cell<u64>,
    pending: RefCell<Vec<PendingTimer>>,
    dispatch: RefCell<Option<TimerDispatch>>,
}

impl WebTimers {
    pub(crate) fn new() -> Self {
        Self {
            next: Cell::new(0),
            pending: RefCell::new(Vec::new()),
            dispatch: RefCell::new(None),
        }
    }

    /// Installs the dispatch hook fired timers are delivered through.
    ///
    /// Timers scheduled before a hook is installed fire into nothing.
    pub(crate) fn set_dispatch(&self, dispatch: TimerDispatch) {
        *self.dispatch.borrow_mut() = Some(dispatch);
    }

    pub(crate) fn schedule(&self, delay_ms: u32) -> TimerId {
        let id = TimerId::from_raw(self.next.get());
        self.next.set(self.next.get() + 1);

        let dispatch = self.dispatch.borrow().clone();
        let closure = Closure::wrap(Box::new(move || {
            if let Some(dispatch) = dispatch.as_ref() {
                dispatch(id);
            }
        }) as Box<dyn FnMut()>);

        let handle = set_timeout(
            closure.as_ref().unchecked_ref(),
            i32::try_from(delay_ms).unwrap_or(i32::MAX),
        );
        self.pending.borrow_mut().push(PendingTimer {
            id,
            handle,
            _closure: closure,
        });
        id
    }

    pub(crate) fn cancel(&self, id: TimerId) {
        let mut pending = self.pending.borrow_mut();
        if let Some(pos) = pending.iter().position(|t| t.id == id) {
            let timer = pending.swap_remove(pos);
            clear_timeout(timer.handle);
        }
    }

    /// Drops the bookkeeping for a timer that just fired.
    pub(crate) fn reap(&self, id: TimerId) {
        let mut pending = self.pending.borrow_mut();
        if let Some(pos) = pending.iter().position(|t| t.id == id) {
            pending.swap_remove(pos);
        }
    }
}

impl core::fmt::Debug for WebTimers {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebTimers")
            .field("next", &self.next.get())
            .field("pending", &self.pending.borrow().len())
            .finish()
    }
}
