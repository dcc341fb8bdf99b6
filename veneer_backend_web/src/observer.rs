// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser wiring for the overlay.
//!
//! [`WebOverlay`] owns one [`Overlay`], one [`WebHost`], the
//! `MutationObserver`s for the engine's observed roots, and the document
//! listeners (keyboard, hover, touch, outside-click) plus the host's theme
//! and sidebar toggle buttons. Everything is delivered into the engine's
//! `on_*` entry points; the engine itself never sees a `web_sys` type.
//!
//! Observer callbacks arrive as microtasks, so a batch caused by the
//! engine's own insertions is classified against the processed marks and
//! coalesces to nothing.

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::Point;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{
    Element, Event, EventTarget, KeyboardEvent, MutationObserver, MutationObserverInit,
    MutationRecord, TouchEvent,
};

use veneer_core::catalog;
use veneer_core::dirty;
use veneer_core::host::{Action, Anchor, HostDocument as _, Key};
use veneer_core::overlay::{Overlay, OverlayConfig};
use veneer_core::trace::TraceSink;

use crate::document::{ActivateDispatch, WebHost};
use crate::timers::TimerDispatch;

type EventClosure = Closure<dyn FnMut(Event)>;
type ObserverClosure = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

/// One observed root: the platform observer plus its kept-alive callback.
struct RootObserver {
    observer: MutationObserver,
    _closure: ObserverClosure,
}

/// A listener we attached and must detach on teardown.
struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: EventClosure,
}

/// The running overlay, attached to the live document.
pub struct WebOverlay {
    overlay: Rc<RefCell<Overlay>>,
    host: Rc<RefCell<WebHost>>,
    observers: Vec<RootObserver>,
    listeners: Vec<Listener>,
}

impl WebOverlay {
    /// Builds the overlay, starts it against the current document, and
    /// attaches observers and listeners.
    ///
    /// # Errors
    ///
    /// Fails if there is no global window/document or an observer cannot
    /// be constructed.
    pub fn attach(
        config: OverlayConfig,
        sink: Option<Box<dyn TraceSink>>,
    ) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let host = Rc::new(RefCell::new(WebHost::new(document.clone())));
        let overlay = match sink {
            Some(sink) => Overlay::new(config).with_trace(sink),
            None => Overlay::new(config),
        };
        let overlay = Rc::new(RefCell::new(overlay));

        // Activation and timer hooks: injected-node clicks and setTimeout
        // firings land back in the engine.
        {
            let overlay_cb = Rc::clone(&overlay);
            let host_cb = Rc::clone(&host);
            let activate: ActivateDispatch = Rc::new(move |node, action| {
                let mut host = host_cb.borrow_mut();
                overlay_cb.borrow_mut().on_activate(&mut *host, node, action);
            });
            let overlay_cb = Rc::clone(&overlay);
            let host_cb = Rc::clone(&host);
            let timers: TimerDispatch = Rc::new(move |id| {
                let mut host = host_cb.borrow_mut();
                host.reap_timer(id);
                overlay_cb.borrow_mut().on_timer(&mut *host, id);
            });
            host.borrow().set_dispatch(activate, timers);
        }

        overlay.borrow_mut().start(&mut *host.borrow_mut());

        let mut attached = Self {
            overlay,
            host,
            observers: Vec::new(),
            listeners: Vec::new(),
        };
        attached.attach_observers()?;
        attached.attach_listeners(&document);
        Ok(attached)
    }

    /// Stops the overlay and detaches every observer and listener.
    pub fn detach(&mut self) {
        for root in self.observers.drain(..) {
            root.observer.disconnect();
        }
        for listener in self.listeners.drain(..) {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.kind,
                listener.closure.as_ref().unchecked_ref(),
            );
        }
        let mut host = self.host.borrow_mut();
        self.overlay.borrow_mut().stop(&mut *host);
    }

    /// Queues a send behind the undo window (see
    /// [`Overlay::request_send`]). Callers hook this into the host's send
    /// path; it returns `false` when the send must not proceed yet.
    pub fn request_send(&self) -> bool {
        let mut host = self.host.borrow_mut();
        self.overlay.borrow_mut().request_send(&mut *host)
    }

    fn attach_observers(&mut self) -> Result<(), JsValue> {
        let roots = self.overlay.borrow().observed_roots();
        for anchor in roots {
            let Some(element) = self.host.borrow().anchor_element(anchor) else {
                // Missing root: the enhancements under it stay unsatisfied.
                continue;
            };
            let overlay = Rc::clone(&self.overlay);
            let host = Rc::clone(&self.host);
            let closure = Closure::wrap(Box::new(
                move |records: js_sys::Array, _observer: MutationObserver| {
                    let mut child_list = false;
                    let mut attributes = false;
                    for record in records.iter() {
                        let record: MutationRecord = record.unchecked_into();
                        match record.type_().as_str() {
                            "childList" => child_list = true,
                            "attributes" => attributes = true,
                            _ => {}
                        }
                    }
                    let mut host = host.borrow_mut();
                    let mut overlay = overlay.borrow_mut();
                    if child_list {
                        overlay.on_mutation(&mut *host, anchor, dirty::CHILD_LIST);
                    }
                    if attributes {
                        overlay.on_mutation(&mut *host, anchor, dirty::ATTRIBUTES);
                    }
                },
            ) as Box<dyn FnMut(js_sys::Array, MutationObserver)>);

            let observer = MutationObserver::new(closure.as_ref().unchecked_ref())?;
            let init = MutationObserverInit::new();
            init.set_child_list(true);
            init.set_subtree(true);
            init.set_attributes(true);
            observer.observe_with_options(&element, &init)?;
            self.observers.push(RootObserver {
                observer,
                _closure: closure,
            });
        }
        Ok(())
    }

    fn attach_listeners(&mut self, document: &web_sys::Document) {
        let doc_target: &EventTarget = document.as_ref();

        {
            let overlay = Rc::clone(&self.overlay);
            let host = Rc::clone(&self.host);
            self.listen(doc_target, "keydown", move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                let key = event.key();
                let key = if key == "Escape" {
                    Key::Escape
                } else {
                    let mut chars = key.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Key::Char(c),
                        _ => return,
                    }
                };
                let mut host = host.borrow_mut();
                overlay.borrow_mut().on_key(&mut *host, key);
            });
        }

        {
            let overlay = Rc::clone(&self.overlay);
            let host = Rc::clone(&self.host);
            self.listen(doc_target, "mouseover", move |event| {
                let target = event
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok());
                let mut host_ref = host.borrow_mut();
                host_ref.set_hovered_element(target.as_ref());
                overlay.borrow_mut().on_hover_changed(&mut *host_ref);
            });
        }

        {
            let overlay = Rc::clone(&self.overlay);
            self.listen(doc_target, "touchstart", move |event| {
                if let Some(point) = first_touch(&event) {
                    overlay.borrow_mut().on_touch_start(point);
                }
            });
        }

        {
            let overlay = Rc::clone(&self.overlay);
            let host = Rc::clone(&self.host);
            self.listen(doc_target, "touchend", move |event| {
                if let Some(point) = first_touch(&event) {
                    let mut host = host.borrow_mut();
                    overlay.borrow_mut().on_touch_end(&mut *host, point);
                }
            });
        }

        // Outside-click dismissal: armed by the engine when the snooze
        // picker opens. Clicks inside the picker stop propagation at the
        // option buttons, so anything arriving here while armed is outside.
        {
            let overlay = Rc::clone(&self.overlay);
            let host = Rc::clone(&self.host);
            self.listen(doc_target, "click", move |event| {
                let inside = event
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok())
                    .and_then(|el| {
                        el.closest(&format!("#{}", catalog::SNOOZE_ID))
                            .ok()
                            .flatten()
                    })
                    .is_some();
                let mut host_ref = host.borrow_mut();
                if inside || !host_ref.take_outside_arm() {
                    return;
                }
                overlay.borrow_mut().on_outside_click(&mut *host_ref);
            });
        }

        let theme = self.host.borrow().anchor_element(Anchor::ThemeToggle);
        if let Some(theme) = theme {
            let overlay = Rc::clone(&self.overlay);
            let host = Rc::clone(&self.host);
            self.listen(theme.as_ref(), "click", move |_event| {
                let mut host = host.borrow_mut();
                overlay.borrow_mut().on_theme_toggled(&mut *host);
            });
        }

        let toggle = self.host.borrow().anchor_element(Anchor::SidebarToggle);
        if let Some(toggle) = toggle {
            let overlay = Rc::clone(&self.overlay);
            let host = Rc::clone(&self.host);
            self.listen(toggle.as_ref(), "click", move |_event| {
                let mut host_ref = host.borrow_mut();
                let Some(node) = host_ref.anchor(Anchor::SidebarToggle) else {
                    return;
                };
                overlay
                    .borrow_mut()
                    .on_activate(&mut *host_ref, node, Action::ToggleSidebar);
            });
        }
    }

    fn listen(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        let _ =
            target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
        self.listeners.push(Listener {
            target: target.clone(),
            kind,
            closure,
        });
    }
}

/// Extracts the first touch point of a touch event, in client coordinates.
fn first_touch(event: &Event) -> Option<Point> {
    let event = event.dyn_ref::<TouchEvent>()?;
    let touches = event.changed_touches();
    let touch = touches.get(0)?;
    Some(Point::new(
        f64::from(touch.client_x()),
        f64::from(touch.client_y()),
    ))
}

impl core::fmt::Debug for WebOverlay {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebOverlay")
            .field("observers", &self.observers.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
