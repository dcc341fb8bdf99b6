// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM-backed host implementation.
//!
//! [`WebHost`] implements the engine's adapter traits over `web-sys`: node
//! handles are slots in an intern table of [`Element`]s, anchors resolve
//! through the webmail skin's ids and selectors, and commands go to the
//! host application's global `rcmail` object when it exists.
//!
//! Injected nodes carrying an [`Action`] get a click listener that forwards
//! the activation through a hook installed during wiring. Listener closures
//! are kept alive for the lifetime of the host; the catalog injects a small,
//! bounded set of interactive nodes, so this does not grow without limit.

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use js_sys::{Function, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Document, Element, HtmlElement};

use veneer_core::host::{
    Action, Anchor, Command, HostCommands, HostDocument, NodeId, NodeSpec, NoticeKind, Placement,
    TimerHost, TimerId,
};

use crate::timers::{TimerDispatch, WebTimers};

/// Receives activations of injected action nodes.
pub(crate) type ActivateDispatch = Rc<dyn Fn(NodeId, Action)>;

/// The engine's view of the browser document.
pub struct WebHost {
    document: Document,
    nodes: RefCell<Vec<Element>>,
    click_closures: RefCell<Vec<Closure<dyn FnMut(web_sys::Event)>>>,
    hovered: Cell<Option<NodeId>>,
    outside_armed: Cell<bool>,
    activate: RefCell<Option<ActivateDispatch>>,
    timers: WebTimers,
}

impl WebHost {
    /// Creates a host over the given document. No listeners are attached
    /// and nothing is interned until the engine starts asking questions.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            nodes: RefCell::new(Vec::new()),
            click_closures: RefCell::new(Vec::new()),
            hovered: Cell::new(None),
            outside_armed: Cell::new(false),
            activate: RefCell::new(None),
            timers: WebTimers::new(),
        }
    }

    /// Installs the wiring hooks: where activations and fired timers go.
    pub(crate) fn set_dispatch(&self, activate: ActivateDispatch, timers: TimerDispatch) {
        *self.activate.borrow_mut() = Some(activate);
        self.timers.set_dispatch(timers);
    }

    /// Records the element currently under the pointer.
    pub(crate) fn set_hovered_element(&self, element: Option<&Element>) {
        self.hovered.set(element.map(|el| self.intern(el)));
    }

    /// Returns whether an outside-click dismissal is armed, and disarms it.
    pub(crate) fn take_outside_arm(&self) -> bool {
        self.outside_armed.replace(false)
    }

    /// Drops timer bookkeeping for a fired id (wiring calls this before
    /// delivering the firing to the engine).
    pub(crate) fn reap_timer(&self, id: TimerId) {
        self.timers.reap(id);
    }

    /// Returns the interned element for a handle.
    pub(crate) fn element(&self, node: NodeId) -> Option<Element> {
        self.nodes.borrow().get(node.raw() as usize).cloned()
    }

    /// Interns an element, returning its (stable) handle.
    fn intern(&self, element: &Element) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(pos) = nodes.iter().position(|el| el == element) {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "the intern table never approaches u32::MAX entries"
            )]
            return NodeId::from_raw(pos as u32);
        }
        nodes.push(element.clone());
        #[expect(
            clippy::cast_possible_truncation,
            reason = "the intern table never approaches u32::MAX entries"
        )]
        NodeId::from_raw((nodes.len() - 1) as u32)
    }

    /// Resolves an anchor against the webmail skin's document structure.
    pub(crate) fn anchor_element(&self, anchor: Anchor) -> Option<Element> {
        let doc = &self.document;
        match anchor {
            Anchor::Root => doc.document_element(),
            Anchor::Body => doc.body().map(Element::from),
            Anchor::LayoutContent => doc.get_element_by_id("layout-content"),
            Anchor::Sidebar => doc.get_element_by_id("layout-sidebar"),
            Anchor::SidebarToggle => query(doc, ".back-sidebar-button"),
            Anchor::MessageList => doc.get_element_by_id("messagelist"),
            Anchor::MessageBody => doc.get_element_by_id("messagebody"),
            Anchor::ComposeEditor => doc.get_element_by_id("composebody"),
            Anchor::AttachmentList => doc.get_element_by_id("attachment-list"),
            Anchor::SearchForm => doc.get_element_by_id("mailsearchform"),
            Anchor::SearchInput => query(
                doc,
                "#mailsearchform input[type=\"text\"], #mailsearchform input[type=\"search\"]",
            ),
            Anchor::ScopeSelect => query(doc, "select[name=\"searchscope\"], #search-scope"),
            Anchor::ToastStack => doc.get_element_by_id("messagestack"),
            Anchor::ThemeToggle => query(doc, "#taskmenu .theme"),
        }
    }

    fn materialize(&self, spec: &NodeSpec) -> Option<Element> {
        let el = self.document.create_element(spec.tag).ok()?;
        if let Some(id) = spec.id {
            el.set_id(id);
        }
        for class in &spec.classes {
            let _ = el.class_list().add_1(class);
        }
        for (name, value) in &spec.attrs {
            let _ = el.set_attribute(name, value);
        }
        if !spec.styles.is_empty()
            && let Some(html) = el.dyn_ref::<HtmlElement>()
        {
            let style = html.style();
            for (prop, value) in &spec.styles {
                let _ = style.set_property(prop, value);
            }
        }
        if let Some(text) = &spec.text {
            el.set_text_content(Some(text));
        }
        if let Some(action) = &spec.action {
            self.wire_action(&el, action.clone());
        }
        for child_spec in &spec.children {
            let child = self.materialize(child_spec)?;
            let _ = el.append_child(&child);
        }
        Some(el)
    }

    fn wire_action(&self, el: &Element, action: Action) {
        let node = self.intern(el);
        let Some(dispatch) = self.activate.borrow().clone() else {
            return;
        };
        let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
            // Keep the activation from also reaching outer dismiss handlers.
            event.stop_propagation();
            dispatch(node, action.clone());
        }) as Box<dyn FnMut(web_sys::Event)>);
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        self.click_closures.borrow_mut().push(closure);
    }
}

fn query(doc: &Document, selector: &str) -> Option<Element> {
    doc.query_selector(selector).ok().flatten()
}

/// Returns the global `rcmail` object, if the host application exposed one.
fn rcmail() -> Option<JsValue> {
    let value = Reflect::get(&js_sys::global(), &JsValue::from_str("rcmail")).ok()?;
    value.is_object().then_some(value)
}

/// Calls a method on the `rcmail` object, dropping the call if anything in
/// the chain is missing. Command dispatch is best-effort by contract.
fn rcmail_call(method: &str, args: &[&JsValue]) {
    let Some(rcmail) = rcmail() else {
        return;
    };
    let Ok(func) = Reflect::get(&rcmail, &JsValue::from_str(method)) else {
        return;
    };
    let Some(func) = func.dyn_ref::<Function>() else {
        return;
    };
    let _ = match args {
        [] => func.call0(&rcmail),
        [a] => func.call1(&rcmail, a),
        [a, b] => func.call2(&rcmail, a, b),
        [a, b, c, ..] => func.call3(&rcmail, a, b, c),
    };
}

impl HostDocument for WebHost {
    fn anchor(&self, anchor: Anchor) -> Option<NodeId> {
        self.anchor_element(anchor).map(|el| self.intern(&el))
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let Some(el) = self.element(node) else {
            return false;
        };
        self.document
            .document_element()
            .is_some_and(|root| root.contains(Some(&el)))
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let (Some(outer), Some(inner)) = (self.element(ancestor), self.element(node)) else {
            return false;
        };
        outer.contains(Some(&inner))
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        let el = self.element(node)?;
        el.parent_element().map(|parent| self.intern(&parent))
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let Some(el) = self.element(root) else {
            return Vec::new();
        };
        let Ok(list) = el.query_selector_all("*") else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(list.length() as usize);
        for i in 0..list.length() {
            if let Some(node) = list.item(i)
                && let Ok(descendant) = node.dyn_into::<Element>()
            {
                out.push(self.intern(&descendant));
            }
        }
        out
    }

    fn tag_name(&self, node: NodeId) -> String {
        self.element(node)
            .map(|el| el.tag_name().to_lowercase())
            .unwrap_or_default()
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)?.get_attribute(name)
    }

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element(node) {
            let _ = el.set_attribute(name, value);
        }
    }

    fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(el) = self.element(node) {
            let _ = el.remove_attribute(name);
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|el| el.class_list().contains(class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element(node) {
            let _ = el.class_list().add_1(class);
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element(node) {
            let _ = el.class_list().remove_1(class);
        }
    }

    fn set_style(&mut self, node: NodeId, prop: &str, value: &str) {
        let Some(el) = self.element(node) else {
            return;
        };
        let Some(html) = el.dyn_ref::<HtmlElement>() else {
            return;
        };
        if value.is_empty() {
            let _ = html.style().remove_property(prop);
        } else {
            let _ = html.style().set_property(prop, value);
        }
    }

    fn text(&self, node: NodeId) -> String {
        self.element(node)
            .and_then(|el| el.text_content())
            .unwrap_or_default()
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(el) = self.element(node) {
            el.set_text_content(Some(text));
        }
    }

    fn value(&self, node: NodeId) -> String {
        // Form controls come in several classes; read the property
        // generically instead of downcasting to each.
        self.element(node)
            .and_then(|el| Reflect::get(&el, &JsValue::from_str("value")).ok())
            .and_then(|v| v.as_string())
            .unwrap_or_default()
    }

    fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(el) = self.element(node) {
            let _ = Reflect::set(&el, &JsValue::from_str("value"), &JsValue::from_str(value));
        }
    }

    fn child_count(&self, node: NodeId) -> usize {
        self.element(node)
            .map(|el| el.child_element_count() as usize)
            .unwrap_or_default()
    }

    fn scroll_height(&self, node: NodeId) -> f64 {
        self.element(node)
            .map(|el| f64::from(el.scroll_height()))
            .unwrap_or_default()
    }

    fn by_id(&self, id: &str) -> Option<NodeId> {
        self.document
            .get_element_by_id(id)
            .map(|el| self.intern(&el))
    }

    fn insert(&mut self, spec: &NodeSpec, place: Placement) -> Option<NodeId> {
        let target_id = match place {
            Placement::Before(n) | Placement::After(n) | Placement::Prepend(n)
            | Placement::Append(n) => n,
        };
        if !self.is_attached(target_id) {
            return None;
        }
        let target = self.element(target_id)?;
        let el = self.materialize(spec)?;
        match place {
            Placement::Before(_) => {
                target.parent_node()?.insert_before(&el, Some(&target)).ok()?;
            }
            Placement::After(_) => {
                target
                    .parent_node()?
                    .insert_before(&el, target.next_sibling().as_ref())
                    .ok()?;
            }
            Placement::Prepend(_) => {
                target.insert_before(&el, target.first_child().as_ref()).ok()?;
            }
            Placement::Append(_) => {
                target.append_child(&el).ok()?;
            }
        }
        Some(self.intern(&el))
    }

    fn remove(&mut self, node: NodeId) {
        if let Some(el) = self.element(node) {
            el.remove();
        }
    }

    fn focus(&mut self, node: NodeId) {
        if let Some(el) = self.element(node)
            && let Some(html) = el.dyn_ref::<HtmlElement>()
        {
            let _ = html.focus();
        }
    }

    fn hovered(&self) -> Option<NodeId> {
        self.hovered.get().filter(|&node| self.is_attached(node))
    }

    fn editable_focused(&self) -> bool {
        let Some(active) = self.document.active_element() else {
            return false;
        };
        let tag = active.tag_name().to_lowercase();
        if matches!(tag.as_str(), "input" | "textarea" | "select") {
            return true;
        }
        active
            .dyn_ref::<HtmlElement>()
            .is_some_and(HtmlElement::is_content_editable)
    }

    fn viewport_width(&self) -> f64 {
        web_sys::window()
            .and_then(|w| w.inner_width().ok())
            .and_then(|v| v.as_f64())
            .unwrap_or(1024.0)
    }

    fn place_near(&mut self, node: NodeId, trigger: NodeId) {
        let (Some(popup), Some(anchor)) = (self.element(node), self.element(trigger)) else {
            return;
        };
        let Some(html) = popup.dyn_ref::<HtmlElement>() else {
            return;
        };
        let rect = anchor.get_bounding_client_rect();
        let style = html.style();
        let _ = style.set_property("position", "fixed");
        let _ = style.set_property("top", &format!("{}px", rect.bottom() + 4.0));
        let _ = style.set_property("left", &format!("{}px", rect.left()));
    }

    fn arm_outside_dismiss(&mut self) {
        self.outside_armed.set(true);
    }
}

impl HostCommands for WebHost {
    fn invoke(&mut self, command: Command, context: Option<NodeId>) {
        let name = JsValue::from_str(command.as_name());
        match context.and_then(|node| self.element(node)) {
            Some(el) => rcmail_call("command", &[&name, &JsValue::UNDEFINED, &el.into()]),
            None => rcmail_call("command", &[&name]),
        }
    }

    fn notify(&mut self, message: &str, kind: NoticeKind) {
        let kind = match kind {
            NoticeKind::Confirmation => "confirmation",
            NoticeKind::Notice => "notice",
            NoticeKind::Error => "error",
        };
        rcmail_call(
            "display_message",
            &[&JsValue::from_str(message), &JsValue::from_str(kind)],
        );
    }

    fn confirm(&mut self, message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(true)
    }
}

impl TimerHost for WebHost {
    fn schedule_timer(&mut self, delay_ms: u32) -> TimerId {
        self.timers.schedule(delay_ms)
    }

    fn cancel_timer(&mut self, id: TimerId) {
        self.timers.cancel(id);
    }
}

impl core::fmt::Debug for WebHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebHost")
            .field("interned", &self.nodes.borrow().len())
            .field("action_listeners", &self.click_closures.borrow().len())
            .field("hovered", &self.hovered.get())
            .field("outside_armed", &self.outside_armed.get())
            .field("timers", &self.timers)
            .finish()
    }
}
