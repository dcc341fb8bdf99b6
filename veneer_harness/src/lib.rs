// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fake host for engine tests.
//!
//! [`FakeHost`] implements the full adapter surface over an in-memory node
//! arena: a document tree with tags, attributes, classes, styles, and text;
//! a manual clock with a deterministic timer queue; and recording command /
//! notification / confirm collaborators. Tests build a host document,
//! drive [`Overlay`](veneer_core::overlay::Overlay) entry points by hand,
//! and assert on the resulting tree.
//!
//! [`RecordingSink`] captures trace events for assertions on engine
//! internals (injection counts, build failures, teardown).

#![no_std]

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use veneer_core::host::{
    Action, Anchor, Command, HostCommands, HostDocument, NodeId, NodeSpec, NoticeKind, Placement,
    TimerHost, TimerId,
};
use veneer_core::trace::{
    BuildFailedEvent, InjectEvent, ScanEvent, TeardownEvent, TimerEvent, TraceSink,
};

/// One node in the fake document.
#[derive(Clone, Debug, Default)]
struct FakeNode {
    tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    text: String,
    value: String,
    scroll_height: f64,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    action: Option<Action>,
}

/// A pending fake timer.
#[derive(Clone, Copy, Debug)]
struct FakeTimer {
    id: TimerId,
    due: u64,
}

/// In-memory host: document tree, manual clock, recording collaborators.
#[derive(Debug)]
pub struct FakeHost {
    nodes: Vec<FakeNode>,
    root: NodeId,
    body: NodeId,
    anchors: Vec<(Anchor, NodeId)>,
    hovered: Option<NodeId>,
    focused: Option<NodeId>,
    editable_focused: bool,
    viewport: f64,
    confirm_answer: bool,
    outside_armed: bool,
    now_ms: u64,
    next_timer: u64,
    timers: Vec<FakeTimer>,
    /// Recorded command dispatches, in order.
    pub commands: Vec<(Command, Option<NodeId>)>,
    /// Recorded notifications, in order.
    pub notices: Vec<(String, NoticeKind)>,
    /// Recorded confirm prompts, in order.
    pub confirms: Vec<String>,
    /// Recorded place-near calls (placed node, trigger).
    pub placements: Vec<(NodeId, NodeId)>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    /// Creates a document with a root element and an empty body, anchored
    /// as [`Anchor::Root`] and [`Anchor::Body`].
    #[must_use]
    pub fn new() -> Self {
        let mut host = Self {
            nodes: Vec::new(),
            root: NodeId::from_raw(0),
            body: NodeId::from_raw(0),
            anchors: Vec::new(),
            hovered: None,
            focused: None,
            editable_focused: false,
            viewport: 1280.0,
            confirm_answer: true,
            outside_armed: false,
            now_ms: 0,
            next_timer: 0,
            timers: Vec::new(),
            commands: Vec::new(),
            notices: Vec::new(),
            confirms: Vec::new(),
            placements: Vec::new(),
        };
        let root = host.alloc("html", None);
        let body = host.alloc("body", Some(root));
        host.root = root;
        host.body = body;
        host.anchors.push((Anchor::Root, root));
        host.anchors.push((Anchor::Body, body));
        host
    }

    /// Returns the body node.
    #[must_use]
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Creates an element as the last child of `parent`.
    pub fn elem(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.alloc(tag, Some(parent))
    }

    /// Binds an anchor to a node (replacing any previous binding).
    pub fn set_anchor(&mut self, anchor: Anchor, node: NodeId) {
        self.anchors.retain(|(a, _)| *a != anchor);
        self.anchors.push((anchor, node));
    }

    /// Unbinds an anchor.
    pub fn clear_anchor(&mut self, anchor: Anchor) {
        self.anchors.retain(|(a, _)| *a != anchor);
    }

    /// Moves the pointer: `None` means nothing is hovered.
    pub fn set_hovered(&mut self, node: Option<NodeId>) {
        self.hovered = node;
    }

    /// Sets whether an editable element has focus.
    pub fn set_editable_focused(&mut self, focused: bool) {
        self.editable_focused = focused;
    }

    /// Sets the viewport width.
    pub fn set_viewport(&mut self, width: f64) {
        self.viewport = width;
    }

    /// Sets the answer future confirm prompts will get.
    pub fn set_confirm_answer(&mut self, answer: bool) {
        self.confirm_answer = answer;
    }

    /// Sets a node's reported scroll height.
    pub fn set_scroll_height(&mut self, node: NodeId, height: f64) {
        self.nodes[node.raw() as usize].scroll_height = height;
    }

    /// Returns the node focus landed on last, if any.
    #[must_use]
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Returns whether an outside-click dismissal is currently armed, and
    /// disarms it (the listener is fire-once).
    pub fn take_outside_arm(&mut self) -> bool {
        core::mem::take(&mut self.outside_armed)
    }

    /// Returns an inline style value.
    #[must_use]
    pub fn style_of(&self, node: NodeId, prop: &str) -> Option<String> {
        self.nodes[node.raw() as usize].styles.get(prop).cloned()
    }

    /// Returns the action wired to a node.
    #[must_use]
    pub fn action_of(&self, node: NodeId) -> Option<Action> {
        self.nodes[node.raw() as usize].action.clone()
    }

    /// Returns all attached nodes carrying a class, in document order.
    #[must_use]
    pub fn nodes_with_class(&self, class: &str) -> Vec<NodeId> {
        let mut out = self.descendants(self.root);
        out.retain(|&n| self.has_class(n, class));
        out
    }

    /// Finds the first attached descendant of `root` for which `pred` holds.
    #[must_use]
    pub fn find(&self, root: NodeId, pred: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        self.descendants(root).into_iter().find(|&n| pred(self, n))
    }

    /// Advances the clock and returns the timers that came due, in firing
    /// order. The caller delivers them to the overlay.
    pub fn advance(&mut self, ms: u64) -> Vec<TimerId> {
        self.now_ms += ms;
        let now = self.now_ms;
        let mut due: Vec<FakeTimer> = self.timers.iter().copied().filter(|t| t.due <= now).collect();
        self.timers.retain(|t| t.due > now);
        due.sort_by_key(|t| (t.due, t.id.raw()));
        due.into_iter().map(|t| t.id).collect()
    }

    /// Returns the number of timers still pending.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    // -- Internals --

    fn alloc(&mut self, tag: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::from_raw(u32::try_from(self.nodes.len()).expect("node arena overflow"));
        self.nodes.push(FakeNode {
            tag: tag.to_string(),
            parent,
            ..FakeNode::default()
        });
        if let Some(parent) = parent {
            self.nodes[parent.raw() as usize].children.push(id);
        }
        id
    }

    fn node(&self, id: NodeId) -> &FakeNode {
        &self.nodes[id.raw() as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut FakeNode {
        &mut self.nodes[id.raw() as usize]
    }

    fn collect_subtree(&self, node: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.node(node).children {
            out.push(child);
            self.collect_subtree(child, out);
        }
    }

    fn materialize(&mut self, spec: &NodeSpec) -> NodeId {
        let id = self.alloc(spec.tag, None);
        {
            let node = self.node_mut(id);
            if let Some(elem_id) = spec.id {
                node.attrs.insert("id".to_string(), elem_id.to_string());
            }
            for class in &spec.classes {
                node.classes.push((*class).to_string());
            }
            for (name, value) in &spec.attrs {
                node.attrs.insert((*name).to_string(), value.clone());
            }
            for (prop, value) in &spec.styles {
                node.styles.insert((*prop).to_string(), value.clone());
            }
            if let Some(text) = &spec.text {
                node.text = text.clone();
            }
            node.action = spec.action.clone();
        }
        for child_spec in &spec.children {
            let child = self.materialize(child_spec);
            self.node_mut(child).parent = Some(id);
            self.node_mut(id).children.push(child);
        }
        id
    }
}

impl HostDocument for FakeHost {
    fn anchor(&self, anchor: Anchor) -> Option<NodeId> {
        self.anchors
            .iter()
            .find(|(a, _)| *a == anchor)
            .map(|&(_, n)| n)
            .filter(|&n| self.is_attached(n))
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.node(current).parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == ancestor {
                return true;
            }
            match self.node(current).parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_subtree(root, &mut out);
        out
    }

    fn tag_name(&self, node: NodeId) -> String {
        self.node(node).tag.clone()
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node).attrs.get(name).cloned()
    }

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        self.node_mut(node)
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    fn remove_attr(&mut self, node: NodeId, name: &str) {
        self.node_mut(node).attrs.remove(name);
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node).classes.iter().any(|c| c == class)
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if !self.has_class(node, class) {
            self.node_mut(node).classes.push(class.to_string());
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        self.node_mut(node).classes.retain(|c| c != class);
    }

    fn set_style(&mut self, node: NodeId, prop: &str, value: &str) {
        if value.is_empty() {
            self.node_mut(node).styles.remove(prop);
        } else {
            self.node_mut(node)
                .styles
                .insert(prop.to_string(), value.to_string());
        }
    }

    fn text(&self, node: NodeId) -> String {
        let mut out = self.node(node).text.clone();
        for child in self.descendants(node) {
            out.push_str(&self.node(child).text);
        }
        out
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        self.node_mut(node).text = text.to_string();
    }

    fn value(&self, node: NodeId) -> String {
        self.node(node).value.clone()
    }

    fn set_value(&mut self, node: NodeId, value: &str) {
        self.node_mut(node).value = value.to_string();
    }

    fn child_count(&self, node: NodeId) -> usize {
        self.node(node).children.len()
    }

    fn scroll_height(&self, node: NodeId) -> f64 {
        self.node(node).scroll_height
    }

    fn by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.node(n).attrs.get("id").is_some_and(|v| v == id))
    }

    fn insert(&mut self, spec: &NodeSpec, place: Placement) -> Option<NodeId> {
        let target = match place {
            Placement::Before(n) | Placement::After(n) | Placement::Prepend(n)
            | Placement::Append(n) => n,
        };
        if !self.is_attached(target) {
            return None;
        }
        let new = self.materialize(spec);
        match place {
            Placement::Before(sibling) | Placement::After(sibling) => {
                let parent = self.node(sibling).parent?;
                let mut index = self
                    .node(parent)
                    .children
                    .iter()
                    .position(|&c| c == sibling)?;
                if matches!(place, Placement::After(_)) {
                    index += 1;
                }
                self.node_mut(parent).children.insert(index, new);
                self.node_mut(new).parent = Some(parent);
            }
            Placement::Prepend(parent) => {
                self.node_mut(parent).children.insert(0, new);
                self.node_mut(new).parent = Some(parent);
            }
            Placement::Append(parent) => {
                self.node_mut(parent).children.push(new);
                self.node_mut(new).parent = Some(parent);
            }
        }
        Some(new)
    }

    fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.node(node).parent {
            self.node_mut(parent).children.retain(|&c| c != node);
        }
        self.node_mut(node).parent = None;
    }

    fn focus(&mut self, node: NodeId) {
        self.focused = Some(node);
    }

    fn hovered(&self) -> Option<NodeId> {
        self.hovered.filter(|&n| self.is_attached(n))
    }

    fn editable_focused(&self) -> bool {
        self.editable_focused
    }

    fn viewport_width(&self) -> f64 {
        self.viewport
    }

    fn place_near(&mut self, node: NodeId, trigger: NodeId) {
        self.placements.push((node, trigger));
    }

    fn arm_outside_dismiss(&mut self) {
        self.outside_armed = true;
    }
}

impl HostCommands for FakeHost {
    fn invoke(&mut self, command: Command, context: Option<NodeId>) {
        self.commands.push((command, context));
    }

    fn notify(&mut self, message: &str, kind: NoticeKind) {
        self.notices.push((message.to_string(), kind));
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.confirms.push(message.to_string());
        self.confirm_answer
    }
}

impl TimerHost for FakeHost {
    fn schedule_timer(&mut self, delay_ms: u32) -> TimerId {
        let id = TimerId::from_raw(self.next_timer);
        self.next_timer += 1;
        self.timers.push(FakeTimer {
            id,
            due: self.now_ms + u64::from(delay_ms),
        });
        id
    }

    fn cancel_timer(&mut self, id: TimerId) {
        self.timers.retain(|t| t.id != id);
    }
}

/// Trace sink that records the events tests assert on.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// (descriptor, target) per injection.
    pub injected: Vec<(&'static str, NodeId)>,
    /// (descriptor, target) per teardown.
    pub torn_down: Vec<(&'static str, NodeId)>,
    /// (descriptor, reason) per build failure.
    pub build_failures: Vec<(&'static str, String)>,
    /// Scan passes, as (descriptor, candidates).
    pub scans: Vec<(&'static str, usize)>,
    /// Fired timer slots.
    pub fired: Vec<&'static str>,
    /// Stale timer deliveries.
    pub stale: Vec<TimerId>,
}

impl TraceSink for RecordingSink {
    fn scan(&mut self, event: ScanEvent) {
        self.scans.push((event.descriptor, event.candidates));
    }

    fn injected(&mut self, event: InjectEvent) {
        self.injected.push((event.descriptor, event.target));
    }

    fn torn_down(&mut self, event: TeardownEvent) {
        self.torn_down.push((event.descriptor, event.target));
    }

    fn build_failed(&mut self, event: BuildFailedEvent<'_>) {
        self.build_failures
            .push((event.descriptor, event.reason.to_string()));
    }

    fn timer_fired(&mut self, event: TimerEvent) {
        self.fired.push(event.slot);
    }

    fn timer_stale(&mut self, event: TimerEvent) {
        self.stale.push(event.id);
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::ToString;

    use kurbo::Point;
    use veneer_core::catalog::{
        self, ATTACHMENT_WARNING, CHIPS_ID, COLLAPSED_CLASS, FAB_ID, MOBILE_BAR_ID,
        ROW_ACTIONS_CLASS, SHORTCUTS_ID, SIDEBAR_COLLAPSED_CLASS, SNOOZE_ID, SUGGESTIONS_ID,
        TOAST_CLASS, UNDO_TOAST_ID,
    };
    use veneer_core::host::{Key, SearchScope};
    use veneer_core::overlay::{Overlay, OverlayConfig};
    use veneer_core::trace::Tracer;
    use veneer_core::watch::{BuildError, Enhancement, WatchedInjector};
    use veneer_core::dirty;

    use super::*;

    /// A populated webmail document with every anchor the catalog uses.
    struct Mail {
        host: FakeHost,
        layout: NodeId,
        sidebar: NodeId,
        list: NodeId,
        input: NodeId,
        select: NodeId,
        stack: NodeId,
    }

    fn mail() -> Mail {
        let mut host = FakeHost::new();
        let body = host.body();
        let layout = host.elem(body, "div");
        host.set_anchor(Anchor::LayoutContent, layout);
        let sidebar = host.elem(body, "div");
        host.set_anchor(Anchor::Sidebar, sidebar);
        let list = host.elem(layout, "table");
        host.set_anchor(Anchor::MessageList, list);
        let form = host.elem(body, "form");
        host.set_anchor(Anchor::SearchForm, form);
        let input = host.elem(form, "input");
        host.set_anchor(Anchor::SearchInput, input);
        let select = host.elem(form, "select");
        host.set_anchor(Anchor::ScopeSelect, select);
        let stack = host.elem(body, "div");
        host.set_anchor(Anchor::ToastStack, stack);
        Mail {
            host,
            layout,
            sidebar,
            list,
            input,
            select,
            stack,
        }
    }

    fn started(host: &mut FakeHost) -> Overlay {
        let mut overlay = Overlay::new(OverlayConfig::default());
        overlay.start(host);
        overlay
    }

    fn add_photo(host: &mut FakeHost, layout: NodeId, name: &str) -> NodeId {
        let photo = host.elem(layout, "span");
        host.add_class(photo, "contact-photo");
        host.set_attr(photo, "data-name", name);
        photo
    }

    fn add_row(host: &mut FakeHost, list: NodeId, row_id: &str, high_priority: bool) -> NodeId {
        let row = host.elem(list, "tr");
        host.set_attr(row, "id", row_id);
        if high_priority {
            host.add_class(row, "priority-high");
        }
        let subject = host.elem(row, "td");
        host.add_class(subject, "subject");
        row
    }

    fn add_message_body(host: &mut FakeHost, layout: NodeId, height: f64) -> NodeId {
        let body = host.elem(layout, "div");
        host.set_scroll_height(body, height);
        host.set_anchor(Anchor::MessageBody, body);
        body
    }

    fn add_editor(host: &mut FakeHost, content: &str) -> NodeId {
        let body = host.body();
        let editor = host.elem(body, "textarea");
        host.set_value(editor, content);
        host.set_anchor(Anchor::ComposeEditor, editor);
        editor
    }

    fn count_id(host: &FakeHost, id: &str) -> usize {
        let root = host.anchor(Anchor::Root).unwrap();
        host.descendants(root)
            .into_iter()
            .filter(|&n| host.attr(n, "id").as_deref() == Some(id))
            .count()
    }

    fn action_button(host: &FakeHost, wanted: &Action) -> NodeId {
        let root = host.anchor(Anchor::Root).unwrap();
        host.find(root, |h, n| h.action_of(n).as_ref() == Some(wanted))
            .expect("no node carries the wanted action")
    }

    fn run_timers(overlay: &mut Overlay, host: &mut FakeHost, ms: u64) {
        for id in host.advance(ms) {
            overlay.on_timer(host, id);
        }
    }

    fn activate(overlay: &mut Overlay, host: &mut FakeHost, node: NodeId) {
        let action = host.action_of(node).expect("node has no action");
        overlay.on_activate(host, node, action);
    }

    // -- Harness self-checks --

    #[test]
    fn fake_insert_respects_placement() {
        let mut host = FakeHost::new();
        let body = host.body();
        let a = host.elem(body, "div");
        let b = host
            .insert(&NodeSpec::new("span"), Placement::Before(a))
            .unwrap();
        let c = host
            .insert(&NodeSpec::new("span"), Placement::Prepend(body))
            .unwrap();
        assert_eq!(host.descendants(body), alloc::vec![c, b, a]);
    }

    #[test]
    fn fake_remove_detaches_subtree() {
        let mut host = FakeHost::new();
        let body = host.body();
        let a = host.elem(body, "div");
        let b = host.elem(a, "span");
        host.remove(a);
        assert!(!host.is_attached(a));
        assert!(!host.is_attached(b));
        assert!(host.is_attached(body));
    }

    #[test]
    fn fake_timers_fire_in_order() {
        let mut host = FakeHost::new();
        let late = host.schedule_timer(500);
        let early = host.schedule_timer(100);
        assert_eq!(host.advance(1000), alloc::vec![early, late]);
        assert_eq!(host.pending_timers(), 0);
    }

    // -- Watch-driven enhancements --

    #[test]
    fn avatar_injected_once_per_photo() {
        let mut m = mail();
        let photo = add_photo(&mut m.host, m.layout, "Jane Doe");
        let mut overlay = started(&mut m.host);

        let avatars = m.host.nodes_with_class(catalog::AVATAR_CLASS);
        assert_eq!(avatars.len(), 1);
        assert_eq!(m.host.text(avatars[0]), "JD");
        assert_eq!(m.host.style_of(photo, "display").as_deref(), Some("none"));

        // A later mutation batch must not duplicate it.
        overlay.on_mutation(&mut m.host, Anchor::LayoutContent, dirty::CHILD_LIST);
        assert_eq!(m.host.nodes_with_class(catalog::AVATAR_CLASS).len(), 1);
    }

    #[test]
    fn avatar_skips_photos_with_src() {
        let mut m = mail();
        let photo = add_photo(&mut m.host, m.layout, "Jane Doe");
        m.host.set_attr(photo, "src", "/jane.png");
        let _overlay = started(&mut m.host);
        assert!(m.host.nodes_with_class(catalog::AVATAR_CLASS).is_empty());
    }

    #[test]
    fn priority_dot_lands_in_subject_cell() {
        let mut m = mail();
        let row = add_row(&mut m.host, m.list, "rcmrow1", true);
        add_row(&mut m.host, m.list, "rcmrow2", false);
        let mut overlay = started(&mut m.host);

        let dots = m.host.nodes_with_class("veneer-priority");
        assert_eq!(dots.len(), 1);
        let subject = m
            .host
            .find(row, |h, n| h.has_class(n, "subject"))
            .unwrap();
        assert_eq!(m.host.parent(dots[0]), Some(subject));

        overlay.on_mutation(&mut m.host, Anchor::MessageList, dirty::CHILD_LIST);
        assert_eq!(m.host.nodes_with_class("veneer-priority").len(), 1);
    }

    #[test]
    fn suggestion_panel_survives_body_replacement_as_singleton() {
        let mut m = mail();
        let body = add_message_body(&mut m.host, m.layout, 100.0);
        let mut overlay = started(&mut m.host);
        assert_eq!(count_id(&m.host, SUGGESTIONS_ID), 1);

        // The host swaps in a freshly loaded message body.
        m.host.remove(body);
        let replacement = add_message_body(&mut m.host, m.layout, 100.0);
        overlay.on_mutation(&mut m.host, Anchor::LayoutContent, dirty::CHILD_LIST);

        assert_eq!(count_id(&m.host, SUGGESTIONS_ID), 1);
        let panel = m.host.by_id(SUGGESTIONS_ID).unwrap();
        assert_eq!(m.host.parent(panel), m.host.parent(replacement));
    }

    #[test]
    fn suggestion_panel_offers_every_quick_reply() {
        let mut m = mail();
        add_message_body(&mut m.host, m.layout, 100.0);
        let _overlay = started(&mut m.host);
        let panel = m.host.by_id(SUGGESTIONS_ID).unwrap();
        let buttons = m
            .host
            .descendants(panel)
            .into_iter()
            .filter(|&n| matches!(m.host.action_of(n), Some(Action::QuickReply { .. })))
            .count();
        assert_eq!(buttons, catalog::QUICK_REPLIES.len());
    }

    #[test]
    fn tall_body_collapses_and_expands_on_demand() {
        let mut m = mail();
        let body = add_message_body(&mut m.host, m.layout, 900.0);
        let mut overlay = started(&mut m.host);

        assert!(m.host.has_class(body, COLLAPSED_CLASS));
        let button = action_button(&m.host, &Action::ExpandMessage { body });

        activate(&mut overlay, &mut m.host, button);
        assert!(!m.host.has_class(body, COLLAPSED_CLASS));
        assert!(!m.host.is_attached(button));

        // Expanding is permanent: a re-scan finds the body already handled.
        overlay.on_mutation(&mut m.host, Anchor::LayoutContent, dirty::CHILD_LIST);
        assert!(!m.host.has_class(body, COLLAPSED_CLASS));
    }

    #[test]
    fn short_body_stays_uncollapsed() {
        let mut m = mail();
        let body = add_message_body(&mut m.host, m.layout, 250.0);
        let _overlay = started(&mut m.host);
        assert!(!m.host.has_class(body, COLLAPSED_CLASS));
        assert!(m.host.nodes_with_class("veneer-expand-btn").is_empty());
    }

    #[test]
    fn toast_pushed_after_start_gets_restyled() {
        let mut m = mail();
        let mut overlay = started(&mut m.host);

        let toast = m.host.elem(m.stack, "div");
        overlay.on_mutation(&mut m.host, Anchor::ToastStack, dirty::CHILD_LIST);

        assert!(m.host.has_class(toast, TOAST_CLASS));
        assert_eq!(m.host.style_of(toast, "border-radius").as_deref(), Some("8px"));
    }

    #[test]
    fn row_actions_follow_hover() {
        let mut m = mail();
        let row = add_row(&mut m.host, m.list, "rcmrow7", false);
        let mut overlay = started(&mut m.host);
        assert!(m.host.nodes_with_class(ROW_ACTIONS_CLASS).is_empty());

        m.host.set_hovered(Some(row));
        overlay.on_hover_changed(&mut m.host);
        let wrappers = m.host.nodes_with_class(ROW_ACTIONS_CLASS);
        assert_eq!(wrappers.len(), 1);
        assert_eq!(m.host.parent(wrappers[0]), Some(row));

        // Moving the pointer into the injected buttons keeps the row
        // qualifying; nothing is torn down mid-hover.
        let button = m.host.descendants(wrappers[0])[0];
        m.host.set_hovered(Some(button));
        overlay.on_hover_changed(&mut m.host);
        assert_eq!(m.host.nodes_with_class(ROW_ACTIONS_CLASS).len(), 1);

        m.host.set_hovered(None);
        overlay.on_hover_changed(&mut m.host);
        assert!(m.host.nodes_with_class(ROW_ACTIONS_CLASS).is_empty());

        // Re-hovering re-injects; the processed mark was cleared.
        m.host.set_hovered(Some(row));
        overlay.on_hover_changed(&mut m.host);
        assert_eq!(m.host.nodes_with_class(ROW_ACTIONS_CLASS).len(), 1);
    }

    #[test]
    fn rows_without_id_never_get_hover_actions() {
        let mut m = mail();
        let row = m.host.elem(m.list, "tr");
        let mut overlay = started(&mut m.host);
        m.host.set_hovered(Some(row));
        overlay.on_hover_changed(&mut m.host);
        assert!(m.host.nodes_with_class(ROW_ACTIONS_CLASS).is_empty());
    }

    // -- Undo-send --

    #[test]
    fn undo_send_commits_after_the_window() {
        let mut m = mail();
        add_editor(&mut m.host, "hello");
        let mut overlay = started(&mut m.host);

        assert!(overlay.request_send(&mut m.host));
        assert_eq!(count_id(&m.host, UNDO_TOAST_ID), 1);
        assert!(m.host.commands.is_empty());

        run_timers(&mut overlay, &mut m.host, 8000);
        assert_eq!(m.host.commands, alloc::vec![(Command::Send, None)]);
        assert_eq!(count_id(&m.host, UNDO_TOAST_ID), 0);

        run_timers(&mut overlay, &mut m.host, 10_000);
        assert_eq!(m.host.commands.len(), 1);
    }

    #[test]
    fn undo_click_cancels_the_send() {
        let mut m = mail();
        add_editor(&mut m.host, "hello");
        let mut overlay = started(&mut m.host);
        assert!(overlay.request_send(&mut m.host));

        run_timers(&mut overlay, &mut m.host, 4000);
        let undo = action_button(&m.host, &Action::UndoSend);
        activate(&mut overlay, &mut m.host, undo);

        assert_eq!(count_id(&m.host, UNDO_TOAST_ID), 0);
        assert_eq!(
            m.host.notices,
            alloc::vec![("Send cancelled.".to_string(), NoticeKind::Confirmation)]
        );

        run_timers(&mut overlay, &mut m.host, 10_000);
        assert!(m.host.commands.is_empty());
    }

    #[test]
    fn cancellation_beats_an_in_flight_firing() {
        let mut m = mail();
        add_editor(&mut m.host, "hello");
        let mut overlay = started(&mut m.host);
        assert!(overlay.request_send(&mut m.host));

        // The platform timer comes due, but the undo click is handled
        // before the firing is delivered.
        let in_flight = m.host.advance(8000);
        assert_eq!(in_flight.len(), 1);
        let undo = action_button(&m.host, &Action::UndoSend);
        activate(&mut overlay, &mut m.host, undo);

        for id in in_flight {
            overlay.on_timer(&mut m.host, id);
        }
        assert!(m.host.commands.is_empty());
    }

    #[test]
    fn resend_supersedes_the_pending_window() {
        let mut m = mail();
        add_editor(&mut m.host, "hello");
        let mut overlay = started(&mut m.host);

        assert!(overlay.request_send(&mut m.host));
        run_timers(&mut overlay, &mut m.host, 4000);
        assert!(overlay.request_send(&mut m.host));
        assert_eq!(count_id(&m.host, UNDO_TOAST_ID), 1);

        // 4 s later the first window would have elapsed; only the second
        // timer exists and only it commits.
        run_timers(&mut overlay, &mut m.host, 4000);
        assert!(m.host.commands.is_empty());
        run_timers(&mut overlay, &mut m.host, 4000);
        assert_eq!(m.host.commands, alloc::vec![(Command::Send, None)]);
    }

    #[test]
    fn stale_timer_delivery_is_ignored() {
        let mut m = mail();
        let mut overlay = started(&mut m.host);
        overlay.on_timer(&mut m.host, TimerId::from_raw(991));
        assert!(m.host.commands.is_empty());
        assert!(m.host.notices.is_empty());
    }

    // -- Attachment reminder --

    #[test]
    fn declined_reminder_aborts_the_send() {
        let mut m = mail();
        add_editor(&mut m.host, "Please see attached invoice.");
        let list = m.host.elem(m.host.body(), "ul");
        m.host.set_anchor(Anchor::AttachmentList, list);
        m.host.set_confirm_answer(false);
        let mut overlay = started(&mut m.host);

        assert!(!overlay.request_send(&mut m.host));
        assert_eq!(m.host.confirms, alloc::vec![ATTACHMENT_WARNING.to_string()]);
        assert_eq!(count_id(&m.host, UNDO_TOAST_ID), 0);
        assert_eq!(m.host.pending_timers(), 0);
    }

    #[test]
    fn accepted_reminder_proceeds() {
        let mut m = mail();
        add_editor(&mut m.host, "the attachment is coming");
        let mut overlay = started(&mut m.host);
        assert!(overlay.request_send(&mut m.host));
        assert_eq!(m.host.confirms.len(), 1);
        assert_eq!(count_id(&m.host, UNDO_TOAST_ID), 1);
    }

    #[test]
    fn present_attachment_skips_the_prompt() {
        let mut m = mail();
        add_editor(&mut m.host, "see attached");
        let list = m.host.elem(m.host.body(), "ul");
        let _file = m.host.elem(list, "li");
        m.host.set_anchor(Anchor::AttachmentList, list);
        let mut overlay = started(&mut m.host);
        assert!(overlay.request_send(&mut m.host));
        assert!(m.host.confirms.is_empty());
    }

    // -- Search chips --

    #[test]
    fn chip_row_is_built_after_the_search_form() {
        let mut m = mail();
        let _overlay = started(&mut m.host);
        let row = m.host.by_id(CHIPS_ID).unwrap();
        assert_eq!(m.host.descendants(row).len(), 4);
        assert_eq!(
            m.host.attr(m.input, "placeholder").as_deref(),
            Some("Search conversations\u{2026}")
        );
    }

    #[test]
    fn chips_keep_at_most_one_active() {
        let mut m = mail();
        let mut overlay = started(&mut m.host);
        let from = action_button(&m.host, &Action::Chip(SearchScope::From));
        let subject = action_button(&m.host, &Action::Chip(SearchScope::Subject));

        activate(&mut overlay, &mut m.host, from);
        assert!(m.host.has_class(from, "active"));
        assert_eq!(m.host.value(m.select), "from");

        activate(&mut overlay, &mut m.host, subject);
        assert!(!m.host.has_class(from, "active"));
        assert!(m.host.has_class(subject, "active"));
        assert_eq!(m.host.value(m.select), "subject");

        // Re-activating toggles off without touching the host selector.
        activate(&mut overlay, &mut m.host, subject);
        assert!(!m.host.has_class(subject, "active"));
        assert_eq!(m.host.value(m.select), "subject");
    }

    #[test]
    fn date_chip_focuses_the_input_with_a_hint() {
        let mut m = mail();
        let mut overlay = started(&mut m.host);
        let date = action_button(&m.host, &Action::Chip(SearchScope::Date));
        activate(&mut overlay, &mut m.host, date);
        assert_eq!(m.host.focused(), Some(m.input));
        assert_eq!(
            m.host.attr(m.input, "placeholder").as_deref(),
            Some("e.g. 2024-01-15 or \"last week\"")
        );
    }

    #[test]
    fn preset_placeholder_is_left_alone() {
        let mut m = mail();
        m.host.set_attr(m.input, "placeholder", "Find");
        let _overlay = started(&mut m.host);
        assert_eq!(m.host.attr(m.input, "placeholder").as_deref(), Some("Find"));
    }

    // -- Shortcuts overlay --

    #[test]
    fn question_mark_toggles_the_shortcuts_overlay() {
        let mut m = mail();
        let mut overlay = started(&mut m.host);

        overlay.on_key(&mut m.host, Key::Char('?'));
        assert_eq!(count_id(&m.host, SHORTCUTS_ID), 1);

        // Pressing again replaces rather than stacks.
        overlay.on_key(&mut m.host, Key::Char('?'));
        assert_eq!(count_id(&m.host, SHORTCUTS_ID), 1);

        overlay.on_key(&mut m.host, Key::Escape);
        assert_eq!(count_id(&m.host, SHORTCUTS_ID), 0);
    }

    #[test]
    fn question_mark_in_an_editable_is_typing() {
        let mut m = mail();
        let mut overlay = started(&mut m.host);
        m.host.set_editable_focused(true);
        overlay.on_key(&mut m.host, Key::Char('?'));
        assert_eq!(count_id(&m.host, SHORTCUTS_ID), 0);
    }

    // -- Snooze picker --

    #[test]
    fn snooze_opens_near_its_trigger_and_confirms_a_pick() {
        let mut m = mail();
        let trigger = m.host.elem(m.host.body(), "button");
        let mut overlay = started(&mut m.host);

        overlay.on_activate(&mut m.host, trigger, Action::OpenSnooze);
        let popup = m.host.by_id(SNOOZE_ID).unwrap();
        assert_eq!(m.host.placements, alloc::vec![(popup, trigger)]);
        assert!(m.host.take_outside_arm());
        assert_eq!(
            m.host.descendants(popup).len(),
            catalog::SNOOZE_OPTIONS.len()
        );

        let pick = action_button(
            &m.host,
            &Action::SnoozePick {
                label: "Later today (2 h)".to_string(),
            },
        );
        activate(&mut overlay, &mut m.host, pick);
        assert_eq!(count_id(&m.host, SNOOZE_ID), 0);
        assert_eq!(
            m.host.notices,
            alloc::vec![(
                "Email snoozed: Later today (2 h)".to_string(),
                NoticeKind::Confirmation
            )]
        );
    }

    #[test]
    fn outside_click_dismisses_the_snooze_picker() {
        let mut m = mail();
        let trigger = m.host.elem(m.host.body(), "button");
        let mut overlay = started(&mut m.host);
        overlay.on_activate(&mut m.host, trigger, Action::OpenSnooze);
        overlay.on_outside_click(&mut m.host);
        assert_eq!(count_id(&m.host, SNOOZE_ID), 0);
    }

    // -- Gestures and sidebar --

    #[test]
    fn toggle_collapses_and_swipe_right_reopens() {
        let mut m = mail();
        m.host.set_viewport(600.0);
        let mut overlay = started(&mut m.host);

        overlay.on_activate(&mut m.host, m.sidebar, Action::ToggleSidebar);
        assert!(m.host.has_class(m.sidebar, SIDEBAR_COLLAPSED_CLASS));
        assert_eq!(m.host.style_of(m.sidebar, "width").as_deref(), Some("0"));

        overlay.on_touch_start(Point::new(100.0, 200.0));
        overlay.on_touch_end(&mut m.host, Point::new(170.0, 205.0));
        assert!(!m.host.has_class(m.sidebar, SIDEBAR_COLLAPSED_CLASS));
        assert_eq!(m.host.style_of(m.sidebar, "width"), None);
    }

    #[test]
    fn swipe_left_navigates_back_to_the_list() {
        let mut m = mail();
        m.host.set_viewport(600.0);
        let mut overlay = started(&mut m.host);
        overlay.on_touch_start(Point::new(200.0, 200.0));
        overlay.on_touch_end(&mut m.host, Point::new(130.0, 260.0));
        assert_eq!(m.host.commands, alloc::vec![(Command::List, None)]);
    }

    // Touch hardware on a desktop-width window: drags stay with the host.
    #[test]
    fn wide_viewports_ignore_swipes() {
        let mut m = mail();
        let mut overlay = started(&mut m.host);
        overlay.on_activate(&mut m.host, m.sidebar, Action::ToggleSidebar);

        overlay.on_touch_start(Point::new(100.0, 200.0));
        overlay.on_touch_end(&mut m.host, Point::new(170.0, 205.0));
        assert!(m.host.has_class(m.sidebar, SIDEBAR_COLLAPSED_CLASS));

        overlay.on_touch_start(Point::new(200.0, 200.0));
        overlay.on_touch_end(&mut m.host, Point::new(130.0, 205.0));
        assert!(m.host.commands.is_empty());
    }

    #[test]
    fn vertical_scroll_is_not_a_swipe() {
        let mut m = mail();
        m.host.set_viewport(600.0);
        let mut overlay = started(&mut m.host);
        overlay.on_activate(&mut m.host, m.sidebar, Action::ToggleSidebar);
        overlay.on_touch_start(Point::new(100.0, 100.0));
        overlay.on_touch_end(&mut m.host, Point::new(180.0, 300.0));
        assert!(m.host.has_class(m.sidebar, SIDEBAR_COLLAPSED_CLASS));
        assert!(m.host.commands.is_empty());
    }

    // -- Viewport-gated UI --

    #[test]
    fn narrow_viewport_gets_bar_and_fab() {
        let mut m = mail();
        m.host.set_viewport(400.0);
        let _overlay = started(&mut m.host);
        assert_eq!(count_id(&m.host, MOBILE_BAR_ID), 1);
        assert_eq!(count_id(&m.host, FAB_ID), 1);
        let bar = m.host.by_id(MOBILE_BAR_ID).unwrap();
        let buttons = m
            .host
            .descendants(bar)
            .into_iter()
            .filter(|&n| m.host.action_of(n).is_some())
            .count();
        assert_eq!(buttons, catalog::MOBILE_ITEMS.len());
    }

    #[test]
    fn tablet_viewport_gets_only_the_fab() {
        let mut m = mail();
        m.host.set_viewport(600.0);
        let _overlay = started(&mut m.host);
        assert_eq!(count_id(&m.host, MOBILE_BAR_ID), 0);
        assert_eq!(count_id(&m.host, FAB_ID), 1);
    }

    #[test]
    fn compose_page_suppresses_the_fab() {
        let mut m = mail();
        m.host.set_viewport(600.0);
        let body = m.host.body();
        m.host.add_class(body, "action-compose");
        let _overlay = started(&mut m.host);
        assert_eq!(count_id(&m.host, FAB_ID), 0);
    }

    #[test]
    fn desktop_viewport_gets_neither() {
        let mut m = mail();
        let _overlay = started(&mut m.host);
        assert_eq!(count_id(&m.host, MOBILE_BAR_ID), 0);
        assert_eq!(count_id(&m.host, FAB_ID), 0);
    }

    // -- Quick reply and theme --

    #[test]
    fn quick_reply_fills_the_editor_after_the_delay() {
        let mut m = mail();
        add_message_body(&mut m.host, m.layout, 100.0);
        let editor = add_editor(&mut m.host, "Original draft");
        let mut overlay = started(&mut m.host);

        let button = action_button(
            &m.host,
            &Action::QuickReply {
                phrase: "\u{2714} Received".to_string(),
            },
        );
        activate(&mut overlay, &mut m.host, button);
        assert_eq!(m.host.commands.len(), 1);
        assert_eq!(m.host.commands[0].0, Command::Reply);
        assert_eq!(m.host.value(editor), "Original draft");

        run_timers(&mut overlay, &mut m.host, 400);
        assert_eq!(m.host.value(editor), "\u{2714} Received\n\nOriginal draft");
        assert_eq!(m.host.focused(), Some(editor));
    }

    #[test]
    fn theme_attribute_syncs_after_the_toggle_settles() {
        let mut m = mail();
        let root = m.host.anchor(Anchor::Root).unwrap();
        let mut overlay = started(&mut m.host);

        m.host.add_class(root, "dark-mode");
        overlay.on_theme_toggled(&mut m.host);
        assert_eq!(m.host.attr(root, "data-veneer-theme"), None);
        run_timers(&mut overlay, &mut m.host, 50);
        assert_eq!(m.host.attr(root, "data-veneer-theme").as_deref(), Some("dark"));

        m.host.remove_class(root, "dark-mode");
        overlay.on_theme_toggled(&mut m.host);
        run_timers(&mut overlay, &mut m.host, 50);
        assert_eq!(
            m.host.attr(root, "data-veneer-theme").as_deref(),
            Some("light")
        );
    }

    // -- Lifecycle --

    #[test]
    fn entry_points_are_inert_before_start() {
        let mut m = mail();
        let mut overlay = Overlay::new(OverlayConfig::default());
        overlay.on_key(&mut m.host, Key::Char('?'));
        assert!(!overlay.request_send(&mut m.host));
        overlay.on_mutation(&mut m.host, Anchor::LayoutContent, dirty::CHILD_LIST);
        assert_eq!(count_id(&m.host, SHORTCUTS_ID), 0);
        assert_eq!(count_id(&m.host, CHIPS_ID), 0);
    }

    #[test]
    fn stop_removes_injected_ui_and_goes_idle() {
        let mut m = mail();
        let row = add_row(&mut m.host, m.list, "rcmrow1", false);
        add_editor(&mut m.host, "hello");
        let mut overlay = started(&mut m.host);
        m.host.set_hovered(Some(row));
        overlay.on_hover_changed(&mut m.host);
        assert!(overlay.request_send(&mut m.host));

        overlay.stop(&mut m.host);
        assert_eq!(count_id(&m.host, CHIPS_ID), 0);
        assert_eq!(count_id(&m.host, UNDO_TOAST_ID), 0);
        assert!(m.host.nodes_with_class(ROW_ACTIONS_CLASS).is_empty());
        assert_eq!(m.host.pending_timers(), 0);

        // Idle again: no scans, no sends.
        run_timers(&mut overlay, &mut m.host, 10_000);
        assert!(m.host.commands.is_empty());
        assert!(!overlay.request_send(&mut m.host));
    }

    #[test]
    fn stop_then_start_rebuilds_the_overlay() {
        let mut m = mail();
        let row = add_row(&mut m.host, m.list, "rcmrow1", false);
        let mut overlay = started(&mut m.host);
        overlay.stop(&mut m.host);
        assert_eq!(count_id(&m.host, CHIPS_ID), 0);

        overlay.start(&mut m.host);
        assert_eq!(count_id(&m.host, CHIPS_ID), 1);

        // The watch loop is live again.
        m.host.set_hovered(Some(row));
        overlay.on_hover_changed(&mut m.host);
        assert_eq!(m.host.nodes_with_class(ROW_ACTIONS_CLASS).len(), 1);
    }

    #[test]
    fn missing_anchors_degrade_to_nothing() {
        let mut host = FakeHost::new();
        let mut overlay = Overlay::new(OverlayConfig::default());
        overlay.start(&mut host);
        assert_eq!(count_id(&host, CHIPS_ID), 0);
        overlay.on_mutation(&mut host, Anchor::LayoutContent, dirty::CHILD_LIST);
        overlay.stop(&mut host);
    }

    #[test]
    fn observed_roots_cover_the_catalog() {
        let mut m = mail();
        let overlay = started(&mut m.host);
        assert_eq!(
            overlay.observed_roots(),
            alloc::vec![Anchor::LayoutContent, Anchor::ToastStack, Anchor::MessageList]
        );
    }

    // -- Engine behavior via custom watches --

    #[derive(Debug)]
    struct AlwaysFails;

    impl Enhancement for AlwaysFails {
        fn id(&self) -> &'static str {
            "broken"
        }

        fn root(&self) -> Anchor {
            Anchor::Body
        }

        fn matches(&self, dom: &dyn HostDocument, node: NodeId) -> bool {
            dom.has_class(node, "needy")
        }

        fn build(
            &mut self,
            _dom: &mut dyn HostDocument,
            _node: NodeId,
        ) -> Result<Option<NodeId>, BuildError> {
            Err(BuildError::new("boom"))
        }
    }

    #[derive(Debug)]
    struct AddsBadge;

    impl Enhancement for AddsBadge {
        fn id(&self) -> &'static str {
            "badge"
        }

        fn root(&self) -> Anchor {
            Anchor::Body
        }

        fn matches(&self, dom: &dyn HostDocument, node: NodeId) -> bool {
            dom.has_class(node, "needy")
        }

        fn build(
            &mut self,
            dom: &mut dyn HostDocument,
            node: NodeId,
        ) -> Result<Option<NodeId>, BuildError> {
            dom.add_class(node, "badged");
            Ok(None)
        }
    }

    #[test]
    fn build_failure_is_isolated_and_not_retried() {
        let mut host = FakeHost::new();
        let target = host.elem(host.body(), "div");
        host.add_class(target, "needy");

        let mut injector = WatchedInjector::new();
        injector.register(Box::new(AlwaysFails));
        injector.register(Box::new(AddsBadge));

        let mut sink = RecordingSink::default();
        injector.scan_all(&mut host, &mut Tracer::new(Some(&mut sink)));

        assert_eq!(sink.build_failures, alloc::vec![("broken", "boom".to_string())]);
        assert!(host.has_class(target, "badged"));

        // The failed node was marked before building; the failure is not
        // retried on the next pass.
        injector.note_mutation(Anchor::Body, dirty::CHILD_LIST);
        injector.process(&mut host, &mut Tracer::new(Some(&mut sink)));
        assert_eq!(sink.build_failures.len(), 1);
    }

    #[test]
    fn watches_scan_in_registration_order() {
        let mut host = FakeHost::new();
        let mut injector = WatchedInjector::new();
        injector.register(Box::new(AddsBadge));
        injector.register(Box::new(AlwaysFails));

        let mut sink = RecordingSink::default();
        injector.scan_all(&mut host, &mut Tracer::new(Some(&mut sink)));
        let order: Vec<&'static str> = sink.scans.iter().map(|&(d, _)| d).collect();
        assert_eq!(order, alloc::vec!["badge", "broken"]);
    }

    #[test]
    #[should_panic(expected = "duplicate descriptor id")]
    fn duplicate_descriptor_ids_are_rejected() {
        let mut injector = WatchedInjector::new();
        injector.register(Box::new(AddsBadge));
        injector.register(Box::new(AddsBadge));
    }

    #[test]
    fn swipe_threshold_is_configurable() {
        let mut m = mail();
        m.host.set_viewport(600.0);
        let mut overlay = Overlay::new(OverlayConfig {
            swipe_threshold: 30.0,
            ..OverlayConfig::default()
        });
        overlay.start(&mut m.host);
        overlay.on_touch_start(Point::new(100.0, 100.0));
        overlay.on_touch_end(&mut m.host, Point::new(60.0, 100.0));
        assert_eq!(m.host.commands, alloc::vec![(Command::List, None)]);
    }
}
