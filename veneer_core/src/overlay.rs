// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The overlay application context.
//!
//! [`Overlay`] is constructed once at startup and wired to a platform
//! adapter by the backend (or the test harness): the adapter delivers
//! mutation batches, input events, and timer firings into the `on_*` entry
//! points, always passing the host by reference — the overlay owns no
//! platform state. The catalog is registered at construction;
//! [`start`](Overlay::start) injects the static UI and runs the initial
//! synchronous scan, and [`stop`](Overlay::stop) is the teardown hook that
//! removes everything the overlay injected (adapters disconnect their
//! observers and listeners alongside it).
//!
//! All entry points are no-ops until `start` and after `stop`; a stopped
//! overlay can be started again.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Point;
use understory_dirty::Channel;

use crate::catalog;
use crate::dirty;
use crate::gesture::{GestureRecognizer, SwipeDirection};
use crate::host::{
    Action, Anchor, Command, Host, Key, NodeId, NoticeKind, SearchScope, TimerId,
};
use crate::timer::TimedAction;
use crate::toggle::ToggleGroup;
use crate::trace::{CommandEvent, GestureEvent, TimerEvent, TraceSink, Tracer};
use crate::watch::WatchedInjector;

/// Tunable overlay behavior. `Default` matches the host skin's values.
#[derive(Clone, Copy, Debug)]
pub struct OverlayConfig {
    /// Minimum horizontal displacement for a swipe, in DIP.
    pub swipe_threshold: f64,
    /// Undo window before a queued send commits, in milliseconds.
    pub undo_delay_ms: u32,
    /// Delay before a quick-reply phrase is filled into the editor.
    pub quick_fill_delay_ms: u32,
    /// Delay before the theme attribute is synced after a toggle.
    pub theme_sync_delay_ms: u32,
    /// Scroll height above which a message body is collapsed, in CSS px.
    pub collapse_min_height: f64,
    /// Widest viewport that still gets the mobile bottom bar, in CSS px.
    pub mobile_bar_max_width: f64,
    /// Widest viewport that still gets the floating compose button.
    pub fab_max_width: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: crate::gesture::DEFAULT_SWIPE_THRESHOLD,
            undo_delay_ms: 8000,
            quick_fill_delay_ms: 400,
            theme_sync_delay_ms: 50,
            collapse_min_height: 400.0,
            mobile_bar_max_width: 480.0,
            fab_max_width: 768.0,
        }
    }
}

/// The overlay: catalog, interaction state, and event entry points.
#[derive(Debug)]
pub struct Overlay {
    config: OverlayConfig,
    injector: WatchedInjector,
    gesture: GestureRecognizer,
    chips: ToggleGroup<SearchScope>,
    chip_nodes: Vec<(SearchScope, NodeId)>,
    undo: TimedAction,
    quick_fill: TimedAction,
    theme_sync: TimedAction,
    pending_fill: Option<String>,
    snooze_open: bool,
    started: bool,
    sink: Option<Box<dyn TraceSink>>,
}

impl Overlay {
    /// Creates an overlay with the given configuration and registers the
    /// catalog. Nothing touches the document until [`start`](Self::start).
    #[must_use]
    pub fn new(config: OverlayConfig) -> Self {
        let mut injector = WatchedInjector::new();
        catalog::register_all(&mut injector, &config);
        Self {
            config,
            injector,
            gesture: GestureRecognizer::new(config.swipe_threshold),
            chips: ToggleGroup::new([
                SearchScope::From,
                SearchScope::Subject,
                SearchScope::Attachment,
                SearchScope::Date,
            ]),
            chip_nodes: Vec::new(),
            undo: TimedAction::new(),
            quick_fill: TimedAction::new(),
            theme_sync: TimedAction::new(),
            pending_fill: None,
            snooze_open: false,
            started: false,
            sink: None,
        }
    }

    /// Installs a trace sink.
    #[must_use]
    pub fn with_trace(mut self, sink: Box<dyn TraceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Returns the anchors the adapter must observe for mutations.
    #[must_use]
    pub fn observed_roots(&self) -> Vec<Anchor> {
        self.injector.observed_roots()
    }

    /// Injects the static UI and runs the initial synchronous scan.
    ///
    /// Valid again after [`stop`](Self::stop): the host keeps navigating in
    /// place, and a stopped overlay can be re-attached to the same document.
    pub fn start(&mut self, host: &mut dyn Host) {
        if self.started {
            return;
        }

        // Static, once-per-document UI.
        if let Some(input) = host.anchor(Anchor::SearchInput) {
            let current = host.attr(input, "placeholder");
            if current.as_deref().is_none_or(str::is_empty) {
                host.set_attr(input, "placeholder", "Search conversations\u{2026}");
            }
        }
        self.chip_nodes = catalog::build_search_chips(host);
        if host.viewport_width() <= self.config.mobile_bar_max_width {
            catalog::build_mobile_bar(host);
        }
        let on_compose_page = host
            .anchor(Anchor::Body)
            .is_some_and(|body| host.has_class(body, "action-compose"));
        if host.viewport_width() <= self.config.fab_max_width && !on_compose_page {
            catalog::build_fab(host);
        }

        let Self { injector, sink, .. } = self;
        let mut tracer = Tracer::new(sink.as_deref_mut());
        injector.scan_all(host, &mut tracer);
        self.started = true;
    }

    /// Tears down everything the overlay injected and goes idle.
    pub fn stop(&mut self, host: &mut dyn Host) {
        if !self.started {
            return;
        }
        for (slot, action) in [
            ("undo-send", &mut self.undo),
            ("quick-fill", &mut self.quick_fill),
            ("theme-sync", &mut self.theme_sync),
        ] {
            if let Some(id) = action.cancel(host) {
                Tracer::new(self.sink.as_deref_mut()).timer_cancelled(TimerEvent { slot, id });
            }
        }
        self.pending_fill = None;
        self.snooze_open = false;
        for id in [
            catalog::UNDO_TOAST_ID,
            catalog::SHORTCUTS_ID,
            catalog::SNOOZE_ID,
            catalog::CHIPS_ID,
            catalog::MOBILE_BAR_ID,
            catalog::FAB_ID,
            catalog::SUGGESTIONS_ID,
        ] {
            catalog::remove_singleton(host, id);
        }
        self.chip_nodes.clear();
        let Self { injector, sink, .. } = self;
        let mut tracer = Tracer::new(sink.as_deref_mut());
        injector.teardown_all(host, &mut tracer);
        self.started = false;
    }

    /// Delivers a host mutation batch under `root` on `channel`.
    pub fn on_mutation(&mut self, host: &mut dyn Host, root: Anchor, channel: Channel) {
        if !self.started {
            return;
        }
        self.injector.note_mutation(root, channel);
        let Self { injector, sink, .. } = self;
        let mut tracer = Tracer::new(sink.as_deref_mut());
        injector.process(host, &mut tracer);
    }

    /// Delivers a pointer hover transition.
    ///
    /// Hover changes which rows qualify for the removable hover-actions
    /// watch, so they re-scan the message list like an attribute mutation.
    pub fn on_hover_changed(&mut self, host: &mut dyn Host) {
        self.on_mutation(host, Anchor::MessageList, dirty::ATTRIBUTES);
    }

    /// Delivers a keyboard event.
    pub fn on_key(&mut self, host: &mut dyn Host, key: Key) {
        if !self.started {
            return;
        }
        match key {
            Key::Char('?') if !host.editable_focused() => {
                catalog::build_shortcuts_overlay(host);
            }
            Key::Escape => {
                catalog::remove_singleton(host, catalog::SHORTCUTS_ID);
                self.hide_snooze(host);
            }
            Key::Char(_) => {}
        }
    }

    /// Delivers a touch start (first touch point only).
    pub fn on_touch_start(&mut self, point: Point) {
        if !self.started {
            return;
        }
        self.gesture.on_start(point);
    }

    /// Delivers a touch end and acts on the classified swipe.
    ///
    /// Swipe-right expands the sidebar — the same operation as the manual
    /// toggle. Swipe-left triggers the host's back-to-list navigation
    /// regardless of view. Swipes are honored only on viewports at or below
    /// the compose-button breakpoint; wider layouts keep horizontal drags
    /// for the host's own handling.
    pub fn on_touch_end(&mut self, host: &mut dyn Host, point: Point) {
        if !self.started {
            return;
        }
        let direction = self.gesture.on_end(point);
        if host.viewport_width() > self.config.fab_max_width {
            return;
        }
        let Self { sink, .. } = self;
        let mut tracer = Tracer::new(sink.as_deref_mut());
        tracer.gesture(GestureEvent { direction });
        match direction {
            SwipeDirection::Right => expand_sidebar(host),
            SwipeDirection::Left => {
                tracer.command(CommandEvent {
                    command: Command::List,
                });
                host.invoke(Command::List, None);
            }
            SwipeDirection::None => {}
        }
    }

    /// Delivers an activation (click) of an injected node.
    pub fn on_activate(&mut self, host: &mut dyn Host, node: NodeId, action: Action) {
        if !self.started {
            return;
        }
        match action {
            Action::Invoke(command) => {
                let Self { sink, .. } = self;
                Tracer::new(sink.as_deref_mut()).command(CommandEvent { command });
                host.invoke(command, Some(node));
            }
            Action::ToggleSidebar => {
                let Some(sidebar) = host.anchor(Anchor::Sidebar) else {
                    return;
                };
                if host.has_class(sidebar, catalog::SIDEBAR_COLLAPSED_CLASS) {
                    expand_sidebar(host);
                } else {
                    host.add_class(sidebar, catalog::SIDEBAR_COLLAPSED_CLASS);
                    host.set_style(sidebar, "width", "0");
                    host.set_style(sidebar, "min-width", "0");
                    host.set_style(sidebar, "overflow", "hidden");
                }
            }
            Action::Chip(scope) => self.on_chip(host, scope),
            Action::QuickReply { phrase } => {
                let Self { sink, .. } = self;
                Tracer::new(sink.as_deref_mut()).command(CommandEvent {
                    command: Command::Reply,
                });
                host.invoke(Command::Reply, Some(node));
                self.pending_fill = Some(phrase);
                let id = self
                    .quick_fill
                    .schedule(host, self.config.quick_fill_delay_ms);
                self.trace_scheduled("quick-fill", id);
            }
            Action::ExpandMessage { body } => {
                host.remove_class(body, catalog::COLLAPSED_CLASS);
                host.remove(node);
            }
            Action::UndoSend => {
                if let Some(id) = self.undo.cancel(host) {
                    self.trace_cancelled("undo-send", id);
                    catalog::remove_singleton(host, catalog::UNDO_TOAST_ID);
                    host.notify("Send cancelled.", NoticeKind::Confirmation);
                }
            }
            Action::OpenSnooze => {
                catalog::build_snooze_popup(host, node);
                self.snooze_open = true;
            }
            Action::SnoozePick { label } => {
                self.hide_snooze(host);
                host.notify(&format!("Email snoozed: {label}"), NoticeKind::Confirmation);
            }
            Action::DismissShortcuts => {
                catalog::remove_singleton(host, catalog::SHORTCUTS_ID);
            }
        }
    }

    /// Delivers the armed outside-click dismissal.
    pub fn on_outside_click(&mut self, host: &mut dyn Host) {
        if !self.started {
            return;
        }
        self.hide_snooze(host);
    }

    /// Delivers a click on the host's theme toggle. The attribute sync runs
    /// after a short delay so the host's own class flip lands first.
    pub fn on_theme_toggled(&mut self, host: &mut dyn Host) {
        if !self.started {
            return;
        }
        let id = self.theme_sync.schedule(host, self.config.theme_sync_delay_ms);
        self.trace_scheduled("theme-sync", id);
    }

    /// Queues a send behind the undo window.
    ///
    /// Runs the attachment reminder first: a keyword in the compose body
    /// with an empty attachment list asks the host to confirm, and a
    /// declined confirm aborts (returns `false`, no toast, no timer). A
    /// send issued while one is pending supersedes it.
    pub fn request_send(&mut self, host: &mut dyn Host) -> bool {
        if !self.started {
            return false;
        }
        if self.needs_attachment_reminder(host) && !host.confirm(catalog::ATTACHMENT_WARNING) {
            return false;
        }
        catalog::build_undo_toast(host);
        let id = self.undo.schedule(host, self.config.undo_delay_ms);
        self.trace_scheduled("undo-send", id);
        true
    }

    /// Delivers a fired platform timer.
    pub fn on_timer(&mut self, host: &mut dyn Host, fired: TimerId) {
        if !self.started {
            return;
        }
        if self.undo.complete(fired) {
            self.trace_fired("undo-send", fired);
            catalog::remove_singleton(host, catalog::UNDO_TOAST_ID);
            let Self { sink, .. } = self;
            Tracer::new(sink.as_deref_mut()).command(CommandEvent {
                command: Command::Send,
            });
            host.invoke(Command::Send, None);
        } else if self.quick_fill.complete(fired) {
            self.trace_fired("quick-fill", fired);
            if let Some(phrase) = self.pending_fill.take() {
                fill_editor(host, &phrase);
            }
        } else if self.theme_sync.complete(fired) {
            self.trace_fired("theme-sync", fired);
            sync_theme_attr(host);
        } else {
            let Self { sink, .. } = self;
            Tracer::new(sink.as_deref_mut()).timer_stale(TimerEvent {
                slot: "unknown",
                id: fired,
            });
        }
    }

    // -- Internals --

    fn on_chip(&mut self, host: &mut dyn Host, scope: SearchScope) {
        let transition = self.chips.activate(scope);
        // Visible deactivation happens before the activation effect.
        if let Some(previous) = transition.deactivated
            && let Some(&(_, button)) = self.chip_nodes.iter().find(|(s, _)| *s == previous)
        {
            host.remove_class(button, "active");
        }
        let Some(scope) = transition.activated else {
            return;
        };
        if let Some(&(_, button)) = self.chip_nodes.iter().find(|(s, _)| *s == scope) {
            host.add_class(button, "active");
        }
        if let Some(select) = host.anchor(Anchor::ScopeSelect) {
            host.set_value(select, scope.as_value());
        }
        if scope == SearchScope::Date
            && let Some(input) = host.anchor(Anchor::SearchInput)
        {
            host.focus(input);
            host.set_attr(input, "placeholder", "e.g. 2024-01-15 or \"last week\"");
        }
    }

    fn hide_snooze(&mut self, host: &mut dyn Host) {
        if self.snooze_open {
            catalog::remove_singleton(host, catalog::SNOOZE_ID);
            self.snooze_open = false;
        }
    }

    fn needs_attachment_reminder(&self, host: &dyn Host) -> bool {
        let Some(editor) = host.anchor(Anchor::ComposeEditor) else {
            return false;
        };
        let body = if host.tag_name(editor) == "textarea" {
            host.value(editor)
        } else {
            host.text(editor)
        };
        let body = body.to_lowercase();
        let mentions_attachment = catalog::ATTACHMENT_KEYWORDS
            .iter()
            .any(|keyword| body.contains(keyword));
        let has_attachment = host
            .anchor(Anchor::AttachmentList)
            .is_some_and(|list| host.child_count(list) > 0);
        mentions_attachment && !has_attachment
    }

    fn trace_scheduled(&mut self, slot: &'static str, id: TimerId) {
        let Self { sink, .. } = self;
        Tracer::new(sink.as_deref_mut()).timer_scheduled(TimerEvent { slot, id });
    }

    fn trace_cancelled(&mut self, slot: &'static str, id: TimerId) {
        let Self { sink, .. } = self;
        Tracer::new(sink.as_deref_mut()).timer_cancelled(TimerEvent { slot, id });
    }

    fn trace_fired(&mut self, slot: &'static str, id: TimerId) {
        let Self { sink, .. } = self;
        Tracer::new(sink.as_deref_mut()).timer_fired(TimerEvent { slot, id });
    }
}

/// Expands the folder sidebar. Shared by the manual toggle and the
/// swipe-right gesture — one operation, two triggers.
fn expand_sidebar(host: &mut dyn Host) {
    let Some(sidebar) = host.anchor(Anchor::Sidebar) else {
        return;
    };
    host.remove_class(sidebar, catalog::SIDEBAR_COLLAPSED_CLASS);
    host.set_style(sidebar, "width", "");
    host.set_style(sidebar, "min-width", "");
    host.set_style(sidebar, "overflow", "");
}

/// Prepends a quick-reply phrase into the compose editor and focuses it.
fn fill_editor(host: &mut dyn Host, phrase: &str) {
    let Some(editor) = host.anchor(Anchor::ComposeEditor) else {
        return;
    };
    if host.tag_name(editor) == "textarea" {
        let existing = host.value(editor);
        host.set_value(editor, &format!("{phrase}\n\n{existing}"));
    } else {
        let existing = host.text(editor);
        host.set_text(editor, &format!("{phrase}\n\n{existing}"));
    }
    host.focus(editor);
}

/// Mirrors the host's dark-mode class into the overlay theme attribute.
fn sync_theme_attr(host: &mut dyn Host) {
    let Some(root) = host.anchor(Anchor::Root) else {
        return;
    };
    let theme = if host.has_class(root, "dark-mode") {
        "dark"
    } else {
        "light"
    };
    host.set_attr(root, "data-veneer-theme", theme);
}
