// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The enhancement catalog.
//!
//! Every DOM-driven feature is one [`Enhancement`] consumed by the
//! [`WatchedInjector`](crate::watch::WatchedInjector); event-driven features
//! (chips, shortcuts, snooze, undo toast, mobile bar, FAB) are markup
//! builders the [`Overlay`](crate::overlay::Overlay) wires to direct
//! listeners. None of this introduces new engine algorithms — it is the
//! declarative layer on top of them.
//!
//! Injected markup always carries a `veneer-` class or id: host styling
//! targets it, and the engine's duplicate prevention keys on it. Singular
//! UIs go through [`replace_singleton`], which removes any existing
//! instance with the same id before inserting.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::host::{
    Action, Anchor, Command, HostDocument, NodeId, NodeSpec, Placement, SearchScope,
};
use crate::identity;
use crate::overlay::OverlayConfig;
use crate::watch::{BuildError, Enhancement, WatchedInjector};

// -- Injected ids (singular UIs) --

/// Id of the quick-reply suggestion panel.
pub const SUGGESTIONS_ID: &str = "veneer-suggestions";
/// Id of the undo-send toast.
pub const UNDO_TOAST_ID: &str = "veneer-undo-toast";
/// Id of the keyboard shortcuts overlay.
pub const SHORTCUTS_ID: &str = "veneer-shortcuts-overlay";
/// Id of the snooze picker popup.
pub const SNOOZE_ID: &str = "veneer-snooze-popup";
/// Id of the search chip row.
pub const CHIPS_ID: &str = "veneer-search-chips";
/// Id of the mobile bottom action bar.
pub const MOBILE_BAR_ID: &str = "veneer-mobile-bar";
/// Id of the floating compose button.
pub const FAB_ID: &str = "veneer-fab";

// -- Injected classes (per-node enhancements) --

/// Class of an injected avatar circle.
pub const AVATAR_CLASS: &str = "veneer-avatar";
/// Class of the row hover action wrapper.
pub const ROW_ACTIONS_CLASS: &str = "veneer-row-actions";
/// Class of a restyled host toast.
pub const TOAST_CLASS: &str = "veneer-toast";
/// Class marking a collapsed long message body.
pub const COLLAPSED_CLASS: &str = "veneer-message-collapsed";
/// Class marking the collapsed folder sidebar.
pub const SIDEBAR_COLLAPSED_CLASS: &str = "veneer-collapsed";

/// Quick-reply phrases offered in the suggestion panel.
pub const QUICK_REPLIES: [&str; 5] = [
    "\u{2714} Received",
    "\u{2714} Approved",
    "\u{2714} Noted",
    "\u{2714} Will review",
    "\u{1F4C5} Schedule meeting",
];

/// Static shortcut table shown by the `?` overlay. No user data.
pub const SHORTCUTS: [(&str, &str); 8] = [
    ("C", "Compose new message"),
    ("R", "Reply"),
    ("F", "Forward"),
    ("D", "Delete"),
    ("U", "Mark as unread"),
    ("S", "Snooze email"),
    ("/", "Search"),
    ("?", "Show shortcuts"),
];

/// Snooze picker options: label plus duration in hours.
pub const SNOOZE_OPTIONS: [(&str, u32); 4] = [
    ("Later today (2 h)", 2),
    ("Tomorrow morning", 18),
    ("Next week", 168),
    ("In 3 days", 72),
];

/// Mobile bar items: label, icon, host command.
pub const MOBILE_ITEMS: [(&str, &str, Command); 5] = [
    ("Inbox", "\u{1F4E5}", Command::Mail),
    ("Compose", "\u{270F}\u{FE0F}", Command::Compose),
    ("Search", "\u{1F50D}", Command::Search),
    ("Contacts", "\u{1F464}", Command::Addressbook),
    ("Settings", "\u{2699}\u{FE0F}", Command::Settings),
];

/// Row hover quick-actions: icon, label, host command.
pub const ROW_ACTIONS: [(&str, &str, Command); 4] = [
    ("\u{21A9}", "Reply", Command::Reply),
    ("\u{2192}", "Forward", Command::Forward),
    ("\u{1F5C4}", "Archive", Command::Archive),
    ("\u{2B50}", "Star", Command::Flag),
];

/// Compose-body phrases that suggest an attachment was intended.
pub const ATTACHMENT_KEYWORDS: [&str; 6] = [
    "attached",
    "attachment",
    "document",
    "invoice",
    "see file",
    "find enclosed",
];

/// Warning shown when a keyword is present but nothing is attached.
pub const ATTACHMENT_WARNING: &str =
    "It looks like you mentioned an attachment but haven't attached any file.\n\nSend anyway?";

/// Registers the catalog's watch-driven enhancements, in evaluation order.
pub fn register_all(injector: &mut WatchedInjector, config: &OverlayConfig) {
    injector.register(Box::new(SenderAvatars));
    injector.register(Box::new(ToastRestyle));
    injector.register(Box::new(SuggestionPanel));
    injector.register(Box::new(LongMessageCollapse {
        min_height: config.collapse_min_height,
    }));
    injector.register(Box::new(PriorityDots));
    injector.register(Box::new(RowHoverActions));
}

/// Inserts a singular UI, removing any existing instance with its id first.
///
/// Returns the inserted node, or `None` if the placement target is gone.
pub fn replace_singleton(
    dom: &mut dyn HostDocument,
    spec: &NodeSpec,
    place: Placement,
) -> Option<NodeId> {
    if let Some(id) = spec.id
        && let Some(existing) = dom.by_id(id)
    {
        dom.remove(existing);
    }
    dom.insert(spec, place)
}

/// Removes a singular UI by id, if present.
pub fn remove_singleton(dom: &mut dyn HostDocument, id: &str) {
    if let Some(node) = dom.by_id(id) {
        dom.remove(node);
    }
}

// ---------------------------------------------------------------------------
// Watch-driven enhancements
// ---------------------------------------------------------------------------

/// Initials-circle avatars for senders without a contact photo.
#[derive(Debug)]
struct SenderAvatars;

impl Enhancement for SenderAvatars {
    fn id(&self) -> &'static str {
        "avatar"
    }

    fn root(&self) -> Anchor {
        Anchor::LayoutContent
    }

    fn matches(&self, dom: &dyn HostDocument, node: NodeId) -> bool {
        dom.has_class(node, "contact-photo") && dom.attr(node, "src").is_none()
    }

    fn build(
        &mut self,
        dom: &mut dyn HostDocument,
        node: NodeId,
    ) -> Result<Option<NodeId>, BuildError> {
        let name = dom
            .attr(node, "data-name")
            .or_else(|| dom.attr(node, "title"))
            .unwrap_or_else(|| String::from("?"));
        dom.set_style(node, "display", "none");
        let avatar = NodeSpec::new("span")
            .class(AVATAR_CLASS)
            .text(identity::initials(&name))
            .style("display", "inline-flex")
            .style("align-items", "center")
            .style("justify-content", "center")
            .style("width", "40px")
            .style("height", "40px")
            .style("border-radius", "50%")
            .style("background", identity::color(&name))
            .style("color", "#fff")
            .style("font-weight", "700")
            .style("font-size", "0.9rem")
            .style("flex-shrink", "0")
            .style("font-family", "inherit");
        let inserted = dom
            .insert(&avatar, Placement::After(node))
            .ok_or_else(|| BuildError::new("photo element lost its parent"))?;
        Ok(Some(inserted))
    }
}

/// Restyles host toasts as they are pushed onto the stack.
#[derive(Debug)]
struct ToastRestyle;

impl Enhancement for ToastRestyle {
    fn id(&self) -> &'static str {
        "toast"
    }

    fn root(&self) -> Anchor {
        Anchor::ToastStack
    }

    fn matches(&self, dom: &dyn HostDocument, node: NodeId) -> bool {
        // Direct children of the stack only.
        dom.anchor(Anchor::ToastStack)
            .is_some_and(|stack| dom.parent(node) == Some(stack))
    }

    fn build(
        &mut self,
        dom: &mut dyn HostDocument,
        node: NodeId,
    ) -> Result<Option<NodeId>, BuildError> {
        dom.add_class(node, TOAST_CLASS);
        dom.set_style(node, "border-radius", "8px");
        dom.set_style(node, "box-shadow", "0 4px 16px rgba(0,0,0,0.12)");
        Ok(None)
    }
}

/// Quick-reply suggestion panel above a loaded message body.
#[derive(Debug)]
struct SuggestionPanel;

impl Enhancement for SuggestionPanel {
    fn id(&self) -> &'static str {
        "suggest"
    }

    fn root(&self) -> Anchor {
        Anchor::LayoutContent
    }

    fn matches(&self, dom: &dyn HostDocument, node: NodeId) -> bool {
        dom.anchor(Anchor::MessageBody) == Some(node)
    }

    fn build(
        &mut self,
        dom: &mut dyn HostDocument,
        node: NodeId,
    ) -> Result<Option<NodeId>, BuildError> {
        let mut actions = NodeSpec::new("div").class("veneer-suggestion-actions");
        for phrase in QUICK_REPLIES {
            actions = actions.child(
                NodeSpec::new("button")
                    .class("veneer-quick-reply")
                    .attr("type", "button")
                    .text(phrase)
                    .action(Action::QuickReply {
                        phrase: String::from(phrase),
                    }),
            );
        }
        let panel = NodeSpec::new("div")
            .id(SUGGESTIONS_ID)
            .child(
                NodeSpec::new("span")
                    .class("veneer-suggestion-icon")
                    .text("\u{1F4A1}"),
            )
            .child(
                NodeSpec::new("div")
                    .class("veneer-suggestion-body")
                    .child(
                        NodeSpec::new("div")
                            .class("veneer-suggestion-title")
                            .text("Quick reply:"),
                    )
                    .child(actions),
            );
        let inserted = replace_singleton(dom, &panel, Placement::Before(node))
            .ok_or_else(|| BuildError::new("message body lost its parent"))?;
        Ok(Some(inserted))
    }
}

/// Collapses tall message bodies behind a "show full message" button.
#[derive(Debug)]
struct LongMessageCollapse {
    min_height: f64,
}

impl Enhancement for LongMessageCollapse {
    fn id(&self) -> &'static str {
        "collapse"
    }

    fn root(&self) -> Anchor {
        Anchor::LayoutContent
    }

    fn matches(&self, dom: &dyn HostDocument, node: NodeId) -> bool {
        dom.anchor(Anchor::MessageBody) == Some(node)
    }

    fn build(
        &mut self,
        dom: &mut dyn HostDocument,
        node: NodeId,
    ) -> Result<Option<NodeId>, BuildError> {
        // Short bodies stay marked but untouched.
        if dom.scroll_height(node) <= self.min_height {
            return Ok(None);
        }
        dom.add_class(node, COLLAPSED_CLASS);
        let button = NodeSpec::new("button")
            .class("veneer-expand-btn")
            .attr("type", "button")
            .text("\u{25BC} Show full message")
            .action(Action::ExpandMessage { body: node });
        let inserted = dom
            .insert(&button, Placement::After(node))
            .ok_or_else(|| BuildError::new("message body lost its parent"))?;
        Ok(Some(inserted))
    }
}

/// Colored dot on high-priority message rows.
#[derive(Debug)]
struct PriorityDots;

impl Enhancement for PriorityDots {
    fn id(&self) -> &'static str {
        "priority"
    }

    fn root(&self) -> Anchor {
        Anchor::MessageList
    }

    fn matches(&self, dom: &dyn HostDocument, node: NodeId) -> bool {
        dom.tag_name(node) == "tr" && dom.has_class(node, "priority-high")
    }

    fn build(
        &mut self,
        dom: &mut dyn HostDocument,
        node: NodeId,
    ) -> Result<Option<NodeId>, BuildError> {
        let subject = dom
            .descendants(node)
            .into_iter()
            .find(|&cell| dom.tag_name(cell) == "td" && dom.has_class(cell, "subject"));
        let Some(subject) = subject else {
            // Row layout without a subject cell: nothing to decorate.
            return Ok(None);
        };
        let dot = NodeSpec::new("span")
            .class("veneer-priority")
            .class("veneer-priority-high")
            .attr("title", "High priority");
        Ok(dom.insert(&dot, Placement::Prepend(subject)))
    }
}

/// Hover-scoped quick-action buttons on message rows.
///
/// Qualifying is "the pointer is on the row or anything inside it" — the
/// injected wrapper included, so moving the mouse into the buttons does not
/// tear them down mid-hover.
#[derive(Debug)]
struct RowHoverActions;

impl Enhancement for RowHoverActions {
    fn id(&self) -> &'static str {
        "rowact"
    }

    fn root(&self) -> Anchor {
        Anchor::MessageList
    }

    fn matches(&self, dom: &dyn HostDocument, node: NodeId) -> bool {
        dom.tag_name(node) == "tr"
            && dom.attr(node, "id").is_some()
            && dom.hovered().is_some_and(|hovered| dom.contains(node, hovered))
    }

    fn build(
        &mut self,
        dom: &mut dyn HostDocument,
        node: NodeId,
    ) -> Result<Option<NodeId>, BuildError> {
        let mut wrap = NodeSpec::new("div").class(ROW_ACTIONS_CLASS);
        for (icon, label, command) in ROW_ACTIONS {
            wrap = wrap.child(
                NodeSpec::new("button")
                    .class("veneer-row-action-btn")
                    .attr("type", "button")
                    .attr("title", label)
                    .text(icon)
                    .action(Action::Invoke(command)),
            );
        }
        let inserted = dom
            .insert(&wrap, Placement::Append(node))
            .ok_or_else(|| BuildError::new("hovered row vanished"))?;
        Ok(Some(inserted))
    }

    fn removable(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Event-driven markup builders
// ---------------------------------------------------------------------------

/// Builds the search chip row after the search form.
///
/// Returns the scope/button pairs for the overlay's toggle bookkeeping, or
/// an empty list if the search form anchor is absent.
pub fn build_search_chips(dom: &mut dyn HostDocument) -> Vec<(SearchScope, NodeId)> {
    let Some(form) = dom.anchor(Anchor::SearchForm) else {
        return Vec::new();
    };
    let scopes = [
        SearchScope::From,
        SearchScope::Subject,
        SearchScope::Attachment,
        SearchScope::Date,
    ];
    let mut row = NodeSpec::new("div").id(CHIPS_ID);
    for scope in scopes {
        row = row.child(
            NodeSpec::new("button")
                .class("veneer-chip")
                .attr("type", "button")
                .attr("data-scope", scope.as_value())
                .text(scope.label())
                .action(Action::Chip(scope)),
        );
    }
    let Some(container) = replace_singleton(dom, &row, Placement::After(form)) else {
        return Vec::new();
    };
    let buttons = dom.descendants(container);
    scopes.into_iter().zip(buttons).collect()
}

/// Builds the bottom navigation bar for narrow viewports.
pub fn build_mobile_bar(dom: &mut dyn HostDocument) {
    let Some(body) = dom.anchor(Anchor::Body) else {
        return;
    };
    let mut bar = NodeSpec::new("nav")
        .id(MOBILE_BAR_ID)
        .attr("aria-label", "Mobile navigation");
    for (label, icon, command) in MOBILE_ITEMS {
        bar = bar.child(
            NodeSpec::new("button")
                .attr("type", "button")
                .attr("aria-label", label)
                .action(Action::Invoke(command))
                .child(
                    NodeSpec::new("span")
                        .attr("aria-hidden", "true")
                        .attr("role", "img")
                        .text(icon),
                )
                .child(NodeSpec::new("span").text(label)),
        );
    }
    replace_singleton(dom, &bar, Placement::Append(body));
}

/// Builds the floating compose button.
pub fn build_fab(dom: &mut dyn HostDocument) {
    let Some(body) = dom.anchor(Anchor::Body) else {
        return;
    };
    let fab = NodeSpec::new("button")
        .id(FAB_ID)
        .attr("type", "button")
        .attr("aria-label", "Compose new message")
        .text("\u{270F}")
        .action(Action::Invoke(Command::Compose));
    replace_singleton(dom, &fab, Placement::Append(body));
}

/// Builds (or rebuilds) the keyboard shortcuts overlay.
pub fn build_shortcuts_overlay(dom: &mut dyn HostDocument) {
    let Some(body) = dom.anchor(Anchor::Body) else {
        return;
    };
    let mut table = NodeSpec::new("table").class("veneer-shortcuts-table");
    for (key, description) in SHORTCUTS {
        table = table.child(
            NodeSpec::new("tr")
                .child(NodeSpec::new("td").class("veneer-shortcut-key").text(key))
                .child(NodeSpec::new("td").text(description)),
        );
    }
    let overlay = NodeSpec::new("div")
        .id(SHORTCUTS_ID)
        .action(Action::DismissShortcuts)
        .child(
            NodeSpec::new("div")
                .class("veneer-shortcuts-card")
                .child(NodeSpec::new("h3").text("Keyboard Shortcuts"))
                .child(table)
                .child(
                    NodeSpec::new("p")
                        .class("veneer-shortcuts-hint")
                        .text("Press Esc or click to close"),
                ),
        );
    replace_singleton(dom, &overlay, Placement::Append(body));
}

/// Builds the snooze picker near its trigger and arms outside-click
/// dismissal. Any open picker is dismissed first (singular-slot rule).
pub fn build_snooze_popup(dom: &mut dyn HostDocument, trigger: NodeId) {
    let Some(body) = dom.anchor(Anchor::Body) else {
        return;
    };
    let mut popup = NodeSpec::new("div").id(SNOOZE_ID);
    for (label, hours) in SNOOZE_OPTIONS {
        popup = popup.child(
            NodeSpec::new("button")
                .attr("type", "button")
                .attr("data-hours", format!("{hours}"))
                .text(label)
                .action(Action::SnoozePick {
                    label: String::from(label),
                }),
        );
    }
    let Some(node) = replace_singleton(dom, &popup, Placement::Append(body)) else {
        return;
    };
    dom.place_near(node, trigger);
    dom.arm_outside_dismiss();
}

/// Builds (or replaces) the undo-send toast.
pub fn build_undo_toast(dom: &mut dyn HostDocument) {
    let Some(body) = dom.anchor(Anchor::Body) else {
        return;
    };
    let toast = NodeSpec::new("div")
        .id(UNDO_TOAST_ID)
        .child(NodeSpec::new("span").text("Message queued to send\u{2026}"))
        .child(
            NodeSpec::new("button")
                .class("veneer-undo-btn")
                .attr("type", "button")
                .text("Undo")
                .action(Action::UndoSend),
        )
        .child(NodeSpec::new("div").id("veneer-undo-progress"));
    replace_singleton(dom, &toast, Placement::Append(body));
}
