// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host adapter contract.
//!
//! Veneer never touches a platform document directly. Everything the engine
//! needs from the host — anchor lookup, node inspection, node insertion and
//! removal, command dispatch, timers — goes through the traits in this
//! module, so the engine runs unchanged against a real DOM (the web backend)
//! or a fake one (the harness).
//!
//! The host mail application is an *external schema*: anchors that are
//! absent simply mean the corresponding enhancement is never satisfied.
//! Adapter methods therefore return `Option` or degrade to no-ops rather
//! than erroring.

use alloc::string::String;
use alloc::vec::Vec;

/// Handle to a host document node.
///
/// Handles are minted by the adapter (one slot per node it has interned) and
/// are meaningless outside it. A handle whose node has left the document
/// stays valid to pass around; inspection methods report it as detached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a handle from a raw adapter slot index.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw adapter slot index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Handle to a scheduled platform timer.
///
/// Adapters must never reuse an id; a monotonic counter is sufficient. The
/// engine relies on this to tell a live firing from a stale one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Creates a handle from a raw timer number.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw timer number.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Well-known host elements the engine anchors enhancements to.
///
/// The mapping from anchor to concrete element (id or selector) lives in the
/// adapter; the engine only speaks this vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// The document root element (theme attributes live here).
    Root,
    /// The document body.
    Body,
    /// The main content column (message list and reading pane).
    LayoutContent,
    /// The folder sidebar panel.
    Sidebar,
    /// The host's own sidebar collapse/expand button.
    SidebarToggle,
    /// The message list table.
    MessageList,
    /// The loaded message body container in the reading pane.
    MessageBody,
    /// The compose editor (textarea or contenteditable).
    ComposeEditor,
    /// The compose attachment list.
    AttachmentList,
    /// The search form.
    SearchForm,
    /// The text input inside the search form.
    SearchInput,
    /// The search scope selector inside the search form.
    ScopeSelect,
    /// The transient notification stack.
    ToastStack,
    /// The host's theme toggle button.
    ThemeToggle,
}

/// Host mail commands the overlay can trigger.
///
/// Dispatch is best-effort: if the host's command entry point is missing the
/// adapter silently drops the call and the triggering UI keeps only its own
/// visual state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Open the compose view.
    Compose,
    /// Reply to the selected message.
    Reply,
    /// Forward the selected message.
    Forward,
    /// Archive the selected message.
    Archive,
    /// Flag (star) the selected message.
    Flag,
    /// Delete the selected message.
    Delete,
    /// Navigate back to the message list.
    List,
    /// Navigate to the mail task.
    Mail,
    /// Open search.
    Search,
    /// Navigate to the address book.
    Addressbook,
    /// Navigate to settings.
    Settings,
    /// Send the composed message.
    Send,
}

impl Command {
    /// Returns the host-side command name.
    #[must_use]
    pub const fn as_name(self) -> &'static str {
        match self {
            Self::Compose => "compose",
            Self::Reply => "reply",
            Self::Forward => "forward",
            Self::Archive => "archive",
            Self::Flag => "flag",
            Self::Delete => "delete",
            Self::List => "list",
            Self::Mail => "mail",
            Self::Search => "search",
            Self::Addressbook => "addressbook",
            Self::Settings => "settings",
            Self::Send => "send",
        }
    }
}

/// Severity of a transient host notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    /// A positive confirmation ("Send cancelled.").
    Confirmation,
    /// A neutral notice.
    Notice,
    /// An error notice.
    Error,
}

/// Search filter scopes offered by the chip row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SearchScope {
    /// Filter by sender.
    From,
    /// Filter by subject.
    Subject,
    /// Filter by attachment presence.
    Attachment,
    /// Filter by date (focuses the input for a date expression).
    Date,
}

impl SearchScope {
    /// Returns the value written into the host's scope selector.
    #[must_use]
    pub const fn as_value(self) -> &'static str {
        match self {
            Self::From => "from",
            Self::Subject => "subject",
            Self::Attachment => "attachment",
            Self::Date => "date",
        }
    }

    /// Returns the chip label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::From => "From",
            Self::Subject => "Subject",
            Self::Attachment => "Attachment",
            Self::Date => "Date",
        }
    }
}

/// Behavior attached to an injected node.
///
/// Adapters wire each node carrying an action so that activating it (a
/// click) is delivered back to [`Overlay::on_activate`].
///
/// [`Overlay::on_activate`]: crate::overlay::Overlay::on_activate
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Dispatch a host command with the activated node as context.
    Invoke(Command),
    /// Collapse or expand the folder sidebar.
    ToggleSidebar,
    /// Toggle a search filter chip.
    Chip(SearchScope),
    /// Start a reply pre-filled with a quick phrase.
    QuickReply {
        /// The phrase inserted at the top of the compose body.
        phrase: String,
    },
    /// Expand a collapsed long message body.
    ExpandMessage {
        /// The collapsed body container.
        body: NodeId,
    },
    /// Cancel a pending undo-send.
    UndoSend,
    /// Open the snooze picker next to the activated node.
    OpenSnooze,
    /// Pick a snooze duration.
    SnoozePick {
        /// Human-readable option label, echoed in the confirmation notice.
        label: String,
    },
    /// Dismiss the keyboard shortcuts overlay.
    DismissShortcuts,
}

/// Keyboard input forwarded to the overlay.
///
/// Adapters forward only what the overlay reacts to; everything else stays
/// with the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// The Escape key.
    Escape,
}

/// Where to insert a new node relative to an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// As the previous sibling of the given node.
    Before(NodeId),
    /// As the next sibling of the given node.
    After(NodeId),
    /// As the first child of the given node.
    Prepend(NodeId),
    /// As the last child of the given node.
    Append(NodeId),
}

/// Declarative description of a node tree to inject.
///
/// Built with the chained constructors and handed to
/// [`HostDocument::insert`], which materializes the tree and wires any
/// [`Action`]s to the overlay's activation entry point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeSpec {
    /// Element tag name.
    pub tag: &'static str,
    /// Optional element id (singular UIs rely on this for replace-on-open).
    pub id: Option<&'static str>,
    /// CSS classes.
    pub classes: Vec<&'static str>,
    /// Plain attributes.
    pub attrs: Vec<(&'static str, String)>,
    /// Inline styles.
    pub styles: Vec<(&'static str, String)>,
    /// Text content.
    pub text: Option<String>,
    /// Activation behavior.
    pub action: Option<Action>,
    /// Child nodes, in order.
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// Creates a spec for an element with the given tag.
    #[must_use]
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            ..Self::default()
        }
    }

    /// Sets the element id.
    #[must_use]
    pub fn id(mut self, id: &'static str) -> Self {
        self.id = Some(id);
        self
    }

    /// Adds a CSS class.
    #[must_use]
    pub fn class(mut self, class: &'static str) -> Self {
        self.classes.push(class);
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    /// Adds an inline style.
    #[must_use]
    pub fn style(mut self, prop: &'static str, value: impl Into<String>) -> Self {
        self.styles.push((prop, value.into()));
        self
    }

    /// Sets the text content.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attaches an activation behavior.
    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Appends a child spec.
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }
}

/// Read and write access to the host document.
///
/// Inspection methods on a detached or unknown node return the neutral value
/// (`None`, `false`, empty); mutation methods on one are no-ops. This is
/// what lets the engine treat the host schema as optional end to end.
pub trait HostDocument {
    /// Resolves a well-known host element, if present in the document.
    fn anchor(&self, anchor: Anchor) -> Option<NodeId>;

    /// Returns whether the node is currently attached to the document.
    fn is_attached(&self, node: NodeId) -> bool;

    /// Returns whether `node` is `ancestor` itself or inside its subtree.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    /// Returns the parent of a node.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Returns all element descendants of `root` in document order
    /// (excluding `root` itself).
    fn descendants(&self, root: NodeId) -> Vec<NodeId>;

    /// Returns the lowercase tag name.
    fn tag_name(&self, node: NodeId) -> String;

    /// Returns an attribute value.
    fn attr(&self, node: NodeId, name: &str) -> Option<String>;

    /// Sets an attribute.
    fn set_attr(&mut self, node: NodeId, name: &str, value: &str);

    /// Removes an attribute.
    fn remove_attr(&mut self, node: NodeId, name: &str);

    /// Returns whether the node carries a CSS class.
    fn has_class(&self, node: NodeId, class: &str) -> bool;

    /// Adds a CSS class.
    fn add_class(&mut self, node: NodeId, class: &str);

    /// Removes a CSS class.
    fn remove_class(&mut self, node: NodeId, class: &str);

    /// Sets an inline style property; an empty value clears it.
    fn set_style(&mut self, node: NodeId, prop: &str, value: &str);

    /// Returns the text content of the node's subtree.
    fn text(&self, node: NodeId) -> String;

    /// Replaces the text content.
    fn set_text(&mut self, node: NodeId, text: &str);

    /// Returns a form control's value.
    fn value(&self, node: NodeId) -> String;

    /// Sets a form control's value.
    fn set_value(&mut self, node: NodeId, value: &str);

    /// Returns the number of element children.
    fn child_count(&self, node: NodeId) -> usize;

    /// Returns the node's scroll height in CSS pixels.
    fn scroll_height(&self, node: NodeId) -> f64;

    /// Looks up a node by element id (used for injected singletons).
    fn by_id(&self, id: &str) -> Option<NodeId>;

    /// Materializes a spec tree at the given placement.
    ///
    /// Returns the root of the inserted tree, or `None` if the placement
    /// target is detached.
    fn insert(&mut self, spec: &NodeSpec, place: Placement) -> Option<NodeId>;

    /// Removes a node (and its subtree) from the document.
    fn remove(&mut self, node: NodeId);

    /// Moves keyboard focus to the node.
    fn focus(&mut self, node: NodeId);

    /// Returns the innermost element currently under the pointer.
    fn hovered(&self) -> Option<NodeId>;

    /// Returns whether an editable element (input, textarea, select, or
    /// contenteditable) currently has focus.
    fn editable_focused(&self) -> bool;

    /// Returns the viewport width in CSS pixels.
    fn viewport_width(&self) -> f64;

    /// Positions an absolutely-placed node just below its trigger.
    fn place_near(&mut self, node: NodeId, trigger: NodeId);

    /// Arms a fire-once outside-click listener that is delivered to
    /// [`Overlay::on_outside_click`] and then self-removes.
    ///
    /// Arming while already armed stays a single listener.
    ///
    /// [`Overlay::on_outside_click`]: crate::overlay::Overlay::on_outside_click
    fn arm_outside_dismiss(&mut self);
}

/// Best-effort access to the host application's command layer.
///
/// The default `notify`/`confirm` bodies model a host without those
/// collaborators: notifications vanish, confirmations pass.
pub trait HostCommands {
    /// Dispatches a host mail command.
    fn invoke(&mut self, command: Command, context: Option<NodeId>);

    /// Surfaces a transient notification.
    fn notify(&mut self, message: &str, kind: NoticeKind) {
        let _ = (message, kind);
    }

    /// Asks the user a yes/no question.
    fn confirm(&mut self, message: &str) -> bool {
        let _ = message;
        true
    }
}

/// Delayed-execution source.
///
/// Fired timers are delivered back through [`Overlay::on_timer`]; a
/// cancelled id must not be delivered, but the engine tolerates a stale
/// delivery that was already in flight.
///
/// [`Overlay::on_timer`]: crate::overlay::Overlay::on_timer
pub trait TimerHost {
    /// Schedules a timer and returns its (never reused) id.
    fn schedule_timer(&mut self, delay_ms: u32) -> TimerId;

    /// Cancels a scheduled timer; a no-op if it already fired.
    fn cancel_timer(&mut self, id: TimerId);
}

/// Everything the overlay needs from a platform, in one object.
pub trait Host: HostDocument + HostCommands + TimerHost {}

impl<T: HostDocument + HostCommands + TimerHost + ?Sized> Host for T {}
