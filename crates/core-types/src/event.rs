use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{EventId, SessionId};

/// Viewport-relative geometry of an element at capture time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Semantic snapshot of a DOM element. Purely derived data; never holds a
/// reference back into the tree it was built from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub tag: String,
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    pub role: Option<String>,
    pub label: Option<String>,
    pub xpath: String,
    pub selector: String,
    pub bounding_box: Option<BoundingBox>,
}

/// Sanitized snapshot of a DOM subtree. Always the output of sanitization,
/// never raw captured markup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DomFragment {
    pub html: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Left,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.alt || self.ctrl || self.shift || self.meta
    }

    /// Held modifier names in a fixed order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut held = Vec::new();
        if self.ctrl {
            held.push("Ctrl");
        }
        if self.alt {
            held.push("Alt");
        }
        if self.shift {
            held.push("Shift");
        }
        if self.meta {
            held.push("Meta");
        }
        held
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: u32,
    pub end: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationKind {
    Initial,
    Push,
    Replace,
    Pop,
    Hash,
}

impl NavigationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationKind::Initial => "initial",
            NavigationKind::Push => "push",
            NavigationKind::Replace => "replace",
            NavigationKind::Pop => "pop",
            NavigationKind::Hash => "hash",
        }
    }
}

/// Type-specific event payload. The `kind` tag doubles as the event type tag
/// used for classification (`user:` / `mutation:` / `error:` prefixes).
///
/// Marked non-exhaustive: consumers outside the pipeline (exporters,
/// downstream tooling) must carry a fallback arm for kinds they do not know.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EventPayload {
    #[serde(rename = "mutation:add")]
    MutationAdd {
        /// Total number of affected nodes; `nodes` may hold fewer fragments
        /// when the capture cap was hit.
        node_count: usize,
        nodes: Vec<DomFragment>,
        parent_before: Option<String>,
        parent_after: Option<String>,
    },
    #[serde(rename = "mutation:remove")]
    MutationRemove {
        node_count: usize,
        nodes: Vec<DomFragment>,
        parent_before: Option<String>,
        parent_after: Option<String>,
    },
    #[serde(rename = "mutation:attribute")]
    MutationAttribute {
        name: String,
        old_value: Option<String>,
        new_value: Option<String>,
    },
    #[serde(rename = "mutation:text")]
    MutationText { old_value: String, new_value: String },
    #[serde(rename = "user:click")]
    Click {
        button: MouseButton,
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    #[serde(rename = "user:input")]
    Input {
        input_type: String,
        value: String,
        selection: Option<SelectionRange>,
    },
    #[serde(rename = "user:scroll")]
    Scroll { x: f64, y: f64 },
    #[serde(rename = "user:navigation")]
    Navigation {
        url: String,
        nav_kind: NavigationKind,
        page_source: Option<String>,
    },
    #[serde(rename = "user:focus")]
    Focus,
    #[serde(rename = "user:blur")]
    Blur,
    #[serde(rename = "error:page")]
    PageError {
        message: String,
        source: Option<String>,
    },
}

impl EventPayload {
    pub fn kind_tag(&self) -> &'static str {
        match self {
            EventPayload::MutationAdd { .. } => "mutation:add",
            EventPayload::MutationRemove { .. } => "mutation:remove",
            EventPayload::MutationAttribute { .. } => "mutation:attribute",
            EventPayload::MutationText { .. } => "mutation:text",
            EventPayload::Click { .. } => "user:click",
            EventPayload::Input { .. } => "user:input",
            EventPayload::Scroll { .. } => "user:scroll",
            EventPayload::Navigation { .. } => "user:navigation",
            EventPayload::Focus => "user:focus",
            EventPayload::Blur => "user:blur",
            EventPayload::PageError { .. } => "error:page",
        }
    }
}

/// An event as produced by the capture stages: everything but identity and
/// sequence, which only the recorder may assign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub ts_mono: u64,
    pub target: ElementDescriptor,
    pub payload: EventPayload,
    pub dom_snapshot: Option<DomFragment>,
}

impl EventDraft {
    pub fn new(ts_mono: u64, target: ElementDescriptor, payload: EventPayload) -> Self {
        Self {
            ts_mono,
            target,
            payload,
            dom_snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, snapshot: DomFragment) -> Self {
        self.dom_snapshot = Some(snapshot);
        self
    }
}

/// A fully sequenced, redacted event. Immutable once it leaves the recorder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub session: SessionId,
    pub seq: u64,
    pub ts_mono: u64,
    pub target: ElementDescriptor,
    pub payload: EventPayload,
    pub dom_snapshot: Option<DomFragment>,
}

impl EventRecord {
    pub fn from_draft(draft: EventDraft, session: SessionId, seq: u64) -> Self {
        Self {
            id: EventId::new(),
            session,
            seq,
            ts_mono: draft.ts_mono,
            target: draft.target,
            payload: draft.payload,
            dom_snapshot: draft.dom_snapshot,
        }
    }

    pub fn kind_tag(&self) -> &'static str {
        self.payload.kind_tag()
    }
}
