use dom_snapshot::{DomTree, NodeId};
use pagetrace_core_types::{Modifiers, NavigationKind};

/// One structural-change notification from the observation source. Node ids
/// refer to the live tree at delivery time; removed subtrees arrive as owned
/// detached trees because they no longer exist in the live tree.
#[derive(Debug)]
pub enum ChangeNotification {
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<DomTree>,
    },
    Attribute {
        target: NodeId,
        name: String,
        old_value: Option<String>,
    },
    CharacterData {
        target: NodeId,
        old_value: Option<String>,
    },
}

/// One user-interaction notification with its native event fields.
#[derive(Debug)]
pub struct InteractionNotification {
    pub target: NodeId,
    pub detail: InteractionDetail,
}

#[derive(Debug)]
pub enum InteractionDetail {
    Click {
        button: u8,
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    Input {
        input_type: String,
        value: String,
        selection: Option<(u32, u32)>,
    },
    Focus,
    Blur,
    Scroll {
        x: f64,
        y: f64,
    },
    Navigation {
        url: String,
        kind: NavigationKind,
        page_source: Option<String>,
    },
}
