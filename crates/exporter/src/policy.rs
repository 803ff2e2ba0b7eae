use serde::{Deserialize, Serialize};

/// Rendering knobs supplied by the settings collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportPolicyView {
    /// Character budget per embedded fragment; longer fragments are cut and
    /// annotated.
    pub fragment_char_budget: usize,
    /// Fragments shorter than this are omitted entirely.
    pub fragment_min_len: usize,
    /// Literal input values are previewed up to this many characters.
    pub value_preview_len: usize,
    pub include_repro_steps: bool,
}

impl Default for ExportPolicyView {
    fn default() -> Self {
        Self {
            fragment_char_budget: 2_000,
            fragment_min_len: 5,
            value_preview_len: 100,
            include_repro_steps: true,
        }
    }
}
