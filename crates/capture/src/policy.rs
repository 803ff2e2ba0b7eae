use serde::{Deserialize, Serialize};

/// Tunable capture behavior, supplied by the surrounding settings
/// collaborator and snapshotted into the session config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapturePolicyView {
    /// Coalescing window for structural-change micro-batches.
    pub batch_window_ms: u64,
    /// Quiet period before a debounced input emission.
    pub input_debounce_ms: u64,
    /// Minimum spacing between scroll emissions (trailing edge).
    pub scroll_throttle_ms: u64,
    /// Scroll capture is opt-in.
    pub capture_scroll: bool,
    /// Cap on sanitized fragments carried per add/remove mutation.
    pub max_fragment_nodes: usize,
    /// Capture parent before/after outer HTML for rich diffing.
    pub include_parent_context: bool,
}

impl Default for CapturePolicyView {
    fn default() -> Self {
        Self {
            batch_window_ms: 50,
            input_debounce_ms: 300,
            scroll_throttle_ms: 200,
            capture_scroll: false,
            max_fragment_nodes: 5,
            include_parent_context: true,
        }
    }
}
