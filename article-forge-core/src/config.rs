use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Thresholds for [`crate::segment::segment`], all counted in visible characters of the
/// markdown-stripped text.
///
/// The defaults are tuned for Korean prose. Texts in other languages will usually
/// want a different connective list and possibly different windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Texts at or below this length are never split.
    pub short_threshold: usize,
    /// Earliest position a cut may be placed at.
    pub min_cut: usize,
    /// Upper bound of the comma and connective windows.
    pub max_cut: usize,
    /// Upper bound of the sentence-end window.
    pub extended_max_cut: usize,
    /// Backward space scan runs from `min(space_scan_from, len - 1)` down to `space_scan_to`.
    pub space_scan_from: usize,
    pub space_scan_to: usize,
    /// Position used when nothing else matched.
    pub forced_cut: usize,
    pub connectives: Vec<String>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            short_threshold: 28,
            min_cut: 15,
            max_cut: 28,
            extended_max_cut: 35,
            space_scan_from: 30,
            space_scan_to: 20,
            forced_cut: 28,
            connectives: [
                "그리고", "하지만", "그러나", "또한", "그래서", "따라서", "그런데", "게다가",
                "반면에", "특히", "즉",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Controls for the asset generation fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of provider calls in flight at once.
    pub max_concurrency: usize,
    /// Automatic retry rounds over failed items after a bulk run.
    pub retry_rounds: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            retry_rounds: 1,
        }
    }
}

impl PipelineConfig {
    pub fn trace_loaded(&self) {
        info!(
            max_concurrency = self.max_concurrency,
            retry_rounds = self.retry_rounds,
            "Loaded PipelineConfig"
        );
        debug!(?self, "PipelineConfig loaded (full debug)");
    }
}

/// Provider/model selection for one asset type. Opaque to the core: it is handed to
/// the providers untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub options: serde_json::Value,
}
