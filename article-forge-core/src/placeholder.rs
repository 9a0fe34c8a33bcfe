use serde::{Deserialize, Serialize};

/// Literal token marking where a generated image goes.
pub const IMAGE_MARKER: &str = "[IMAGE]";

/// One planned image slot, in order of appearance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placeholder {
    /// Zero-based position among the markers.
    pub index: usize,
    /// `image1`, `image2`, ...
    pub key: String,
}

impl Placeholder {
    fn at(index: usize) -> Self {
        Self {
            index,
            key: format!("image{}", index + 1),
        }
    }
}

/// Plans one placeholder per [`IMAGE_MARKER`] occurrence. Keys depend only on marker
/// order, so re-planning unchanged text yields the same plan.
pub fn plan(text: &str) -> Vec<Placeholder> {
    (0..marker_count(text)).map(Placeholder::at).collect()
}

pub(crate) fn marker_count(text: &str) -> usize {
    text.matches(IMAGE_MARKER).count()
}
