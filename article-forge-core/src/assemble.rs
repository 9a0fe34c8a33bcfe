//! Substitutes generated assets into the article.

use tracing::{debug, warn};

use crate::error::AssemblyError;
use crate::pipeline::{AssetRequest, AssetState};
use crate::placeholder::{marker_count, Placeholder, IMAGE_MARKER};

/// Replaces the n-th [`IMAGE_MARKER`] in `raw_content` with a markdown image that
/// points at the n-th placeholder's asset.
///
/// Every placeholder must have a `Ready` request. Markers and placeholders must line
/// up one to one; otherwise a raw marker would survive into the output.
pub fn assemble(
    raw_content: &str,
    placeholders: &[Placeholder],
    requests: &[AssetRequest],
) -> Result<String, AssemblyError> {
    let found = marker_count(raw_content);
    if found != placeholders.len() {
        warn!(expected = placeholders.len(), found, "Marker count does not match placeholder plan");
        return Err(AssemblyError::PlanMismatch {
            expected: placeholders.len(),
            found,
        });
    }

    let urls = placeholders
        .iter()
        .map(|placeholder| resolved_url(placeholder, requests))
        .collect::<Result<Vec<_>, _>>()?;

    let mut assembled = String::with_capacity(raw_content.len());
    let mut rest = raw_content;
    for (placeholder, url) in placeholders.iter().zip(urls) {
        let Some(at) = rest.find(IMAGE_MARKER) else {
            break;
        };
        assembled.push_str(&rest[..at]);
        assembled.push_str(&format!("![{}]({})", placeholder.key, url));
        rest = &rest[at + IMAGE_MARKER.len()..];
    }
    assembled.push_str(rest);

    debug!(placeholders = placeholders.len(), bytes = assembled.len(), "Assembled document");
    Ok(assembled)
}

fn resolved_url<'a>(
    placeholder: &Placeholder,
    requests: &'a [AssetRequest],
) -> Result<&'a str, AssemblyError> {
    let request = requests
        .iter()
        .find(|r| r.placeholder_key == placeholder.key)
        .ok_or_else(|| AssemblyError::MissingRequest {
            key: placeholder.key.clone(),
        })?;
    match (request.state, request.asset_url.as_deref()) {
        (AssetState::Ready, Some(url)) => Ok(url),
        (state, _) => Err(AssemblyError::IncompleteAssets {
            key: placeholder.key.clone(),
            state,
        }),
    }
}
