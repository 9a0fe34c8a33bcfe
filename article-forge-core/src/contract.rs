//! # contract: collaborator interfaces for the article pipeline
//!
//! The core never talks to a network or a browser directly. Prompt planning, image
//! generation and publishing are reached through the three traits below, each with a
//! typed request/response shape and no opinion on transport.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`; with the `test-export-mocks` feature
//!   (on by default) `MockPromptProvider`, `MockAssetProvider` and `MockPublishBackend`
//!   are available to integration tests and downstream crates.
//!
//! ## Implementing a collaborator
//! - Return `Err` for transport failures (connection refused, bad payload).
//! - Return `Ok` with `success: false` when the remote side answered and declined.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::config::ProviderSettings;
use crate::error::ProviderError;

/// Answer of a prompt provider: one prompt per requested image, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptResponse {
    pub success: bool,
    #[serde(default)]
    pub prompts: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Answer of a publish backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishResponse {
    pub success: bool,
    /// Where the article ended up, e.g. a post URL.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Produces image prompts for an article.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PromptProvider: Send + Sync {
    /// Generate `count` prompts for the images in `content`.
    async fn generate_prompts(
        &self,
        content: &str,
        count: usize,
        settings: &ProviderSettings,
    ) -> Result<PromptResponse, ProviderError>;
}

/// Turns one prompt into one hosted image.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait AssetProvider: Send + Sync {
    /// Returns the URL of the generated asset.
    async fn generate_asset(
        &self,
        prompt: &str,
        settings: &ProviderSettings,
    ) -> Result<String, ProviderError>;
}

/// Performs the actual publish action for an assembled document.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PublishBackend: Send + Sync {
    async fn publish(&self, document: &str) -> Result<PublishResponse, ProviderError>;
}
