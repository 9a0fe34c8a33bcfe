#![doc = "HTTP bridge: implements the core collaborator traits over a JSON API."]
//
//! # Bridge client (CLI <-> providers)
//!
//! Prompt, image and publish services sit behind one bridge service. [`BridgeClient`]
//! implements [`PromptProvider`], [`AssetProvider`] and [`PublishBackend`] from
//! `article-forge-core` by POSTing JSON to a local or remote bridge service:
//!
//! - `POST {base_url}/prompts`  `{content, count, settings}` → `PromptResponse`
//! - `POST {base_url}/assets`   `{prompt, settings}` → `{success, asset_url, error}`
//! - `POST {base_url}/publish`  `{document}` → `PublishResponse`
//!
//! What the bridge does with those requests (which AI vendor, which browser
//! automation) is its own business.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use article_forge_core::config::ProviderSettings;
use article_forge_core::contract::{
    AssetProvider, PromptProvider, PromptResponse, PublishBackend, PublishResponse,
};
use article_forge_core::error::ProviderError;

use crate::load_config::BridgeSection;

#[derive(Serialize)]
struct PromptRequest<'a> {
    content: &'a str,
    count: usize,
    settings: &'a ProviderSettings,
}

#[derive(Serialize)]
struct AssetRequestBody<'a> {
    prompt: &'a str,
    settings: &'a ProviderSettings,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    success: bool,
    #[serde(default)]
    asset_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    document: &'a str,
}

pub struct BridgeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl BridgeClient {
    pub fn new(section: &BridgeSection) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(section.timeout_secs))
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build HTTP client for bridge");
                e
            })?;
        tracing::info!(
            base_url = %section.base_url,
            api_key_set = section.api_key.is_some(),
            "Initialized BridgeClient"
        );
        Ok(Self {
            http,
            base_url: section.base_url.trim_end_matches('/').to_string(),
            api_key: section.api_key.clone(),
        })
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self.http.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = ?e, url = %url, "Bridge request failed");
            e
        })?;
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            tracing::error!(status = %status, url = %url, "Bridge returned error. Response body: {text}");
            return Err(format!("bridge error {status} at {url}: {text}").into());
        }
        let parsed = response.json::<R>().await.map_err(|e| {
            tracing::error!(error = ?e, url = %url, "Failed to parse bridge response JSON");
            e
        })?;
        Ok(parsed)
    }
}

#[async_trait]
impl PromptProvider for BridgeClient {
    async fn generate_prompts(
        &self,
        content: &str,
        count: usize,
        settings: &ProviderSettings,
    ) -> Result<PromptResponse, ProviderError> {
        tracing::info!(count, provider = %settings.provider, "Requesting prompts from bridge");
        self.post_json(
            "prompts",
            &PromptRequest {
                content,
                count,
                settings,
            },
        )
        .await
    }
}

#[async_trait]
impl AssetProvider for BridgeClient {
    async fn generate_asset(
        &self,
        prompt: &str,
        settings: &ProviderSettings,
    ) -> Result<String, ProviderError> {
        let response: AssetResponse = self
            .post_json("assets", &AssetRequestBody { prompt, settings })
            .await?;
        match response {
            AssetResponse {
                success: true,
                asset_url: Some(url),
                ..
            } => Ok(url),
            AssetResponse { error, .. } => {
                let reason = error.unwrap_or_else(|| "bridge returned no asset url".to_string());
                tracing::warn!(reason = %reason, "Bridge could not generate asset");
                Err(reason.into())
            }
        }
    }
}

#[async_trait]
impl PublishBackend for BridgeClient {
    async fn publish(&self, document: &str) -> Result<PublishResponse, ProviderError> {
        tracing::info!(bytes = document.len(), "Submitting document to bridge publish endpoint");
        self.post_json("publish", &PublishRequest { document }).await
    }
}
