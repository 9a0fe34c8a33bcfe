#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use article_forge_core::config::{PipelineConfig, ProviderSettings};
use article_forge_core::contract::{AssetProvider, MockPromptProvider, PromptResponse};
use article_forge_core::error::ProviderError;
use async_trait::async_trait;
use tokio::sync::Semaphore;

pub fn settings() -> ProviderSettings {
    ProviderSettings {
        provider: "test-images".to_string(),
        model: Some("v1".to_string()),
        options: serde_json::Value::Null,
    }
}

pub fn pipeline_config(max_concurrency: usize, retry_rounds: usize) -> PipelineConfig {
    PipelineConfig {
        max_concurrency,
        retry_rounds,
    }
}

pub fn url_for(prompt: &str) -> String {
    format!("https://cdn.example.com/{prompt}.png")
}

/// Prompt provider mock answering `prompt-1..prompt-n`.
pub fn numbered_prompts() -> MockPromptProvider {
    let mut prompts = MockPromptProvider::new();
    prompts.expect_generate_prompts().returning(|_, count, _| {
        Ok(PromptResponse {
            success: true,
            prompts: (1..=count).map(|i| format!("prompt-{i}")).collect(),
            error: None,
        })
    });
    prompts
}

/// Fails the first `failures` attempts for each listed prompt, succeeds otherwise.
pub struct FlakyAssets {
    remaining_failures: Mutex<HashMap<String, usize>>,
    pub calls: Mutex<Vec<String>>,
}

impl FlakyAssets {
    pub fn new(failing: &[(&str, usize)]) -> Self {
        Self {
            remaining_failures: Mutex::new(
                failing
                    .iter()
                    .map(|(prompt, n)| (prompt.to_string(), *n))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls_for(&self, prompt: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_str() == prompt)
            .count()
    }
}

#[async_trait]
impl AssetProvider for FlakyAssets {
    async fn generate_asset(
        &self,
        prompt: &str,
        _settings: &ProviderSettings,
    ) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(prompt.to_string());
        let mut remaining = self.remaining_failures.lock().unwrap();
        match remaining.get_mut(prompt) {
            Some(n) if *n > 0 => {
                *n -= 1;
                Err(format!("image provider timed out for {prompt}").into())
            }
            _ => Ok(url_for(prompt)),
        }
    }
}

/// Holds every call until the test hands out permits on `release`.
pub struct GatedAssets {
    pub started: Arc<Semaphore>,
    pub release: Arc<Semaphore>,
}

impl GatedAssets {
    pub fn new() -> Self {
        Self {
            started: Arc::new(Semaphore::new(0)),
            release: Arc::new(Semaphore::new(0)),
        }
    }
}

#[async_trait]
impl AssetProvider for GatedAssets {
    async fn generate_asset(
        &self,
        prompt: &str,
        _settings: &ProviderSettings,
    ) -> Result<String, ProviderError> {
        self.started.add_permits(1);
        let permit = self.release.acquire().await?;
        permit.forget();
        Ok(url_for(prompt))
    }
}
