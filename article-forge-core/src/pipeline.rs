//! Concurrent image generation with per-item failure tracking.
//!
//! Every planned placeholder owns one [`AssetRequest`] that moves through
//! `Pending -> Generating -> {Ready | Failed}`. A bulk run spawns one task per
//! launchable item, bounded by a semaphore, and joins on all of them. Failures stay
//! on the item; the run itself only reports counts.
//!
//! The request collection lives behind one async lock together with a generation
//! token. Loading, resetting or clearing the collection bumps the token, and any
//! completion that carries an older token is dropped instead of applied.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, error, info, warn};

use crate::config::{PipelineConfig, ProviderSettings};
use crate::contract::{AssetProvider, PromptProvider};
use crate::error::{AssetGenerationError, PipelineError, PromptGenerationError};
use crate::placeholder::Placeholder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetState {
    Pending,
    /// Claimed by a run. Covers items still queued for a concurrency permit as
    /// well as items whose provider call is in flight.
    Generating,
    Ready,
    Failed,
}

/// Generation job for one placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRequest {
    pub placeholder_key: String,
    pub prompt: String,
    pub state: AssetState,
    pub asset_url: Option<String>,
    pub error: Option<String>,
}

impl AssetRequest {
    pub fn new(placeholder_key: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            placeholder_key: placeholder_key.into(),
            prompt: prompt.into(),
            state: AssetState::Pending,
            asset_url: None,
            error: None,
        }
    }

    fn launch(&mut self) {
        self.state = AssetState::Generating;
        self.asset_url = None;
        self.error = None;
    }
}

/// Point-in-time view of the pipeline. Counts are derived from `requests` on
/// construction and never tracked separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineRun {
    pub token: u64,
    pub requests: Vec<AssetRequest>,
    pub total: usize,
    pub ready_count: usize,
    pub failed_count: usize,
}

impl PipelineRun {
    pub fn new(token: u64, requests: Vec<AssetRequest>) -> Self {
        let count = |state: AssetState| requests.iter().filter(|r| r.state == state).count();
        let ready_count = count(AssetState::Ready);
        let failed_count = count(AssetState::Failed);
        Self {
            token,
            total: requests.len(),
            ready_count,
            failed_count,
            requests,
        }
    }

    /// Every item has settled, successfully or not.
    pub fn is_complete(&self) -> bool {
        self.ready_count + self.failed_count == self.total
    }

    pub fn all_ready(&self) -> bool {
        self.ready_count == self.total
    }

    pub fn request(&self, key: &str) -> Option<&AssetRequest> {
        self.requests.iter().find(|r| r.placeholder_key == key)
    }
}

/// Outcome of one bulk run, covering the items that run launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkRunReport {
    pub token: u64,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Completions dropped because the collection was reset or cleared meanwhile.
    pub discarded: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Ready,
    Failed,
    Discarded,
}

struct PipelineState {
    token: u64,
    requests: Vec<AssetRequest>,
}

/// Asks the prompt provider for one prompt per placeholder and builds fresh
/// requests from the answer.
pub async fn request_prompts<P>(
    provider: &P,
    content: &str,
    placeholders: &[Placeholder],
    settings: &ProviderSettings,
) -> Result<Vec<AssetRequest>, PromptGenerationError>
where
    P: PromptProvider + ?Sized,
{
    let expected = placeholders.len();
    info!(count = expected, provider = %settings.provider, "[PIPELINE] Requesting image prompts");

    let response = provider
        .generate_prompts(content, expected, settings)
        .await
        .map_err(|e| {
            error!(error = ?e, "[PIPELINE][ERROR] Prompt provider call failed");
            PromptGenerationError::Transport(e.to_string())
        })?;

    if !response.success {
        let reason = response
            .error
            .unwrap_or_else(|| "no reason given".to_string());
        error!(reason = %reason, "[PIPELINE][ERROR] Prompt provider rejected the request");
        return Err(PromptGenerationError::Rejected(reason));
    }
    if response.prompts.len() != expected {
        error!(
            expected,
            found = response.prompts.len(),
            "[PIPELINE][ERROR] Prompt count does not match placeholder count"
        );
        return Err(PromptGenerationError::CountMismatch {
            expected,
            found: response.prompts.len(),
        });
    }

    debug!(prompts = ?response.prompts, "[PIPELINE][DEBUG] Received prompts");
    Ok(placeholders
        .iter()
        .zip(response.prompts)
        .map(|(placeholder, prompt)| AssetRequest::new(placeholder.key.clone(), prompt))
        .collect())
}

/// Handle to the shared request collection. Cloning is cheap; clones share state.
#[derive(Clone)]
pub struct AssetPipeline {
    provider: Arc<dyn AssetProvider>,
    settings: Arc<ProviderSettings>,
    state: Arc<Mutex<PipelineState>>,
    limiter: Arc<Semaphore>,
}

impl AssetPipeline {
    pub fn new(
        provider: Arc<dyn AssetProvider>,
        settings: ProviderSettings,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            provider,
            settings: Arc::new(settings),
            state: Arc::new(Mutex::new(PipelineState {
                token: 0,
                requests: Vec::new(),
            })),
            limiter: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
        }
    }

    /// Replaces the request collection wholesale. Returns the new token.
    pub async fn load(&self, requests: Vec<AssetRequest>) -> u64 {
        let mut state = self.state.lock().await;
        state.token += 1;
        state.requests = requests;
        info!(token = state.token, total = state.requests.len(), "[PIPELINE] Loaded asset requests");
        state.token
    }

    /// Returns every request to `Pending`, keeping prompts. In-flight work is orphaned.
    pub async fn reset(&self) -> u64 {
        let mut state = self.state.lock().await;
        state.token += 1;
        for request in state.requests.iter_mut() {
            request.state = AssetState::Pending;
            request.asset_url = None;
            request.error = None;
        }
        info!(token = state.token, "[PIPELINE] Reset all asset requests to Pending");
        state.token
    }

    /// Drops all requests. In-flight work is orphaned.
    pub async fn clear(&self) -> u64 {
        let mut state = self.state.lock().await;
        state.token += 1;
        state.requests.clear();
        info!(token = state.token, "[PIPELINE] Cleared asset requests");
        state.token
    }

    pub async fn snapshot(&self) -> PipelineRun {
        let state = self.state.lock().await;
        PipelineRun::new(state.token, state.requests.clone())
    }

    /// Bulk run over every `Pending` or `Failed` item. Waits for all of them.
    pub async fn run_all(&self) -> BulkRunReport {
        self.run_where(|state| matches!(state, AssetState::Pending | AssetState::Failed))
            .await
    }

    /// Bulk run over `Failed` items only.
    pub async fn retry_failed(&self) -> BulkRunReport {
        self.run_where(|state| state == AssetState::Failed).await
    }

    /// Retries a single item without touching its siblings.
    pub async fn retry(&self, key: &str) -> Result<AssetRequest, PipelineError> {
        let (token, prompt) = {
            let mut state = self.state.lock().await;
            let token = state.token;
            let request = state
                .requests
                .iter_mut()
                .find(|r| r.placeholder_key == key)
                .ok_or_else(|| PipelineError::UnknownPlaceholder(key.to_string()))?;
            match request.state {
                AssetState::Pending | AssetState::Failed => request.launch(),
                other => {
                    return Err(PipelineError::NotRetryable {
                        key: key.to_string(),
                        state: other,
                    })
                }
            }
            (token, request.prompt.clone())
        };

        info!(key, token, "[PIPELINE] Retrying asset generation");
        let handle = tokio::spawn(self.attempt(token, key.to_string(), prompt));
        if let Err(e) = handle.await {
            self.abandon(token, key, &e.to_string()).await;
        }

        let state = self.state.lock().await;
        state
            .requests
            .iter()
            .find(|r| r.placeholder_key == key)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownPlaceholder(key.to_string()))
    }

    async fn run_where<F>(&self, launchable: F) -> BulkRunReport
    where
        F: Fn(AssetState) -> bool,
    {
        let (token, jobs) = {
            let mut state = self.state.lock().await;
            let token = state.token;
            // Claimed before permits are acquired; overlapping runs and retries skip these.
            let jobs: Vec<(String, String)> = state
                .requests
                .iter_mut()
                .filter(|r| launchable(r.state))
                .map(|r| {
                    r.launch();
                    (r.placeholder_key.clone(), r.prompt.clone())
                })
                .collect();
            (token, jobs)
        };

        info!(token, launched = jobs.len(), "[PIPELINE] Starting bulk generation run");

        let (keys, handles): (Vec<String>, Vec<_>) = jobs
            .into_iter()
            .map(|(key, prompt)| {
                let handle = tokio::spawn(self.attempt(token, key.clone(), prompt));
                (key, handle)
            })
            .unzip();

        let mut report = BulkRunReport {
            token,
            total: keys.len(),
            successful: 0,
            failed: 0,
            discarded: 0,
        };
        for (key, joined) in keys.iter().zip(join_all(handles).await) {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => self.abandon(token, key, &e.to_string()).await,
            };
            match outcome {
                Outcome::Ready => report.successful += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Discarded => report.discarded += 1,
            }
        }

        info!(
            token,
            total = report.total,
            successful = report.successful,
            failed = report.failed,
            discarded = report.discarded,
            "[PIPELINE] Bulk generation run settled"
        );
        report
    }

    /// One generation attempt, detached from the pipeline borrow so it can be spawned.
    fn attempt(
        &self,
        token: u64,
        key: String,
        prompt: String,
    ) -> impl std::future::Future<Output = Outcome> + Send + 'static {
        let provider = Arc::clone(&self.provider);
        let settings = Arc::clone(&self.settings);
        let state = Arc::clone(&self.state);
        let limiter = Arc::clone(&self.limiter);
        async move {
            let _permit = match limiter.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return Outcome::Discarded,
            };
            if state.lock().await.token != token {
                debug!(key = %key, token, "[PIPELINE] Skipping superseded generation before start");
                return Outcome::Discarded;
            }

            debug!(key = %key, "[PIPELINE] Calling asset provider");
            let result = provider.generate_asset(&prompt, &settings).await;

            let mut state = state.lock().await;
            if state.token != token {
                debug!(key = %key, token, current = state.token, "[PIPELINE] Discarding stale completion");
                return Outcome::Discarded;
            }
            let Some(request) = state.requests.iter_mut().find(|r| r.placeholder_key == key) else {
                return Outcome::Discarded;
            };
            match result {
                Ok(url) => {
                    info!(key = %key, url = %url, "[PIPELINE] Asset ready");
                    request.state = AssetState::Ready;
                    request.asset_url = Some(url);
                    request.error = None;
                    Outcome::Ready
                }
                Err(e) => {
                    let failure = AssetGenerationError {
                        key: key.clone(),
                        message: e.to_string(),
                    };
                    warn!(error = %failure, "[PIPELINE] Asset generation failed");
                    request.state = AssetState::Failed;
                    request.asset_url = None;
                    request.error = Some(failure.message);
                    Outcome::Failed
                }
            }
        }
    }

    /// Marks an item whose task died without reporting back.
    async fn abandon(&self, token: u64, key: &str, reason: &str) -> Outcome {
        error!(key, reason, "[PIPELINE][ERROR] Generation task aborted");
        let mut state = self.state.lock().await;
        if state.token != token {
            return Outcome::Discarded;
        }
        match state.requests.iter_mut().find(|r| r.placeholder_key == key) {
            Some(request) => {
                request.state = AssetState::Failed;
                request.error = Some(format!("generation task aborted: {reason}"));
                Outcome::Failed
            }
            None => Outcome::Discarded,
        }
    }
}
