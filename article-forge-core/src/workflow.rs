//! High-level cycle: plan → prompts → generate → assemble → publish.
//!
//! A [`Workflow`] owns one [`WorkflowDocument`] for the duration of a generation and
//! publish cycle, and wires the collaborators into the pipeline and the publish
//! coordinator.
//!
//! # Lifecycle
//! - `assembled` is filled as soon as every planned asset is `Ready` (immediately
//!   when the text has no image markers).
//! - `publish_result` is filled by a successful [`Workflow::publish`].
//! - Editing the content or re-planning prompts starts a new cycle: both are
//!   discarded and all requests go back to `Pending` (or are dropped when the
//!   placeholder plan changed).
//!
//! # Error Handling
//! Prompt failures stop the cycle before any generation starts. Per-asset failures
//! never surface as errors; inspect [`Workflow::snapshot`] or the returned
//! [`BulkRunReport`]s instead.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::assemble::assemble;
use crate::config::{PipelineConfig, ProviderSettings, SegmentConfig};
use crate::contract::{AssetProvider, PromptProvider, PublishBackend};
use crate::error::WorkflowError;
use crate::pipeline::{request_prompts, AssetPipeline, AssetRequest, BulkRunReport, PipelineRun};
use crate::placeholder::{plan, Placeholder};
use crate::publish::{PublishCoordinator, PublishResult};
use crate::segment::{segment_with, Segment};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowDocument {
    pub id: Uuid,
    pub raw_content: String,
    pub placeholders: Vec<Placeholder>,
    pub assembled: Option<String>,
    pub publish_result: Option<PublishResult>,
}

impl WorkflowDocument {
    pub fn new(raw_content: impl Into<String>) -> Self {
        let raw_content = raw_content.into();
        let placeholders = plan(&raw_content);
        // Nothing to generate: the raw text is already the final document.
        let assembled = if placeholders.is_empty() {
            assemble(&raw_content, &placeholders, &[]).ok()
        } else {
            None
        };
        Self {
            id: Uuid::new_v4(),
            placeholders,
            raw_content,
            assembled,
            publish_result: None,
        }
    }
}

/// The external services a workflow talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub prompts: Arc<dyn PromptProvider>,
    pub assets: Arc<dyn AssetProvider>,
    pub publisher: Arc<dyn PublishBackend>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowSettings {
    pub prompts: ProviderSettings,
    pub assets: ProviderSettings,
    pub pipeline: PipelineConfig,
    pub segment: SegmentConfig,
}

/// Summary of [`Workflow::run_to_publish`].
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub document_id: Uuid,
    pub segments: usize,
    pub placeholders: usize,
    pub runs: Vec<BulkRunReport>,
    pub ready: usize,
    pub failed: usize,
    pub location: Option<String>,
}

pub struct Workflow {
    document: WorkflowDocument,
    prompts: Arc<dyn PromptProvider>,
    pipeline: AssetPipeline,
    coordinator: PublishCoordinator,
    settings: WorkflowSettings,
}

impl Workflow {
    pub fn new(
        raw_content: impl Into<String>,
        collaborators: Collaborators,
        settings: WorkflowSettings,
    ) -> Self {
        let document = WorkflowDocument::new(raw_content);
        info!(
            document_id = %document.id,
            placeholders = document.placeholders.len(),
            "[WORKFLOW] Planned document"
        );
        Self {
            pipeline: AssetPipeline::new(
                collaborators.assets,
                settings.assets.clone(),
                &settings.pipeline,
            ),
            coordinator: PublishCoordinator::new(collaborators.publisher),
            prompts: collaborators.prompts,
            document,
            settings,
        }
    }

    pub fn document(&self) -> &WorkflowDocument {
        &self.document
    }

    pub fn pipeline(&self) -> &AssetPipeline {
        &self.pipeline
    }

    pub fn coordinator(&self) -> &PublishCoordinator {
        &self.coordinator
    }

    pub async fn snapshot(&self) -> PipelineRun {
        self.pipeline.snapshot().await
    }

    /// Display segments of the current content.
    pub fn segments(&self) -> Vec<Segment> {
        segment_with(&self.document.raw_content, &self.settings.segment)
    }

    /// Starts a new cycle with edited content.
    pub async fn edit_content(&mut self, raw_content: impl Into<String>) {
        let raw_content = raw_content.into();
        let placeholders = plan(&raw_content);
        let same_plan = placeholders == self.document.placeholders;

        self.document.raw_content = raw_content;
        self.document.placeholders = placeholders;
        self.discard_outputs();

        if same_plan {
            self.pipeline.reset().await;
        } else {
            info!(
                placeholders = self.document.placeholders.len(),
                "[WORKFLOW] Placeholder plan changed, prompts must be prepared again"
            );
            self.pipeline.clear().await;
        }
        self.refresh_assembled().await;
    }

    /// Fetches one prompt per placeholder and loads fresh requests.
    /// Returns the number of requests loaded.
    pub async fn prepare_prompts(&mut self) -> Result<usize, WorkflowError> {
        self.discard_outputs();
        let requests = if self.document.placeholders.is_empty() {
            Vec::new()
        } else {
            request_prompts(
                self.prompts.as_ref(),
                &self.document.raw_content,
                &self.document.placeholders,
                &self.settings.prompts,
            )
            .await?
        };
        let loaded = requests.len();
        self.pipeline.load(requests).await;
        self.refresh_assembled().await;
        Ok(loaded)
    }

    /// Bulk run followed by up to `retry_rounds` rounds over the failed items.
    pub async fn generate_assets(&mut self) -> Result<Vec<BulkRunReport>, WorkflowError> {
        self.ensure_prompts().await?;

        let mut runs = vec![self.pipeline.run_all().await];
        for round in 0..self.settings.pipeline.retry_rounds {
            if self.pipeline.snapshot().await.failed_count == 0 {
                break;
            }
            info!(round = round + 1, "[WORKFLOW] Retrying failed assets");
            runs.push(self.pipeline.retry_failed().await);
        }

        self.refresh_assembled().await;
        Ok(runs)
    }

    /// Retries one failed asset.
    pub async fn retry_asset(&mut self, key: &str) -> Result<AssetRequest, WorkflowError> {
        let request = self.pipeline.retry(key).await?;
        self.refresh_assembled().await;
        Ok(request)
    }

    pub async fn publish(&mut self) -> Result<PublishResult, WorkflowError> {
        let run = self.pipeline.snapshot().await;
        let result = self
            .coordinator
            .publish(
                &self.document.raw_content,
                &self.document.placeholders,
                &run,
            )
            .await?;
        self.document.assembled = Some(result.document.clone());
        self.document.publish_result = Some(result.clone());
        Ok(result)
    }

    /// Prepare prompts, generate every asset, then publish.
    pub async fn run_to_publish(&mut self) -> Result<WorkflowReport, WorkflowError> {
        self.prepare_prompts().await?;
        let runs = self.generate_assets().await?;
        let run = self.pipeline.snapshot().await;
        if run.failed_count > 0 {
            warn!(failed = run.failed_count, "[WORKFLOW] Publishing blocked by failed assets");
        }
        let result = self.publish().await?;
        Ok(WorkflowReport {
            document_id: self.document.id,
            segments: self.segments().len(),
            placeholders: self.document.placeholders.len(),
            runs,
            ready: run.ready_count,
            failed: run.failed_count,
            location: result.location,
        })
    }

    async fn ensure_prompts(&self) -> Result<(), WorkflowError> {
        let expected = self.document.placeholders.len();
        if expected > 0 && self.pipeline.snapshot().await.total != expected {
            return Err(WorkflowError::PromptsMissing(expected));
        }
        Ok(())
    }

    fn discard_outputs(&mut self) {
        self.document.assembled = None;
        self.document.publish_result = None;
    }

    async fn refresh_assembled(&mut self) {
        let run = self.pipeline.snapshot().await;
        self.document.assembled = if run.all_ready() {
            assemble(
                &self.document.raw_content,
                &self.document.placeholders,
                &run.requests,
            )
            .ok()
        } else {
            None
        };
    }
}
