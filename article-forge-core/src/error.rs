//! Error taxonomy for the article pipeline.
//!
//! Segmentation has no error type: the forced cut always makes progress.
//! Per-item generation failures never escape the pipeline; they are recorded on the
//! item as [`crate::pipeline::AssetState::Failed`].

use thiserror::Error;

use crate::pipeline::AssetState;

/// Transport-level failure reported by a collaborator.
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// Global failure while obtaining prompts. Blocks the pipeline from starting.
#[derive(Debug, Error)]
pub enum PromptGenerationError {
    #[error("prompt provider call failed: {0}")]
    Transport(String),
    #[error("prompt provider rejected the request: {0}")]
    Rejected(String),
    #[error("prompt provider returned {found} prompts, expected {expected}")]
    CountMismatch { expected: usize, found: usize },
}

/// Failure of a single generation attempt.
#[derive(Debug, Error)]
#[error("asset generation failed for {key}: {message}")]
pub struct AssetGenerationError {
    pub key: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("asset for {key} is not ready (state: {state:?})")]
    IncompleteAssets { key: String, state: AssetState },
    #[error("no asset request exists for {key}")]
    MissingRequest { key: String },
    #[error("document has {found} image markers but {expected} placeholders were planned")]
    PlanMismatch { expected: usize, found: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("assets incomplete: {ready} of {total} ready")]
    AssetsIncomplete { ready: usize, total: usize },
    #[error("assembly failed: {0}")]
    Assembly(#[from] AssemblyError),
    #[error("publish backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("no asset request for placeholder {0}")]
    UnknownPlaceholder(String),
    #[error("placeholder {key} cannot be retried while {state:?}")]
    NotRetryable { key: String, state: AssetState },
}

/// Errors surfaced by [`crate::workflow::Workflow`].
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Prompts(#[from] PromptGenerationError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error("prompts have not been prepared for {0} placeholders")]
    PromptsMissing(usize),
}
