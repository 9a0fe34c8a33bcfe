//! Publish gating: `Idle -> Validating -> Publishing -> {Success | Error}`.
//!
//! Each call to [`PublishCoordinator::publish`] is one attempt and always starts
//! over from `Idle`. Validation refuses to go further while any asset is unresolved,
//! so the backend never sees a document with a raw image marker in it.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::assemble::assemble;
use crate::contract::PublishBackend;
use crate::error::PublishError;
use crate::pipeline::PipelineRun;
use crate::placeholder::Placeholder;

/// What the backend reported for a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    pub location: Option<String>,
    pub document: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishState {
    Idle,
    Validating,
    Publishing,
    Success(PublishResult),
    Error(PublishError),
}

/// State names without payload, used for the attempt history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PublishPhase {
    Idle,
    Validating,
    Publishing,
    Success,
    Error,
}

impl PublishState {
    pub fn phase(&self) -> PublishPhase {
        match self {
            PublishState::Idle => PublishPhase::Idle,
            PublishState::Validating => PublishPhase::Validating,
            PublishState::Publishing => PublishPhase::Publishing,
            PublishState::Success(_) => PublishPhase::Success,
            PublishState::Error(_) => PublishPhase::Error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PublishState::Success(_) | PublishState::Error(_))
    }
}

pub struct PublishCoordinator {
    backend: Arc<dyn PublishBackend>,
    state: PublishState,
    phases: Vec<PublishPhase>,
}

impl PublishCoordinator {
    pub fn new(backend: Arc<dyn PublishBackend>) -> Self {
        Self {
            backend,
            state: PublishState::Idle,
            phases: vec![PublishPhase::Idle],
        }
    }

    pub fn state(&self) -> &PublishState {
        &self.state
    }

    /// Phases visited by the latest attempt, starting with `Idle`.
    pub fn phases(&self) -> &[PublishPhase] {
        &self.phases
    }

    /// Runs one publish attempt against the current pipeline snapshot.
    pub async fn publish(
        &mut self,
        raw_content: &str,
        placeholders: &[Placeholder],
        run: &PipelineRun,
    ) -> Result<PublishResult, PublishError> {
        self.state = PublishState::Idle;
        self.phases = vec![PublishPhase::Idle];

        self.enter(PublishState::Validating);
        if !placeholders.is_empty() && run.ready_count != placeholders.len() {
            let err = PublishError::AssetsIncomplete {
                ready: run.ready_count,
                total: placeholders.len(),
            };
            error!(error = %err, "[PUBLISH][ERROR] Validation failed");
            return self.fail(err);
        }

        self.enter(PublishState::Publishing);
        let document = match assemble(raw_content, placeholders, &run.requests) {
            Ok(document) => document,
            Err(e) => {
                error!(error = %e, "[PUBLISH][ERROR] Assembly failed");
                return self.fail(e.into());
            }
        };

        info!(bytes = document.len(), "[PUBLISH] Submitting document to publish backend");
        let response = match self.backend.publish(&document).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = ?e, "[PUBLISH][ERROR] Publish backend call failed");
                return self.fail(PublishError::Backend(e.to_string()));
            }
        };
        if !response.success {
            let reason = response
                .error
                .unwrap_or_else(|| "publish backend reported failure".to_string());
            error!(reason = %reason, "[PUBLISH][ERROR] Publish backend rejected the document");
            return self.fail(PublishError::Backend(reason));
        }

        let result = PublishResult {
            location: response.location,
            document,
        };
        info!(location = ?result.location, "[PUBLISH] Published");
        self.enter(PublishState::Success(result.clone()));
        Ok(result)
    }

    fn enter(&mut self, state: PublishState) {
        self.phases.push(state.phase());
        self.state = state;
    }

    fn fail(&mut self, err: PublishError) -> Result<PublishResult, PublishError> {
        self.enter(PublishState::Error(err.clone()));
        Err(err)
    }
}
