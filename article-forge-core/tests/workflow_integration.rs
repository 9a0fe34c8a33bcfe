mod common;

use std::sync::Arc;

use article_forge_core::contract::{
    MockAssetProvider, MockPromptProvider, MockPublishBackend, PromptResponse, PublishResponse,
};
use article_forge_core::error::{PromptGenerationError, PublishError, WorkflowError};
use article_forge_core::pipeline::AssetState;
use article_forge_core::workflow::{Collaborators, Workflow, WorkflowSettings};
use common::{numbered_prompts, pipeline_config, url_for, FlakyAssets};

const ARTICLE: &str = "테슬라 주가가 다시 움직이고 있습니다.\n[IMAGE]\n전문가들의 의견은 엇갈립니다.\n[IMAGE]\n앞으로의 전망을 살펴보겠습니다.";

fn publishing_backend() -> MockPublishBackend {
    let mut backend = MockPublishBackend::new();
    backend
        .expect_publish()
        .withf(|document: &str| !document.contains("[IMAGE]"))
        .returning(|_| {
            Ok(PublishResponse {
                success: true,
                location: Some("https://blog.example.com/posts/42".into()),
                error: None,
            })
        });
    backend
}

fn workflow_with(assets: Arc<FlakyAssets>, retry_rounds: usize) -> Workflow {
    Workflow::new(
        ARTICLE,
        Collaborators {
            prompts: Arc::new(numbered_prompts()),
            assets,
            publisher: Arc::new(publishing_backend()),
        },
        WorkflowSettings {
            pipeline: pipeline_config(4, retry_rounds),
            ..WorkflowSettings::default()
        },
    )
}

#[tokio::test]
async fn test_failed_asset_retried_individually_then_published() {
    let assets = Arc::new(FlakyAssets::new(&[("prompt-2", 1)]));
    let mut workflow = workflow_with(assets.clone(), 0);

    assert_eq!(workflow.prepare_prompts().await.expect("prompts"), 2);
    let runs = workflow.generate_assets().await.expect("generation runs");
    assert_eq!(runs.len(), 1);
    assert_eq!((runs[0].total, runs[0].successful, runs[0].failed), (2, 1, 1));
    assert!(workflow.document().assembled.is_none());

    let blocked = workflow.publish().await.unwrap_err();
    assert!(matches!(
        blocked,
        WorkflowError::Publish(PublishError::AssetsIncomplete { ready: 1, total: 2 })
    ));

    let retried = workflow.retry_asset("image2").await.expect("retry runs");
    assert_eq!(retried.state, AssetState::Ready);

    let run = workflow.snapshot().await;
    assert_eq!(run.ready_count, 2);
    let assembled = workflow
        .document()
        .assembled
        .clone()
        .expect("assembled once every asset is ready");
    let first = assembled.find(&url_for("prompt-1")).expect("image1 inserted");
    let second = assembled.find(&url_for("prompt-2")).expect("image2 inserted");
    assert!(first < second);

    let result = workflow.publish().await.expect("publish proceeds");
    assert_eq!(result.location.as_deref(), Some("https://blog.example.com/posts/42"));
    assert_eq!(workflow.document().publish_result, Some(result));
    assert_eq!(assets.calls_for("prompt-1"), 1);
}

#[tokio::test]
async fn test_retry_rounds_recover_transient_failures() {
    let assets = Arc::new(FlakyAssets::new(&[("prompt-1", 1), ("prompt-2", 1)]));
    let mut workflow = workflow_with(assets, 1);

    let report = workflow.run_to_publish().await.expect("published after retry round");
    assert_eq!(report.placeholders, 2);
    assert_eq!(report.runs.len(), 2);
    assert_eq!(report.runs[1].successful, 2);
    assert_eq!((report.ready, report.failed), (2, 0));
    assert!(report.segments >= 3);
}

#[tokio::test]
async fn test_edit_with_same_plan_resets_cycle() {
    let assets = Arc::new(FlakyAssets::new(&[]));
    let mut workflow = workflow_with(assets, 0);
    workflow.run_to_publish().await.expect("first cycle publishes");
    assert!(workflow.document().publish_result.is_some());

    workflow
        .edit_content(ARTICLE.replace("살펴보겠습니다", "정리해 보겠습니다"))
        .await;

    assert!(workflow.document().assembled.is_none());
    assert!(workflow.document().publish_result.is_none());
    let run = workflow.snapshot().await;
    assert_eq!(run.total, 2);
    assert!(run.requests.iter().all(|r| r.state == AssetState::Pending));
    assert_eq!(run.requests[1].prompt, "prompt-2");

    workflow.generate_assets().await.expect("regeneration runs");
    assert!(workflow.document().assembled.is_some());
}

#[tokio::test]
async fn test_edit_with_new_plan_requires_fresh_prompts() {
    let assets = Arc::new(FlakyAssets::new(&[]));
    let mut workflow = workflow_with(assets, 0);
    workflow.prepare_prompts().await.expect("prompts");

    workflow
        .edit_content(format!("{ARTICLE}\n[IMAGE]\n마지막 이미지"))
        .await;
    assert_eq!(workflow.document().placeholders.len(), 3);
    assert_eq!(workflow.snapshot().await.total, 0);

    let err = workflow.generate_assets().await.unwrap_err();
    assert!(matches!(err, WorkflowError::PromptsMissing(3)));

    assert_eq!(workflow.prepare_prompts().await.expect("prompts"), 3);
    let runs = workflow.generate_assets().await.expect("generation runs");
    assert_eq!(runs[0].successful, 3);
}

#[tokio::test]
async fn test_prompt_failure_blocks_generation() {
    let mut prompts = MockPromptProvider::new();
    prompts.expect_generate_prompts().times(1).returning(|_, _, _| {
        Ok(PromptResponse {
            success: false,
            prompts: vec![],
            error: Some("invalid api key".into()),
        })
    });
    let mut assets = MockAssetProvider::new();
    assets.expect_generate_asset().never();
    let mut backend = MockPublishBackend::new();
    backend.expect_publish().never();

    let mut workflow = Workflow::new(
        ARTICLE,
        Collaborators {
            prompts: Arc::new(prompts),
            assets: Arc::new(assets),
            publisher: Arc::new(backend),
        },
        WorkflowSettings::default(),
    );

    let err = workflow.run_to_publish().await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Prompts(PromptGenerationError::Rejected(ref m)) if m == "invalid api key"
    ));
    assert_eq!(workflow.snapshot().await.total, 0);
}

#[tokio::test]
async fn test_segments_follow_document_content() {
    let workflow = workflow_with(Arc::new(FlakyAssets::new(&[])), 0);
    let segments = workflow.segments();
    assert!(segments.iter().any(|s| s.text.contains("[IMAGE]")));
    assert!(segments.iter().all(|s| !s.text.is_empty()));
}

#[tokio::test]
async fn test_document_without_markers_is_assembled_on_creation() {
    let mut prompts = MockPromptProvider::new();
    prompts.expect_generate_prompts().never();
    let mut assets = MockAssetProvider::new();
    assets.expect_generate_asset().never();

    let content = "이미지가 필요 없는 짧은 공지입니다.";
    let workflow = Workflow::new(
        content,
        Collaborators {
            prompts: Arc::new(prompts),
            assets: Arc::new(assets),
            publisher: Arc::new(publishing_backend()),
        },
        WorkflowSettings::default(),
    );

    assert!(workflow.document().placeholders.is_empty());
    assert_eq!(workflow.document().assembled.as_deref(), Some(content));

    let with_markers = workflow_with(Arc::new(FlakyAssets::new(&[])), 0);
    assert!(with_markers.document().assembled.is_none());
}
