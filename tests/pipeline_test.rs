//! Pipeline behavior tests against in-memory collaborators.
//!
//! These cover the status state machine, the all-or-nothing commit policy,
//! and the vision-stage short-circuit, with the Gemini client mocked out.

mod helpers;

use std::sync::Arc;

use uuid::Uuid;

use brandlens::db::store::{AnalysisStore, StoreError};
use brandlens::models::analysis::AnalysisStatus;
use brandlens::models::modules::{ModuleKind, ModuleResults};
use brandlens::prompts;
use brandlens::services::gemini::GenerationError;
use brandlens::services::pipeline::{AnalysisPipeline, OrchestrationError};
use brandlens::services::registry::{configured_modules, ModuleSpec};

use helpers::{
    distinct_module_json, sample_image, sample_vision_json, MemoryImages, MemoryStore,
    MockGenerator,
};

const IMAGE_KEY: &str = "uploads/test-photo.enc";

struct Harness {
    vision: MockGenerator,
    modules: MockGenerator,
    store: MemoryStore,
    pipeline: AnalysisPipeline<MockGenerator, MemoryStore, MemoryImages>,
}

/// Wire a pipeline with a pending analysis, a stored image, and a
/// successfully scripted vision stage plus all 9 modules.
fn harness(id: Uuid) -> Harness {
    let vision = MockGenerator::new();
    vision.script(prompts::VISION_SYSTEM_PROMPT, Ok(sample_vision_json()));

    let modules = MockGenerator::new();
    for kind in ModuleKind::ALL {
        modules.script_module(kind, Ok(distinct_module_json(kind)));
    }

    let store = MemoryStore::new();
    store.insert_pending(id, IMAGE_KEY);

    let images = MemoryImages::new();
    images.put(IMAGE_KEY, sample_image());

    let pipeline = AnalysisPipeline::new(
        Arc::new(vision.clone()),
        Arc::new(modules.clone()),
        store.clone(),
        images,
    );

    Harness {
        vision,
        modules,
        store,
        pipeline,
    }
}

/// All 9 modules succeed with distinct payloads: completed, 9 child
/// records, each field-exact against its scripted payload.
#[tokio::test]
async fn test_all_modules_succeed_commits_everything() {
    let id = Uuid::new_v4();
    let h = harness(id);

    h.pipeline.start(id, IMAGE_KEY, None).await.unwrap();

    assert_eq!(h.store.status_of(id), Some(AnalysisStatus::Completed));
    assert_eq!(h.store.module_count(id), 9);
    assert_eq!(h.store.error_of(id), None);

    // One vision call, one call per module
    assert_eq!(h.vision.call_count(), 1);
    assert_eq!(h.modules.call_count(), 9);

    // Persisted records carry exactly the scripted payloads
    let snapshot = h.store.fetch(id).await.unwrap().unwrap();
    let expected = ModuleResults::from_outputs(ModuleKind::ALL.map(|kind| {
        ModuleSpec::for_kind(kind)
            .parse(distinct_module_json(kind))
            .unwrap()
    }));
    assert_eq!(snapshot.results, Some(expected));

    // Vision extract was written in the same commit
    let vision = snapshot.analysis.vision_result.unwrap();
    assert_eq!(vision.mood.as_deref(), Some("warm"));
    assert_eq!(vision.labels.unwrap(), vec!["food", "condiment"]);
}

/// One failing module out of 9: failed status, the failing module's detail
/// recorded, and none of the 8 successful results persisted.
#[tokio::test]
async fn test_single_module_failure_discards_all_results() {
    let id = Uuid::new_v4();
    let h = harness(id);
    h.modules.script_module(
        ModuleKind::ActionPlan,
        Err(GenerationError::Validation(
            "action_plan result does not match its schema: missing field".to_string(),
        )),
    );

    let err = h.pipeline.start(id, IMAGE_KEY, None).await.unwrap_err();
    assert!(matches!(
        err,
        OrchestrationError::ModuleStage {
            module: ModuleKind::ActionPlan,
            ..
        }
    ));

    assert_eq!(h.store.status_of(id), Some(AnalysisStatus::Failed));
    assert_eq!(h.store.module_count(id), 0);

    let error = h.store.error_of(id).unwrap();
    assert!(error.contains("action_plan"));

    // Every module still ran to completion; no short-circuit cancellation
    assert_eq!(h.modules.call_count(), 9);
}

/// Multiple failing modules: the recorded error is the first failure in
/// registry order, not completion order.
#[tokio::test]
async fn test_first_failure_in_registry_order_wins() {
    let id = Uuid::new_v4();
    let h = harness(id);
    h.modules.script_module(
        ModuleKind::Packaging,
        Err(GenerationError::Api {
            status: 500,
            message: "backend exploded".to_string(),
        }),
    );
    h.modules.script_module(
        ModuleKind::Taste,
        Err(GenerationError::RateLimited("quota exhausted".to_string())),
    );

    let err = h.pipeline.start(id, IMAGE_KEY, None).await.unwrap_err();
    match err {
        OrchestrationError::ModuleStage { module, source } => {
            // Taste precedes packaging in registry order
            assert_eq!(module, ModuleKind::Taste);
            assert!(matches!(source, GenerationError::RateLimited(_)));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(h.store.status_of(id), Some(AnalysisStatus::Failed));
    assert_eq!(h.store.module_count(id), 0);
}

/// Vision transport failure: failed status, error references the
/// transport problem, and zero module generation calls were attempted.
#[tokio::test]
async fn test_vision_failure_skips_module_stage() {
    let id = Uuid::new_v4();
    let h = harness(id);
    h.vision.script(
        prompts::VISION_SYSTEM_PROMPT,
        Err(GenerationError::Transport("connection reset".to_string())),
    );

    let err = h.pipeline.start(id, IMAGE_KEY, None).await.unwrap_err();
    assert!(matches!(
        err,
        OrchestrationError::VisionStage(GenerationError::Transport(_))
    ));

    assert_eq!(h.store.status_of(id), Some(AnalysisStatus::Failed));
    assert_eq!(h.store.module_count(id), 0);
    assert_eq!(h.modules.call_count(), 0);

    let error = h.store.error_of(id).unwrap();
    assert!(error.contains("transport"));
}

/// A missing stored image fails the job before any generation call.
#[tokio::test]
async fn test_missing_image_fails_before_any_generation() {
    let id = Uuid::new_v4();
    let h = harness(id);

    let err = h
        .pipeline
        .start(id, "uploads/no-such-object.enc", None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::ImageLoad { .. }));

    assert_eq!(h.store.status_of(id), Some(AnalysisStatus::Failed));
    assert_eq!(h.vision.call_count(), 0);
    assert_eq!(h.modules.call_count(), 0);
}

/// Starting an unknown job is a store error and touches nothing.
#[tokio::test]
async fn test_start_unknown_job() {
    let id = Uuid::new_v4();
    let h = harness(id);

    let missing = Uuid::new_v4();
    let err = h.pipeline.start(missing, IMAGE_KEY, None).await.unwrap_err();
    assert!(matches!(
        err,
        OrchestrationError::Store(StoreError::NotFound(_))
    ));
    assert_eq!(h.vision.call_count(), 0);
}

/// A terminal job cannot be re-entered: the processing mark is refused and
/// the record is left untouched.
#[tokio::test]
async fn test_terminal_job_cannot_be_restarted() {
    let id = Uuid::new_v4();
    let h = harness(id);

    h.pipeline.start(id, IMAGE_KEY, None).await.unwrap();
    assert_eq!(h.store.status_of(id), Some(AnalysisStatus::Completed));

    let err = h.pipeline.start(id, IMAGE_KEY, None).await.unwrap_err();
    assert!(matches!(
        err,
        OrchestrationError::Store(StoreError::InvalidTransition { .. })
    ));

    // Still completed, children intact, no new generation calls beyond the
    // first run's 1 + 9
    assert_eq!(h.store.status_of(id), Some(AnalysisStatus::Completed));
    assert_eq!(h.store.module_count(id), 9);
    assert_eq!(h.vision.call_count(), 1);
    assert_eq!(h.modules.call_count(), 9);
}

/// Reading a completed analysis twice returns identical data; reads have
/// no side effects.
#[tokio::test]
async fn test_status_read_is_idempotent() {
    let id = Uuid::new_v4();
    let h = harness(id);

    h.pipeline.start(id, IMAGE_KEY, None).await.unwrap();

    let first = h.store.fetch(id).await.unwrap().unwrap();
    let second = h.store.fetch(id).await.unwrap().unwrap();

    assert_eq!(first.analysis.status, second.analysis.status);
    assert_eq!(first.analysis.updated_at, second.analysis.updated_at);
    assert_eq!(first.results, second.results);
}

/// Non-terminal and failed analyses never expose module results.
#[tokio::test]
async fn test_results_only_visible_when_completed() {
    let id = Uuid::new_v4();
    let h = harness(id);

    // Pending: no results
    let snapshot = h.store.fetch(id).await.unwrap().unwrap();
    assert_eq!(snapshot.analysis.status, AnalysisStatus::Pending);
    assert!(snapshot.results.is_none());

    // Failed: still no results
    h.modules.script_module(
        ModuleKind::Seo,
        Err(GenerationError::Validation("not JSON".to_string())),
    );
    h.pipeline.start(id, IMAGE_KEY, None).await.unwrap_err();

    let snapshot = h.store.fetch(id).await.unwrap().unwrap();
    assert_eq!(snapshot.analysis.status, AnalysisStatus::Failed);
    assert!(snapshot.results.is_none());
    assert!(snapshot.analysis.vision_result.is_none());
}

/// The seller context is forwarded into every module prompt; the registry
/// drives one generation per configured module.
#[tokio::test]
async fn test_fan_out_covers_every_configured_module() {
    let id = Uuid::new_v4();
    let h = harness(id);

    h.pipeline
        .start(id, IMAGE_KEY, Some("small-batch chili sauce"))
        .await
        .unwrap();

    assert_eq!(h.modules.call_count(), configured_modules().len());
    assert_eq!(h.store.module_count(id), configured_modules().len());
}

/// The store refuses a partial result set outright.
#[tokio::test]
async fn test_store_rejects_incomplete_commit() {
    let id = Uuid::new_v4();
    let store = MemoryStore::new();
    store.insert_pending(id, IMAGE_KEY);
    store.mark_processing(id).await.unwrap();

    let partial = ModuleResults {
        seo: Some(
            match ModuleSpec::for_kind(ModuleKind::Seo)
                .parse(distinct_module_json(ModuleKind::Seo))
                .unwrap()
            {
                brandlens::models::modules::ModuleOutput::Seo(r) => r,
                _ => unreachable!(),
            },
        ),
        ..Default::default()
    };

    let err = store
        .commit_results(id, &Default::default(), &partial)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::IncompleteResults));
    assert_eq!(store.module_count(id), 0);
    assert_eq!(store.status_of(id), Some(AnalysisStatus::Processing));
}
