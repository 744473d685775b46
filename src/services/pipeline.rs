use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use uuid::Uuid;

use crate::db::store::{AnalysisStore, StoreError};
use crate::models::modules::{ModuleKind, ModuleOutput, ModuleResults};
use crate::services::gemini::{GenerationError, TextGenerator};
use crate::services::images::{ImageSource, ImageSourceError};
use crate::services::prompt::{PromptBuilder, PromptError, PromptPayload};
use crate::services::registry::{self, ModuleSpec};
use crate::services::vision::VisionExtractor;

/// Orchestrates one analysis run: a single vision extraction seeding N
/// concurrent, schema-constrained module generations, with an
/// all-or-nothing commit.
///
/// Status transitions per job are monotonic:
/// `pending -> processing -> {completed | failed}`. Exactly one pipeline
/// execution owns a given analysis id at a time; guarding against double
/// starts is the enqueueing layer's responsibility.
pub struct AnalysisPipeline<G, S, I> {
    vision: VisionExtractor<G>,
    generator: Arc<G>,
    store: S,
    images: I,
    modules: Vec<ModuleSpec>,
}

impl<G, S, I> AnalysisPipeline<G, S, I>
where
    G: TextGenerator,
    S: AnalysisStore,
    I: ImageSource,
{
    /// `vision_generator` and `module_generator` may be the same instance;
    /// they are separate so the two stages can use different model ids.
    pub fn new(vision_generator: Arc<G>, module_generator: Arc<G>, store: S, images: I) -> Self {
        Self {
            vision: VisionExtractor::new(vision_generator),
            generator: module_generator,
            store,
            images,
            modules: registry::configured_modules(),
        }
    }

    /// Run the full pipeline for an already-created pending analysis.
    ///
    /// Usable identically from the queue worker or an inline task. On any
    /// failure after the job entered `processing`, the job is marked
    /// `failed` before this returns; it is never left stuck in
    /// `processing`.
    pub async fn start(
        &self,
        analysis_id: Uuid,
        image_key: &str,
        context: Option<&str>,
    ) -> Result<(), OrchestrationError> {
        let started = Instant::now();

        // Persist the processing mark immediately so a concurrent status
        // read never sees stale 'pending' once the pipeline has begun.
        self.store.mark_processing(analysis_id).await?;

        match self.run(analysis_id, image_key, context).await {
            Ok(()) => {
                metrics::counter!("analysis_jobs_completed").increment(1);
                metrics::histogram!("analysis_pipeline_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(
                    analysis_id = %analysis_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "analysis completed"
                );
                Ok(())
            }
            Err(e) => {
                metrics::counter!("analysis_jobs_failed").increment(1);
                tracing::error!(analysis_id = %analysis_id, error = %e, "analysis failed");

                if let Err(store_err) = self.store.mark_failed(analysis_id, &e.to_string()).await {
                    tracing::error!(
                        analysis_id = %analysis_id,
                        error = %store_err,
                        "failed to record failure status"
                    );
                }
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        analysis_id: Uuid,
        image_key: &str,
        context: Option<&str>,
    ) -> Result<(), OrchestrationError> {
        // Vision stage. Fatal on failure: every module prompt is built from
        // the extract, so no module generation is attempted without it.
        let image = self
            .images
            .fetch(image_key)
            .await
            .map_err(|source| OrchestrationError::ImageLoad {
                key: image_key.to_string(),
                source,
            })?;
        let images = [image];

        let vision_extract = self
            .vision
            .extract(&images)
            .await
            .map_err(OrchestrationError::VisionStage)?;

        tracing::debug!(analysis_id = %analysis_id, "vision extraction complete");

        // Prompt assembly is pure; done up front for every module.
        let mut prompts: Vec<PromptPayload> = Vec::with_capacity(self.modules.len());
        for spec in &self.modules {
            let payload = PromptBuilder::new()
                .system(spec.system_instruction)
                .images(&images)
                .instruction(spec.instruction)
                .context(context)
                .vision(Some(&vision_extract))
                .build()?;
            prompts.push(payload);
        }

        // Fan out all module generations concurrently. Modules are
        // independent; wall-clock latency is bounded by the slowest one.
        // Each task converts its own failure into an outcome, so one
        // failure never short-circuits the others: every module's fate is
        // known before the job's fate is decided.
        let tasks = self.modules.iter().zip(prompts.iter()).map(|(spec, payload)| {
            let generator = Arc::clone(&self.generator);
            async move {
                let raw = generator.generate(payload, &spec.response_schema()).await?;
                spec.parse(raw)
            }
        });
        let outcomes: Vec<Result<ModuleOutput, GenerationError>> = join_all(tasks).await;

        // All-or-nothing: any module failure fails the job, and none of the
        // sibling successes are persisted. The recorded error is the first
        // failure in registry order.
        let mut outputs = Vec::with_capacity(outcomes.len());
        let mut first_failure: Option<(ModuleKind, GenerationError)> = None;

        for (spec, outcome) in self.modules.iter().zip(outcomes) {
            match outcome {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    tracing::warn!(
                        analysis_id = %analysis_id,
                        module = %spec.kind,
                        error = %e,
                        "module generation failed"
                    );
                    if first_failure.is_none() {
                        first_failure = Some((spec.kind, e));
                    }
                }
            }
        }

        if let Some((module, source)) = first_failure {
            return Err(OrchestrationError::ModuleStage { module, source });
        }

        // Single transaction: vision extract + every module result +
        // status flip to completed.
        let results = ModuleResults::from_outputs(outputs);
        self.store
            .commit_results(analysis_id, &vision_extract, &results)
            .await?;

        Ok(())
    }
}

/// The one failure recorded per analysis run.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    /// The uploaded image could not be loaded. Precedes the vision stage;
    /// like a vision failure, no module generation is attempted.
    #[error("failed to load image {key}: {source}")]
    ImageLoad {
        key: String,
        #[source]
        source: ImageSourceError,
    },

    #[error("vision analysis failed: {0}")]
    VisionStage(#[source] GenerationError),

    #[error("{module} analysis failed: {source}")]
    ModuleStage {
        module: ModuleKind,
        #[source]
        source: GenerationError,
    },

    /// Assembly precondition violation; indicates a registry programming
    /// error, not a runtime fault.
    #[error("prompt assembly failed: {0}")]
    Prompt(#[from] PromptError),

    #[error("persistence failure: {0}")]
    Store(#[from] StoreError),
}
