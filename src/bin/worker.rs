use brandlens::{
    config::AppConfig,
    db::{self, store::PgAnalysisStore},
    services::{
        encryption::EncryptionService,
        gemini::GeminiClient,
        images::StoredImageSource,
        pipeline::AnalysisPipeline,
        queue::{JobQueue, QueuedAnalysis},
        storage::ObjectStorage,
    },
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL_MS: u64 = 1000; // 1 second

type ProductionPipeline = AnalysisPipeline<GeminiClient, PgAnalysisStore, StoredImageSource>;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting brandlens analysis worker");

    // Load configuration
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Initialize database
    tracing::info!("Connecting to PostgreSQL");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Initialize services
    tracing::info!("Initializing services");
    let storage = ObjectStorage::new(
        &config.s3_bucket,
        &config.s3_endpoint,
        &config.s3_access_key,
        &config.s3_secret_key,
    )
    .expect("Failed to initialize object storage client");

    let encryption =
        EncryptionService::new(&config.encryption_key).expect("Failed to initialize encryption");

    let queue = JobQueue::new(&config.redis_url).expect("Failed to initialize job queue");

    let timeout = Duration::from_secs(config.gemini_timeout_secs);
    let vision_client = GeminiClient::new(&config.google_api_key, &config.gemini_vision_model, timeout)
        .expect("Failed to initialize Gemini vision client");
    let llm_client = GeminiClient::new(&config.google_api_key, &config.gemini_llm_model, timeout)
        .expect("Failed to initialize Gemini client");

    let images = StoredImageSource::new(Arc::new(storage), Arc::new(encryption));
    let store = PgAnalysisStore::new(db_pool);

    let pipeline = AnalysisPipeline::new(
        Arc::new(vision_client),
        Arc::new(llm_client),
        store,
        images,
    );

    tracing::info!("Worker ready, starting job processing loop");

    // Main processing loop
    loop {
        match process_next_job(&queue, &pipeline).await {
            Ok(true) => {
                tracing::debug!("Job processed, checking for next job");
            }
            Ok(false) => {
                tracing::trace!("No jobs available, sleeping");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Error processing job, will retry");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
        }
    }
}

/// Process the next job from the queue.
/// Returns Ok(true) if a job was processed, Ok(false) if no job available.
async fn process_next_job(
    queue: &JobQueue,
    pipeline: &ProductionPipeline,
) -> Result<bool, Box<dyn std::error::Error>> {
    let job: QueuedAnalysis = match queue.dequeue().await? {
        Some(j) => j,
        None => return Ok(false),
    };

    if let Ok(depth) = queue.queue_depth().await {
        metrics::gauge!("analysis_queue_depth").set(depth as f64);
    }

    tracing::info!(
        analysis_id = %job.analysis_id,
        image_key = %job.image_key,
        "Processing analysis job"
    );

    // The pipeline drives every status transition itself, including the
    // failed mark on any error, so the worker only logs the outcome. A
    // failed analysis is not re-queued; a retry is a new submission.
    match pipeline
        .start(job.analysis_id, &job.image_key, job.context.as_deref())
        .await
    {
        Ok(()) => {
            tracing::info!(analysis_id = %job.analysis_id, "Analysis job completed");
        }
        Err(e) => {
            tracing::warn!(analysis_id = %job.analysis_id, error = %e, "Analysis job failed");
        }
    }

    queue.complete(&job).await?;

    Ok(true)
}
