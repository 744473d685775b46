//! In-memory mock collaborators for exercising the analysis pipeline
//! without Postgres, Redis, or the Gemini API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use brandlens::db::store::{AnalysisSnapshot, AnalysisStore, StoreError};
use brandlens::models::analysis::{Analysis, AnalysisStatus};
use brandlens::models::modules::{ModuleKind, ModuleResults};
use brandlens::models::vision::VisionExtract;
use brandlens::services::gemini::{GenerationError, TextGenerator};
use brandlens::services::images::{ImageSource, ImageSourceError};
use brandlens::services::prompt::{ImagePayload, PromptPayload};
use brandlens::services::registry::ModuleSpec;
use brandlens::services::storage::StorageError;

/// A scripted generator. Outcomes are keyed by the payload's system
/// instruction, which uniquely identifies the vision stage and each module.
#[derive(Clone, Default)]
pub struct MockGenerator {
    outcomes: Arc<Mutex<HashMap<String, Result<Value, GenerationError>>>>,
    calls: Arc<AtomicUsize>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome for every call whose system instruction matches.
    pub fn script(&self, system: &str, outcome: Result<Value, GenerationError>) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(system.to_string(), outcome);
    }

    pub fn script_module(&self, kind: ModuleKind, outcome: Result<Value, GenerationError>) {
        self.script(ModuleSpec::for_kind(kind).system_instruction, outcome);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextGenerator for MockGenerator {
    async fn generate(
        &self,
        payload: &PromptPayload,
        _response_schema: &Value,
    ) -> Result<Value, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcomes.lock().unwrap().get(&payload.system) {
            Some(outcome) => outcome.clone(),
            None => Err(GenerationError::Validation(format!(
                "no scripted outcome for system instruction: {:.40}",
                payload.system
            ))),
        }
    }
}

/// In-memory analysis store enforcing the same transition guards and
/// atomic commit semantics as the Postgres store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<Uuid, MemoryRecord>>>,
}

#[derive(Clone)]
struct MemoryRecord {
    analysis: Analysis,
    results: Option<ModuleResults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_pending(&self, id: Uuid, image_key: &str) {
        let now = Utc::now();
        self.inner.lock().unwrap().insert(
            id,
            MemoryRecord {
                analysis: Analysis {
                    id,
                    status: AnalysisStatus::Pending,
                    image_key: image_key.to_string(),
                    context: None,
                    created_at: now,
                    updated_at: now,
                    vision_result: None,
                    error: None,
                },
                results: None,
            },
        );
    }

    pub fn status_of(&self, id: Uuid) -> Option<AnalysisStatus> {
        self.inner
            .lock()
            .unwrap()
            .get(&id)
            .map(|r| r.analysis.status)
    }

    pub fn error_of(&self, id: Uuid) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .get(&id)
            .and_then(|r| r.analysis.error.clone())
    }

    /// Count of persisted module result records for the analysis.
    pub fn module_count(&self, id: Uuid) -> usize {
        self.inner
            .lock()
            .unwrap()
            .get(&id)
            .and_then(|r| r.results.as_ref())
            .map(|r| r.count())
            .unwrap_or(0)
    }
}

impl AnalysisStore for MemoryStore {
    async fn mark_processing(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.analysis.status != AnalysisStatus::Pending {
            return Err(StoreError::InvalidTransition {
                id,
                from: record.analysis.status.as_str().to_string(),
                to: AnalysisStatus::Processing.as_str().to_string(),
            });
        }
        record.analysis.status = AnalysisStatus::Processing;
        record.analysis.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.analysis.status != AnalysisStatus::Processing {
            return Err(StoreError::InvalidTransition {
                id,
                from: record.analysis.status.as_str().to_string(),
                to: AnalysisStatus::Failed.as_str().to_string(),
            });
        }
        record.analysis.status = AnalysisStatus::Failed;
        record.analysis.error = Some(error.to_string());
        record.analysis.updated_at = Utc::now();
        Ok(())
    }

    async fn commit_results(
        &self,
        id: Uuid,
        vision: &VisionExtract,
        results: &ModuleResults,
    ) -> Result<(), StoreError> {
        if results.count() != ModuleKind::ALL.len() {
            return Err(StoreError::IncompleteResults);
        }
        let mut inner = self.inner.lock().unwrap();
        let record = inner.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.analysis.status != AnalysisStatus::Processing {
            return Err(StoreError::InvalidTransition {
                id,
                from: record.analysis.status.as_str().to_string(),
                to: AnalysisStatus::Completed.as_str().to_string(),
            });
        }
        // Single atomic update: status, vision extract and every child
        // record change together or not at all.
        record.analysis.status = AnalysisStatus::Completed;
        record.analysis.vision_result = Some(vision.clone());
        record.analysis.error = None;
        record.analysis.updated_at = Utc::now();
        record.results = Some(results.clone());
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<AnalysisSnapshot>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.get(&id).map(|record| AnalysisSnapshot {
            analysis: record.analysis.clone(),
            results: record.results.clone(),
        }))
    }
}

/// In-memory image source.
#[derive(Clone, Default)]
pub struct MemoryImages {
    objects: Arc<Mutex<HashMap<String, ImagePayload>>>,
}

impl MemoryImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: &str, payload: ImagePayload) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), payload);
    }
}

impl ImageSource for MemoryImages {
    async fn fetch(&self, image_key: &str) -> Result<ImagePayload, ImageSourceError> {
        self.objects
            .lock()
            .unwrap()
            .get(image_key)
            .cloned()
            .ok_or_else(|| {
                ImageSourceError::Storage(StorageError::Config(format!(
                    "no such object: {}",
                    image_key
                )))
            })
    }
}

/// A small PNG-ish payload for submissions.
pub fn sample_image() -> ImagePayload {
    ImagePayload {
        mime_type: "image/png".to_string(),
        data: vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a],
    }
}

/// The vision payload scripted for successful runs.
pub fn sample_vision_json() -> Value {
    json!({
        "labels": ["food", "condiment"],
        "colors": ["red", "dark brown"],
        "objects": ["glass jar", "chili"],
        "mood": "warm"
    })
}

/// A distinct, non-null JSON payload for each module, used both to script
/// the mock generator and to assert field-exact persistence.
pub fn distinct_module_json(kind: ModuleKind) -> Value {
    match kind {
        ModuleKind::Story => json!({
            "product_name": "Sambal Rumah Dewi",
            "tagline": "Pedasnya bikin kangen rumah",
            "short_desc": "Homemade chili sauce in small batches.",
        }),
        ModuleKind::Taste => json!({
            "taste_profile": ["spicy", "smoky"],
            "sensory_persona": "bold comfort food",
        }),
        ModuleKind::Pricing => json!({
            "recommended_price": 25000.0,
            "min_price": 18000.0,
            "max_price": 32000.0,
            "reasoning": "Premium homemade positioning.",
        }),
        ModuleKind::BrandTheme => json!({
            "primary_color": "#C0392B",
            "secondary_color": "#F5E6D3",
            "tone": "warm and personal",
        }),
        ModuleKind::Seo => json!({
            "keywords": ["sambal", "sambal rumahan"],
            "hashtags": ["#sambal", "#UMKM"],
        }),
        ModuleKind::Marketplace => json!({
            "shopee_desc": "Sambal rumahan, stok terbatas!",
            "instagram_desc": "Small-batch sambal, made weekly.",
        }),
        ModuleKind::Persona => json!({
            "name": "Dewi",
            "demographics": { "age": "25-34", "city": "Bandung" },
            "motivations": ["authentic taste"],
        }),
        ModuleKind::Packaging => json!({
            "suggestions": ["glass jar with kraft label"],
            "material_recommendations": ["glass", "kraft paper"],
        }),
        ModuleKind::ActionPlan => json!({
            "day_1": "Reshoot photos in daylight",
            "day_7": "Launch a bundle promo",
        }),
    }
}
