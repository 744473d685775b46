use std::future::Future;

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::queries;
use crate::models::analysis::{Analysis, AnalysisStatus};
use crate::models::modules::{ModuleKind, ModuleResults};
use crate::models::vision::VisionExtract;

/// A consistent read of one analysis.
///
/// `results` is populated only for completed analyses.
#[derive(Debug, Clone)]
pub struct AnalysisSnapshot {
    pub analysis: Analysis,
    pub results: Option<ModuleResults>,
}

/// Persistence interface consumed by the orchestration pipeline.
///
/// Implementations must honor the status state machine (transitions are
/// guarded by expected current status) and must write the completing
/// result set atomically: callers never observe COMPLETED with a missing
/// child record, nor a child record with a non-COMPLETED parent.
pub trait AnalysisStore: Send + Sync {
    /// Pending -> Processing, persisted immediately.
    fn mark_processing(&self, id: Uuid) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Processing -> Failed with a concise error message. Nothing else is
    /// written.
    fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Processing -> Completed: one transaction writing the vision extract,
    /// every module result, and the status flip. All-or-nothing.
    fn commit_results(
        &self,
        id: Uuid,
        vision: &VisionExtract,
        results: &ModuleResults,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Pure read: current status plus module results when completed.
    fn fetch(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<AnalysisSnapshot>, StoreError>> + Send;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgAnalysisStore {
    pool: PgPool,
}

impl PgAnalysisStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Distinguish "no such analysis" from "analysis is in the wrong state"
    /// after a guarded UPDATE matched zero rows.
    async fn transition_failure(&self, id: Uuid, to: AnalysisStatus) -> StoreError {
        let current: Result<Option<String>, sqlx::Error> =
            sqlx::query_scalar("SELECT status FROM analyses WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await;

        match current {
            Ok(Some(from)) => StoreError::InvalidTransition {
                id,
                from,
                to: to.as_str().to_string(),
            },
            Ok(None) => StoreError::NotFound(id),
            Err(e) => StoreError::Database(e),
        }
    }
}

impl AnalysisStore for PgAnalysisStore {
    async fn mark_processing(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE analyses
            SET status = 'processing', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.transition_failure(id, AnalysisStatus::Processing).await);
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE analyses
            SET status = 'failed', error = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.transition_failure(id, AnalysisStatus::Failed).await);
        }
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
        let story = results.story.as_ref().ok_or(StoreError::IncompleteResults)?;
        let taste = results.taste.as_ref().ok_or(StoreError::IncompleteResults)?;
        let pricing = results.pricing.as_ref().ok_or(StoreError::IncompleteResults)?;
        let brand_theme = results
            .brand_theme
            .as_ref()
            .ok_or(StoreError::IncompleteResults)?;
        let seo = results.seo.as_ref().ok_or(StoreError::IncompleteResults)?;
        let marketplace = results
            .marketplace
            .as_ref()
            .ok_or(StoreError::IncompleteResults)?;
        let persona = results.persona.as_ref().ok_or(StoreError::IncompleteResults)?;
        let packaging = results
            .packaging
            .as_ref()
            .ok_or(StoreError::IncompleteResults)?;
        let action_plan = results
            .action_plan
            .as_ref()
            .ok_or(StoreError::IncompleteResults)?;

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE analyses
            SET status = 'completed', vision_result = $2, error = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(id)
        .bind(Json(vision))
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(self.transition_failure(id, AnalysisStatus::Completed).await);
        }

        sqlx::query(
            r#"
            INSERT INTO analysis_stories
                (analysis_id, product_name, tagline, short_desc, long_desc,
                 caption_casual, caption_professional, caption_storytelling)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(&story.product_name)
        .bind(&story.tagline)
        .bind(&story.short_desc)
        .bind(&story.long_desc)
        .bind(&story.caption_casual)
        .bind(&story.caption_professional)
        .bind(&story.caption_storytelling)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO analysis_tastes
                (analysis_id, taste_profile, aroma_profile, sensory_persona, pairing)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(taste.taste_profile.as_ref().map(Json))
        .bind(taste.aroma_profile.as_ref().map(Json))
        .bind(&taste.sensory_persona)
        .bind(taste.pairing.as_ref().map(Json))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO analysis_pricings
                (analysis_id, recommended_price, min_price, max_price,
                 reasoning, promo_strategy, best_posting_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(pricing.recommended_price)
        .bind(pricing.min_price)
        .bind(pricing.max_price)
        .bind(&pricing.reasoning)
        .bind(pricing.promo_strategy.as_ref().map(Json))
        .bind(&pricing.best_posting_time)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO analysis_brand_themes
                (analysis_id, primary_color, secondary_color, accent_color, tone, style_suggestions)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(&brand_theme.primary_color)
        .bind(&brand_theme.secondary_color)
        .bind(&brand_theme.accent_color)
        .bind(&brand_theme.tone)
        .bind(brand_theme.style_suggestions.as_ref().map(Json))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO analysis_seos (analysis_id, keywords, hashtags)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(id)
        .bind(seo.keywords.as_ref().map(Json))
        .bind(seo.hashtags.as_ref().map(Json))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO analysis_marketplaces
                (analysis_id, shopee_desc, tokopedia_desc, instagram_desc)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(&marketplace.shopee_desc)
        .bind(&marketplace.tokopedia_desc)
        .bind(&marketplace.instagram_desc)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO analysis_personas
                (analysis_id, name, bio, demographics, motivations, pain_points)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(&persona.name)
        .bind(&persona.bio)
        .bind(&persona.demographics)
        .bind(persona.motivations.as_ref().map(Json))
        .bind(persona.pain_points.as_ref().map(Json))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO analysis_packagings
                (analysis_id, suggestions, material_recommendations)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(id)
        .bind(packaging.suggestions.as_ref().map(Json))
        .bind(packaging.material_recommendations.as_ref().map(Json))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO analysis_action_plans
                (analysis_id, day_1, day_2, day_3, day_4, day_5, day_6, day_7)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(&action_plan.day_1)
        .bind(&action_plan.day_2)
        .bind(&action_plan.day_3)
        .bind(&action_plan.day_4)
        .bind(&action_plan.day_5)
        .bind(&action_plan.day_6)
        .bind(&action_plan.day_7)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<AnalysisSnapshot>, StoreError> {
        let analysis = match queries::get_analysis(&self.pool, id).await? {
            Some(a) => a,
            None => return Ok(None),
        };

        let results = if analysis.status == AnalysisStatus::Completed {
            Some(queries::get_module_results(&self.pool, id).await?)
        } else {
            None
        };

        Ok(Some(AnalysisSnapshot { analysis, results }))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("analysis {0} not found")]
    NotFound(Uuid),

    #[error("illegal status transition for analysis {id}: {from} -> {to}")]
    InvalidTransition { id: Uuid, from: String, to: String },

    #[error("module result set is incomplete; refusing partial commit")]
    IncompleteResults,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
