use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::analysis::{Analysis, AnalysisStatus};
use crate::models::modules::{
    ActionPlanResult, BrandThemeResult, MarketplaceResult, ModuleResults, PackagingResult,
    PersonaResult, PricingResult, SeoResult, StoryResult, TasteResult,
};
use crate::models::vision::VisionExtract;

/// Insert a new analysis in pending state
pub async fn create_analysis(
    pool: &PgPool,
    image_key: &str,
    context: Option<&str>,
) -> Result<Analysis, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO analyses (status, image_key, context)
        VALUES ('pending', $1, $2)
        RETURNING id, status, image_key, context, created_at, updated_at, vision_result, error
        "#,
    )
    .bind(image_key)
    .bind(context)
    .fetch_one(pool)
    .await?;

    map_analysis_row(&row)
}

/// Get an analysis by ID
pub async fn get_analysis(pool: &PgPool, id: Uuid) -> Result<Option<Analysis>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, status, image_key, context, created_at, updated_at, vision_result, error
        FROM analyses
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(map_analysis_row).transpose()
}

fn map_analysis_row(row: &sqlx::postgres::PgRow) -> Result<Analysis, sqlx::Error> {
    let status_str: String = row.try_get("status")?;
    let status = AnalysisStatus::from_str(&status_str).unwrap_or(AnalysisStatus::Pending);

    let vision_result: Option<Json<VisionExtract>> = row.try_get("vision_result")?;

    Ok(Analysis {
        id: row.try_get("id")?,
        status,
        image_key: row.try_get("image_key")?,
        context: row.try_get("context")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        vision_result: vision_result.map(|j| j.0),
        error: row.try_get("error")?,
    })
}

/// Load every module result owned by an analysis.
///
/// For a completed analysis each field is populated; otherwise all are
/// None (module results exist only once the job completed).
pub async fn get_module_results(pool: &PgPool, id: Uuid) -> Result<ModuleResults, sqlx::Error> {
    let mut results = ModuleResults::default();

    if let Some(row) = sqlx::query(
        r#"
        SELECT product_name, tagline, short_desc, long_desc,
               caption_casual, caption_professional, caption_storytelling
        FROM analysis_stories
        WHERE analysis_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    {
        results.story = Some(StoryResult {
            product_name: row.try_get("product_name")?,
            tagline: row.try_get("tagline")?,
            short_desc: row.try_get("short_desc")?,
            long_desc: row.try_get("long_desc")?,
            caption_casual: row.try_get("caption_casual")?,
            caption_professional: row.try_get("caption_professional")?,
            caption_storytelling: row.try_get("caption_storytelling")?,
        });
    }

    if let Some(row) = sqlx::query(
        r#"
        SELECT taste_profile, aroma_profile, sensory_persona, pairing
        FROM analysis_tastes
        WHERE analysis_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    {
        results.taste = Some(TasteResult {
            taste_profile: json_list(&row, "taste_profile")?,
            aroma_profile: json_list(&row, "aroma_profile")?,
            sensory_persona: row.try_get("sensory_persona")?,
            pairing: json_list(&row, "pairing")?,
        });
    }

    if let Some(row) = sqlx::query(
        r#"
        SELECT recommended_price, min_price, max_price, reasoning,
               promo_strategy, best_posting_time
        FROM analysis_pricings
        WHERE analysis_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    {
        results.pricing = Some(PricingResult {
            recommended_price: row.try_get("recommended_price")?,
            min_price: row.try_get("min_price")?,
            max_price: row.try_get("max_price")?,
            reasoning: row.try_get("reasoning")?,
            promo_strategy: json_list(&row, "promo_strategy")?,
            best_posting_time: row.try_get("best_posting_time")?,
        });
    }

    if let Some(row) = sqlx::query(
        r#"
        SELECT primary_color, secondary_color, accent_color, tone, style_suggestions
        FROM analysis_brand_themes
        WHERE analysis_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    {
        results.brand_theme = Some(BrandThemeResult {
            primary_color: row.try_get("primary_color")?,
            secondary_color: row.try_get("secondary_color")?,
            accent_color: row.try_get("accent_color")?,
            tone: row.try_get("tone")?,
            style_suggestions: json_list(&row, "style_suggestions")?,
        });
    }

    if let Some(row) = sqlx::query(
        r#"
        SELECT keywords, hashtags
        FROM analysis_seos
        WHERE analysis_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    {
        results.seo = Some(SeoResult {
            keywords: json_list(&row, "keywords")?,
            hashtags: json_list(&row, "hashtags")?,
        });
    }

    if let Some(row) = sqlx::query(
        r#"
        SELECT shopee_desc, tokopedia_desc, instagram_desc
        FROM analysis_marketplaces
        WHERE analysis_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    {
        results.marketplace = Some(MarketplaceResult {
            shopee_desc: row.try_get("shopee_desc")?,
            tokopedia_desc: row.try_get("tokopedia_desc")?,
            instagram_desc: row.try_get("instagram_desc")?,
        });
    }

    if let Some(row) = sqlx::query(
        r#"
        SELECT name, bio, demographics, motivations, pain_points
        FROM analysis_personas
        WHERE analysis_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    {
        results.persona = Some(PersonaResult {
            name: row.try_get("name")?,
            bio: row.try_get("bio")?,
            demographics: row.try_get("demographics")?,
            motivations: json_list(&row, "motivations")?,
            pain_points: json_list(&row, "pain_points")?,
        });
    }

    if let Some(row) = sqlx::query(
        r#"
        SELECT suggestions, material_recommendations
        FROM analysis_packagings
        WHERE analysis_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    {
        results.packaging = Some(PackagingResult {
            suggestions: json_list(&row, "suggestions")?,
            material_recommendations: json_list(&row, "material_recommendations")?,
        });
    }

    if let Some(row) = sqlx::query(
        r#"
        SELECT day_1, day_2, day_3, day_4, day_5, day_6, day_7
        FROM analysis_action_plans
        WHERE analysis_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    {
        results.action_plan = Some(ActionPlanResult {
            day_1: row.try_get("day_1")?,
            day_2: row.try_get("day_2")?,
            day_3: row.try_get("day_3")?,
            day_4: row.try_get("day_4")?,
            day_5: row.try_get("day_5")?,
            day_6: row.try_get("day_6")?,
            day_7: row.try_get("day_7")?,
        });
    }

    Ok(results)
}

/// Count module result rows owned by an analysis, across all module tables.
pub async fn count_module_results(pool: &PgPool, id: Uuid) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT
            (SELECT COUNT(*) FROM analysis_stories WHERE analysis_id = $1) +
            (SELECT COUNT(*) FROM analysis_tastes WHERE analysis_id = $1) +
            (SELECT COUNT(*) FROM analysis_pricings WHERE analysis_id = $1) +
            (SELECT COUNT(*) FROM analysis_brand_themes WHERE analysis_id = $1) +
            (SELECT COUNT(*) FROM analysis_seos WHERE analysis_id = $1) +
            (SELECT COUNT(*) FROM analysis_marketplaces WHERE analysis_id = $1) +
            (SELECT COUNT(*) FROM analysis_personas WHERE analysis_id = $1) +
            (SELECT COUNT(*) FROM analysis_packagings WHERE analysis_id = $1) +
            (SELECT COUNT(*) FROM analysis_action_plans WHERE analysis_id = $1)
            AS total
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    row.try_get("total")
}

fn json_list(
    row: &sqlx::postgres::PgRow,
    column: &str,
) -> Result<Option<Vec<String>>, sqlx::Error> {
    let value: Option<Json<Vec<String>>> = row.try_get(column)?;
    Ok(value.map(|j| j.0))
}
