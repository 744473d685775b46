use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The analysis modules, in registry order.
///
/// Registry order is load-bearing: when several modules fail in one run,
/// the job's error is taken from the first failure in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModuleKind {
    Story,
    Taste,
    Pricing,
    BrandTheme,
    Seo,
    Marketplace,
    Persona,
    Packaging,
    ActionPlan,
}

impl ModuleKind {
    /// All modules, in registry order.
    pub const ALL: [ModuleKind; 9] = [
        ModuleKind::Story,
        ModuleKind::Taste,
        ModuleKind::Pricing,
        ModuleKind::BrandTheme,
        ModuleKind::Seo,
        ModuleKind::Marketplace,
        ModuleKind::Persona,
        ModuleKind::Packaging,
        ModuleKind::ActionPlan,
    ];
}

/// Product storytelling content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryResult {
    pub product_name: Option<String>,
    pub tagline: Option<String>,
    pub short_desc: Option<String>,
    pub long_desc: Option<String>,
    pub caption_casual: Option<String>,
    pub caption_professional: Option<String>,
    pub caption_storytelling: Option<String>,
}

/// Taste and aroma characteristics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasteResult {
    pub taste_profile: Option<Vec<String>>,
    pub aroma_profile: Option<Vec<String>>,
    pub sensory_persona: Option<String>,
    pub pairing: Option<Vec<String>>,
}

/// Price recommendation with reasoning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub recommended_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub reasoning: Option<String>,
    pub promo_strategy: Option<Vec<String>>,
    pub best_posting_time: Option<String>,
}

/// Brand identity recommendation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandThemeResult {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub accent_color: Option<String>,
    pub tone: Option<String>,
    pub style_suggestions: Option<Vec<String>>,
}

/// Search keywords and hashtags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoResult {
    pub keywords: Option<Vec<String>>,
    pub hashtags: Option<Vec<String>>,
}

/// Marketplace-ready listing descriptions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceResult {
    pub shopee_desc: Option<String>,
    pub tokopedia_desc: Option<String>,
    pub instagram_desc: Option<String>,
}

/// Buyer persona profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaResult {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub demographics: Option<serde_json::Value>,
    pub motivations: Option<Vec<String>>,
    pub pain_points: Option<Vec<String>>,
}

/// Packaging style recommendations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackagingResult {
    pub suggestions: Option<Vec<String>>,
    pub material_recommendations: Option<Vec<String>>,
}

/// Seven-day marketing action plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionPlanResult {
    pub day_1: Option<String>,
    pub day_2: Option<String>,
    pub day_3: Option<String>,
    pub day_4: Option<String>,
    pub day_5: Option<String>,
    pub day_6: Option<String>,
    pub day_7: Option<String>,
}

/// One module's validated output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "module", rename_all = "snake_case")]
pub enum ModuleOutput {
    Story(StoryResult),
    Taste(TasteResult),
    Pricing(PricingResult),
    BrandTheme(BrandThemeResult),
    Seo(SeoResult),
    Marketplace(MarketplaceResult),
    Persona(PersonaResult),
    Packaging(PackagingResult),
    ActionPlan(ActionPlanResult),
}

impl ModuleOutput {
    pub fn kind(&self) -> ModuleKind {
        match self {
            ModuleOutput::Story(_) => ModuleKind::Story,
            ModuleOutput::Taste(_) => ModuleKind::Taste,
            ModuleOutput::Pricing(_) => ModuleKind::Pricing,
            ModuleOutput::BrandTheme(_) => ModuleKind::BrandTheme,
            ModuleOutput::Seo(_) => ModuleKind::Seo,
            ModuleOutput::Marketplace(_) => ModuleKind::Marketplace,
            ModuleOutput::Persona(_) => ModuleKind::Persona,
            ModuleOutput::Packaging(_) => ModuleKind::Packaging,
            ModuleOutput::ActionPlan(_) => ModuleKind::ActionPlan,
        }
    }
}

/// The complete result set of one successful analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleResults {
    pub story: Option<StoryResult>,
    pub taste: Option<TasteResult>,
    pub pricing: Option<PricingResult>,
    pub brand_theme: Option<BrandThemeResult>,
    pub seo: Option<SeoResult>,
    pub marketplace: Option<MarketplaceResult>,
    pub persona: Option<PersonaResult>,
    pub packaging: Option<PackagingResult>,
    pub action_plan: Option<ActionPlanResult>,
}

impl ModuleResults {
    pub fn insert(&mut self, output: ModuleOutput) {
        match output {
            ModuleOutput::Story(r) => self.story = Some(r),
            ModuleOutput::Taste(r) => self.taste = Some(r),
            ModuleOutput::Pricing(r) => self.pricing = Some(r),
            ModuleOutput::BrandTheme(r) => self.brand_theme = Some(r),
            ModuleOutput::Seo(r) => self.seo = Some(r),
            ModuleOutput::Marketplace(r) => self.marketplace = Some(r),
            ModuleOutput::Persona(r) => self.persona = Some(r),
            ModuleOutput::Packaging(r) => self.packaging = Some(r),
            ModuleOutput::ActionPlan(r) => self.action_plan = Some(r),
        }
    }

    pub fn from_outputs(outputs: impl IntoIterator<Item = ModuleOutput>) -> Self {
        let mut results = Self::default();
        for output in outputs {
            results.insert(output);
        }
        results
    }

    /// Number of populated module results.
    pub fn count(&self) -> usize {
        [
            self.story.is_some(),
            self.taste.is_some(),
            self.pricing.is_some(),
            self.brand_theme.is_some(),
            self.seo.is_some(),
            self.marketplace.is_some(),
            self.persona.is_some(),
            self.packaging.is_some(),
            self.action_plan.is_some(),
        ]
        .iter()
        .filter(|populated| **populated)
        .count()
    }
}
