//! Schema registry: the fixed mapping of analysis module to system
//! instruction, per-module user instruction, response schema, and typed
//! parse. The orchestrator's fan-out is a plain iteration over
//! [`configured_modules`].

use serde_json::{json, Value};

use crate::models::modules::{ModuleKind, ModuleOutput};
use crate::models::vision::VisionExtract;
use crate::prompts;
use crate::services::gemini::GenerationError;

/// Static configuration for one analysis module.
#[derive(Debug, Clone, Copy)]
pub struct ModuleSpec {
    pub kind: ModuleKind,
    pub system_instruction: &'static str,
    pub instruction: &'static str,
}

impl ModuleSpec {
    pub fn for_kind(kind: ModuleKind) -> Self {
        let (system_instruction, instruction) = match kind {
            ModuleKind::Story => (
                prompts::STORY_SYSTEM_PROMPT,
                "Generate a product story in structured JSON format.",
            ),
            ModuleKind::Taste => (
                prompts::TASTE_SYSTEM_PROMPT,
                "Identify taste & aroma characteristics in JSON.",
            ),
            ModuleKind::Pricing => (
                prompts::PRICING_SYSTEM_PROMPT,
                "Recommend a retail price strategy in JSON.",
            ),
            ModuleKind::BrandTheme => (
                prompts::BRAND_THEME_SYSTEM_PROMPT,
                "Generate a brand identity recommendation in JSON.",
            ),
            ModuleKind::Seo => (
                prompts::SEO_SYSTEM_PROMPT,
                "Generate SEO keywords and hashtags in JSON.",
            ),
            ModuleKind::Marketplace => (
                prompts::MARKETPLACE_SYSTEM_PROMPT,
                "Generate marketplace-ready descriptions in JSON.",
            ),
            ModuleKind::Persona => (
                prompts::PERSONA_SYSTEM_PROMPT,
                "Generate buyer persona information in JSON.",
            ),
            ModuleKind::Packaging => (
                prompts::PACKAGING_SYSTEM_PROMPT,
                "Recommend packaging styles in JSON.",
            ),
            ModuleKind::ActionPlan => (
                prompts::ACTION_PLAN_SYSTEM_PROMPT,
                "Generate a 7-day UMKM action plan in JSON.",
            ),
        };

        Self {
            kind,
            system_instruction,
            instruction,
        }
    }

    /// Gemini `response_schema` for this module, every field nullable.
    pub fn response_schema(&self) -> Value {
        match self.kind {
            ModuleKind::Story => object_schema(&[
                ("product_name", nullable_string()),
                ("tagline", nullable_string()),
                ("short_desc", nullable_string()),
                ("long_desc", nullable_string()),
                ("caption_casual", nullable_string()),
                ("caption_professional", nullable_string()),
                ("caption_storytelling", nullable_string()),
            ]),
            ModuleKind::Taste => object_schema(&[
                ("taste_profile", nullable_string_array()),
                ("aroma_profile", nullable_string_array()),
                ("sensory_persona", nullable_string()),
                ("pairing", nullable_string_array()),
            ]),
            ModuleKind::Pricing => object_schema(&[
                ("recommended_price", nullable_number()),
                ("min_price", nullable_number()),
                ("max_price", nullable_number()),
                ("reasoning", nullable_string()),
                ("promo_strategy", nullable_string_array()),
                ("best_posting_time", nullable_string()),
            ]),
            ModuleKind::BrandTheme => object_schema(&[
                ("primary_color", nullable_string()),
                ("secondary_color", nullable_string()),
                ("accent_color", nullable_string()),
                ("tone", nullable_string()),
                ("style_suggestions", nullable_string_array()),
            ]),
            ModuleKind::Seo => object_schema(&[
                ("keywords", nullable_string_array()),
                ("hashtags", nullable_string_array()),
            ]),
            ModuleKind::Marketplace => object_schema(&[
                ("shopee_desc", nullable_string()),
                ("tokopedia_desc", nullable_string()),
                ("instagram_desc", nullable_string()),
            ]),
            ModuleKind::Persona => object_schema(&[
                ("name", nullable_string()),
                ("bio", nullable_string()),
                ("demographics", json!({ "type": "OBJECT", "nullable": true })),
                ("motivations", nullable_string_array()),
                ("pain_points", nullable_string_array()),
            ]),
            ModuleKind::Packaging => object_schema(&[
                ("suggestions", nullable_string_array()),
                ("material_recommendations", nullable_string_array()),
            ]),
            ModuleKind::ActionPlan => object_schema(&[
                ("day_1", nullable_string()),
                ("day_2", nullable_string()),
                ("day_3", nullable_string()),
                ("day_4", nullable_string()),
                ("day_5", nullable_string()),
                ("day_6", nullable_string()),
                ("day_7", nullable_string()),
            ]),
        }
    }

    /// Validate a raw generation result against this module's typed shape.
    ///
    /// A mismatch aborts the module's result entirely; there is no
    /// partial-field recovery.
    pub fn parse(&self, value: Value) -> Result<ModuleOutput, GenerationError> {
        let invalid = |e: serde_json::Error| {
            GenerationError::Validation(format!(
                "{} result does not match its schema: {}",
                self.kind, e
            ))
        };

        Ok(match self.kind {
            ModuleKind::Story => ModuleOutput::Story(serde_json::from_value(value).map_err(invalid)?),
            ModuleKind::Taste => ModuleOutput::Taste(serde_json::from_value(value).map_err(invalid)?),
            ModuleKind::Pricing => {
                ModuleOutput::Pricing(serde_json::from_value(value).map_err(invalid)?)
            }
            ModuleKind::BrandTheme => {
                ModuleOutput::BrandTheme(serde_json::from_value(value).map_err(invalid)?)
            }
            ModuleKind::Seo => ModuleOutput::Seo(serde_json::from_value(value).map_err(invalid)?),
            ModuleKind::Marketplace => {
                ModuleOutput::Marketplace(serde_json::from_value(value).map_err(invalid)?)
            }
            ModuleKind::Persona => {
                ModuleOutput::Persona(serde_json::from_value(value).map_err(invalid)?)
            }
            ModuleKind::Packaging => {
                ModuleOutput::Packaging(serde_json::from_value(value).map_err(invalid)?)
            }
            ModuleKind::ActionPlan => {
                ModuleOutput::ActionPlan(serde_json::from_value(value).map_err(invalid)?)
            }
        })
    }
}

/// All configured modules, in registry order.
pub fn configured_modules() -> Vec<ModuleSpec> {
    ModuleKind::ALL.iter().copied().map(ModuleSpec::for_kind).collect()
}

/// Gemini `response_schema` for the vision extraction stage.
pub fn vision_schema() -> Value {
    object_schema(&[
        ("labels", nullable_string_array()),
        ("colors", nullable_string_array()),
        ("objects", nullable_string_array()),
        ("mood", nullable_string()),
        ("raw", json!({ "type": "OBJECT", "nullable": true })),
    ])
}

pub fn parse_vision(value: Value) -> Result<VisionExtract, GenerationError> {
    serde_json::from_value(value).map_err(|e| {
        GenerationError::Validation(format!("vision result does not match its schema: {}", e))
    })
}

fn object_schema(properties: &[(&str, Value)]) -> Value {
    let mut props = serde_json::Map::new();
    for (name, schema) in properties {
        props.insert(name.to_string(), schema.clone());
    }
    json!({ "type": "OBJECT", "properties": Value::Object(props) })
}

fn nullable_string() -> Value {
    json!({ "type": "STRING", "nullable": true })
}

fn nullable_string_array() -> Value {
    json!({ "type": "ARRAY", "nullable": true, "items": { "type": "STRING" } })
}

fn nullable_number() -> Value {
    json!({ "type": "NUMBER", "nullable": true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::modules::ModuleResults;

    #[test]
    fn test_registry_covers_all_modules_in_order() {
        let modules = configured_modules();
        assert_eq!(modules.len(), 9);
        assert_eq!(modules[0].kind, ModuleKind::Story);
        assert_eq!(modules[8].kind, ModuleKind::ActionPlan);
        for spec in &modules {
            assert!(!spec.system_instruction.is_empty());
            assert!(!spec.instruction.is_empty());
        }
    }

    #[test]
    fn test_schemas_declare_nullable_fields() {
        for spec in configured_modules() {
            let schema = spec.response_schema();
            let props = schema["properties"].as_object().unwrap();
            assert!(!props.is_empty());
            for (_, field) in props {
                assert_eq!(field["nullable"], true);
            }
        }
    }

    #[test]
    fn test_parse_accepts_all_null_fields() {
        // The model declining every field is legitimate output
        for spec in configured_modules() {
            let output = spec.parse(json!({})).unwrap();
            assert_eq!(output.kind(), spec.kind);
        }
    }

    #[test]
    fn test_parse_rejects_mistyped_field() {
        let spec = ModuleSpec::for_kind(ModuleKind::Pricing);
        let err = spec
            .parse(json!({ "recommended_price": "lots" }))
            .unwrap_err();
        assert!(matches!(err, GenerationError::Validation(_)));
    }

    #[test]
    fn test_parse_typed_payload() {
        let spec = ModuleSpec::for_kind(ModuleKind::Seo);
        let output = spec
            .parse(json!({ "keywords": ["sambal", "pedas"], "hashtags": ["#sambal"] }))
            .unwrap();
        let results = ModuleResults::from_outputs([output]);
        assert_eq!(results.seo.unwrap().keywords.unwrap().len(), 2);
    }

    #[test]
    fn test_parse_vision_tolerates_nulls() {
        let extract = parse_vision(json!({ "labels": null, "mood": "fresh" })).unwrap();
        assert_eq!(extract.mood.as_deref(), Some("fresh"));
        assert!(extract.labels.is_none());
    }
}
