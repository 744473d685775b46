use std::sync::Arc;

use crate::models::vision::VisionExtract;
use crate::prompts;
use crate::services::gemini::{GenerationError, TextGenerator};
use crate::services::prompt::{ImagePayload, PromptBuilder};
use crate::services::registry;

/// The single upstream image-understanding call whose output seeds every
/// analysis module's prompt.
///
/// No persistence side effects; any failure surfaces as one
/// [`GenerationError`].
pub struct VisionExtractor<G> {
    generator: Arc<G>,
}

impl<G: TextGenerator> VisionExtractor<G> {
    pub fn new(generator: Arc<G>) -> Self {
        Self { generator }
    }

    /// Analyze one or more product images into a [`VisionExtract`].
    ///
    /// Every output field is independently optional; a null field is not an
    /// error.
    pub async fn extract(&self, images: &[ImagePayload]) -> Result<VisionExtract, GenerationError> {
        if images.is_empty() {
            return Err(GenerationError::Validation(
                "vision extraction requires at least one image".to_string(),
            ));
        }

        let payload = PromptBuilder::new()
            .system(prompts::VISION_SYSTEM_PROMPT)
            .images(images)
            .build()
            .map_err(|e| GenerationError::Validation(format!("vision prompt assembly: {}", e)))?;

        let raw = self
            .generator
            .generate(&payload, &registry::vision_schema())
            .await?;

        registry::parse_vision(raw)
    }
}
