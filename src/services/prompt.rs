use crate::models::vision::VisionExtract;

/// One image attached to a prompt, as uploaded.
///
/// The payload is opaque to prompt assembly; nothing here reinterprets the
/// bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// A fully assembled, model-ready request.
///
/// Part ordering is a contract the generation client relies on: system
/// instruction, then images, then the assembled trailing text. Changing it
/// changes model behavior and is a breaking change.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPayload {
    pub system: String,
    pub images: Vec<ImagePayload>,
    pub text: String,
}

/// Pure builder for [`PromptPayload`]. No I/O.
///
/// The trailing text is composed of optional instruction + optional seller
/// context + optional vision summary, in that order.
#[derive(Debug, Default)]
pub struct PromptBuilder {
    system: Option<String>,
    images: Vec<ImagePayload>,
    context: Option<String>,
    vision: Option<VisionExtract>,
    instruction: Option<String>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the system-level instruction. Required.
    pub fn system(mut self, prompt: &str) -> Self {
        self.system = Some(prompt.to_string());
        self
    }

    pub fn image(mut self, image: ImagePayload) -> Self {
        self.images.push(image);
        self
    }

    pub fn images(mut self, images: &[ImagePayload]) -> Self {
        self.images.extend_from_slice(images);
        self
    }

    /// Optional natural-language seller context.
    pub fn context(mut self, context: Option<&str>) -> Self {
        if let Some(c) = context {
            self.context = Some(c.to_string());
        }
        self
    }

    /// Provide the upstream vision extraction to guide the model.
    pub fn vision(mut self, vision: Option<&VisionExtract>) -> Self {
        if let Some(v) = vision {
            self.vision = Some(v.clone());
        }
        self
    }

    /// Human-readable per-module guidance, appended to the user text.
    pub fn instruction(mut self, instruction: &str) -> Self {
        self.instruction = Some(instruction.to_string());
        self
    }

    pub fn build(self) -> Result<PromptPayload, PromptError> {
        let system = self.system.ok_or(PromptError::MissingSystemInstruction)?;

        let mut text = String::new();

        if let Some(instruction) = &self.instruction {
            text.push_str(instruction);
            text.push_str("\n\n");
        }

        if let Some(context) = &self.context {
            text.push_str(&format!("Additional context: {}\n\n", context));
        }

        if let Some(vision) = &self.vision {
            // VisionExtract serialization cannot fail: plain optional fields.
            let summary =
                serde_json::to_string(vision).map_err(|e| PromptError::Serialize(e.to_string()))?;
            text.push_str(&format!(
                "Vision analysis (optional helper data):\n{}\n\n",
                summary
            ));
        }

        Ok(PromptPayload {
            system,
            images: self.images,
            text: text.trim_end().to_string(),
        })
    }
}

/// Assembly precondition violations. These indicate a programming error in
/// the caller, not a runtime failure of the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("system instruction must be set before building a prompt")]
    MissingSystemInstruction,

    #[error("failed to serialize prompt component: {0}")]
    Serialize(String),
}
