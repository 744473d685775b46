use serde::{Deserialize, Serialize};

/// Structured output of the vision extraction stage.
///
/// Every field is independently optional: the model may legitimately
/// return null for any of them, and that is not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionExtract {
    /// General product categorization (e.g. "food", "drink", "snack").
    pub labels: Option<Vec<String>>,
    /// Dominant colors in plain words (e.g. "red", "beige", "dark brown").
    pub colors: Option<Vec<String>>,
    /// Objects detected in the scene.
    pub objects: Option<Vec<String>>,
    /// Emotional tone of the presentation (e.g. "warm", "fresh", "premium").
    pub mood: Option<String>,
    /// Additional extracted metadata, passed through as-is.
    pub raw: Option<serde_json::Value>,
}
