use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::modules::ModuleResults;
use crate::models::vision::VisionExtract;

/// Metadata portion of an analysis submission (multipart text fields).
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SubmitRequest {
    /// Optional free-text context about the product from the seller.
    #[garde(length(min = 1, max = 2000))]
    pub context: Option<String>,
}

/// Response after submitting a photo for analysis (202 Accepted).
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub analysis_id: Uuid,
    pub status: String,
    pub message: String,
}

/// Response for querying analysis status.
///
/// `results` is populated only for completed analyses.
#[derive(Debug, Serialize)]
pub struct AnalysisStatusResponse {
    pub analysis_id: Uuid,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision_result: Option<VisionExtract>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<ModuleResults>,
}
