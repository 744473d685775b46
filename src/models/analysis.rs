use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::vision::VisionExtract;

/// Status of a product analysis in the async queue.
///
/// Transitions are one-directional: `Pending -> Processing -> {Completed | Failed}`.
/// Completed and Failed are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AnalysisStatus::Pending),
            "processing" => Some(AnalysisStatus::Processing),
            "completed" => Some(AnalysisStatus::Completed),
            "failed" => Some(AnalysisStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }

    /// Whether `next` is a legal successor of `self` in the transition graph.
    pub fn can_transition_to(&self, next: AnalysisStatus) -> bool {
        matches!(
            (self, next),
            (AnalysisStatus::Pending, AnalysisStatus::Processing)
                | (AnalysisStatus::Processing, AnalysisStatus::Completed)
                | (AnalysisStatus::Processing, AnalysisStatus::Failed)
        )
    }
}

/// A product analysis job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: Uuid,
    pub status: AnalysisStatus,
    pub image_key: String,
    pub context: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Structured vision extraction; written once, in the completing transaction.
    pub vision_result: Option<VisionExtract>,
    pub error: Option<String>,
}
