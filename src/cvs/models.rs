//! CV data models

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Lifecycle of a CV record
///
/// pending -> processing -> completed | failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CvStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl CvStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CvStatus::Pending => "pending",
            CvStatus::Processing => "processing",
            CvStatus::Completed => "completed",
            CvStatus::Failed => "failed",
        }
    }
}

/// CV database record
#[derive(FromRow, Debug, Clone)]
pub struct CvRecord {
    pub id: String,
    pub user_id: String,
    pub description: String,
    pub job_description: String,
    pub link: Option<String>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub status: String,
    pub cv_optimized: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl CvRecord {
    /// Parse the stored optimized content column, if present
    pub fn optimized_content(&self) -> Option<Value> {
        self.cv_optimized
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// Creation request payload
#[derive(Deserialize, Debug)]
pub struct CvCreateRequest {
    pub description: String,
    pub job_description: String,
    pub link: Option<String>,
}

/// Full CV representation returned by list/get/create
#[derive(Serialize, Debug)]
pub struct CvResponse {
    pub id: String,
    pub description: String,
    pub job_description: String,
    pub link: Option<String>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub status: String,
    pub cv_optimized: Option<Value>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CvRecord> for CvResponse {
    fn from(record: CvRecord) -> Self {
        let cv_optimized = record.optimized_content();
        CvResponse {
            id: record.id,
            description: record.description,
            job_description: record.job_description,
            link: record.link,
            model: record.model,
            provider: record.provider,
            status: record.status,
            cv_optimized,
            error_message: record.error_message,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Status polling response
#[derive(Serialize, Debug)]
pub struct CvStatusResponse {
    pub status: String,
    pub error_message: Option<String>,
}
