// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::services::{ApiKeyService, CvRenderer, OptimizeQueue, PdfService};

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_secret: String,
    pub keys_service: Arc<ApiKeyService>,
    pub renderer: Arc<CvRenderer>,
    pub pdf_service: Arc<PdfService>,
    pub optimize_queue: Arc<OptimizeQueue>,
}
