// Services module - CV optimization pipeline and supporting services

pub mod encryption;
pub mod keys;
pub mod llm;
pub mod optimizer;
pub mod pdf;
pub mod queue;
pub mod renderer;

pub use encryption::EncryptionService;
pub use keys::{ApiKeyService, SettingsError, UserSettings};
pub use llm::{LlmError, LlmService, Provider};
pub use optimizer::{OptimizeError, OptimizeRequest, Optimizer};
pub use pdf::{PdfError, PdfService};
pub use queue::{OptimizeJob, OptimizeQueue, QueueError};
pub use renderer::{CvRenderer, RenderSection};
