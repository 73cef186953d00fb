//! # Providers Module
//!
//! Static registry of supported AI providers and their models, plus the
//! public endpoints that expose it for settings dropdowns.

pub mod handlers;
pub mod registry;
pub mod routes;

pub use registry::{
    find_provider, models_for_provider, ProviderInfo, DEFAULT_MODEL, DEFAULT_PROVIDER, PROVIDERS,
};
pub use routes::provider_routes;
