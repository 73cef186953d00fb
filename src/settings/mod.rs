//! # Settings Module
//!
//! Per-user provider/model selection and API key management endpoints.

pub mod handlers;
pub mod models;
pub mod routes;

pub use routes::settings_routes;
