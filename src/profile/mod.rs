//! # Profile Module
//!
//! Stores the user's personal data and base CV content, and exposes the
//! HTML preview built from them.

pub mod handlers;
pub mod models;
pub mod routes;

pub use models::PersonalData;
pub use routes::profile_routes;
