//! # CVs Module
//!
//! Tailored CV records: creation kicks off background optimization against
//! a job description, then the record can be polled, previewed as part of
//! the list, and downloaded as a PDF once completed.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use models::{CvRecord, CvStatus};
pub use routes::cv_routes;
