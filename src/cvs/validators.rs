// src/cvs/validators.rs

use super::models::CvCreateRequest;
use crate::common::{ValidationResult, Validator};

// ============================================================================
// CV Creation Validator
// ============================================================================

pub struct CvCreateValidator;

impl Validator<CvCreateRequest> for CvCreateValidator {
    fn validate(&self, data: &CvCreateRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        // Validate description (used as the download filename); limits count
        // chars, not bytes, and apply to the trimmed value that gets stored
        let description = data.description.trim();
        if description.is_empty() {
            result.add_error("description", "Description is required");
        } else if description.chars().count() > 200 {
            result.add_error("description", "Description must be less than 200 characters");
        }

        // Validate job description
        let job_description = data.job_description.trim();
        if job_description.chars().count() < 10 {
            result.add_error(
                "job_description",
                "Job description must be at least 10 characters",
            );
        } else if job_description.chars().count() > 50000 {
            result.add_error(
                "job_description",
                "Job description must be less than 50000 characters",
            );
        }

        // Validate link length if provided
        if let Some(link) = &data.link {
            if link.chars().count() > 2000 {
                result.add_error("link", "Link must be less than 2000 characters");
            }
        }

        result
    }
}
