//! Tests for CVs module
//!
//! Covers creation validation and the record model's status lifecycle
//! representation.

#[cfg(test)]
mod tests {
    use crate::common::Validator;
    use crate::cvs::models::*;
    use crate::cvs::validators::*;

    fn valid_request() -> CvCreateRequest {
        CvCreateRequest {
            description: "Senior Backend Engineer at Acme".to_string(),
            job_description: "We are looking for a senior backend engineer with Rust experience"
                .to_string(),
            link: Some("https://jobs.example.com/123".to_string()),
        }
    }

    #[test]
    fn test_cv_create_validator_valid_data() {
        let result = CvCreateValidator.validate(&valid_request());
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_cv_create_validator_empty_description() {
        let mut request = valid_request();
        request.description = "   ".to_string();

        let result = CvCreateValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "description"));
    }

    #[test]
    fn test_cv_create_validator_description_too_long() {
        let mut request = valid_request();
        request.description = "x".repeat(201);

        let result = CvCreateValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "description"));
    }

    #[test]
    fn test_cv_create_validator_counts_chars_not_bytes() {
        // 200 multibyte chars is within the limit even at 400 bytes
        let mut request = valid_request();
        request.description = "é".repeat(200);

        let result = CvCreateValidator.validate(&request);
        assert!(result.is_valid);
    }

    #[test]
    fn test_cv_create_validator_ignores_surrounding_whitespace() {
        // Padding does not count against the limit of the stored value
        let mut request = valid_request();
        request.description = format!("   {}   ", "x".repeat(200));

        let result = CvCreateValidator.validate(&request);
        assert!(result.is_valid);
    }

    #[test]
    fn test_cv_create_validator_short_job_description() {
        let mut request = valid_request();
        request.job_description = "too short".to_string();

        let result = CvCreateValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "job_description"));
    }

    #[test]
    fn test_cv_create_validator_link_is_optional() {
        let mut request = valid_request();
        request.link = None;

        let result = CvCreateValidator.validate(&request);
        assert!(result.is_valid);
    }

    #[test]
    fn test_cv_status_serialization() {
        assert_eq!(CvStatus::Pending.as_str(), "pending");
        assert_eq!(CvStatus::Processing.as_str(), "processing");
        assert_eq!(CvStatus::Completed.as_str(), "completed");
        assert_eq!(CvStatus::Failed.as_str(), "failed");

        let json = serde_json::to_string(&CvStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }

    #[test]
    fn test_cv_record_optimized_content_parsing() {
        let record = CvRecord {
            id: "CV_TEST01".to_string(),
            user_id: "U_TEST01".to_string(),
            description: "desc".to_string(),
            job_description: "jd".to_string(),
            link: None,
            model: Some("gemini-2.5-flash".to_string()),
            provider: Some("google".to_string()),
            status: "completed".to_string(),
            cv_optimized: Some(r#"{"professional_summary": "text"}"#.to_string()),
            error_message: None,
            created_at: "2024-01-01".to_string(),
            updated_at: "2024-01-01".to_string(),
        };

        let content = record.optimized_content().expect("parsed content");
        assert_eq!(content["professional_summary"], "text");
    }

    #[test]
    fn test_cv_record_optimized_content_absent_or_invalid() {
        let mut record = CvRecord {
            id: "CV_TEST01".to_string(),
            user_id: "U_TEST01".to_string(),
            description: "desc".to_string(),
            job_description: "jd".to_string(),
            link: None,
            model: None,
            provider: None,
            status: "pending".to_string(),
            cv_optimized: None,
            error_message: None,
            created_at: "2024-01-01".to_string(),
            updated_at: "2024-01-01".to_string(),
        };

        assert!(record.optimized_content().is_none());

        record.cv_optimized = Some("not json".to_string());
        assert!(record.optimized_content().is_none());
    }

    #[test]
    fn test_cv_response_carries_parsed_content() {
        let record = CvRecord {
            id: "CV_TEST01".to_string(),
            user_id: "U_TEST01".to_string(),
            description: "desc".to_string(),
            job_description: "jd".to_string(),
            link: None,
            model: None,
            provider: None,
            status: "completed".to_string(),
            cv_optimized: Some(r#"{"education": []}"#.to_string()),
            error_message: None,
            created_at: "2024-01-01".to_string(),
            updated_at: "2024-01-02".to_string(),
        };

        let response = CvResponse::from(record);
        assert_eq!(response.status, "completed");
        assert!(response.cv_optimized.is_some());
        assert_eq!(response.updated_at, "2024-01-02");
    }
}
