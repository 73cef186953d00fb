// src/common/content.rs
//! Typed CV content contract
//!
//! This is the schema exchanged with the LLM provider (as a required output
//! shape) and consumed by the renderer. The four required sections are
//! `professional_summary`, `core_competencies`, `professional_experience`
//! and `education`; the remaining sections may be empty.

use serde::{Deserialize, Serialize};

/// Technical skills list, grouped under a single key to match the stored
/// profile shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSkills {
    pub technical_skills: Vec<String>,
}

/// Work experience entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub stack: String,
    pub achievements: Vec<String>,
}

/// Education entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub location: String,
    pub graduation_year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Course or certification entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    pub provider: String,
    pub location: String,
    pub year: String,
    pub description: String,
}

/// Key project entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub period: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub details: String,
}

/// Language proficiency entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub language: String,
    pub proficiency: String,
}

/// Full CV content document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvContent {
    pub professional_summary: String,
    pub core_competencies: TechnicalSkills,
    pub professional_experience: Vec<Experience>,
    pub education: Vec<Education>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub key_projects: Vec<Project>,
    #[serde(default)]
    pub languages: Vec<Language>,
}

/// Section keys recognized by the renderer, in their fixed display order
pub const SECTION_KEYS: [&str; 7] = [
    "professional_summary",
    "core_competencies",
    "professional_experience",
    "education",
    "courses",
    "key_projects",
    "languages",
];

/// Sections that must be present and non-empty in any optimized output
pub const REQUIRED_SECTIONS: [&str; 4] = [
    "professional_summary",
    "core_competencies",
    "professional_experience",
    "education",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_sections_default_to_empty() {
        let json = serde_json::json!({
            "professional_summary": "Engineer.",
            "core_competencies": {"technical_skills": ["Rust"]},
            "professional_experience": [],
            "education": []
        });

        let content: CvContent = serde_json::from_value(json).expect("valid content");
        assert!(content.courses.is_empty());
        assert!(content.key_projects.is_empty());
        assert!(content.languages.is_empty());
    }

    #[test]
    fn test_missing_required_section_fails_deserialization() {
        let json = serde_json::json!({
            "professional_summary": "Engineer.",
            "core_competencies": {"technical_skills": []},
            "education": []
        });

        assert!(serde_json::from_value::<CvContent>(json).is_err());
    }

    #[test]
    fn test_education_optional_fields() {
        let json = serde_json::json!({
            "degree": "BSc Computer Science",
            "institution": "Example University",
            "location": "Berlin",
            "graduation_year": "2018"
        });

        let education: Education = serde_json::from_value(json).expect("valid entry");
        assert!(education.start_year.is_none());
        assert!(education.details.is_none());
    }
}
