// src/services/optimizer.rs
//! CV optimization pipeline: prompt assembly, generation, sanitization,
//! and structure validation
//!
//! The model is asked for structured output, but its text is still cleaned
//! of markdown leftovers and checked against the user's original content
//! before it is accepted. A result that drops required sections or work
//! experience entries is rejected outright.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::common::content::REQUIRED_SECTIONS;
use crate::common::CvContent;
use crate::services::llm::{LlmError, LlmService};

#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Optimized CV is missing required sections: {0}")]
    MissingSections(String),

    #[error("Optimized CV lost {0} work experience entries")]
    ExperienceLoss(usize),

    #[error("Failed to serialize CV content: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Everything one optimization run needs
#[derive(Debug, Clone)]
pub struct OptimizeRequest {
    pub job_description: String,
    pub cv_content: Value,
    pub provider: String,
    pub model: String,
    pub api_key: String,
}

#[derive(Debug)]
pub struct Optimizer {
    llm: LlmService,
}

impl Optimizer {
    pub fn new(llm: LlmService) -> Self {
        Self { llm }
    }

    /// Run the full pipeline: generate, sanitize, validate
    pub async fn optimize(&self, request: &OptimizeRequest) -> Result<Value, OptimizeError> {
        let instruction = build_instruction(&request.job_description, &request.cv_content)?;

        let generated: CvContent = self
            .llm
            .generate_cv(
                &request.provider,
                &request.model,
                &request.api_key,
                &instruction,
            )
            .await?;

        let mut optimized = serde_json::to_value(&generated)?;
        sanitize_content(&mut optimized);
        validate_structure(&request.cv_content, &optimized)?;

        info!(provider = %request.provider, model = %request.model, "CV optimization succeeded");
        Ok(optimized)
    }
}

/// Assemble the system instruction from the job description and current CV
fn build_instruction(job_description: &str, cv_content: &Value) -> Result<String, OptimizeError> {
    let current_cv = serde_json::to_string_pretty(cv_content)?;

    Ok(format!(
        r#"Expert CV optimizer. Mission: Maximize chances of
landing THIS specific job by presenting existing experience optimally.

TARGET JOB DESCRIPTION:
{job_description}

CURRENT CV JSON DATA:
{current_cv}

RULES:
1. NEVER over fabricate/exaggerate - only reorder, rephrase, emphasize
2. Preserve all work experiences, projects, education
3. Skills: REMOVE least/not relevant skills, ADD/ADAPT keywords matching job terminology
4. Rephrase achievements for relevance, don't create new ones
5. NEVER include markdown like **bold** or *italic*
6. NEVER use typical LLM generated symbols like M-dashes

STRATEGY:
1. Craft 3-line summary positioning candidate as perfect fit
2. Reorder skills/achievements - most relevant first (recruiters scan 6 sec)
3. Integrate job keywords naturally (ATS scoring)
4. Use action verbs, metrics, results-driven language
5. Make every bullet point scream relevance to target role

OUTPUT:
Return optimized CV matching the exact structure of the input CV with:
- professional_summary: 3-line hook for THIS role
- core_competencies: Relevant skills first (job keywords)
- professional_experience: Rewritten for relevance
- All sections reordered by relevance to THIS job

Goal: Make recruiter think "This is EXACTLY who we need" and ATS score 85%+"#
    ))
}

fn bold_star_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").unwrap())
}

fn bold_underscore_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"__(.+?)__").unwrap())
}

fn italic_star_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*([^*]+?)\*").unwrap())
}

fn italic_underscore_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_([^_]+?)_").unwrap())
}

/// Strip markdown emphasis and trailing periods from every string in the
/// content tree, in place.
///
/// Bold markers are removed before italic markers, so the single-character
/// patterns never see a `**` pair. A single trailing period is dropped;
/// ellipses are left alone so the pass is idempotent.
pub fn sanitize_content(value: &mut Value) {
    match value {
        Value::String(text) => {
            let mut cleaned = bold_star_re().replace_all(text, "$1").into_owned();
            cleaned = bold_underscore_re().replace_all(&cleaned, "$1").into_owned();
            cleaned = italic_star_re().replace_all(&cleaned, "$1").into_owned();
            cleaned = italic_underscore_re()
                .replace_all(&cleaned, "$1")
                .into_owned();

            if cleaned.ends_with('.') && !cleaned.ends_with("..") {
                cleaned.pop();
            }

            *text = cleaned;
        }
        Value::Array(items) => {
            for item in items {
                sanitize_content(item);
            }
        }
        Value::Object(map) => {
            for (_, child) in map.iter_mut() {
                sanitize_content(child);
            }
        }
        _ => {}
    }
}

/// Reject optimized content that lost required sections or experience entries
pub fn validate_structure(original: &Value, optimized: &Value) -> Result<(), OptimizeError> {
    let missing: Vec<&str> = REQUIRED_SECTIONS
        .iter()
        .filter(|section| optimized.get(**section).is_none())
        .copied()
        .collect();

    if !missing.is_empty() {
        warn!(sections = ?missing, "Optimized CV rejected for missing sections");
        return Err(OptimizeError::MissingSections(missing.join(", ")));
    }

    let original_count = experience_count(original);
    let optimized_count = experience_count(optimized);

    if optimized_count < original_count {
        warn!(
            original = original_count,
            optimized = optimized_count,
            "Optimized CV rejected for dropped experience entries"
        );
        return Err(OptimizeError::ExperienceLoss(
            original_count - optimized_count,
        ));
    }

    Ok(())
}

fn experience_count(cv: &Value) -> usize {
    cv.get("professional_experience")
        .and_then(|v| v.as_array())
        .map(|a| a.len())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_strips_markdown_emphasis() {
        let mut value = json!({
            "professional_summary": "An **expert** developer with *strong* skills",
            "core_competencies": {
                "technical_skills": ["__Rust__", "_Python_"]
            }
        });

        sanitize_content(&mut value);

        assert_eq!(
            value["professional_summary"],
            "An expert developer with strong skills"
        );
        assert_eq!(value["core_competencies"]["technical_skills"][0], "Rust");
        assert_eq!(value["core_competencies"]["technical_skills"][1], "Python");
    }

    #[test]
    fn test_sanitize_strips_single_trailing_period() {
        let mut value = json!(["Led the platform team.", "Shipped v2"]);
        sanitize_content(&mut value);
        assert_eq!(value[0], "Led the platform team");
        assert_eq!(value[1], "Shipped v2");
    }

    #[test]
    fn test_sanitize_preserves_ellipses() {
        let mut value = json!("Migrated services etc...");
        sanitize_content(&mut value);
        assert_eq!(value, "Migrated services etc...");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let mut value = json!({
            "summary": "A **bold** claim about _results_.",
            "items": ["etc..", "plain"]
        });

        sanitize_content(&mut value);
        let once = value.clone();
        sanitize_content(&mut value);

        assert_eq!(value, once);
    }

    #[test]
    fn test_sanitize_leaves_non_strings_untouched() {
        let mut value = json!({"count": 3, "flag": true, "nothing": null});
        let expected = value.clone();
        sanitize_content(&mut value);
        assert_eq!(value, expected);
    }

    #[test]
    fn test_validate_structure_accepts_complete_cv() {
        let original = json!({
            "professional_summary": "s",
            "core_competencies": {"technical_skills": []},
            "professional_experience": [{}, {}],
            "education": []
        });
        let optimized = original.clone();

        assert!(validate_structure(&original, &optimized).is_ok());
    }

    #[test]
    fn test_validate_structure_rejects_missing_section() {
        let original = json!({
            "professional_summary": "s",
            "core_competencies": {"technical_skills": []},
            "professional_experience": [],
            "education": []
        });
        let optimized = json!({
            "professional_summary": "s",
            "core_competencies": {"technical_skills": []},
            "professional_experience": []
        });

        let err = validate_structure(&original, &optimized).unwrap_err();
        assert!(matches!(err, OptimizeError::MissingSections(s) if s == "education"));
    }

    #[test]
    fn test_validate_structure_rejects_experience_loss() {
        let original = json!({
            "professional_summary": "s",
            "core_competencies": {"technical_skills": []},
            "professional_experience": [{}, {}, {}],
            "education": []
        });
        let optimized = json!({
            "professional_summary": "s",
            "core_competencies": {"technical_skills": []},
            "professional_experience": [{}, {}],
            "education": []
        });

        let err = validate_structure(&original, &optimized).unwrap_err();
        assert!(matches!(err, OptimizeError::ExperienceLoss(1)));
    }

    #[test]
    fn test_build_instruction_embeds_inputs() {
        let cv = json!({"professional_summary": "builder of things"});
        let instruction = build_instruction("Senior Rust Engineer at Acme", &cv).unwrap();

        assert!(instruction.contains("Senior Rust Engineer at Acme"));
        assert!(instruction.contains("builder of things"));
        assert!(instruction.contains("NEVER include markdown"));
    }
}
