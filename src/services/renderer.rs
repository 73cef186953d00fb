// src/services/renderer.rs
//! HTML composition for CV preview and PDF generation
//!
//! Builds the full document from personal data plus an ordered list of
//! sections. The same HTML feeds the browser preview and the PDF engine,
//! so screen styling lives in the embedded stylesheet and print overrides
//! are applied later by the PDF service.

use chrono::Local;
use serde_json::Value;

/// Embedded screen stylesheet, loaded at compile time
const STYLESHEET: &str = include_str!("../../assets/cv.css");

/// One renderable CV section with its display label and position
#[derive(Debug, Clone)]
pub struct RenderSection {
    pub key: String,
    pub display_as: String,
    pub order: u32,
    pub content: Value,
}

#[derive(Debug, Default)]
pub struct CvRenderer;

// Canonical section order and display labels
const SECTION_LAYOUT: [(&str, &str); 7] = [
    ("professional_summary", "Professional Summary"),
    ("core_competencies", "Core Competencies"),
    ("professional_experience", "Professional Experience"),
    ("education", "Education"),
    ("courses", "Courses"),
    ("key_projects", "Key Projects"),
    ("languages", "Languages"),
];

impl CvRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Build the section list from stored CV content.
    ///
    /// Sections absent from the content still render as empty blocks only
    /// when their key is present; missing keys are skipped entirely.
    pub fn sections_from_value(&self, cv_content: &Value) -> Vec<RenderSection> {
        SECTION_LAYOUT
            .iter()
            .enumerate()
            .filter_map(|(rank, (key, display_as))| {
                cv_content.get(*key).map(|content| RenderSection {
                    key: (*key).to_string(),
                    display_as: (*display_as).to_string(),
                    order: rank as u32,
                    content: content.clone(),
                })
            })
            .collect()
    }

    /// Render the complete HTML document
    pub fn render(&self, personal_data: &Value, sections: &[RenderSection]) -> String {
        let mut ordered: Vec<&RenderSection> = sections.iter().collect();
        // Stable sort keeps insertion order for equal ranks
        ordered.sort_by_key(|s| s.order);

        let mut sections_html = String::new();
        for section in ordered {
            // Unknown section keys are ignored rather than rejected
            if let Some(html) = render_section(section) {
                sections_html.push_str(&html);
            }
        }

        let name = str_field(personal_data, "full_name");
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>CV - {name}</title>
<meta name="generated" content="{timestamp}">
<style>
{STYLESHEET}
</style>
</head>
<body>
<div class="cv-container">
{header}
{sections_html}
</div>
</body>
</html>
"#,
            name = esc(&name),
            header = render_header(personal_data),
        )
    }
}

fn render_header(personal_data: &Value) -> String {
    let name = str_field(personal_data, "full_name");
    let title = str_field(personal_data, "job_title");

    let mut contacts = Vec::new();
    for key in ["location", "phone", "email", "nationality"] {
        let value = str_field(personal_data, key);
        if !value.is_empty() {
            contacts.push(format!(r#"<span class="contact-item">{}</span>"#, esc(&value)));
        }
    }
    for key in ["linkedin", "github", "website"] {
        let value = str_field(personal_data, key);
        if !value.is_empty() {
            contacts.push(format!(
                r#"<span class="contact-item"><a href="{0}">{0}</a></span>"#,
                esc(&value)
            ));
        }
    }

    format!(
        r#"<header class="cv-header">
<h1 class="cv-name">{}</h1>
<p class="cv-title">{}</p>
<div class="cv-contacts">{}</div>
</header>
"#,
        esc(&name),
        esc(&title),
        contacts.join("\n")
    )
}

fn render_section(section: &RenderSection) -> Option<String> {
    let body = match section.key.as_str() {
        "professional_summary" => render_summary(&section.content),
        "core_competencies" => render_competencies(&section.content),
        "professional_experience" => render_experience(&section.content),
        "education" => render_education(&section.content),
        "courses" => render_courses(&section.content),
        "key_projects" => render_projects(&section.content),
        "languages" => render_languages(&section.content),
        _ => return None,
    };

    Some(format!(
        r#"<section class="cv-section cv-section-{key}">
<h2 class="section-title">{title}</h2>
{body}
</section>
"#,
        key = esc(&section.key),
        title = esc(&section.display_as),
    ))
}

fn render_summary(content: &Value) -> String {
    let text = content.as_str().unwrap_or("");
    format!(r#"<p class="summary-text">{}</p>"#, esc(text))
}

fn render_competencies(content: &Value) -> String {
    let skills = content
        .get("technical_skills")
        .and_then(|v| v.as_array())
        .map(|a| a.as_slice())
        .unwrap_or(&[]);

    let items: String = skills
        .iter()
        .filter_map(|s| s.as_str())
        .map(|s| format!(r#"<span class="skill-tag">{}</span>"#, esc(s)))
        .collect();

    format!(r#"<div class="skills-list">{}</div>"#, items)
}

fn render_experience(content: &Value) -> String {
    let entries = content.as_array().map(|a| a.as_slice()).unwrap_or(&[]);

    entries
        .iter()
        .map(|entry| {
            let achievements: String = entry
                .get("achievements")
                .and_then(|v| v.as_array())
                .map(|a| {
                    a.iter()
                        .filter_map(|v| v.as_str())
                        .map(|s| format!("<li>{}</li>", esc(s)))
                        .collect()
                })
                .unwrap_or_default();

            format!(
                r#"<div class="experience-entry">
<div class="entry-header">
<span class="entry-title">{job_title}</span>
<span class="entry-dates">{start} - {end}</span>
</div>
<div class="entry-subheader">{company}, {location}</div>
<div class="entry-stack">{stack}</div>
<ul class="achievements">{achievements}</ul>
</div>
"#,
                job_title = esc(&str_field(entry, "job_title")),
                start = esc(&str_field(entry, "start_date")),
                end = esc(&str_field(entry, "end_date")),
                company = esc(&str_field(entry, "company")),
                location = esc(&str_field(entry, "location")),
                stack = esc(&str_field(entry, "stack")),
            )
        })
        .collect()
}

fn render_education(content: &Value) -> String {
    let entries = content.as_array().map(|a| a.as_slice()).unwrap_or(&[]);

    entries
        .iter()
        .map(|entry| {
            let years = match str_opt_field(entry, "start_year") {
                Some(start) => format!("{} - {}", start, str_field(entry, "graduation_year")),
                None => str_field(entry, "graduation_year"),
            };
            let details = str_opt_field(entry, "details")
                .map(|d| format!(r#"<div class="entry-details">{}</div>"#, esc(&d)))
                .unwrap_or_default();

            format!(
                r#"<div class="education-entry">
<div class="entry-header">
<span class="entry-title">{degree}</span>
<span class="entry-dates">{years}</span>
</div>
<div class="entry-subheader">{institution}, {location}</div>
{details}
</div>
"#,
                degree = esc(&str_field(entry, "degree")),
                years = esc(&years),
                institution = esc(&str_field(entry, "institution")),
                location = esc(&str_field(entry, "location")),
            )
        })
        .collect()
}

fn render_courses(content: &Value) -> String {
    let entries = content.as_array().map(|a| a.as_slice()).unwrap_or(&[]);

    entries
        .iter()
        .map(|entry| {
            format!(
                r#"<div class="course-entry">
<div class="entry-header">
<span class="entry-title">{name}</span>
<span class="entry-dates">{year}</span>
</div>
<div class="entry-subheader">{provider}, {location}</div>
<div class="entry-details">{description}</div>
</div>
"#,
                name = esc(&str_field(entry, "name")),
                year = esc(&str_field(entry, "year")),
                provider = esc(&str_field(entry, "provider")),
                location = esc(&str_field(entry, "location")),
                description = esc(&str_field(entry, "description")),
            )
        })
        .collect()
}

fn render_projects(content: &Value) -> String {
    let entries = content.as_array().map(|a| a.as_slice()).unwrap_or(&[]);

    entries
        .iter()
        .map(|entry| {
            let technologies: String = entry
                .get("technologies")
                .and_then(|v| v.as_array())
                .map(|a| {
                    a.iter()
                        .filter_map(|v| v.as_str())
                        .map(|s| format!(r#"<span class="skill-tag">{}</span>"#, esc(s)))
                        .collect()
                })
                .unwrap_or_default();

            format!(
                r#"<div class="project-entry">
<div class="entry-header">
<span class="entry-title">{name}</span>
<span class="entry-dates">{period}</span>
</div>
<div class="entry-details">{description}</div>
<div class="skills-list">{technologies}</div>
<div class="entry-details">{details}</div>
</div>
"#,
                name = esc(&str_field(entry, "name")),
                period = esc(&str_field(entry, "period")),
                description = esc(&str_field(entry, "description")),
                details = esc(&str_field(entry, "details")),
            )
        })
        .collect()
}

fn render_languages(content: &Value) -> String {
    let entries = content.as_array().map(|a| a.as_slice()).unwrap_or(&[]);

    let items: String = entries
        .iter()
        .map(|entry| {
            format!(
                r#"<li><span class="language-name">{}</span> <span class="language-level">{}</span></li>"#,
                esc(&str_field(entry, "language")),
                esc(&str_field(entry, "proficiency")),
            )
        })
        .collect();

    format!(r#"<ul class="languages-list">{}</ul>"#, items)
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

fn str_opt_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Minimal HTML escaping for text interpolated into the document
fn esc(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
