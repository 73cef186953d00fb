//! Profile data models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Personal (non-CV) data shown in the document header
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PersonalData {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub nationality: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub github: String,
}

impl PersonalData {
    /// Parse the stored JSON column, falling back to empty fields for
    /// missing or unparseable data
    pub fn from_stored(stored: Option<&str>) -> Self {
        stored
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }

    /// Apply a partial update: only fields present in the patch change
    pub fn merge_patch(&mut self, patch: &PersonalDataUpdate) {
        macro_rules! apply {
            ($field:ident) => {
                if let Some(value) = &patch.$field {
                    self.$field = value.clone();
                }
            };
        }
        apply!(full_name);
        apply!(job_title);
        apply!(email);
        apply!(phone);
        apply!(location);
        apply!(nationality);
        apply!(website);
        apply!(linkedin);
        apply!(github);
    }
}

/// Partial update payload; absent fields are left untouched
#[derive(Deserialize, Debug, Default)]
pub struct PersonalDataUpdate {
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub nationality: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
}

/// Full CV content replacement payload
#[derive(Deserialize, Debug)]
pub struct CvContentUpdate {
    pub cv_content: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_stored_handles_missing_and_garbage() {
        assert_eq!(PersonalData::from_stored(None), PersonalData::default());
        assert_eq!(
            PersonalData::from_stored(Some("not json")),
            PersonalData::default()
        );
    }

    #[test]
    fn test_from_stored_parses_partial_object() {
        let data = PersonalData::from_stored(Some(r#"{"full_name": "Ada"}"#));
        assert_eq!(data.full_name, "Ada");
        assert_eq!(data.email, "");
    }

    #[test]
    fn test_merge_patch_updates_only_present_fields() {
        let mut data = PersonalData {
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            ..Default::default()
        };

        data.merge_patch(&PersonalDataUpdate {
            email: Some("ada@newmail.com".to_string()),
            location: Some("London".to_string()),
            ..Default::default()
        });

        assert_eq!(data.full_name, "Ada Lovelace");
        assert_eq!(data.email, "ada@newmail.com");
        assert_eq!(data.location, "London");
    }

    #[test]
    fn test_merge_patch_can_clear_a_field() {
        let mut data = PersonalData {
            phone: "+44 1234".to_string(),
            ..Default::default()
        };

        data.merge_patch(&PersonalDataUpdate {
            phone: Some(String::new()),
            ..Default::default()
        });

        assert_eq!(data.phone, "");
    }
}
