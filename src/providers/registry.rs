//! Static provider and model registry
//!
//! The registry is the single source of truth for which providers exist
//! and which models each one offers. Settings updates are validated against
//! it, and new users start on the defaults below.

/// One selectable model under a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
}

/// One supported AI provider with its model list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub models: &'static [ModelInfo],
}

pub const PROVIDERS: &[ProviderInfo] = &[
    ProviderInfo {
        id: "google",
        name: "Google",
        models: &[
            ModelInfo {
                id: "gemini-2.5-flash",
                name: "Gemini 2.5 Flash",
            },
            ModelInfo {
                id: "gemini-2.5-flash-lite",
                name: "Gemini 2.5 Flash-Lite",
            },
            ModelInfo {
                id: "gemini-2.5-pro",
                name: "Gemini 2.5 Pro",
            },
        ],
    },
    ProviderInfo {
        id: "groq",
        name: "Groq",
        models: &[
            ModelInfo {
                id: "openai/gpt-oss-120b",
                name: "OpenAI GPT OSS 120B",
            },
            ModelInfo {
                id: "moonshotai/kimi-k2-instruct-0905",
                name: "Kimi K2 Instruct",
            },
        ],
    },
];

pub const DEFAULT_PROVIDER: &str = "google";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub fn find_provider(provider_id: &str) -> Option<&'static ProviderInfo> {
    PROVIDERS.iter().find(|p| p.id == provider_id)
}

pub fn models_for_provider(provider_id: &str) -> Option<&'static [ModelInfo]> {
    find_provider(provider_id).map(|p| p.models)
}

/// True when the model id belongs to the given provider
pub fn is_valid_model(provider_id: &str, model_id: &str) -> bool {
    models_for_provider(provider_id)
        .map(|models| models.iter().any(|m| m.id == model_id))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_exist_in_registry() {
        let provider = find_provider(DEFAULT_PROVIDER).expect("default provider registered");
        assert!(provider.models.iter().any(|m| m.id == DEFAULT_MODEL));
    }

    #[test]
    fn test_find_provider() {
        assert_eq!(find_provider("google").unwrap().name, "Google");
        assert_eq!(find_provider("groq").unwrap().name, "Groq");
        assert!(find_provider("openai").is_none());
    }

    #[test]
    fn test_model_validation() {
        assert!(is_valid_model("google", "gemini-2.5-pro"));
        assert!(is_valid_model("groq", "openai/gpt-oss-120b"));
        assert!(!is_valid_model("google", "openai/gpt-oss-120b"));
        assert!(!is_valid_model("unknown", "gemini-2.5-flash"));
    }
}
