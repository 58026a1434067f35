//! Provider registry: static specs for the supported completion endpoints.
//!
//! Each `ProviderSpec` describes how to reach one OpenAI-compatible
//! `/chat/completions` endpoint: default base URL, credential env var,
//! and headers the service insists on.

// ─────────────────────────────────────────────
// ProviderSpec: static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one completion endpoint.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name (e.g. `"copilot"`).
    pub name: &'static str,
    /// Human-readable name for logs.
    pub display_name: &'static str,
    /// Environment variable conventionally holding the key.
    pub env_key: &'static str,
    /// Default API base URL.
    pub default_api_base: &'static str,
    /// Headers sent with every request, before user-configured extras.
    pub default_headers: &'static [(&'static str, &'static str)],
    /// Whether requests fail without a bearer token.
    pub requires_key: bool,
}

/// Supported endpoints, first entry is the default.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "copilot",
        display_name: "GitHub Copilot",
        env_key: "GITHUB_TOKEN",
        default_api_base: "https://api.githubcopilot.com",
        default_headers: &[
            ("Copilot-Integration-Id", "vscode-chat"),
            ("X-GitHub-Api-Version", "2025-04-01"),
        ],
        requires_key: true,
    },
    ProviderSpec {
        name: "openai",
        display_name: "OpenAI",
        env_key: "OPENAI_API_KEY",
        default_api_base: "https://api.openai.com/v1",
        default_headers: &[],
        requires_key: true,
    },
    ProviderSpec {
        name: "openrouter",
        display_name: "OpenRouter",
        env_key: "OPENROUTER_API_KEY",
        default_api_base: "https://openrouter.ai/api/v1",
        default_headers: &[],
        requires_key: true,
    },
    ProviderSpec {
        name: "ollama",
        display_name: "Ollama",
        env_key: "OLLAMA_API_KEY",
        default_api_base: "http://localhost:11434/v1",
        default_headers: &[],
        requires_key: false,
    },
];

/// Find a provider spec by its internal name (case-insensitive).
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    let name = name.to_lowercase();
    PROVIDERS.iter().find(|spec| spec.name == name)
}

/// The spec used when the config names none.
pub fn default_spec() -> &'static ProviderSpec {
    &PROVIDERS[0]
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_name() {
        let spec = find_by_name("openrouter").unwrap();
        assert_eq!(spec.display_name, "OpenRouter");
        assert_eq!(spec.default_api_base, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        assert_eq!(find_by_name("Copilot").unwrap().name, "copilot");
    }

    #[test]
    fn test_find_by_name_unknown() {
        assert!(find_by_name("nope").is_none());
    }

    #[test]
    fn test_default_is_copilot() {
        let spec = default_spec();
        assert_eq!(spec.name, "copilot");
        assert!(spec
            .default_headers
            .iter()
            .any(|(k, _)| *k == "Copilot-Integration-Id"));
    }

    #[test]
    fn test_local_provider_needs_no_key() {
        assert!(!find_by_name("ollama").unwrap().requires_key);
    }

    #[test]
    fn test_all_providers_have_unique_names() {
        let names: Vec<&str> = PROVIDERS.iter().map(|s| s.name).collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(names.len(), unique.len());
    }
}
