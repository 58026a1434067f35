//! Config loader: reads `~/.lookout/config.json`, merges env vars, and
//! applies legacy migrations.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.lookout/config.json`
//! 3. Environment variables `LOOKOUT_<SECTION>__<FIELD>` (override JSON)
//! 4. `LOOKOUT_API_KEY`, then `GITHUB_TOKEN`, when no key is set

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Legacy top-level credential keys, moved under `provider.apiKey`.
const LEGACY_TOKEN_KEYS: &[&str] = &["githubToken", "copilotApiKey"];

/// Credential fallbacks, checked in order when no key is configured.
const CREDENTIAL_ENV_VARS: &[&str] = &["LOOKOUT_API_KEY", "GITHUB_TOKEN"];

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    migrate_config(&mut raw);

    let config: Config = match serde_json::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to deserialize config: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Move a top-level `githubToken` / `copilotApiKey` into `provider.apiKey`.
///
/// An explicit `provider.apiKey` is never overwritten.
fn migrate_config(raw: &mut serde_json::Value) {
    let Some(root) = raw.as_object_mut() else {
        return;
    };

    let legacy = LEGACY_TOKEN_KEYS
        .iter()
        .find_map(|key| root.get(*key).and_then(|v| v.as_str()).map(|s| (*key, s.to_string())));

    let Some((key, token)) = legacy else {
        return;
    };

    let provider = root
        .entry("provider")
        .or_insert_with(|| serde_json::json!({}));
    if let Some(provider) = provider.as_object_mut() {
        let has_key = provider
            .get("apiKey")
            .and_then(|v| v.as_str())
            .is_some_and(|s| !s.is_empty());
        if !has_key {
            provider.insert("apiKey".to_string(), serde_json::Value::String(token));
            debug!("Migrated {key} → provider.apiKey");
        }
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `LOOKOUT_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `LOOKOUT_AGENT__WORKSPACE`, `LOOKOUT_AGENT__MAX_ITERATIONS`, `LOOKOUT_AGENT__DEBUG`
/// - `LOOKOUT_AGENT__PROMPT_DIR`, `LOOKOUT_AGENT__OUTPUT_DIR`
/// - `LOOKOUT_PROVIDER__NAME`, `LOOKOUT_PROVIDER__API_KEY`, `LOOKOUT_PROVIDER__API_BASE`,
///   `LOOKOUT_PROVIDER__MODEL`
/// - `LOOKOUT_LOGGING__DIR`, `LOOKOUT_LOGGING__ENABLED`
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("LOOKOUT_AGENT__WORKSPACE") {
        config.agent.workspace = val;
    }
    if let Ok(val) = std::env::var("LOOKOUT_AGENT__MAX_ITERATIONS") {
        if let Ok(n) = val.parse::<u32>() {
            config.agent.max_iterations = n;
        }
    }
    if let Ok(val) = std::env::var("LOOKOUT_AGENT__DEBUG") {
        config.agent.debug = parse_flag(&val);
    }
    if let Ok(val) = std::env::var("LOOKOUT_AGENT__PROMPT_DIR") {
        config.agent.prompt_dir = val;
    }
    if let Ok(val) = std::env::var("LOOKOUT_AGENT__OUTPUT_DIR") {
        config.agent.output_dir = val;
    }

    if let Ok(val) = std::env::var("LOOKOUT_PROVIDER__NAME") {
        config.provider.name = val;
    }
    if let Ok(val) = std::env::var("LOOKOUT_PROVIDER__API_KEY") {
        config.provider.api_key = val;
    }
    if let Ok(val) = std::env::var("LOOKOUT_PROVIDER__API_BASE") {
        config.provider.api_base = Some(val);
    }
    if let Ok(val) = std::env::var("LOOKOUT_PROVIDER__MODEL") {
        config.provider.model = val;
    }

    if let Ok(val) = std::env::var("LOOKOUT_LOGGING__DIR") {
        config.logging.dir = val;
    }
    if let Ok(val) = std::env::var("LOOKOUT_LOGGING__ENABLED") {
        config.logging.enabled = parse_flag(&val);
    }

    if config.provider.api_key.is_empty() {
        if let Some(token) = CREDENTIAL_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        {
            config.provider.api_key = token;
        }
    }

    config
}

fn parse_flag(val: &str) -> bool {
    val == "true" || val == "1"
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
