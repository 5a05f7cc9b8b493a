// Application settings
// Loaded from ~/.config/sheetlint/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default lint service origin (local development server)
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Default namespace prefixed to AI method names ("ai.value", ...)
pub const DEFAULT_AI_NAMESPACE: &str = "ai";

/// Lint service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LintSettings {
    /// Origin of the linting API; the endpoint path is fixed
    pub api_base: String,

    /// Cap on concurrent uploads per batch (None = one request per file)
    pub max_in_flight: Option<usize>,
}

impl Default for LintSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            max_in_flight: None,
        }
    }
}

/// Usage analytics (local structured log only)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    pub enabled: bool,
}

/// AI custom-function backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// Full URL of the AI dispatch endpoint (None = AI functions unavailable)
    pub endpoint: Option<String>,

    /// Namespace used to build fully-qualified method names
    pub namespace: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            namespace: DEFAULT_AI_NAMESPACE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub lint: LintSettings,
    pub analytics: AnalyticsSettings,
    pub ai: AiSettings,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sheetlint");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults.
    /// Writes a commented default file on first run.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(&path);
            return settings;
        }

        Self::load_from(&path)
    }

    /// Load settings from an explicit path. Missing or invalid files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::debug!("Could not read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring lines that start with `//`.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        serde_json::from_str(&cleaned).map_err(|e| e.to_string())
    }

    /// Apply environment overrides (SHEETLINT_API_BASE, SHEETLINT_AI_ENDPOINT,
    /// SHEETLINT_ANALYTICS). `lookup` is normally `std::env::var(..).ok()`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(base) = non_empty("SHEETLINT_API_BASE") {
            self.lint.api_base = base;
        }
        if let Some(endpoint) = non_empty("SHEETLINT_AI_ENDPOINT") {
            self.ai.endpoint = Some(endpoint);
        }
        if let Some(flag) = non_empty("SHEETLINT_ANALYTICS") {
            self.analytics.enabled = is_truthy(&flag);
        }
        self
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r#"{
    // Linting service
    // maxInFlight: null = upload every dropped file at once
    "lint": {
        "apiBase": "http://localhost:8000",
        "maxInFlight": null
    },

    // Local usage events (written to the log, never sent anywhere)
    "analytics": {
        "enabled": false
    },

    // AI custom functions (value / list / table)
    // API key is read from the system keychain or SHEETLINT_AI_KEY
    "ai": {
        "endpoint": null,
        "namespace": "ai"
    }
}
"#;

        if let Err(e) = fs::write(path, default_config) {
            log::warn!("Error writing default settings.json: {}", e);
        }
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

/// "1", "true", "yes", "on" (any case) are true; everything else is false.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.lint.api_base, DEFAULT_API_BASE);
        assert!(s.lint.max_in_flight.is_none());
        assert!(!s.analytics.enabled);
        assert!(s.ai.endpoint.is_none());
        assert_eq!(s.ai.namespace, "ai");
    }

    #[test]
    fn test_parse_with_comments_and_partial_keys() {
        let json = r#"{
            // comment line
            "lint": { "maxInFlight": 4 },
            "ai": { "endpoint": "https://ai.example.com/run" }
        }"#;
        let s = Settings::parse(json).unwrap();
        assert_eq!(s.lint.max_in_flight, Some(4));
        assert_eq!(s.lint.api_base, DEFAULT_API_BASE);
        assert_eq!(s.ai.endpoint.as_deref(), Some("https://ai.example.com/run"));
        assert_eq!(s.ai.namespace, "ai");
    }

    #[test]
    fn test_default_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheetlint/settings.json");
        Settings::default().create_default_file(&path);
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::load_from(&dir.path().join("nope.json")), Settings::default());
    }

    #[test]
    fn test_serialized_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut s = Settings::default();
        s.lint.api_base = "https://lint.test".into();
        s.analytics.enabled = true;
        fs::write(&path, serde_json::to_string_pretty(&s).unwrap()).unwrap();
        assert_eq!(Settings::load_from(&path), s);
    }

    #[test]
    fn test_env_overrides() {
        let s = Settings::default().with_env_overrides(env(&[
            ("SHEETLINT_API_BASE", "https://lint.test"),
            ("SHEETLINT_AI_ENDPOINT", "https://ai.test/run"),
            ("SHEETLINT_ANALYTICS", "yes"),
        ]));
        assert_eq!(s.lint.api_base, "https://lint.test");
        assert_eq!(s.ai.endpoint.as_deref(), Some("https://ai.test/run"));
        assert!(s.analytics.enabled);
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let s = Settings::default().with_env_overrides(env(&[("SHEETLINT_API_BASE", "  ")]));
        assert_eq!(s.lint.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("TRUE"));
        assert!(is_truthy(" 1 "));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("false"));
    }
}
