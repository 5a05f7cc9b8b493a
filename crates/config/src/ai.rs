// AI backend configuration and secrets
//
// The API key for the AI dispatch endpoint is looked up in:
// 1. System keychain (preferred)
// 2. SHEETLINT_AI_KEY environment variable (fallback for CI/headless)
//
// Keys are NEVER stored in settings.json

use std::env;

/// Service name for keychain storage
const KEYCHAIN_SERVICE: &str = "sheetlint";

/// Keychain account holding the AI backend key
const KEYCHAIN_ACCOUNT: &str = "ai/backend";

/// Environment variable fallback
pub const AI_KEY_ENV: &str = "SHEETLINT_AI_KEY";

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Key retrieved from system keychain
    Keychain,
    /// Key retrieved from environment variable
    Environment,
    /// No key found
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Keychain => "keychain",
            KeySource::Environment => "environment",
            KeySource::None => "none",
        }
    }
}

/// Result of key lookup
#[derive(Debug, Clone)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
}

/// Get the AI backend key.
///
/// Checks the system keychain first, then `SHEETLINT_AI_KEY`.
pub fn get_api_key() -> KeyLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT) {
            if let Ok(key) = entry.get_password() {
                return KeyLookup {
                    key: Some(key),
                    source: KeySource::Keychain,
                };
            }
        }
    }

    key_from_env(|name| env::var(name).ok())
}

fn key_from_env(lookup: impl Fn(&str) -> Option<String>) -> KeyLookup {
    match lookup(AI_KEY_ENV) {
        Some(key) if !key.is_empty() => KeyLookup {
            key: Some(key),
            source: KeySource::Environment,
        },
        _ => KeyLookup {
            key: None,
            source: KeySource::None,
        },
    }
}

/// Store the AI backend key in the system keychain
#[cfg(feature = "keychain")]
pub fn set_api_key(key: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
        .map_err(|e| format!("Failed to create keychain entry: {}", e))?;

    entry
        .set_password(key)
        .map_err(|e| format!("Failed to store key in keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn set_api_key(_key: &str) -> Result<(), String> {
    Err(format!("Keychain support not enabled. Set {} instead.", AI_KEY_ENV))
}

/// Delete the AI backend key from the system keychain
#[cfg(feature = "keychain")]
pub fn delete_api_key() -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
        .map_err(|e| format!("Failed to access keychain entry: {}", e))?;

    entry
        .delete_credential()
        .map_err(|e| format!("Failed to delete key from keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn delete_api_key() -> Result<(), String> {
    Err("Keychain support not enabled.".to_string())
}

/// Check if keychain support is available
pub fn keychain_available() -> bool {
    #[cfg(feature = "keychain")]
    {
        keyring::Entry::new(KEYCHAIN_SERVICE, "test").is_ok()
    }
    #[cfg(not(feature = "keychain"))]
    {
        false
    }
}

// ============================================================================
// Resolved AI Configuration
// ============================================================================

/// Status of the AI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiConfigStatus {
    /// No endpoint configured
    Disabled,
    /// Endpoint configured (key optional)
    Ready,
}

impl AiConfigStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Ready => "ready",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// The effective AI configuration, fully resolved from settings and secrets.
#[derive(Debug, Clone)]
pub struct ResolvedAiConfig {
    pub endpoint: Option<String>,
    pub namespace: String,
    pub api_key: Option<String>,
    pub key_source: KeySource,
    pub status: AiConfigStatus,
    /// Human-readable reason if not ready
    pub blocking_reason: Option<String>,
}

impl ResolvedAiConfig {
    pub fn from_settings(settings: &crate::settings::AiSettings) -> Self {
        Self::resolve(settings, get_api_key())
    }

    fn resolve(settings: &crate::settings::AiSettings, lookup: KeyLookup) -> Self {
        let endpoint = settings
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(String::from);

        let (status, blocking_reason) = match endpoint {
            Some(_) => (AiConfigStatus::Ready, None),
            None => (
                AiConfigStatus::Disabled,
                Some("No AI endpoint configured. Set ai.endpoint or SHEETLINT_AI_ENDPOINT".to_string()),
            ),
        };

        Self {
            endpoint,
            namespace: settings.namespace.clone(),
            api_key: lookup.key,
            key_source: lookup.source,
            status,
            blocking_reason,
        }
    }
}

/// Diagnostic information about AI configuration
#[derive(Debug)]
pub struct AiDiagnostics {
    pub endpoint: Option<String>,
    pub namespace: String,
    pub status: AiConfigStatus,
    pub key_present: bool,
    pub key_source: KeySource,
    pub keychain_available: bool,
}

impl AiDiagnostics {
    pub fn from_resolved(config: &ResolvedAiConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            namespace: config.namespace.clone(),
            status: config.status,
            key_present: config.api_key.is_some(),
            key_source: config.key_source,
            keychain_available: keychain_available(),
        }
    }
}

impl std::fmt::Display for AiDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "AI Configuration")?;
        writeln!(f, "──────────────────────────────")?;
        writeln!(f, "Status:            {}", self.status.as_str())?;
        writeln!(f, "Endpoint:          {}", self.endpoint.as_deref().unwrap_or("(none)"))?;
        writeln!(f, "Namespace:         {}", self.namespace)?;
        writeln!(f, "Key present:       {}", if self.key_present { "yes" } else { "no" })?;
        writeln!(f, "Key source:        {}", self.key_source.as_str())?;
        writeln!(f, "Keychain:          {}", if self.keychain_available { "yes" } else { "no" })?;
        Ok(())
    }
}
