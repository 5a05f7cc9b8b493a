//! Process-wide flags, resolved exactly once at entry.
//!
//! Nothing here is global: `main` builds a `StartupConfig` and passes it
//! down to whatever needs it.

use crate::settings::Settings;

/// Environment variables that switch on diagnostics display.
/// Any non-empty value counts.
pub const DIAGNOSTIC_ENV_VARS: [&str; 2] = ["SHEETLINT_INCLUDE_PROMPT", "SHEETLINT_DEBUG"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StartupConfig {
    /// Show prompt, raw response and token counts next to results
    pub show_diagnostics: bool,
    /// Emit usage events to the analytics log target
    pub analytics: bool,
}

impl StartupConfig {
    /// Combine command-line switches, environment and settings.
    ///
    /// `include_prompt` / `debug` are the command-line switches; either one
    /// (or either env var) enables diagnostics.
    pub fn resolve(
        settings: &Settings,
        include_prompt: bool,
        debug: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let env_diagnostics = DIAGNOSTIC_ENV_VARS
            .iter()
            .any(|name| lookup(name).is_some_and(|v| !v.is_empty()));

        Self {
            show_diagnostics: include_prompt || debug || env_diagnostics,
            analytics: settings.analytics.enabled,
        }
    }

    /// Resolve against the real process environment.
    pub fn from_env(settings: &Settings, include_prompt: bool, debug: bool) -> Self {
        Self::resolve(settings, include_prompt, debug, |name| std::env::var(name).ok())
    }
}
