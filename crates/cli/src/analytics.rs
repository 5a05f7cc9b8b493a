//! Local usage events.
//!
//! Enabled once at startup from `StartupConfig`; events are structured log
//! records on the `sheetlint::analytics` target and never leave the machine.

use sheetlint_config::StartupConfig;

pub const ANALYTICS_TARGET: &str = "sheetlint::analytics";

#[derive(Debug, Clone, Copy)]
pub struct Analytics {
    enabled: bool,
}

impl Analytics {
    pub fn new(startup: &StartupConfig) -> Self {
        Self { enabled: startup.analytics }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record an event. No-op when analytics is off.
    pub fn track(&self, event: &str, props: serde_json::Value) {
        if !self.enabled {
            return;
        }
        log::info!(target: ANALYTICS_TARGET, "analytics event={} props={}", event, props);
    }
}
