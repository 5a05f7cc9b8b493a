// Configuration loading

pub mod ai;
pub mod settings;
pub mod startup;

pub use settings::{AiSettings, AnalyticsSettings, LintSettings, Settings};
pub use startup::StartupConfig;
