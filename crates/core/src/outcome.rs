//! Lint results and per-file outcomes.
//!
//! `LintResult` mirrors the JSON body returned by the linting endpoint.
//! `LintOutcome` wraps it (or an error message) together with the
//! originating file name and the time the outcome was created.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Qualitative ranking attached to a detected problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    /// Used when the service omits a severity.
    #[default]
    #[serde(alias = "Low", alias = "LOW")]
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding reported against a cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Problem {
    #[serde(deserialize_with = "null_as_default")]
    pub sheet: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cell: String,
    #[serde(deserialize_with = "null_as_default")]
    pub problem: String,
    #[serde(deserialize_with = "null_as_default")]
    pub fix: String,
    #[serde(deserialize_with = "null_as_default")]
    pub example: String,
    #[serde(deserialize_with = "null_as_default")]
    pub severity: Severity,
}

/// Explicit `null` reads the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Structured lint result as returned by the service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LintResult {
    #[serde(deserialize_with = "null_as_default")]
    pub summary: String,
    /// Named sub-ranges of the workbook mapped to their cell addresses
    #[serde(deserialize_with = "null_as_default")]
    pub subtables: BTreeMap<String, Vec<String>>,
    /// Human-readable descriptions of the calculations found
    #[serde(deserialize_with = "null_as_default")]
    pub calculations: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub problems: Vec<Problem>,

    // Diagnostics, only populated when the service is asked for them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(alias = "rawResponse", skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(alias = "promptTokens", skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(alias = "completionTokens", skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(alias = "totalTokens", skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

impl LintResult {
    /// True when any of the diagnostic fields came back.
    pub fn has_diagnostics(&self) -> bool {
        self.prompt.is_some()
            || self.raw_response.is_some()
            || self.prompt_tokens.is_some()
            || self.completion_tokens.is_some()
            || self.total_tokens.is_some()
    }

    /// Problem count per severity, in (high, medium, low) order.
    pub fn severity_counts(&self) -> (usize, usize, usize) {
        self.problems.iter().fold((0, 0, 0), |(h, m, l), p| match p.severity {
            Severity::High => (h + 1, m, l),
            Severity::Medium => (h, m + 1, l),
            Severity::Low => (h, m, l + 1),
        })
    }
}

/// Result of analyzing one spreadsheet: a structured result or an error.
///
/// Outcomes are never edited after construction; the aggregator only hands
/// out shared references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LintOutcome {
    Success {
        file_name: String,
        created_at: DateTime<Utc>,
        result: LintResult,
        /// Pretty-printed response body with `prompt` removed
        json_response: String,
    },
    Failure {
        file_name: String,
        created_at: DateTime<Utc>,
        error: String,
    },
}

impl LintOutcome {
    pub fn success(file_name: impl Into<String>, result: LintResult, json_response: String) -> Self {
        LintOutcome::Success {
            file_name: file_name.into(),
            created_at: Utc::now(),
            result,
            json_response,
        }
    }

    pub fn failure(file_name: impl Into<String>, error: impl Into<String>) -> Self {
        LintOutcome::Failure {
            file_name: file_name.into(),
            created_at: Utc::now(),
            error: error.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            LintOutcome::Success { file_name, .. } | LintOutcome::Failure { file_name, .. } => file_name,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            LintOutcome::Success { created_at, .. } | LintOutcome::Failure { created_at, .. } => *created_at,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LintOutcome::Success { .. })
    }

    pub fn result(&self) -> Option<&LintResult> {
        match self {
            LintOutcome::Success { result, .. } => Some(result),
            LintOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LintOutcome::Success { .. } => None,
            LintOutcome::Failure { error, .. } => Some(error),
        }
    }

    /// Stable key for display lists. Not an ordering guarantee.
    pub fn display_key(&self) -> String {
        format!(
            "{}@{}",
            self.file_name(),
            self.created_at().timestamp_nanos_opt().unwrap_or_default()
        )
    }
}
