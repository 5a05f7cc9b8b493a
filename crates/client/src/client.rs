//! Lint API HTTP client.
//!
//! Blocking reqwest client (no async runtime required). Each file in a
//! batch gets its own request; the batch settles once every request has.

use std::path::Path;
use std::time::Duration;

use sheetlint_config::Settings;
use sheetlint_core::{FileTask, LintOutcome, LintResult};

use crate::batch::gather;

/// Path of the lint endpoint, relative to the API base.
pub const LINT_ENDPOINT: &str = "/api/sheet_linter";

const USER_AGENT: &str = concat!("sheetlint/", env!("CARGO_PKG_VERSION"));

/// Known statuses with a user-facing explanation.
const STATUS_MESSAGES: &[(u16, &str)] = &[
    (415, "Unsupported file type. Please upload a .xlsx file"),
    (413, "File too large. Please upload a smaller file"),
];

/// Message for a known HTTP status, if there is one.
pub fn status_message(status: u16) -> Option<&'static str> {
    STATUS_MESSAGES
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, msg)| *msg)
}

/// Error type for a single lint request.
#[derive(Debug, Clone, PartialEq)]
pub enum LintError {
    /// Could not read the local file
    Io(String),
    /// Network error (connection refused, reset, DNS, ...)
    Transport(String),
    /// Non-success status, already mapped to a user-facing message
    HttpStatus { status: u16, message: String },
    /// Body was not a valid lint result
    Parse(String),
}

impl std::fmt::Display for LintError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LintError::Io(msg) => write!(f, "Could not read file: {}", msg),
            LintError::Transport(msg) => write!(f, "Network error: {}", msg),
            LintError::HttpStatus { message, .. } => write!(f, "{}", message),
            LintError::Parse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for LintError {}

/// One field of the multipart upload body.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    File {
        name: &'static str,
        file_name: String,
        bytes: Vec<u8>,
    },
    Text {
        name: &'static str,
        value: String,
    },
}

/// Describe the multipart body for a task.
///
/// Local files become a single `file1` part. Remote documents become a
/// `url` field plus the authorization payload serialized as JSON.
pub fn form_fields(task: &FileTask) -> Result<Vec<FormField>, LintError> {
    match task {
        FileTask::File { name, path } => {
            let bytes = read_file(path)?;
            Ok(vec![FormField::File {
                name: "file1",
                file_name: name.clone(),
                bytes,
            }])
        }
        FileTask::Remote { url, auth_payload, .. } => {
            let payload = serde_json::to_string(auth_payload)
                .map_err(|e| LintError::Parse(e.to_string()))?;
            Ok(vec![
                FormField::Text { name: "url", value: url.clone() },
                FormField::Text { name: "authPayload", value: payload },
            ])
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, LintError> {
    std::fs::read(path).map_err(|e| LintError::Io(format!("{}: {}", path.display(), e)))
}

fn build_form(fields: Vec<FormField>) -> reqwest::blocking::multipart::Form {
    use reqwest::blocking::multipart::{Form, Part};

    fields.into_iter().fold(Form::new(), |form, field| match field {
        FormField::File { name, file_name, bytes } => {
            form.part(name, Part::bytes(bytes).file_name(file_name))
        }
        FormField::Text { name, value } => form.text(name, value),
    })
}

/// Pretty-print a response body with its `prompt` key removed.
pub fn scrub_prompt(body: &serde_json::Value) -> String {
    let mut scrubbed = body.clone();
    if let Some(obj) = scrubbed.as_object_mut() {
        obj.remove("prompt");
    }
    serde_json::to_string_pretty(&scrubbed).unwrap_or_else(|_| scrubbed.to_string())
}

/// Lint API client (blocking).
#[derive(Clone)]
pub struct LintClient {
    http: reqwest::blocking::Client,
    api_base: String,
    max_in_flight: Option<usize>,
}

impl LintClient {
    /// Create a client for the given API origin.
    pub fn new(api_base: impl Into<String>) -> Result<Self, LintError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| LintError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            max_in_flight: None,
        })
    }

    /// Create a client from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, LintError> {
        Ok(Self::new(settings.lint.api_base.clone())?
            .with_max_in_flight(settings.lint.max_in_flight))
    }

    /// Bound the number of concurrent uploads per batch. `None` = unbounded.
    pub fn with_max_in_flight(mut self, limit: Option<usize>) -> Self {
        self.max_in_flight = limit;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn max_in_flight(&self) -> Option<usize> {
        self.max_in_flight
    }

    /// Full URL of the lint endpoint, including the JSON output flag.
    pub fn endpoint_url(&self) -> String {
        format!("{}{}?format=json", self.api_base, LINT_ENDPOINT)
    }

    /// Lint one task. Every error is folded into a failure outcome.
    pub fn lint(&self, task: &FileTask) -> LintOutcome {
        match self.try_lint(task) {
            Ok((result, json_response)) => LintOutcome::success(task.name(), result, json_response),
            Err(e) => {
                log::warn!("lint failed for {}: {}", task.name(), e);
                LintOutcome::failure(task.name(), e.to_string())
            }
        }
    }

    /// Lint every task concurrently and wait for all of them.
    ///
    /// The result has one outcome per task, in task order. A failing task
    /// never affects its siblings.
    pub fn submit_batch(&self, tasks: &[FileTask]) -> Vec<LintOutcome> {
        log::info!(
            "submitting {} file(s) to {} (max in flight: {})",
            tasks.len(),
            self.endpoint_url(),
            self.max_in_flight.map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
        );
        let outcomes = gather(tasks, self.max_in_flight, |task| self.lint(task));
        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        log::info!("batch settled: {} ok, {} failed", outcomes.len() - failed, failed);
        outcomes
    }

    /// Upload a task and decode the response.
    /// Returns the parsed result and the prompt-free pretty JSON.
    pub fn try_lint(&self, task: &FileTask) -> Result<(LintResult, String), LintError> {
        let form = build_form(form_fields(task)?);
        let url = self.endpoint_url();
        log::debug!("POST {} ({})", url, task.name());

        let response = self.http
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| LintError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = status_message(status.as_u16())
                .or_else(|| status.canonical_reason())
                .map(String::from)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(LintError::HttpStatus { status: status.as_u16(), message });
        }

        let body: serde_json::Value = response.json()
            .map_err(|e| LintError::Parse(e.to_string()))?;
        let json_response = scrub_prompt(&body);
        let result: LintResult = serde_json::from_value(body)
            .map_err(|e| LintError::Parse(e.to_string()))?;

        Ok((result, json_response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> LintClient {
        LintClient::new(server.base_url()).unwrap()
    }

    fn xlsx(dir: &tempfile::TempDir, name: &str) -> FileTask {
        let path = dir.path().join(name);
        std::fs::write(&path, b"PK\x03\x04 fake workbook").unwrap();
        FileTask::from_path(path)
    }

    #[test]
    fn test_status_table() {
        assert_eq!(status_message(415), Some("Unsupported file type. Please upload a .xlsx file"));
        assert_eq!(status_message(413), Some("File too large. Please upload a smaller file"));
        assert_eq!(status_message(500), None);
    }

    #[test]
    fn test_endpoint_url_trims_trailing_slash() {
        let c = LintClient::new("http://lint.test/").unwrap();
        assert_eq!(c.endpoint_url(), "http://lint.test/api/sheet_linter?format=json");
    }

    #[test]
    fn test_from_settings_carries_cap() {
        let mut settings = Settings::default();
        settings.lint.api_base = "http://lint.test".into();
        settings.lint.max_in_flight = Some(3);
        let c = LintClient::from_settings(&settings).unwrap();
        assert_eq!(c.api_base(), "http://lint.test");
        assert_eq!(c.max_in_flight(), Some(3));
    }

    #[test]
    fn test_form_fields_for_file() {
        let dir = tempfile::tempdir().unwrap();
        let task = xlsx(&dir, "budget.xlsx");
        let fields = form_fields(&task).unwrap();
        assert_eq!(fields.len(), 1);
        match &fields[0] {
            FormField::File { name, file_name, bytes } => {
                assert_eq!(*name, "file1");
                assert_eq!(file_name, "budget.xlsx");
                assert!(bytes.starts_with(b"PK"));
            }
            other => panic!("unexpected field {:?}", other),
        }
    }

    #[test]
    fn test_form_fields_for_remote() {
        let task = FileTask::remote(
            "Forecast",
            "https://docs.google.com/spreadsheets/d/abc",
            serde_json::json!({ "access_token": "ya29.x" }),
        );
        let fields = form_fields(&task).unwrap();
        assert_eq!(
            fields,
            vec![
                FormField::Text { name: "url", value: "https://docs.google.com/spreadsheets/d/abc".into() },
                FormField::Text { name: "authPayload", value: r#"{"access_token":"ya29.x"}"#.into() },
            ]
        );
    }

    #[test]
    fn test_form_fields_missing_file() {
        let task = FileTask::from_path("/definitely/not/here.xlsx");
        let err = form_fields(&task).unwrap_err();
        assert!(matches!(err, LintError::Io(_)));
    }

    #[test]
    fn test_scrub_prompt_removes_only_prompt() {
        let body = serde_json::json!({ "summary": "S", "prompt": "secret", "total_tokens": 3 });
        let pretty = scrub_prompt(&body);
        assert!(!pretty.contains("prompt"));
        assert!(pretty.contains("\"summary\": \"S\""));
        assert!(pretty.contains('\n'));
    }

    #[test]
    fn test_success_response() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/sheet_linter")
                .query_param("format", "json");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({
                    "summary": "S",
                    "problems": [],
                    "subtables": {},
                    "calculations": []
                }));
        });

        let dir = tempfile::tempdir().unwrap();
        let outcome = client(&server).lint(&xlsx(&dir, "a.xlsx"));

        mock.assert();
        match outcome {
            LintOutcome::Success { file_name, result, json_response, .. } => {
                assert_eq!(file_name, "a.xlsx");
                assert_eq!(result.summary, "S");
                let expected = serde_json::to_string_pretty(&serde_json::json!({
                    "summary": "S",
                    "problems": [],
                    "subtables": {},
                    "calculations": []
                }))
                .unwrap();
                let reparsed: serde_json::Value = serde_json::from_str(&json_response).unwrap();
                let expected_value: serde_json::Value = serde_json::from_str(&expected).unwrap();
                assert_eq!(reparsed, expected_value);
                assert!(json_response.contains('\n'));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_prompt_kept_on_result_but_scrubbed_from_json() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/sheet_linter");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({
                    "summary": "S",
                    "problems": [],
                    "subtables": {},
                    "calculations": [],
                    "prompt": "Lint this workbook",
                    "prompt_tokens": 10
                }));
        });

        let dir = tempfile::tempdir().unwrap();
        let outcome = client(&server).lint(&xlsx(&dir, "a.xlsx"));
        let LintOutcome::Success { result, json_response, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(result.prompt.as_deref(), Some("Lint this workbook"));
        assert_eq!(result.prompt_tokens, Some(10));
        assert!(!json_response.contains("Lint this workbook"));
        assert!(json_response.contains("prompt_tokens"));
    }

    #[test]
    fn test_415_maps_to_unsupported_type() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/sheet_linter");
            then.status(415);
        });

        let dir = tempfile::tempdir().unwrap();
        let outcome = client(&server).lint(&xlsx(&dir, "notes.txt"));
        assert_eq!(outcome.error(), Some("Unsupported file type. Please upload a .xlsx file"));
        assert_eq!(outcome.file_name(), "notes.txt");
    }

    #[test]
    fn test_413_maps_to_too_large() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/sheet_linter");
            then.status(413);
        });

        let dir = tempfile::tempdir().unwrap();
        let err = client(&server).try_lint(&xlsx(&dir, "huge.xlsx")).unwrap_err();
        assert_eq!(
            err,
            LintError::HttpStatus { status: 413, message: "File too large. Please upload a smaller file".into() }
        );
    }

    #[test]
    fn test_unmapped_status_uses_reason_phrase() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/sheet_linter");
            then.status(500).body("stack trace");
        });

        let dir = tempfile::tempdir().unwrap();
        let outcome = client(&server).lint(&xlsx(&dir, "a.xlsx"));
        assert_eq!(outcome.error(), Some("Internal Server Error"));
    }

    #[test]
    fn test_malformed_json_is_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/sheet_linter");
            then.status(200).body("<html>oops</html>");
        });

        let dir = tempfile::tempdir().unwrap();
        let err = client(&server).try_lint(&xlsx(&dir, "a.xlsx")).unwrap_err();
        assert!(matches!(err, LintError::Parse(_)));
    }

    #[test]
    fn test_wrong_shape_is_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/sheet_linter");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({ "problems": "not a list" }));
        });

        let dir = tempfile::tempdir().unwrap();
        let outcome = client(&server).lint(&xlsx(&dir, "a.xlsx"));
        assert!(outcome.error().unwrap().starts_with("Invalid response"));
    }

    #[test]
    fn test_transport_failure_is_failure() {
        // Nothing listens on port 9 on a test host
        let c = LintClient::new("http://127.0.0.1:9").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = c.try_lint(&xlsx(&dir, "a.xlsx")).unwrap_err();
        assert!(matches!(err, LintError::Transport(_)));
        assert!(err.to_string().starts_with("Network error"));
    }

    #[test]
    fn test_remote_task_posts() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/sheet_linter");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({ "summary": "remote" }));
        });

        let task = FileTask::remote("Forecast", "https://example.com/doc", serde_json::json!({ "t": 1 }));
        let outcome = client(&server).lint(&task);
        mock.assert();
        assert_eq!(outcome.result().map(|r| r.summary.as_str()), Some("remote"));
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/sheet_linter");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({ "summary": "ok" }));
        });

        let dir = tempfile::tempdir().unwrap();
        let tasks = vec![
            xlsx(&dir, "a.xlsx"),
            FileTask::from_path(dir.path().join("missing.xlsx")),
            xlsx(&dir, "c.xlsx"),
        ];
        let outcomes = client(&server).submit_batch(&tasks);

        mock.assert_calls(2);
        let names: Vec<&str> = outcomes.iter().map(|o| o.file_name()).collect();
        assert_eq!(names, vec!["a.xlsx", "missing.xlsx", "c.xlsx"]);
        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
        assert!(outcomes[2].is_success());
    }

    #[test]
    fn test_batch_with_cap() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/sheet_linter");
            then.status(415);
        });

        let dir = tempfile::tempdir().unwrap();
        let tasks: Vec<FileTask> = (0..5).map(|i| xlsx(&dir, &format!("{}.xlsx", i))).collect();
        let outcomes = client(&server).with_max_in_flight(Some(2)).submit_batch(&tasks);

        mock.assert_calls(5);
        assert_eq!(outcomes.len(), 5);
        assert!(outcomes.iter().all(|o| !o.is_success()));
        assert_eq!(outcomes[4].file_name(), "4.xlsx");
    }
}
