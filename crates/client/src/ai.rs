//! AI custom-function dispatch.
//!
//! The spreadsheet functions `AI_Value`, `AI_List` and `AI_Table` are thin
//! adapters: each forwards its arguments untouched to a remote AI backend
//! through [`AiDispatcher::dispatch`], which only prefixes the method name
//! with the configured namespace.

use sheetlint_config::ai::ResolvedAiConfig;

const USER_AGENT: &str = concat!("sheetlint/", env!("CARGO_PKG_VERSION"));

/// Error from an AI dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum AiError {
    /// No AI endpoint configured
    NotConfigured(String),
    /// Network error
    Network(String),
    /// Non-success response from the backend
    Http { status: u16, body: String },
    /// Response was not JSON
    Parse(String),
}

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiError::NotConfigured(msg) => write!(f, "AI not configured: {}", msg),
            AiError::Network(msg) => write!(f, "Network error: {}", msg),
            AiError::Http { status, body } => write!(f, "AI backend error ({}): {}", status, body),
            AiError::Parse(msg) => write!(f, "Failed to parse AI response: {}", msg),
        }
    }
}

impl std::error::Error for AiError {}

/// Client for the remote AI execution endpoint (blocking).
#[derive(Clone)]
pub struct AiDispatcher {
    http: reqwest::blocking::Client,
    endpoint: String,
    namespace: String,
    api_key: Option<String>,
}

impl AiDispatcher {
    pub fn new(endpoint: impl Into<String>, namespace: impl Into<String>) -> Result<Self, AiError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            namespace: namespace.into(),
            api_key: None,
        })
    }

    /// Build from resolved configuration. Fails if no endpoint is set.
    pub fn from_config(config: &ResolvedAiConfig) -> Result<Self, AiError> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            AiError::NotConfigured(
                config.blocking_reason.clone().unwrap_or_else(|| "no endpoint".to_string()),
            )
        })?;
        Ok(Self::new(endpoint, config.namespace.clone())?.with_api_key(config.api_key.clone()))
    }

    /// Attach a bearer token to every call.
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    /// Fully-qualified method name: `<namespace>.<name>`.
    pub fn method_name(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.namespace, name)
        }
    }

    /// Send `args` to the backend method `name` and return its answer.
    ///
    /// When the backend wraps its answer as `{"result": ...}` the inner
    /// value is returned; otherwise the whole body is.
    pub fn dispatch(&self, name: &str, args: Vec<serde_json::Value>) -> Result<serde_json::Value, AiError> {
        let method = self.method_name(name);
        log::debug!("AI dispatch {} ({} args)", method, args.len());

        let mut req = self.http
            .post(&self.endpoint)
            .json(&serde_json::json!({ "method": method, "args": args }));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().map_err(|e| AiError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AiError::Http { status, body });
        }

        let mut body: serde_json::Value = response.json()
            .map_err(|e| AiError::Parse(e.to_string()))?;

        match body.as_object_mut().and_then(|obj| obj.remove("result")) {
            Some(result) => Ok(result),
            None => Ok(body),
        }
    }

    /// `AI_Value(query, ...cells)`
    pub fn ai_value(&self, query: &str, cells: Vec<serde_json::Value>) -> Result<serde_json::Value, AiError> {
        let mut args = Vec::with_capacity(cells.len() + 1);
        args.push(serde_json::Value::from(query));
        args.extend(cells);
        self.dispatch("value", args)
    }

    /// `AI_List(query, count)`
    pub fn ai_list(&self, query: &str, count: Option<u32>) -> Result<serde_json::Value, AiError> {
        self.dispatch("list", vec![query.into(), count.into()])
    }

    /// `AI_Table(query, headers, count)`
    pub fn ai_table(
        &self,
        query: &str,
        headers: serde_json::Value,
        count: Option<u32>,
    ) -> Result<serde_json::Value, AiError> {
        self.dispatch("table", vec![query.into(), headers, count.into()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use sheetlint_config::ai::{AiConfigStatus, KeySource};

    fn dispatcher(server: &MockServer) -> AiDispatcher {
        AiDispatcher::new(server.url("/run"), "ai").unwrap()
    }

    #[test]
    fn test_method_name() {
        let d = AiDispatcher::new("http://ai.test/run", "sheets").unwrap();
        assert_eq!(d.method_name("value"), "sheets.value");
        let bare = AiDispatcher::new("http://ai.test/run", "").unwrap();
        assert_eq!(bare.method_name("list"), "list");
    }

    #[test]
    fn test_from_config_requires_endpoint() {
        let config = ResolvedAiConfig {
            endpoint: None,
            namespace: "ai".into(),
            api_key: None,
            key_source: KeySource::None,
            status: AiConfigStatus::Disabled,
            blocking_reason: Some("No AI endpoint configured".into()),
        };
        let err = AiDispatcher::from_config(&config).err().unwrap();
        assert_eq!(err, AiError::NotConfigured("No AI endpoint configured".into()));
    }

    #[test]
    fn test_value_forwards_arguments_verbatim() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/run")
                .json_body(serde_json::json!({
                    "method": "ai.value",
                    "args": ["capital of", "France", [[1, 2], [3, 4]]]
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({ "result": "Paris" }));
        });

        let out = dispatcher(&server)
            .ai_value("capital of", vec!["France".into(), serde_json::json!([[1, 2], [3, 4]])])
            .unwrap();

        mock.assert();
        assert_eq!(out, serde_json::json!("Paris"));
    }

    #[test]
    fn test_list_passes_null_count() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/run")
                .json_body(serde_json::json!({ "method": "ai.list", "args": ["fruits", null] }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!(["apple", "pear"]));
        });

        let out = dispatcher(&server).ai_list("fruits", None).unwrap();
        mock.assert();
        assert_eq!(out, serde_json::json!(["apple", "pear"]));
    }

    #[test]
    fn test_table_with_bearer_auth() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/run")
                .header("authorization", "Bearer k-123")
                .json_body(serde_json::json!({
                    "method": "ai.table",
                    "args": ["planets", ["name", "moons"], 2]
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({ "result": [["Mars", 2], ["Earth", 1]] }));
        });

        let out = dispatcher(&server)
            .with_api_key(Some("k-123".into()))
            .ai_table("planets", serde_json::json!(["name", "moons"]), Some(2))
            .unwrap();

        mock.assert();
        assert_eq!(out, serde_json::json!([["Mars", 2], ["Earth", 1]]));
    }

    #[test]
    fn test_backend_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/run");
            then.status(503).body("overloaded");
        });

        let err = dispatcher(&server).ai_list("x", Some(1)).unwrap_err();
        assert_eq!(err, AiError::Http { status: 503, body: "overloaded".into() });
    }

    #[test]
    fn test_non_json_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/run");
            then.status(200).body("not json");
        });

        let err = dispatcher(&server).ai_value("x", Vec::new()).unwrap_err();
        assert!(matches!(err, AiError::Parse(_)));
    }
}
