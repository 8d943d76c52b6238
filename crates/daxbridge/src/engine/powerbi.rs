//! Power BI REST `executeQueries` engine adapter.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::error::{DaxBridgeError, Result};

use super::connection::{Cursor, EngineConfig, EngineConnection, QueryEngine};
use super::descriptor::{ConnectionDescriptor, Credentials};
use super::failure::{EngineErrorKind, EngineResult, ExecutionFailure};

/// Environment variable holding the Power BI bearer token.
pub const ACCESS_TOKEN_VAR: &str = "POWERBI_ACCESS_TOKEN";

/// Engine that runs DAX through the Power BI REST API.
pub struct PowerBiRestEngine {
    client: Client,
    config: EngineConfig,
}

impl PowerBiRestEngine {
    /// Create an engine with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DaxBridgeError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn query_url(&self, descriptor: &ConnectionDescriptor) -> String {
        format!(
            "{}/groups/{}/datasets/{}/executeQueries",
            self.config.api_base.trim_end_matches('/'),
            descriptor.dataset.workspace,
            descriptor.dataset.dataset
        )
    }
}

impl QueryEngine for PowerBiRestEngine {
    fn connect(&self, descriptor: &ConnectionDescriptor) -> EngineResult<Box<dyn EngineConnection>> {
        let token = match &descriptor.credentials {
            Credentials::AccessToken(token) => token.clone(),
            Credentials::None => {
                return Err(ExecutionFailure::new(
                    EngineErrorKind::Other,
                    format!("No access token for {}; set {}", descriptor.dataset, ACCESS_TOKEN_VAR),
                ));
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
            ExecutionFailure::new(EngineErrorKind::Other, format!("Invalid access token: {}", e))
        })?;
        headers.insert(AUTHORIZATION, bearer);

        Ok(Box::new(RestConnection {
            client: self.client.clone(),
            url: self.query_url(descriptor),
            headers,
            open: true,
        }))
    }

    fn name(&self) -> &str {
        "powerbi"
    }
}

/// A "connection" is a prepared request target; HTTP is stateless.
struct RestConnection {
    client: Client,
    url: String,
    headers: HeaderMap,
    open: bool,
}

impl EngineConnection for RestConnection {
    fn execute<'c>(&'c mut self, query: &str) -> EngineResult<Box<dyn Cursor + 'c>> {
        if !self.open {
            return Err(ExecutionFailure::connectivity("Connection is closed"));
        }

        let body = json!({
            "queries": [{ "query": query }],
            "serializerSettings": { "includeNulls": true }
        });

        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ExecutionFailure::timeout(format!("Query timed out: {}", e))
                } else if e.is_connect() {
                    ExecutionFailure::connectivity(format!("Could not connect to Power BI: {}", e))
                } else {
                    ExecutionFailure::from_message(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let text = response.text().unwrap_or_default();

        if !status.is_success() {
            return Err(failure_from_response(status, &text));
        }

        let parsed: QueryResponse = serde_json::from_str(&text).map_err(|e| {
            ExecutionFailure::from_message(format!("Failed to parse engine response: {}", e))
        })?;
        let rows = parsed.into_rows()?;
        Ok(Box::new(RestCursor::new(rows)))
    }

    fn close(&mut self) {
        self.open = false;
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    tables: Vec<ResultTable>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ResultTable {
    #[serde(default)]
    rows: Vec<Map<String, Value>>,
}

impl QueryResponse {
    fn into_rows(self) -> EngineResult<Vec<Map<String, Value>>> {
        let Some(result) = self.results.into_iter().next() else {
            return Ok(Vec::new());
        };
        if let Some(error) = result.error {
            return Err(ExecutionFailure::from_message(error_detail(&error)));
        }
        Ok(result
            .tables
            .into_iter()
            .next()
            .map(|t| t.rows)
            .unwrap_or_default())
    }
}

fn failure_from_response(status: StatusCode, body: &str) -> ExecutionFailure {
    let detail = serde_json::from_str::<Value>(body)
        .map(|v| error_detail(&v))
        .unwrap_or_else(|_| body.to_string());
    let message = format!("Engine error ({}): {}", status, detail);

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ExecutionFailure::timeout(message),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
            ExecutionFailure::connectivity(message)
        }
        _ => ExecutionFailure::from_message(message),
    }
}

/// Pull the most specific human-readable message out of an error payload.
fn error_detail(payload: &Value) -> String {
    let error = payload.get("error").unwrap_or(payload);

    let details: Vec<&str> = error
        .pointer("/pbi.error/details")
        .and_then(Value::as_array)
        .map(|details| {
            details
                .iter()
                .filter_map(|d| d.pointer("/detail/value").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    if !details.is_empty() {
        return details.join(" ");
    }

    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.pointer("/pbi.error/code").and_then(Value::as_str))
        .or_else(|| error.get("code").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

/// Strip `Table[Column]` and `[Measure]` keys down to the bracketed name.
fn column_label(key: &str) -> &str {
    match (key.rfind('['), key.ends_with(']')) {
        (Some(open), true) => &key[open + 1..key.len() - 1],
        _ => key,
    }
}

struct RestCursor {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<Value>>,
}

impl RestCursor {
    fn new(rows: Vec<Map<String, Value>>) -> Self {
        let keys: Vec<String> = rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        let columns = keys.iter().map(|k| column_label(k).to_string()).collect();
        let rows: Vec<Vec<Value>> = rows
            .into_iter()
            .map(|mut row| {
                keys.iter()
                    .map(|k| row.remove(k).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self {
            columns,
            rows: rows.into_iter(),
        }
    }
}

impl Cursor for RestCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> EngineResult<Option<Vec<Value>>> {
        Ok(self.rows.next())
    }

    fn close(&mut self) {
        self.rows = Vec::new().into_iter();
    }
}
