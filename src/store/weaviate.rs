//! Weaviate implementation of [`StoreClient`].
//!
//! Talks to Weaviate over HTTP: objects go through the batch endpoint and
//! searches through GraphQL `Get` with a `hybrid` argument. One pooled
//! `reqwest::Client` is built at connect time and shared by all calls.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use super::{ADDITIONAL_PREFIX, BatchItemResult, BatchObject, HybridResult, StoreClient};
use crate::config::AdapterConfig;
use crate::error::StoreError;

/// Delay between readiness probes while waiting for startup.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Collection (class) names: GraphQL names starting with a letter.
static COLLECTION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][_0-9A-Za-z]*$").unwrap_or_else(|_| unreachable!())
});

/// Property names: GraphQL names.
static FIELD_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[_A-Za-z][_0-9A-Za-z]*$").unwrap_or_else(|_| unreachable!())
});

/// Weaviate REST/GraphQL client.
#[derive(Debug, Clone)]
pub struct WeaviateClient {
    http: reqwest::Client,
    base_url: String,
}

impl WeaviateClient {
    /// Builds the HTTP client without probing the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if a forwarded header value is
    /// not valid or the HTTP client cannot be built.
    pub fn new(config: &AdapterConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let forwarded = [
            ("x-openai-api-key", config.openai_api_key.as_deref()),
            ("x-cohere-api-key", config.cohere_api_key.as_deref()),
        ];
        for (name, value) in forwarded {
            if let Some(value) = value {
                let value = HeaderValue::from_str(value).map_err(|e| {
                    StoreError::Connection(format!("invalid value for header {name}: {e}"))
                })?;
                headers.insert(HeaderName::from_static(name), value);
            }
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StoreError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url(),
        })
    }

    /// Builds the client and waits for the store to report ready.
    ///
    /// A zero `config.startup_timeout` skips the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the store is not ready within
    /// `config.startup_timeout`.
    pub async fn connect(config: &AdapterConfig) -> Result<Self, StoreError> {
        let client = Self::new(config)?;
        if config.startup_timeout.is_zero() {
            debug!(url = %client.base_url, "readiness probe disabled");
        } else {
            client.wait_until_ready(config.startup_timeout).await?;
        }
        info!(url = %client.base_url, "connected to weaviate");
        Ok(client)
    }

    /// Polls the readiness endpoint until it answers 2xx or `timeout` elapses.
    async fn wait_until_ready(&self, timeout: Duration) -> Result<(), StoreError> {
        let url = self.url("/v1/.well-known/ready");
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let last_error = match self.http.get(&url).timeout(timeout).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => format!("readiness probe returned {}", resp.status()),
                Err(e) => e.to_string(),
            };

            if tokio::time::Instant::now() + READY_POLL_INTERVAL >= deadline {
                return Err(StoreError::Connection(format!(
                    "weaviate at {} not ready after {}ms: {last_error}",
                    self.base_url,
                    timeout.as_millis()
                )));
            }
            debug!(error = %last_error, "weaviate not ready yet");
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends a JSON POST and returns the decoded body of a 2xx response.
    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, StoreError> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = resp.status();
        let text = resp.text().await.map_err(map_transport_error)?;
        if !status.is_success() {
            let detail = error_messages(&text).unwrap_or(text);
            return Err(StoreError::Operation(format!(
                "weaviate returned {status}: {detail}"
            )));
        }

        serde_json::from_str(&text).map_err(|e| {
            StoreError::Operation(format!("unexpected response from {path}: {e}"))
        })
    }
}

fn map_transport_error(e: reqwest::Error) -> StoreError {
    if e.is_connect() || e.is_timeout() {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Operation(e.to_string())
    }
}

/// Extracts `{"error":[{"message":..}]}` messages from an error body.
fn error_messages(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let messages: Vec<String> = parsed.error.into_iter().map(|e| e.message).collect();
    if messages.is_empty() {
        None
    } else {
        Some(messages.join("\n"))
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Vec<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    #[serde(default)]
    message: String,
}

/// One element of the batch endpoint's response array.
#[derive(Debug, Deserialize)]
struct BatchResponseItem {
    id: Option<String>,
    result: Option<BatchItemStatus>,
}

#[derive(Debug, Deserialize)]
struct BatchItemStatus {
    errors: Option<ErrorBody>,
}

impl From<BatchResponseItem> for BatchItemResult {
    fn from(item: BatchResponseItem) -> Self {
        let errors = item
            .result
            .and_then(|r| r.errors)
            .map(|e| e.error.into_iter().map(|m| m.message).collect())
            .unwrap_or_default();
        Self {
            id: item.id,
            errors,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<ErrorMessage>,
}

// ---------------------------------------------------------------------------
// Query building and response parsing
// ---------------------------------------------------------------------------

/// Renders one requested field as a GraphQL selection.
///
/// Plain names select the property; `_additional.<name>` selects from the
/// `_additional` block.
fn render_field(field: &str) -> Result<String, StoreError> {
    if let Some(extra) = field.strip_prefix(ADDITIONAL_PREFIX) {
        if FIELD_NAME.is_match(extra) {
            return Ok(format!("_additional {{ {extra} }}"));
        }
    } else if FIELD_NAME.is_match(field) {
        return Ok(field.to_string());
    }
    Err(StoreError::Operation(format!("invalid field name: {field:?}")))
}

/// Builds the GraphQL `Get` query for a hybrid search.
pub(crate) fn build_hybrid_query(
    collection: &str,
    query_text: &str,
    fields: &[String],
) -> Result<String, StoreError> {
    if !COLLECTION_NAME.is_match(collection) {
        return Err(StoreError::Operation(format!(
            "invalid collection name: {collection:?}"
        )));
    }
    if fields.is_empty() {
        return Err(StoreError::Operation(
            "at least one target property is required".to_string(),
        ));
    }

    let selection = fields
        .iter()
        .map(|f| render_field(f))
        .collect::<Result<Vec<_>, _>>()?
        .join(" ");
    let literal = serde_json::to_string(query_text)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    Ok(format!(
        "{{ Get {{ {collection}(hybrid: {{query: {literal}}}) {{ {selection} }} }} }}"
    ))
}

/// Pulls the result rows for `collection` out of a GraphQL `data` object.
///
/// Weaviate capitalizes class names, so the lookup falls back to a
/// case-insensitive match on the `Get` keys.
pub(crate) fn extract_rows(collection: &str, data: &Value) -> Result<HybridResult, StoreError> {
    let get = data
        .get("Get")
        .and_then(Value::as_object)
        .ok_or_else(|| StoreError::Operation("response has no Get block".to_string()))?;

    let (key, rows) = get
        .get_key_value(collection)
        .or_else(|| get.iter().find(|(k, _)| k.eq_ignore_ascii_case(collection)))
        .ok_or_else(|| {
            StoreError::Operation(format!("response has no results for {collection}"))
        })?;

    let rows = match rows {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .map(|row| row.as_object().cloned().unwrap_or_default())
            .collect(),
        _ => {
            return Err(StoreError::Operation(format!(
                "results for {key} are not a list"
            )));
        }
    };

    Ok(HybridResult {
        collection: key.clone(),
        rows,
    })
}

#[async_trait]
impl StoreClient for WeaviateClient {
    fn name(&self) -> &'static str {
        "weaviate"
    }

    async fn batch_insert(
        &self,
        objects: &[BatchObject],
    ) -> Result<Vec<BatchItemResult>, StoreError> {
        let body = json!({ "objects": objects });
        let items: Vec<BatchResponseItem> = self
            .post_json("/v1/batch/objects", &body)
            .await
            .map_err(|e| match e {
                StoreError::Operation(msg) => {
                    StoreError::Operation(format!("make insertion request: {msg}"))
                }
                other => other,
            })?;
        debug!(submitted = objects.len(), returned = items.len(), "batch insert");
        Ok(items.into_iter().map(BatchItemResult::from).collect())
    }

    async fn hybrid_search(
        &self,
        collection: &str,
        query_text: &str,
        fields: &[String],
    ) -> Result<HybridResult, StoreError> {
        let query = build_hybrid_query(collection, query_text, fields)?;
        debug!(%collection, fields = fields.len(), "hybrid search");

        let resp: GraphQlResponse = self.post_json("/v1/graphql", &json!({ "query": query })).await?;

        if let Some(err) = StoreError::join(resp.errors.into_iter().map(|e| e.message)) {
            return Err(err);
        }
        let data = resp.data.unwrap_or_else(|| Value::Object(Map::new()));
        extract_rows(collection, &data)
    }
}
