//! Store gateway.
//!
//! Presents the two store operations the dispatcher needs, `insert_one` and
//! `query`, and hides how they map onto the store: inserts go through the
//! batch path as a batch of one, and query results are projected onto the
//! requested fields and encoded as canonical JSON.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{ADDITIONAL_PREFIX, BatchObject, HybridResult, StoreClient};
use crate::error::StoreError;

/// Adapter-facing wrapper around a shared [`StoreClient`].
#[derive(Clone)]
pub struct StoreGateway {
    client: Arc<dyn StoreClient>,
}

impl std::fmt::Debug for StoreGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreGateway")
            .field("store", &self.client.name())
            .finish()
    }
}

impl StoreGateway {
    /// Wraps an already-connected store client.
    #[must_use]
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self { client }
    }

    /// Inserts one object and returns its store-assigned identifier.
    ///
    /// The object is submitted as a one-element batch: the store's schema
    /// inference only runs on the batch path. Every nested error on every
    /// returned result is collected, in store order, into one
    /// [`StoreError::Operation`]. An identifier is only returned when no
    /// error was reported.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the batch request fails, if the store
    /// reports any nested error, or if no identifier comes back.
    pub async fn insert_one(
        &self,
        collection: &str,
        properties: Map<String, Value>,
    ) -> Result<String, StoreError> {
        let batch = [BatchObject {
            collection: collection.to_string(),
            properties,
        }];

        let results = self.client.batch_insert(&batch).await?;

        let messages = results.iter().flat_map(|r| r.errors.iter());
        if let Some(err) = StoreError::join(messages) {
            // The store may assign an ID even when it reports errors.
            warn!(
                %collection,
                assigned_id = results.first().and_then(|r| r.id.as_deref()).unwrap_or(""),
                error = %err,
                "insert rejected by store"
            );
            return Err(err);
        }

        let id = results
            .into_iter()
            .next()
            .and_then(|r| r.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                StoreError::Operation("store returned no identifier for inserted object".to_string())
            })?;

        debug!(%collection, %id, "inserted object");
        Ok(id)
    }

    /// Runs a hybrid search and returns the canonical JSON encoding of the
    /// rows, projected onto `fields`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store call fails or the result cannot
    /// be encoded. Store errors are not retried.
    pub async fn query(
        &self,
        collection: &str,
        query_text: &str,
        fields: &[String],
    ) -> Result<String, StoreError> {
        let result = self
            .client
            .hybrid_search(collection, query_text, fields)
            .await?;
        debug!(%collection, rows = result.rows.len(), "hybrid search returned");
        encode_result(&result, fields)
    }
}

/// Reads one requested field from a row; absent fields are `null`.
fn project_field(row: &Map<String, Value>, field: &str) -> Value {
    let value = field.strip_prefix(ADDITIONAL_PREFIX).map_or_else(
        || row.get(field),
        |extra| row.get("_additional").and_then(|a| a.get(extra)),
    );
    value.cloned().unwrap_or(Value::Null)
}

/// Keeps exactly `fields`, in that order.
fn project_row(row: &Map<String, Value>, fields: &[String]) -> Map<String, Value> {
    fields
        .iter()
        .map(|f| (f.clone(), project_field(row, f)))
        .collect()
}

/// Encodes a search result as
/// `{"data":{"Get":{"<Collection>":[{..}, ..]}}}`.
pub(crate) fn encode_result(result: &HybridResult, fields: &[String]) -> Result<String, StoreError> {
    let rows: Vec<Value> = result
        .rows
        .iter()
        .map(|row| Value::Object(project_row(row, fields)))
        .collect();

    let mut get = Map::new();
    get.insert(result.collection.clone(), Value::Array(rows));
    let mut data = Map::new();
    data.insert("Get".to_string(), Value::Object(get));
    let mut root = Map::new();
    root.insert("data".to_string(), Value::Object(data));

    serde_json::to_string(&root)
        .map_err(|e| StoreError::Serialization(format!("encode query response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::BatchItemResult;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Store double that replays canned responses and records calls.
    #[derive(Default)]
    struct FakeStore {
        batch_response: Vec<BatchItemResult>,
        search_rows: Vec<Value>,
        fail_with: Option<StoreError>,
        inserted: Mutex<Vec<BatchObject>>,
        searched: Mutex<Vec<(String, String, Vec<String>)>>,
    }

    #[async_trait]
    impl StoreClient for FakeStore {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn batch_insert(
            &self,
            objects: &[BatchObject],
        ) -> Result<Vec<BatchItemResult>, StoreError> {
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            if let Ok(mut inserted) = self.inserted.lock() {
                inserted.extend_from_slice(objects);
            }
            Ok(self.batch_response.clone())
        }

        async fn hybrid_search(
            &self,
            collection: &str,
            query_text: &str,
            fields: &[String],
        ) -> Result<HybridResult, StoreError> {
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            if let Ok(mut searched) = self.searched.lock() {
                searched.push((collection.to_string(), query_text.to_string(), fields.to_vec()));
            }
            Ok(HybridResult {
                collection: collection.to_string(),
                rows: self
                    .search_rows
                    .iter()
                    .filter_map(|r| r.as_object().cloned())
                    .collect(),
            })
        }
    }

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn test_insert_one_submits_single_object() {
        let store = Arc::new(FakeStore {
            batch_response: vec![BatchItemResult {
                id: Some("6c8a5f0e-1b7f-4d55-9b0c-5a1a2f3e4d5c".to_string()),
                errors: Vec::new(),
            }],
            ..FakeStore::default()
        });
        let gateway = StoreGateway::new(store.clone());

        let id = gateway
            .insert_one("WorldMap", props(json!({"city": "Valencia"})))
            .await;
        assert_eq!(id, Ok("6c8a5f0e-1b7f-4d55-9b0c-5a1a2f3e4d5c".to_string()));

        let inserted = store.inserted.lock().map(|v| v.clone()).unwrap_or_default();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].collection, "WorldMap");
        assert_eq!(inserted[0].properties["city"], "Valencia");
    }

    #[tokio::test]
    async fn test_insert_one_joins_nested_errors_in_order() {
        let store = Arc::new(FakeStore {
            batch_response: vec![BatchItemResult {
                id: Some("assigned-anyway".to_string()),
                errors: vec!["first problem".to_string(), "second problem".to_string()],
            }],
            ..FakeStore::default()
        });
        let gateway = StoreGateway::new(store);

        let result = gateway.insert_one("WorldMap", Map::new()).await;
        assert_eq!(
            result,
            Err(StoreError::Operation("first problem\nsecond problem".to_string()))
        );
    }

    #[tokio::test]
    async fn test_insert_one_collects_errors_across_results() {
        let store = Arc::new(FakeStore {
            batch_response: vec![
                BatchItemResult {
                    id: Some("a".to_string()),
                    errors: vec!["from first".to_string()],
                },
                BatchItemResult {
                    id: None,
                    errors: vec!["from second".to_string()],
                },
            ],
            ..FakeStore::default()
        });
        let gateway = StoreGateway::new(store);

        let err = gateway
            .insert_one("WorldMap", Map::new())
            .await
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert_eq!(err, "from first\nfrom second");
    }

    #[tokio::test]
    async fn test_insert_one_without_id_fails() {
        let store = Arc::new(FakeStore {
            batch_response: Vec::new(),
            ..FakeStore::default()
        });
        let gateway = StoreGateway::new(store);
        assert!(matches!(
            gateway.insert_one("WorldMap", Map::new()).await,
            Err(StoreError::Operation(_))
        ));
    }

    #[tokio::test]
    async fn test_insert_one_propagates_transport_error() {
        let store = Arc::new(FakeStore {
            fail_with: Some(StoreError::Connection("refused".to_string())),
            ..FakeStore::default()
        });
        let gateway = StoreGateway::new(store);
        assert_eq!(
            gateway.insert_one("WorldMap", Map::new()).await,
            Err(StoreError::Connection("refused".to_string()))
        );
    }

    #[tokio::test]
    async fn test_query_projects_requested_fields_in_order() {
        let store = Arc::new(FakeStore {
            search_rows: vec![json!({
                "city": "Valencia",
                "population": 800_000,
                "country": "Spain",
                "continent": "Europe"
            })],
            ..FakeStore::default()
        });
        let gateway = StoreGateway::new(store.clone());
        let requested = fields(&["continent", "country", "city"]);

        let payload = gateway
            .query("WorldMap", "What country is Valencia in?", &requested)
            .await;
        assert_eq!(
            payload,
            Ok(
                r#"{"data":{"Get":{"WorldMap":[{"continent":"Europe","country":"Spain","city":"Valencia"}]}}}"#
                    .to_string()
            )
        );

        let searched = store.searched.lock().map(|v| v.clone()).unwrap_or_default();
        assert_eq!(
            searched,
            vec![(
                "WorldMap".to_string(),
                "What country is Valencia in?".to_string(),
                requested
            )]
        );
    }

    #[test]
    fn test_encode_result_missing_and_additional_fields() {
        let result = HybridResult {
            collection: "WorldMap".to_string(),
            rows: vec![props(json!({
                "city": "Valencia",
                "_additional": {"id": "abc", "score": "0.9"}
            }))],
        };
        let encoded = encode_result(&result, &fields(&["country", "_additional.id", "city"]));
        assert_eq!(
            encoded,
            Ok(
                r#"{"data":{"Get":{"WorldMap":[{"country":null,"_additional.id":"abc","city":"Valencia"}]}}}"#
                    .to_string()
            )
        );
    }

    #[test]
    fn test_encode_result_empty() {
        let result = HybridResult {
            collection: "WorldMap".to_string(),
            rows: Vec::new(),
        };
        assert_eq!(
            encode_result(&result, &fields(&["city"])),
            Ok(r#"{"data":{"Get":{"WorldMap":[]}}}"#.to_string())
        );
    }
}
