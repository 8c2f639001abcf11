//! End-to-end dispatcher tests against an in-memory store.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use weaviate_mcp::store::{BatchItemResult, BatchObject, HybridResult};
use weaviate_mcp::{
    Dispatcher, Envelope, Invocation, OperationRegistry, Phase, StoreClient, StoreError,
    StoreGateway,
};

const DEFAULT: &str = "DefaultCollection";

/// In-memory store: inserts are kept per collection, searches return every
/// stored object of the collection.
#[derive(Default)]
struct MemoryStore {
    objects: Mutex<Vec<(String, Map<String, Value>)>>,
    nested_errors: Vec<String>,
    calls: AtomicUsize,
    searches: Mutex<Vec<(String, String, Vec<String>)>>,
}

#[async_trait]
impl StoreClient for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn batch_insert(
        &self,
        objects: &[BatchObject],
    ) -> Result<Vec<BatchItemResult>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut stored = self.objects.lock().unwrap();
        let mut results = Vec::new();
        for obj in objects {
            stored.push((obj.collection.clone(), obj.properties.clone()));
            results.push(BatchItemResult {
                id: Some(format!("00000000-0000-0000-0000-{:012}", stored.len())),
                errors: self.nested_errors.clone(),
            });
        }
        Ok(results)
    }

    async fn hybrid_search(
        &self,
        collection: &str,
        query_text: &str,
        fields: &[String],
    ) -> Result<HybridResult, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.searches.lock().unwrap().push((
            collection.to_string(),
            query_text.to_string(),
            fields.to_vec(),
        ));
        let rows = self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == collection)
            .map(|(_, props)| props.clone())
            .collect();
        Ok(HybridResult {
            collection: collection.to_string(),
            rows,
        })
    }
}

fn dispatcher(store: Arc<MemoryStore>) -> Dispatcher {
    Dispatcher::new(
        Arc::new(OperationRegistry::standard()),
        StoreGateway::new(store),
        DEFAULT,
    )
}

fn invocation(operation: &str, arguments: Value) -> Invocation {
    match arguments {
        Value::Object(map) => Invocation::new(operation, map),
        _ => panic!("arguments must be an object"),
    }
}

fn valencia() -> Value {
    json!({"continent": "Europe", "country": "Spain", "city": "Valencia"})
}

#[tokio::test]
async fn insert_without_collection_uses_default_and_returns_bare_id() {
    let store = Arc::new(MemoryStore::default());
    let d = dispatcher(store.clone());

    let envelope = d
        .handle(&invocation("insert-one", json!({"properties": valencia()})))
        .await;

    assert_eq!(
        envelope,
        Envelope::Success {
            payload: "00000000-0000-0000-0000-000000000001".to_string()
        }
    );
    let stored = store.objects.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].0, DEFAULT);
    assert_eq!(stored[0].1["country"], "Spain");
}

#[tokio::test]
async fn insert_with_collection_overrides_default() {
    let store = Arc::new(MemoryStore::default());
    let d = dispatcher(store.clone());

    let envelope = d
        .handle(&invocation(
            "insert-one",
            json!({"collection": "WorldMap", "properties": valencia()}),
        ))
        .await;

    assert!(!envelope.is_failure());
    assert_eq!(store.objects.lock().unwrap()[0].0, "WorldMap");
}

#[tokio::test]
async fn missing_required_argument_never_reaches_store() {
    let store = Arc::new(MemoryStore::default());
    let d = dispatcher(store.clone());

    let insert = d
        .handle(&invocation("insert-one", json!({"collection": "WorldMap"})))
        .await;
    let query = d
        .handle(&invocation("query", json!({"targetProperties": ["city"]})))
        .await;

    for envelope in [&insert, &query] {
        assert!(matches!(
            envelope,
            Envelope::Failure {
                phase: Phase::Resolution,
                ..
            }
        ));
    }
    assert!(insert.text().starts_with("failed to resolve arguments: "));
    assert!(insert.text().contains("'properties'"));
    assert!(query.text().contains("'query'"));
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_string_target_property_is_rejected() {
    let store = Arc::new(MemoryStore::default());
    let d = dispatcher(store.clone());

    let envelope = d
        .handle(&invocation(
            "query",
            json!({"query": "Valencia", "targetProperties": ["city", 42]}),
        ))
        .await;

    assert!(envelope.is_failure());
    assert!(envelope.text().contains("must contain only strings"));
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn nested_batch_errors_become_one_failure() {
    let store = Arc::new(MemoryStore {
        nested_errors: vec![
            "no vectorizer configured".to_string(),
            "property 'city' has invalid type".to_string(),
        ],
        ..MemoryStore::default()
    });
    let d = dispatcher(store);

    let envelope = d
        .handle(&invocation("insert-one", json!({"properties": valencia()})))
        .await;

    assert_eq!(
        envelope.text(),
        "failed to insert object: no vectorizer configured\nproperty 'city' has invalid type"
    );
}

#[tokio::test]
async fn query_projects_exactly_requested_fields() {
    let store = Arc::new(MemoryStore::default());
    let d = dispatcher(store.clone());

    let mut props = valencia();
    props["population"] = json!(800_000);
    d.handle(&invocation(
        "insert-one",
        json!({"collection": "WorldMap", "properties": props}),
    ))
    .await;

    let envelope = d
        .handle(&invocation(
            "query",
            json!({
                "collection": "WorldMap",
                "query": "What country is Valencia in?",
                "targetProperties": ["continent", "country", "city"]
            }),
        ))
        .await;

    assert_eq!(
        envelope,
        Envelope::Success {
            payload: r#"{"data":{"Get":{"WorldMap":[{"continent":"Europe","country":"Spain","city":"Valencia"}]}}}"#
                .to_string()
        }
    );
    let searches = store.searches.lock().unwrap();
    assert_eq!(searches[0].1, "What country is Valencia in?");
    assert_eq!(searches[0].2, vec!["continent", "country", "city"]);
}

#[tokio::test]
async fn unknown_operation_yields_failure() {
    let store = Arc::new(MemoryStore::default());
    let d = dispatcher(store.clone());

    let envelope = d.handle(&invocation("delete-all", json!({}))).await;

    assert!(matches!(
        envelope,
        Envelope::Failure {
            phase: Phase::Lookup,
            ..
        }
    ));
    assert!(envelope.text().contains("delete-all"));
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_invocations_are_independent() {
    let store = Arc::new(MemoryStore::default());
    let d = Arc::new(dispatcher(store.clone()));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let d = Arc::clone(&d);
            tokio::spawn(async move {
                d.handle(&invocation(
                    "insert-one",
                    json!({"collection": "WorldMap", "properties": {"n": i}}),
                ))
                .await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Envelope::Success { payload } => ids.push(payload),
            other => panic!("unexpected failure: {other:?}"),
        }
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);
    assert_eq!(store.objects.lock().unwrap().len(), 16);
}
