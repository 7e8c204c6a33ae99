use crate::core::{DocumentStore, Storage};
use crate::domain::model::{derive_key, ImportSummary, ItemOutcome, KeyDerivation, DEFAULT_ID_FIELD};
use crate::utils::error::{Result, SeedError};
use serde_json::Value;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// One `import` call: which file goes into which collection, keyed by which field.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRequest {
    pub collection: String,
    pub source_path: String,
    pub id_field: String,
}

impl ImportRequest {
    pub fn new(collection: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            source_path: source_path.into(),
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }
}

/// Parses a source file into its top-level array. A leading UTF-8 BOM is ignored.
pub fn parse_records(bytes: &[u8], path: &str) -> Result<Vec<Value>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let parsed: Value =
        serde_json::from_slice(bytes).map_err(|source| SeedError::SourceParseError {
            path: path.to_string(),
            source,
        })?;

    match parsed {
        Value::Array(items) => Ok(items),
        other => Err(SeedError::SourceShapeError {
            path: path.to_string(),
            found: json_type_name(&other),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Writes every element of a JSON array file as a document keyed by one of its fields.
///
/// The store is handed in by the caller, so one client serves every import of a run.
pub struct BulkImporter<S: Storage, D: DocumentStore> {
    storage: S,
    store: D,
}

impl<S: Storage, D: DocumentStore> BulkImporter<S, D> {
    pub fn new(storage: S, store: D) -> Self {
        Self { storage, store }
    }

    /// Reads, validates and writes. Only source errors are returned as `Err`;
    /// per-item problems end up in the summary.
    pub async fn import(&self, request: &ImportRequest) -> Result<ImportSummary> {
        tracing::info!(
            "📥 Importing {} → collection '{}' (key field '{}')",
            request.source_path,
            request.collection,
            request.id_field
        );

        let bytes = self.storage.read_file(&request.source_path).await?;
        let items = parse_records(&bytes, &request.source_path)?;
        tracing::debug!("Loaded {} items from {}", items.len(), request.source_path);

        let mut summary = ImportSummary::new(&request.collection, &request.source_path, items.len());

        for (index, item) in items.iter().enumerate() {
            let outcome = self.import_item(&request.collection, &request.id_field, item).await;
            match &outcome {
                ItemOutcome::Written { key } => {
                    tracing::debug!("Wrote document {} (item {})", key, index);
                }
                ItemOutcome::Skipped { reason } => {
                    tracing::warn!("⚠️ Skipping item {}: {}: {}", index, reason, item);
                }
                ItemOutcome::Failed { key, reason } => {
                    tracing::warn!(
                        "⚠️ Failed to import item {} (key {}): {}",
                        index,
                        key.as_deref().unwrap_or("-"),
                        reason
                    );
                }
            }
            summary.record(index, outcome);
        }

        tracing::info!(
            "✅ Imported {} of {} documents into '{}' ({} skipped, {} failed)",
            summary.succeeded,
            summary.total,
            summary.collection,
            summary.skipped,
            summary.failed
        );

        Ok(summary)
    }

    async fn import_item(&self, collection: &str, id_field: &str, item: &Value) -> ItemOutcome {
        let key = match derive_key(item, id_field) {
            KeyDerivation::Key(key) => key,
            KeyDerivation::Skip(reason) => return ItemOutcome::Skipped { reason },
            KeyDerivation::Invalid { raw, reason } => {
                return ItemOutcome::Failed {
                    key: Some(raw),
                    reason,
                }
            }
        };

        // derive_key only yields a key for objects
        let Some(content) = item.as_object() else {
            return ItemOutcome::Failed {
                key: Some(key.to_string()),
                reason: "element is not a JSON object".to_string(),
            };
        };

        match self.store.set_document(collection, &key, content).await {
            Ok(()) => ItemOutcome::Written { key },
            Err(e) => ItemOutcome::Failed {
                key: Some(key.to_string()),
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{DocumentKey, DocumentPage, SkipReason};
    use async_trait::async_trait;
    use serde_json::{json, Map};
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_file(path: &str, data: &[u8]) -> Self {
            let mut files = HashMap::new();
            files.insert(path.to_string(), data.to_vec());
            Self {
                files: Arc::new(Mutex::new(files)),
            }
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().unwrap();
            files
                .get(path)
                .cloned()
                .ok_or_else(|| SeedError::SourceReadError {
                    path: path.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                })
        }
    }

    type Documents = BTreeMap<(String, String), Map<String, Value>>;

    #[derive(Clone, Default)]
    struct MockStore {
        documents: Arc<Mutex<Documents>>,
        writes: Arc<Mutex<usize>>,
        failing_keys: HashSet<String>,
    }

    impl MockStore {
        fn failing_on(keys: &[&str]) -> Self {
            Self {
                failing_keys: keys.iter().map(|k| k.to_string()).collect(),
                ..Default::default()
            }
        }

        fn snapshot(&self) -> Documents {
            self.documents.lock().unwrap().clone()
        }

        fn writes(&self) -> usize {
            *self.writes.lock().unwrap()
        }
    }

    #[async_trait]
    impl DocumentStore for MockStore {
        async fn set_document(
            &self,
            collection: &str,
            key: &DocumentKey,
            content: &Map<String, Value>,
        ) -> Result<()> {
            *self.writes.lock().unwrap() += 1;
            if self.failing_keys.contains(key.as_str()) {
                return Err(SeedError::StoreRequestError {
                    status: 429,
                    message: "Quota exceeded.".to_string(),
                });
            }
            self.documents.lock().unwrap().insert(
                (collection.to_string(), key.to_string()),
                content.clone(),
            );
            Ok(())
        }

        async fn list_documents(
            &self,
            _collection: &str,
            _page_size: usize,
            _page_token: Option<&str>,
        ) -> Result<DocumentPage> {
            Ok(DocumentPage::default())
        }
    }

    #[tokio::test]
    async fn test_import_scenario_from_three_items() {
        let storage = MockStorage::with_file(
            "questions.json",
            br#"[{"id":1,"q":"A"},{"id":2,"q":"B"},{"q":"C"}]"#,
        );
        let store = MockStore::default();
        let importer = BulkImporter::new(storage, store.clone());

        let summary = importer
            .import(&ImportRequest::new("questions", "questions.json"))
            .await
            .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);

        let docs = store.snapshot();
        let keys: Vec<&str> = docs.keys().map(|(_, k)| k.as_str()).collect();
        assert_eq!(keys, vec!["1", "2"]);
        assert_eq!(
            docs[&("questions".to_string(), "2".to_string())],
            *json!({"id": 2, "q": "B"}).as_object().unwrap()
        );
        assert_eq!(
            summary.items[2].outcome,
            ItemOutcome::Skipped {
                reason: SkipReason::MissingIdentifier
            }
        );
    }

    #[tokio::test]
    async fn test_write_failure_does_not_stop_the_batch() {
        let storage = MockStorage::with_file(
            "data.json",
            br#"[{"id":"a"},{"id":"b"},{"id":"c"},{"name":"no id"}]"#,
        );
        let store = MockStore::failing_on(&["b"]);
        let importer = BulkImporter::new(storage, store.clone());

        let summary = importer
            .import(&ImportRequest::new("items", "data.json"))
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(
            summary.succeeded + summary.skipped + summary.failed,
            summary.total
        );
        assert_eq!(store.writes(), 3);

        let failure = summary.failures().next().unwrap();
        assert_eq!(failure.index, 1);
        match &failure.outcome {
            ItemOutcome::Failed { key, reason } => {
                assert_eq!(key.as_deref(), Some("b"));
                assert!(reason.contains("Quota exceeded"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_custom_id_field_and_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("[{\"code\":\"q-1\",\"text\":\"Xin chào\"}]".as_bytes());
        let storage = MockStorage::with_file("bom.json", &bytes);
        let store = MockStore::default();
        let importer = BulkImporter::new(storage, store.clone());

        let summary = importer
            .import(&ImportRequest::new("questions", "bom.json").with_id_field("code"))
            .await
            .unwrap();

        assert!(summary.is_clean());
        assert!(store
            .snapshot()
            .contains_key(&("questions".to_string(), "q-1".to_string())));
    }

    #[tokio::test]
    async fn test_malformed_json_aborts_without_writes() {
        let storage = MockStorage::with_file("broken.json", br#"[{"id": 1},"#);
        let store = MockStore::default();
        let importer = BulkImporter::new(storage, store.clone());

        let err = importer
            .import(&ImportRequest::new("questions", "broken.json"))
            .await
            .unwrap_err();

        assert!(matches!(err, SeedError::SourceParseError { .. }));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_top_level_object_aborts_without_writes() {
        let storage = MockStorage::with_file("object.json", br#"{"id": 1, "q": "A"}"#);
        let store = MockStore::default();
        let importer = BulkImporter::new(storage, store.clone());

        let err = importer
            .import(&ImportRequest::new("questions", "object.json"))
            .await
            .unwrap_err();

        match err {
            SeedError::SourceShapeError { found, .. } => assert_eq!(found, "object"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_missing_source_aborts() {
        let storage = MockStorage::with_file("other.json", b"[]");
        let importer = BulkImporter::new(storage, MockStore::default());

        let err = importer
            .import(&ImportRequest::new("questions", "missing.json"))
            .await
            .unwrap_err();
        assert!(err.is_fatal_for_import());
    }

    #[tokio::test]
    async fn test_reimport_converges_to_same_state() {
        let data = br#"[{"id":1,"q":"A"},{"id":"1","q":"A2"},{"id":2,"q":"B"}]"#;
        let store = MockStore::default();
        let importer = BulkImporter::new(MockStorage::with_file("q.json", data), store.clone());
        let request = ImportRequest::new("questions", "q.json");

        importer.import(&request).await.unwrap();
        let first = store.snapshot();
        importer.import(&request).await.unwrap();
        let second = store.snapshot();

        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
        // numeric 1 and string "1" share a key; the later element wins
        assert_eq!(
            second[&("questions".to_string(), "1".to_string())]["q"],
            json!("A2")
        );
    }

    #[tokio::test]
    async fn test_invalid_keys_fail_without_a_write() {
        let data = br#"[{"id":"a/b"},{"id":[1,2]},7,{"id":"ok"}]"#;
        let store = MockStore::default();
        let importer = BulkImporter::new(MockStorage::with_file("k.json", data), store.clone());

        let summary = importer
            .import(&ImportRequest::new("things", "k.json"))
            .await
            .unwrap();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_unencodable_integer_is_failed_before_the_request() {
        use crate::adapters::auth::StaticToken;
        use crate::adapters::firestore::{FirestoreClient, DEFAULT_DATABASE};
        use httpmock::prelude::*;
        use httpmock::Method::PATCH;

        let data = br#"[
            {"id": 1, "count": 18446744073709551616},
            {"id": 18446744073709551617},
            {"id": 2, "count": 5}
        ]"#;

        let server = MockServer::start();
        let docs = "/v1/projects/seed-test/databases/(default)/documents/counters";
        let oversized = server.mock(|when, then| {
            when.method(PATCH).path(format!("{}/1", docs));
            then.status(200).json_body(json!({}));
        });
        let wide_key = server.mock(|when, then| {
            when.method(PATCH)
                .path(format!("{}/18446744073709551617", docs));
            then.status(200).json_body(json!({}));
        });
        let valid = server.mock(|when, then| {
            when.method(PATCH)
                .path(format!("{}/2", docs))
                .json_body(json!({"fields": {
                    "id": {"integerValue": "2"},
                    "count": {"integerValue": "5"}
                }}));
            then.status(200).json_body(json!({}));
        });

        let store = FirestoreClient::new(
            reqwest::Client::new(),
            &server.base_url(),
            "seed-test",
            DEFAULT_DATABASE,
            Box::new(StaticToken::emulator()),
        )
        .unwrap();
        let importer = BulkImporter::new(MockStorage::with_file("counters.json", data), store);

        let summary = importer
            .import(&ImportRequest::new("counters", "counters.json"))
            .await
            .unwrap();

        oversized.assert_hits(0);
        wide_key.assert_hits(0);
        valid.assert_hits(1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);

        let failed_keys: Vec<Option<String>> = summary
            .failures()
            .map(|item| match &item.outcome {
                ItemOutcome::Failed { key, .. } => key.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(
            failed_keys,
            vec![
                Some("1".to_string()),
                Some("18446744073709551617".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_records_empty_array() {
        assert!(parse_records(b"[]", "empty.json").unwrap().is_empty());
        assert!(parse_records(b"  \n[ ]\n", "empty.json").unwrap().is_empty());
    }
}
