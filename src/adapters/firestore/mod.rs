pub mod value;

use crate::adapters::auth::TokenProvider;
use crate::domain::model::{DocumentKey, DocumentPage, StoredDocument};
use crate::domain::ports::DocumentStore;
use crate::utils::error::{Result, SeedError};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

pub const DEFAULT_API_ROOT: &str = "https://firestore.googleapis.com";
pub const DEFAULT_DATABASE: &str = "(default)";

#[derive(Debug, Deserialize)]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Firestore REST client, one per process.
pub struct FirestoreClient {
    client: Client,
    documents_root: Url,
    tokens: Box<dyn TokenProvider>,
}

impl FirestoreClient {
    pub fn new(
        client: Client,
        api_root: &str,
        project_id: &str,
        database: &str,
        tokens: Box<dyn TokenProvider>,
    ) -> Result<Self> {
        let mut documents_root = Url::parse(api_root).map_err(|e| {
            SeedError::InvalidConfigValueError {
                field: "api_root".to_string(),
                value: api_root.to_string(),
                reason: e.to_string(),
            }
        })?;

        documents_root
            .path_segments_mut()
            .map_err(|_| SeedError::InvalidConfigValueError {
                field: "api_root".to_string(),
                value: api_root.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(["v1", "projects", project_id, "databases", database, "documents"]);

        Ok(Self {
            client,
            documents_root,
            tokens,
        })
    }

    fn collection_url(&self, collection: &str) -> Url {
        let mut url = self.documents_root.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(collection);
        }
        url
    }

    fn document_url(&self, collection: &str, key: &DocumentKey) -> Url {
        let mut url = self.collection_url(collection);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(key.as_str());
        }
        url
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);

        Err(SeedError::StoreRequestError {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn set_document(
        &self,
        collection: &str,
        key: &DocumentKey,
        content: &Map<String, Value>,
    ) -> Result<()> {
        let body = json!({ "fields": value::encode_fields(content)? });
        let url = self.document_url(collection, key);
        let token = self.tokens.access_token().await?;

        tracing::debug!("PATCH {}", url);
        let response = self
            .client
            .patch(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn list_documents(
        &self,
        collection: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<DocumentPage> {
        let mut url = self.collection_url(collection);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pageSize", &page_size.to_string());
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        let token = self.tokens.access_token().await?;

        tracing::debug!("GET {}", url);
        let response = self.client.get(url).bearer_auth(token).send().await?;
        let listed: ListDocumentsResponse = Self::check(response).await?.json().await?;

        let documents = listed
            .documents
            .into_iter()
            .map(|doc| StoredDocument {
                id: doc
                    .name
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_string(),
                data: value::decode_fields(&doc.fields),
            })
            .collect();

        Ok(DocumentPage {
            documents,
            next_page_token: listed.next_page_token.filter(|t| !t.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::StaticToken;
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;

    fn client_for(server: &MockServer) -> FirestoreClient {
        FirestoreClient::new(
            Client::new(),
            &server.base_url(),
            "seed-test",
            DEFAULT_DATABASE,
            Box::new(StaticToken::new("test-token")),
        )
        .unwrap()
    }

    #[test]
    fn test_document_url_encodes_key() {
        let store = FirestoreClient::new(
            Client::new(),
            DEFAULT_API_ROOT,
            "seed-test",
            DEFAULT_DATABASE,
            Box::new(StaticToken::emulator()),
        )
        .unwrap();

        let url = store.document_url("questions", &DocumentKey::new("a b#1").unwrap());
        assert_eq!(
            url.as_str(),
            "https://firestore.googleapis.com/v1/projects/seed-test/databases/(default)/documents/questions/a%20b%231"
        );
    }

    #[tokio::test]
    async fn test_set_document_patches_whole_document() {
        let server = MockServer::start();
        let patch_mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/v1/projects/seed-test/databases/(default)/documents/questions/7")
                .header("Authorization", "Bearer test-token")
                .json_body(json!({
                    "fields": {
                        "id": {"integerValue": "7"},
                        "q": {"stringValue": "Why us?"}
                    }
                }));
            then.status(200).json_body(json!({
                "name": "projects/seed-test/databases/(default)/documents/questions/7"
            }));
        });

        let store = client_for(&server);
        let content = json!({"id": 7, "q": "Why us?"});
        store
            .set_document(
                "questions",
                &DocumentKey::new("7").unwrap(),
                content.as_object().unwrap(),
            )
            .await
            .unwrap();

        patch_mock.assert();
    }

    #[tokio::test]
    async fn test_set_document_surfaces_store_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(PATCH);
            then.status(403).json_body(json!({
                "error": {
                    "code": 403,
                    "message": "Missing or insufficient permissions.",
                    "status": "PERMISSION_DENIED"
                }
            }));
        });

        let store = client_for(&server);
        let content = json!({"id": 1});
        let err = store
            .set_document(
                "questions",
                &DocumentKey::new("1").unwrap(),
                content.as_object().unwrap(),
            )
            .await
            .unwrap_err();

        match err {
            SeedError::StoreRequestError { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Missing or insufficient permissions.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_documents_decodes_page() {
        let server = MockServer::start();
        let list_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/projects/seed-test/databases/(default)/documents/questions")
                .query_param("pageSize", "2")
                .query_param("pageToken", "abc");
            then.status(200).json_body(json!({
                "documents": [
                    {
                        "name": "projects/seed-test/databases/(default)/documents/questions/1",
                        "fields": {"q": {"stringValue": "A"}},
                        "createTime": "2024-05-01T10:00:00Z",
                        "updateTime": "2024-05-01T10:00:00Z"
                    },
                    {
                        "name": "projects/seed-test/databases/(default)/documents/questions/2",
                        "fields": {"q": {"stringValue": "B"}}
                    }
                ],
                "nextPageToken": "def"
            }));
        });

        let store = client_for(&server);
        let page = store
            .list_documents("questions", 2, Some("abc"))
            .await
            .unwrap();

        list_mock.assert();
        assert_eq!(page.documents.len(), 2);
        assert_eq!(page.documents[0].id, "1");
        assert_eq!(page.documents[1].data["q"], json!("B"));
        assert_eq!(page.next_page_token.as_deref(), Some("def"));
    }

    #[tokio::test]
    async fn test_list_empty_collection() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(200).json_body(json!({}));
        });

        let store = client_for(&server);
        let page = store.list_documents("empty", 100, None).await.unwrap();
        assert!(page.documents.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
