use crate::domain::model::{DocumentKey, DocumentPage};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Where import sources are read from.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// A document-oriented store addressed by `(collection, key)`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Replaces the whole document, creating it when absent.
    async fn set_document(
        &self,
        collection: &str,
        key: &DocumentKey,
        content: &Map<String, Value>,
    ) -> Result<()>;

    async fn list_documents(
        &self,
        collection: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<DocumentPage>;
}
