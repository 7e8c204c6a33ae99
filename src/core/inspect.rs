use crate::core::DocumentStore;
use crate::domain::model::StoredDocument;
use crate::utils::error::Result;
use crate::utils::validation::validate_range;

/// Page size used when walking a whole collection.
const COUNT_PAGE_SIZE: usize = 300;
pub const MAX_SAMPLE_SIZE: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionCount {
    pub collection: String,
    pub total: usize,
    pub ids: Vec<String>,
}

impl CollectionCount {
    /// The first `limit` all-digit ids, in ascending numeric order.
    pub fn numeric_preview(&self, limit: usize) -> Vec<u64> {
        let mut numeric: Vec<u64> = self
            .ids
            .iter()
            .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
            .filter_map(|id| id.parse().ok())
            .collect();
        numeric.sort_unstable();
        numeric.truncate(limit);
        numeric
    }
}

/// Read-only views of a collection, used to check what an import produced.
pub struct CollectionInspector<'a, D: DocumentStore> {
    store: &'a D,
}

impl<'a, D: DocumentStore> CollectionInspector<'a, D> {
    pub fn new(store: &'a D) -> Self {
        Self { store }
    }

    pub async fn count(&self, collection: &str) -> Result<CollectionCount> {
        let mut count = CollectionCount {
            collection: collection.to_string(),
            ..Default::default()
        };
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .store
                .list_documents(collection, COUNT_PAGE_SIZE, page_token.as_deref())
                .await?;
            count.ids.extend(page.documents.into_iter().map(|doc| doc.id));
            tracing::debug!("Counted {} documents so far in '{}'", count.ids.len(), collection);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        count.total = count.ids.len();
        Ok(count)
    }

    pub async fn sample(&self, collection: &str, limit: usize) -> Result<Vec<StoredDocument>> {
        validate_range("limit", limit, 1, MAX_SAMPLE_SIZE)?;
        let page = self.store.list_documents(collection, limit, None).await?;
        let mut documents = page.documents;
        documents.truncate(limit);
        Ok(documents)
    }
}
