use crate::utils::error::{Result, SeedError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Field used as the document key when the caller does not name one.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Longest document id the store accepts, in bytes.
const MAX_KEY_BYTES: usize = 1500;

/// A document id inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Checks the store's id rules: non-empty, no `/`, not `.` or `..`,
    /// not `__name__`, at most 1500 bytes.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let reason = if key.is_empty() {
            "document key cannot be empty".to_string()
        } else if key.contains('/') {
            "document key cannot contain '/'".to_string()
        } else if key == "." || key == ".." {
            "document key cannot be '.' or '..'".to_string()
        } else if key.len() >= 4 && key.starts_with("__") && key.ends_with("__") {
            "document keys of the form __name__ are reserved".to_string()
        } else if key.len() > MAX_KEY_BYTES {
            format!("document key is longer than {} bytes", MAX_KEY_BYTES)
        } else {
            return Ok(Self(key));
        };
        Err(SeedError::InvalidDocumentKey { key, reason })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of looking up the identifier field of one input element.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyDerivation {
    Key(DocumentKey),
    Skip(SkipReason),
    Invalid { raw: String, reason: String },
}

/// Derives the document key from `item[id_field]`.
///
/// Numbers keep their source text, so `42` and `"42"` both become `42` and
/// integers wider than 64 bits stay distinct. Booleans become `True` or
/// `False`, matching ids written by the older seed scripts.
pub fn derive_key(item: &Value, id_field: &str) -> KeyDerivation {
    let Some(object) = item.as_object() else {
        return KeyDerivation::Skip(SkipReason::NotAnObject);
    };

    let raw = match object.get(id_field) {
        None | Some(Value::Null) => return KeyDerivation::Skip(SkipReason::MissingIdentifier),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(other) => {
            return KeyDerivation::Invalid {
                raw: other.to_string(),
                reason: "identifier must be a string, number or boolean".to_string(),
            }
        }
    };

    match DocumentKey::new(raw.clone()) {
        Ok(key) => KeyDerivation::Key(key),
        Err(err) => KeyDerivation::Invalid {
            raw,
            reason: err.to_string(),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingIdentifier,
    NotAnObject,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingIdentifier => f.write_str("identifier field is missing or null"),
            SkipReason::NotAnObject => f.write_str("element is not a JSON object"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Written { key: DocumentKey },
    Skipped { reason: SkipReason },
    Failed { key: Option<String>, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub index: usize,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// Tally of one import run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub collection: String,
    pub source: String,
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub items: Vec<ItemReport>,
}

impl ImportSummary {
    pub fn new(collection: &str, source: &str, total: usize) -> Self {
        Self {
            collection: collection.to_string(),
            source: source.to_string(),
            total,
            items: Vec::with_capacity(total),
            ..Default::default()
        }
    }

    pub fn record(&mut self, index: usize, outcome: ItemOutcome) {
        match &outcome {
            ItemOutcome::Written { .. } => self.succeeded += 1,
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
        }
        self.items.push(ItemReport { index, outcome });
    }

    pub fn written_keys(&self) -> impl Iterator<Item = &DocumentKey> {
        self.items.iter().filter_map(|item| match &item.outcome {
            ItemOutcome::Written { key } => Some(key),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemReport> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Failed { .. }))
    }

    /// True when every input element was written.
    pub fn is_clean(&self) -> bool {
        self.succeeded == self.total
    }
}

/// A document as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument {
    pub id: String,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPage {
    pub documents: Vec<StoredDocument>,
    pub next_page_token: Option<String>,
}
