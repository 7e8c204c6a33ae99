pub mod importer;
pub mod inspect;
pub mod seed;

pub use crate::domain::model::{DocumentKey, ImportSummary, ItemOutcome, StoredDocument};
pub use crate::domain::ports::{DocumentStore, Storage};
pub use crate::utils::error::Result;
