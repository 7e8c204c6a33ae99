pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::firestore::FirestoreClient;
pub use config::{cli::LocalStorage, manifest::SeedManifest, store::StoreSettings};
pub use core::{
    importer::{BulkImporter, ImportRequest},
    inspect::CollectionInspector,
    seed::SeedRunner,
};
pub use domain::model::ImportSummary;
pub use utils::error::{Result, SeedError};
