pub mod cli;
pub mod manifest;
pub mod store;

#[cfg(feature = "cli")]
use crate::adapters::{firestore::DEFAULT_API_ROOT, probe::DEFAULT_RANGE};
#[cfg(feature = "cli")]
use crate::core::inspect::MAX_SAMPLE_SIZE;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{
    validate_collection_name, validate_non_empty_string, validate_path, validate_range,
    validate_url, Validate,
};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "cli")]
use self::store::StoreSettings;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "firestore-seed")]
#[command(about = "Seed and inspect a Firestore database from JSON files")]
pub struct CliConfig {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// Service account key file
    #[arg(
        long,
        global = true,
        env = "GOOGLE_APPLICATION_CREDENTIALS",
        default_value = store::DEFAULT_CREDENTIALS_PATH
    )]
    pub credentials: String,

    /// Defaults to the project of the service account
    #[arg(long, global = true, env = "FIRESTORE_PROJECT_ID")]
    pub project_id: Option<String>,

    #[arg(long, global = true, default_value = crate::adapters::firestore::DEFAULT_DATABASE)]
    pub database: String,

    /// host:port of a local Firestore emulator
    #[arg(long, global = true, env = "FIRESTORE_EMULATOR_HOST")]
    pub emulator_host: Option<String>,

    #[arg(long, global = true, default_value = DEFAULT_API_ROOT)]
    pub api_root: String,

    #[arg(long, global = true, default_value_t = store::DEFAULT_TIMEOUT_SECONDS)]
    pub timeout_seconds: u64,
}

#[cfg(feature = "cli")]
impl From<&StoreArgs> for StoreSettings {
    fn from(args: &StoreArgs) -> Self {
        Self {
            credentials: args.credentials.clone(),
            project_id: args.project_id.clone(),
            database: args.database.clone(),
            emulator_host: args.emulator_host.clone(),
            api_root: args.api_root.clone(),
            timeout_seconds: args.timeout_seconds,
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Import a JSON array file into a collection
    Import {
        #[arg(long)]
        collection: String,
        #[arg(long)]
        file: String,
        /// Field whose value becomes the document id
        #[arg(long, default_value = crate::domain::model::DEFAULT_ID_FIELD)]
        id_field: String,
    },
    /// Run every import listed in a TOML seed manifest
    Seed {
        #[arg(long, default_value = "seed.toml")]
        manifest: String,
    },
    /// Count the documents in a collection
    Count {
        #[arg(long)]
        collection: String,
        /// How many numeric ids to list
        #[arg(long, default_value_t = 10)]
        preview: usize,
    },
    /// Print the first documents of a collection
    Inspect {
        #[arg(long)]
        collection: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Check whether a URL supports HTTP range requests
    Probe {
        #[arg(long)]
        url: String,
        #[arg(long, default_value = DEFAULT_RANGE)]
        range: String,
    },
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings::from(&self.store)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        match &self.command {
            Command::Import {
                collection,
                file,
                id_field,
            } => {
                validate_collection_name("collection", collection)?;
                validate_path("file", file)?;
                validate_non_empty_string("id_field", id_field)?;
            }
            Command::Seed { manifest } => validate_path("manifest", manifest)?,
            Command::Count { collection, .. } => validate_collection_name("collection", collection)?,
            Command::Inspect { collection, limit } => {
                validate_collection_name("collection", collection)?;
                validate_range("limit", *limit, 1, MAX_SAMPLE_SIZE)?;
            }
            Command::Probe { url, range } => {
                validate_url("url", url)?;
                validate_non_empty_string("range", range)?;
                // the probe does not touch the store
                return Ok(());
            }
        }

        // seed manifests may still override the store settings
        if matches!(self.command, Command::Seed { .. }) {
            return Ok(());
        }
        self.store_settings().validate()
    }
}
