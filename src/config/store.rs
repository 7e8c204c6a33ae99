use crate::adapters::auth::{ServiceAccountKey, ServiceAccountTokenProvider, StaticToken, TokenProvider};
use crate::adapters::firestore::{FirestoreClient, DEFAULT_API_ROOT, DEFAULT_DATABASE};
use crate::config::manifest::StoreOverrides;
use crate::utils::error::{Result, SeedError};
use crate::utils::validation::{validate_non_empty_string, validate_path, validate_range, validate_url, Validate};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_CREDENTIALS_PATH: &str = "serviceAccount.json";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Everything needed to open one connection to the document store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    pub credentials: String,
    pub project_id: Option<String>,
    pub database: String,
    pub emulator_host: Option<String>,
    pub api_root: String,
    pub timeout_seconds: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            credentials: DEFAULT_CREDENTIALS_PATH.to_string(),
            project_id: None,
            database: DEFAULT_DATABASE.to_string(),
            emulator_host: None,
            api_root: DEFAULT_API_ROOT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl StoreSettings {
    /// Applies the values a seed manifest sets explicitly.
    pub fn with_overrides(mut self, overrides: &StoreOverrides) -> Self {
        if let Some(credentials) = &overrides.credentials {
            self.credentials = credentials.clone();
        }
        if let Some(project_id) = &overrides.project_id {
            self.project_id = Some(project_id.clone());
        }
        if let Some(database) = &overrides.database {
            self.database = database.clone();
        }
        if let Some(host) = &overrides.emulator_host {
            self.emulator_host = Some(host.clone());
        }
        if let Some(api_root) = &overrides.api_root {
            self.api_root = api_root.clone();
        }
        self
    }

    pub fn http_client(&self) -> Result<Client> {
        Ok(Client::builder()
            .timeout(Duration::from_secs(self.timeout_seconds))
            .build()?)
    }

    /// Builds the store client once, before any import runs.
    ///
    /// With an emulator host no credential file is read; otherwise the
    /// service-account key supplies both the token and, unless overridden,
    /// the project id.
    pub fn connect(&self) -> Result<FirestoreClient> {
        let client = self.http_client()?;

        let (api_root, project_id, tokens): (String, String, Box<dyn TokenProvider>) =
            match &self.emulator_host {
                Some(host) => {
                    let project_id =
                        self.project_id
                            .clone()
                            .ok_or_else(|| SeedError::MissingConfigError {
                                field: "project_id (required with an emulator host)".to_string(),
                            })?;
                    tracing::info!("Using Firestore emulator at {}", host);
                    (
                        format!("http://{}", host),
                        project_id,
                        Box::new(StaticToken::emulator()) as Box<dyn TokenProvider>,
                    )
                }
                None => {
                    let key = ServiceAccountKey::from_file(&self.credentials)?;
                    let project_id = self
                        .project_id
                        .clone()
                        .unwrap_or_else(|| key.project_id.clone());
                    tracing::info!(
                        "Authenticating as {} for project {}",
                        key.client_email,
                        project_id
                    );
                    (
                        self.api_root.clone(),
                        project_id,
                        Box::new(ServiceAccountTokenProvider::new(key, client.clone()))
                            as Box<dyn TokenProvider>,
                    )
                }
            };

        FirestoreClient::new(client, &api_root, &project_id, &self.database, tokens)
    }
}

impl Validate for StoreSettings {
    fn validate(&self) -> Result<()> {
        validate_url("api_root", &self.api_root)?;
        validate_non_empty_string("database", &self.database)?;
        validate_range("timeout_seconds", self.timeout_seconds, 1, 600)?;

        match &self.emulator_host {
            Some(host) => validate_non_empty_string("emulator_host", host)?,
            None => validate_path("credentials", &self.credentials)?,
        }
        if let Some(project_id) = &self.project_id {
            validate_non_empty_string("project_id", project_id)?;
        }
        Ok(())
    }
}
