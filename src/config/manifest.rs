use crate::core::importer::ImportRequest;
use crate::domain::model::DEFAULT_ID_FIELD;
use crate::utils::error::{Result, SeedError};
use crate::utils::validation::{
    validate_collection_name, validate_non_empty_string, validate_path, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A seed manifest: optional store overrides plus the imports to run, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedManifest {
    #[serde(default)]
    pub store: StoreOverrides,
    #[serde(default)]
    pub imports: Vec<ImportEntry>,
    /// Directory relative source and credential paths are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Store settings that take precedence over the command line when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreOverrides {
    pub project_id: Option<String>,
    pub credentials: Option<String>,
    pub database: Option<String>,
    pub emulator_host: Option<String>,
    pub api_root: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportEntry {
    pub collection: String,
    pub file: String,
    pub id_field: Option<String>,
    pub enabled: Option<bool>,
}

impl ImportEntry {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

impl SeedManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| SeedError::ConfigError {
            message: format!("cannot read manifest {}: {}", path.as_ref().display(), e),
        })?;
        let mut manifest = Self::from_toml_str(&content)?;
        manifest.base_dir = path.as_ref().parent().map(Path::to_path_buf);

        let credentials = manifest.store.credentials.take();
        manifest.store.credentials = credentials.map(|file| manifest.resolve(&file));
        Ok(manifest)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SeedError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SeedError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn resolve(&self, file: &str) -> String {
        match &self.base_dir {
            Some(dir) if Path::new(file).is_relative() && !dir.as_os_str().is_empty() => {
                dir.join(file).display().to_string()
            }
            _ => file.to_string(),
        }
    }

    /// Enabled entries as import requests, source paths resolved.
    pub fn import_requests(&self) -> Vec<ImportRequest> {
        self.imports
            .iter()
            .filter(|entry| entry.is_enabled())
            .map(|entry| {
                ImportRequest::new(entry.collection.clone(), self.resolve(&entry.file))
                    .with_id_field(
                        entry
                            .id_field
                            .clone()
                            .unwrap_or_else(|| DEFAULT_ID_FIELD.to_string()),
                    )
            })
            .collect()
    }
}

impl Validate for SeedManifest {
    fn validate(&self) -> Result<()> {
        if self.imports.is_empty() {
            return Err(SeedError::MissingConfigError {
                field: "imports".to_string(),
            });
        }

        for (i, entry) in self.imports.iter().enumerate() {
            validate_collection_name(&format!("imports[{}].collection", i), &entry.collection)?;
            validate_path(&format!("imports[{}].file", i), &entry.file)?;
            if let Some(id_field) = &entry.id_field {
                validate_non_empty_string(&format!("imports[{}].id_field", i), id_field)?;
            }
        }

        if let Some(api_root) = &self.store.api_root {
            validate_url("store.api_root", api_root)?;
        }
        if let Some(credentials) = &self.store.credentials {
            validate_path("store.credentials", credentials)?;
        }

        Ok(())
    }
}
