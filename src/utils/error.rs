use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Cannot read source file {path}: {source}")]
    SourceReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse source file {path} as JSON: {source}")]
    SourceParseError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Source file {path} must contain a JSON array at the top level, found {found}")]
    SourceShapeError { path: String, found: &'static str },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Store request failed with status {status}: {message}")]
    StoreRequestError { status: u16, message: String },

    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("Invalid credentials file {path}: {message}")]
    CredentialsError { path: String, message: String },

    #[error("Token signing failed: {0}")]
    TokenSigningError(#[from] jsonwebtoken::errors::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cannot encode field '{field}': {message}")]
    EncodingError { field: String, message: String },

    #[error("Invalid document key '{key}': {reason}")]
    InvalidDocumentKey { key: String, reason: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

pub type Result<T> = std::result::Result<T, SeedError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Config,
    Auth,
    Store,
    Network,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SeedError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SeedError::SourceReadError { .. }
            | SeedError::SourceParseError { .. }
            | SeedError::SourceShapeError { .. }
            | SeedError::EncodingError { .. }
            | SeedError::InvalidDocumentKey { .. } => ErrorCategory::Input,
            SeedError::ConfigError { .. }
            | SeedError::ConfigValidationError { .. }
            | SeedError::InvalidConfigValueError { .. }
            | SeedError::MissingConfigError { .. } => ErrorCategory::Config,
            SeedError::AuthError { .. }
            | SeedError::CredentialsError { .. }
            | SeedError::TokenSigningError(_) => ErrorCategory::Auth,
            SeedError::StoreRequestError { .. } => ErrorCategory::Store,
            SeedError::HttpError(_) => ErrorCategory::Network,
            SeedError::SerializationError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SeedError::EncodingError { .. } | SeedError::InvalidDocumentKey { .. } => {
                ErrorSeverity::Low
            }
            SeedError::HttpError(_) => ErrorSeverity::Medium,
            SeedError::StoreRequestError { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            SeedError::SerializationError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// Errors that abort a whole import rather than a single item.
    pub fn is_fatal_for_import(&self) -> bool {
        matches!(
            self,
            SeedError::SourceReadError { .. }
                | SeedError::SourceParseError { .. }
                | SeedError::SourceShapeError { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SeedError::SourceReadError { path, .. } => {
                format!("Check that {} exists and is readable", path)
            }
            SeedError::SourceParseError { .. } => {
                "Validate the file with a JSON linter; it must be UTF-8 encoded".to_string()
            }
            SeedError::SourceShapeError { .. } => {
                "Wrap the records in a top-level array: [ {...}, {...} ]".to_string()
            }
            SeedError::StoreRequestError { status: 401, .. }
            | SeedError::StoreRequestError { status: 403, .. } => {
                "Check that the service account has Firestore write access".to_string()
            }
            SeedError::StoreRequestError { status: 404, .. } => {
                "Check the project id and database name".to_string()
            }
            SeedError::StoreRequestError { .. } | SeedError::HttpError(_) => {
                "Re-run the import; writes are upserts so a re-run is safe".to_string()
            }
            SeedError::AuthError { .. } | SeedError::TokenSigningError(_) => {
                "Regenerate the service account key and try again".to_string()
            }
            SeedError::CredentialsError { .. } => {
                "Point --credentials at a service account JSON key file".to_string()
            }
            SeedError::MissingConfigError { field } => {
                format!("Provide a value for {}", field)
            }
            SeedError::ConfigError { .. }
            | SeedError::ConfigValidationError { .. }
            | SeedError::InvalidConfigValueError { .. } => {
                "Fix the configuration and run again".to_string()
            }
            SeedError::EncodingError { .. } | SeedError::InvalidDocumentKey { .. } => {
                "Fix the offending record in the source file".to_string()
            }
            SeedError::SerializationError(_) => {
                "Run again with --verbose and inspect the log".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Input problem: {}", self),
            ErrorCategory::Config => format!("Configuration problem: {}", self),
            ErrorCategory::Auth => format!("Could not authenticate: {}", self),
            ErrorCategory::Store => format!("The document store rejected the request: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Internal => format!("Unexpected error: {}", self),
        }
    }
}
