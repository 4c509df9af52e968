use thiserror::Error;

/// Top-level application error.
///
/// Carries enough structure for the Admin API boundary to map each variant
/// to the taxonomy in spec §7 (`NotFound`, `Conflict`, `Validation`,
/// `Upstream`, `Transient`, `Fatal`) without string matching.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("data source error: {0}")]
    DataSource(#[from] DataSourceError),

    #[error("generator error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("web error: {0}")]
    Web(#[from] WebError),

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Classification used by the Admin API surface to choose an HTTP status.
    /// `Upstream` errors are deliberately excluded from operational fetch
    /// failures (those are logged and swallowed by the Watcher) and only
    /// surface via the datasource test endpoint.
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::NotFound { .. } => ErrorCategory::NotFound,
            AppError::Conflict { .. } => ErrorCategory::Conflict,
            AppError::Validation { .. } => ErrorCategory::Validation,
            AppError::Repository(RepositoryError::RecordNotFound { .. })
            | AppError::Repository(RepositoryError::NotFound { .. }) => ErrorCategory::NotFound,
            AppError::Repository(RepositoryError::ConstraintViolation { .. }) => {
                ErrorCategory::Conflict
            }
            AppError::DataSource(_) => ErrorCategory::Upstream,
            AppError::Database(sea_orm::DbErr::Conn(_)) => ErrorCategory::Transient,
            _ => ErrorCategory::Transient,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Conflict,
    Validation,
    Upstream,
    Transient,
    Fatal,
}

/// Repository layer specific errors.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("constraint violation: {constraint} - {message}")]
    ConstraintViolation { constraint: String, message: String },

    #[error("record not found: {table} with {field} = {value}")]
    RecordNotFound {
        table: String,
        field: String,
        value: String,
    },

    #[error("not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    #[error("migration failed: {version} - {message}")]
    MigrationFailed { version: String, message: String },

    #[error("transaction timed out after {millis}ms")]
    TransactionTimeout { millis: u64 },
}

/// Data source (upstream fetch) specific errors. These never propagate to
/// operators from the Watcher's normal tick — only the `/test` endpoint
/// surfaces them, mapped to HTTP 502.
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("connection timeout: {url}")]
    Timeout { url: String },

    #[error("authentication failed: {source_type} - {message}")]
    AuthenticationFailed {
        source_type: String,
        message: String,
    },

    #[error("invalid configuration: {field} - {message}")]
    InvalidConfig { field: String, message: String },

    #[error("parse error: {source_type} - {message}")]
    ParseError {
        source_type: String,
        message: String,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unknown data source: {name}")]
    UnknownSource { name: String },
}

/// Generator (materialization) specific errors.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_yaml::Error),

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("sandbox error: {0}")]
    Sandbox(#[from] sandboxed_file_manager::SandboxedFileError),
}

/// Web layer specific errors, used only to shape the JSON envelope.
#[derive(Error, Debug)]
pub enum WebError {
    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("internal: {message}")]
    Internal { message: String },
}
