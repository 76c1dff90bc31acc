//! Error types for costctl
//!
//! Library code uses `crate::error::Result<T>` which returns `CostctlError`.
//! CLI code uses `anyhow::Result<T>` for top-level error handling; conversion
//! happens at the CLI boundary via `anyhow::Error::from`, preserving chains.
//!
//! Analyzer `execute()` calls only return the fatal cases (base inventory
//! listing failures). Recoverable failures (pricing lookups, per-instance
//! metrics, reserved-capacity listings) are logged at the call site and the
//! affected check or instance is skipped.

use thiserror::Error;

/// Main error type for costctl
#[derive(Error, Debug)]
pub enum CostctlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Inventory error: {resource_type} - {message}")]
    Inventory {
        resource_type: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Pricing error: {0}")]
    Pricing(String),

    #[error("Metrics error: {instance_id} - {message}")]
    Metrics { instance_id: String, message: String },

    #[error("AWS SDK error: {0}")]
    Aws(String),

    #[error("Validation error: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid cloud provider: {0}")]
    InvalidProvider(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CostctlError>;

impl CostctlError {
    /// Build an inventory error from a collaborator failure
    pub fn inventory(
        resource_type: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        CostctlError::Inventory {
            resource_type: resource_type.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}
