use thiserror::Error;

/// Errors that can occur while building, selecting or patching charts
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Unknown palette, template, category, page or dataset
    #[error("{kind} not found: '{name}'")]
    NotFound { kind: &'static str, name: String },

    /// Color scale cannot satisfy the chart kind's color requirement
    #[error("palette '{palette}' has {available} color(s), chart needs at least {required}")]
    PaletteMismatch {
        palette: String,
        required: usize,
        available: usize,
    },

    /// More than one (or no) control fired for a single transition
    #[error("expected exactly one triggering control, got {0}")]
    AmbiguousTrigger(usize),

    /// Parameter name the patch engine has no field mapping for
    #[error("no patch target for parameter '{0}'")]
    UnknownPatchTarget(String),

    /// Parameter value outside its declared domain (or of the wrong type)
    #[error("invalid value for '{name}': {reason}")]
    InvalidParam { name: String, reason: String },

    /// Binding refers to a column the dataset doesn't have
    #[error("dataset has no column '{0}'")]
    MissingColumn(String),

    /// Field path doesn't resolve inside the chart description
    #[error("invalid patch path {0}")]
    InvalidPatchPath(String),

    /// Configuration error (bad embedded JSON, bad override file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Polars error while reading a dataset
    #[error("Dataset error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DashboardError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        DashboardError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid_param(name: impl Into<String>, reason: impl Into<String>) -> Self {
        DashboardError::InvalidParam {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Type alias for Results using DashboardError
pub type Result<T> = std::result::Result<T, DashboardError>;
