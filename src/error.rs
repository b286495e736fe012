//! Custom error types for the analysis pipeline.
//!
//! This module provides the error hierarchy for the whole crate using
//! `thiserror`. Run-fatal errors ([`AnalysisError::Load`] and, under the
//! abort policy, [`AnalysisError::Imputation`]) stop the run before any
//! success-path artifact is written; stage-local errors are recorded on the
//! failing stage and leave independent stages untouched.

use thiserror::Error;

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Input file could not be loaded (missing, unreadable, unparseable, empty).
    #[error("Failed to load '{path}': {reason}")]
    Load { path: String, reason: String },

    /// A numeric column has no non-missing values to average.
    #[error("Column '{column}' has no non-missing values to impute from")]
    Imputation { column: String },

    /// A model stage was invoked on data it cannot accept.
    #[error("Invalid input for {stage}: {reason}")]
    InvalidInput { stage: String, reason: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A chart artifact could not be produced.
    #[error("Failed to produce chart artifact '{artifact}': {reason}")]
    Render { artifact: String, reason: String },

    /// The report document could not be written.
    #[error("Failed to write report: {0}")]
    Report(String),

    /// Narrative provider error.
    #[error("Narrative provider error: {0}")]
    Narrative(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Short stable code for log labels and machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Load { .. } => "LOAD_ERROR",
            Self::Imputation { .. } => "IMPUTATION_ERROR",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Render { .. } => "RENDER_ERROR",
            Self::Report(_) => "REPORT_ERROR",
            Self::Narrative(_) => "NARRATIVE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether this error aborts the whole run rather than a single stage.
    ///
    /// Render/report failures are boundary failures: the run is still
    /// analytically successful and they are only logged.
    pub fn is_run_fatal(&self) -> bool {
        match self {
            Self::Load { .. } | Self::Imputation { .. } | Self::InvalidConfig(_) => true,
            Self::WithContext { source, .. } => source.is_run_fatal(),
            _ => false,
        }
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}
