//! Error taxonomy shared by the planning modules.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    /// Negative counts, counts above the actual question count, or
    /// non-positive schedule parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown difficulty/category, or a subject/topic missing from the catalog.
    #[error("invalid catalog entry: {0}")]
    InvalidCatalogEntry(String),

    /// Text-generation or document-extraction collaborator failed.
    #[error("{service} unavailable: {message}")]
    ExternalServiceUnavailable { service: String, message: String },

    #[error("export to {target} failed: {source}")]
    ExportFailure {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PlannerError {
    pub fn unavailable(service: &str, message: impl Into<String>) -> Self {
        PlannerError::ExternalServiceUnavailable {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn export<E>(target: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PlannerError::ExportFailure {
            target: target.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
