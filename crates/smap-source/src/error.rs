use std::path::PathBuf;

use crate::orm::KNOWN_ORMS;

/// Failure while selecting an access strategy or fetching model rows.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// ORM name not recognized by [`crate::Orm::from_name`].
    #[error("Unknown ORM \"{name}\": expected one of {}", KNOWN_ORMS.join(", "))]
    UnknownOrm { name: String },
    /// The model does not answer the query the selected ORM issues.
    #[error("Model \"{model}\" does not support {query}")]
    Unsupported { model: String, query: &'static str },
    /// A row could not be built from the underlying data.
    #[error("Invalid data in model \"{model}\": {message}")]
    InvalidData { model: String, message: String },
    /// Reading a model file failed.
    #[error("Failed to read model file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A model file is not valid JSON.
    #[error("Failed to parse model file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Error raised by a user-supplied extractor or fetcher.
    #[error("Fetching \"{model}\" failed: {source}")]
    Backend {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SourceError {
    /// Create an error for a query `model` does not answer.
    #[must_use]
    pub fn unsupported(model: impl Into<String>, query: &'static str) -> Self {
        Self::Unsupported {
            model: model.into(),
            query,
        }
    }

    /// Create an invalid-data error.
    #[must_use]
    pub fn invalid_data(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidData {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Wrap an error raised by user code.
    #[must_use]
    pub fn backend(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            model: model.into(),
            source: Box::new(source),
        }
    }

    /// True for configuration mistakes rather than data access failures.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::UnknownOrm { .. } | Self::Unsupported { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_orm_lists_known_names() {
        let err = SourceError::UnknownOrm {
            name: "pony".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown ORM \"pony\": expected one of django, peewee, sqlalchemy, local"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_backend_keeps_source() {
        let io = std::io::Error::other("connection refused");
        let err = SourceError::backend("Post", io);
        assert!(!err.is_validation());
        assert!(err.to_string().contains("connection refused"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
