//! Error types for the KrmPesan client.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Primary error type for all client operations.
#[derive(Error, Debug)]
pub enum KrmPesanError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{field} not found at {location}")]
    MissingCredential {
        field: &'static str,
        location: String,
    },

    #[error("Token refresh failed: {message}")]
    Refresh {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Token store error at {location}: {source}")]
    Persistence {
        location: String,
        #[source]
        source: BoxError,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upload failed: {message}")]
    Upload {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KrmPesanError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Wrap a failure raised while exchanging the refresh token.
    pub fn refresh_caused_by(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Refresh {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn persistence(location: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Persistence {
            location: location.into(),
            source: source.into(),
        }
    }

    pub fn upload(message: impl Into<String>) -> Self {
        Self::Upload {
            message: message.into(),
            source: None,
        }
    }

    pub fn upload_caused_by(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Upload {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, KrmPesanError>;
