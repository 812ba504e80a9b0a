//! Failure taxonomy.

use bytes::Bytes;
use std::error::Error as StdError;
use std::sync::Arc;

/// Shared, type-erased error produced by a collaborator.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// The request body could not be serialized.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct EncodingError(#[source] SharedError);

impl EncodingError {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// The encoder's own error.
    pub fn underlying(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }
}

impl From<serde_json::Error> for EncodingError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(e)
    }
}

/// The transport layer failed before a response was obtained.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(#[source] SharedError);

impl TransportError {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// The transport's native error.
    pub fn underlying(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self::new(e)
    }
}

/// Why an HTTP call did not succeed.
///
/// `Encoding` and `Transport` wrap collaborator errors whose shape is
/// unknown, so equality only checks the variant for those two.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpFailure {
    #[error("response could not be interpreted as HTTP")]
    InvalidResponse,

    #[error("server returned status {status_code}")]
    Server { status_code: u16, data: Bytes },

    #[error("failed to encode request body: {0}")]
    Encoding(#[source] EncodingError),

    #[error("transport failed: {0}")]
    Transport(#[source] TransportError),
}

impl PartialEq for HttpFailure {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HttpFailure::InvalidResponse, HttpFailure::InvalidResponse) => true,
            (
                HttpFailure::Server { status_code: a, data: a_data },
                HttpFailure::Server { status_code: b, data: b_data },
            ) => a == b && a_data == b_data,
            (HttpFailure::Encoding(_), HttpFailure::Encoding(_)) => true,
            (HttpFailure::Transport(_), HttpFailure::Transport(_)) => true,
            _ => false,
        }
    }
}

impl From<EncodingError> for HttpFailure {
    fn from(e: EncodingError) -> Self {
        HttpFailure::Encoding(e)
    }
}

impl From<TransportError> for HttpFailure {
    fn from(e: TransportError) -> Self {
        HttpFailure::Transport(e)
    }
}

impl From<reqwest::Error> for HttpFailure {
    fn from(e: reqwest::Error) -> Self {
        HttpFailure::Transport(e.into())
    }
}

/// Errors raised while constructing a [`RestClient`](crate::RestClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("invalid base url {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
