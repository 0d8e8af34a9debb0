//! Client error taxonomy.

use crate::transport::TransportError;

/// Errors surfaced to callers of the endpoint.
///
/// Parsing anomalies never show up here; they degrade to empty results.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The transport could not complete the request
    #[error("transport error for {url}: {source}")]
    Transport {
        /// Requested URL
        url: String,
        /// Underlying transport failure
        source: TransportError,
    },
    /// The server answered with a non-success status
    #[error("API error (status {status}) for {url}")]
    ApiError {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },
    /// A URL could not be parsed or joined
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// No collection with this id is listed
    #[error("collection not found: {0}")]
    CollectionNotFound(String),
    /// The collection does not expose the Connected Systems resource model
    #[error("collection does not support Connected Systems: {0}")]
    NotSupported(String),
    /// Every listed collection was tried and none negotiated
    #[error("no Connected Systems collection found after trying {tried} collection(s)")]
    CapabilityNotFound {
        /// Number of collections probed
        tried: usize,
    },
}

impl ClientError {
    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
