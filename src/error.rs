//! Error types for the Folge provider.

use std::time::Duration;

use thiserror::Error;

use crate::check::CheckCodecError;

/// Errors that can occur while serving a provider operation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An internal defect; never caused by user input.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A gRPC transport error occurred.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The Folge API rejected or failed a request.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A check returned by the API could not be decoded.
    #[error("Check error: {0}")]
    Check(#[from] CheckCodecError),

    /// Operation not implemented.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// Invalid request from the host.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Get the error message as a string.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Internal(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::Unimplemented(msg)
            | Self::InvalidRequest(msg) => msg.clone(),
            Self::Serialization(err) => err.to_string(),
            Self::Transport(err) => err.to_string(),
            Self::Api(err) => err.to_string(),
            Self::Check(err) => err.to_string(),
        }
    }

    /// Wrap a check codec error raised while handling one resource instance.
    ///
    /// Marshal failures are internal defects and are reported as such.
    pub fn from_check(resource_type: &str, id: Option<i64>, err: CheckCodecError) -> Self {
        let target = match id {
            Some(id) => format!("{} {}", resource_type, id),
            None => resource_type.to_string(),
        };
        match err {
            CheckCodecError::Marshal(source) => {
                Self::Internal(format!("building {} request: {}", target, source))
            }
            other => Self::Validation(format!("decoding {}: {}", target, other)),
        }
    }
}

impl From<ProviderError> for tonic::Status {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(msg) => tonic::Status::not_found(msg),
            ProviderError::Validation(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Configuration(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::UnknownResource(msg) => tonic::Status::not_found(msg),
            ProviderError::Internal(msg) => tonic::Status::internal(msg),
            ProviderError::Serialization(err) => {
                tonic::Status::invalid_argument(format!("Serialization error: {}", err))
            }
            ProviderError::Transport(err) => {
                tonic::Status::unavailable(format!("Transport error: {}", err))
            }
            ProviderError::Api(err) => match err {
                ApiError::NotFound(msg) => tonic::Status::not_found(msg),
                ApiError::Unauthorized => tonic::Status::permission_denied(err.to_string()),
                ApiError::Network(_) => tonic::Status::unavailable(err.to_string()),
                _ => tonic::Status::unknown(err.to_string()),
            },
            ProviderError::Check(err) => match err {
                CheckCodecError::Marshal(_) => tonic::Status::internal(err.to_string()),
                _ => tonic::Status::invalid_argument(err.to_string()),
            },
            ProviderError::Unimplemented(msg) => tonic::Status::unimplemented(msg),
            ProviderError::InvalidRequest(msg) => tonic::Status::invalid_argument(msg),
        }
    }
}

/// Errors raised by the API client and its transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API rejected the client credentials.
    #[error("Authentication failed. Check client_id and client_secret.")]
    Unauthorized,

    /// The API returned 404 for the object.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The API answered with a status the operation does not expect.
    #[error("unexpected status code {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be parsed.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The server asked us to slow down and retries ran out.
    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    /// The request/response recorder failed.
    #[error("Recorder error: {0}")]
    Recorder(String),
}

impl ApiError {
    /// Whether the request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network(format!("Failed to connect to API: {}", err))
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
