//! Error types for AWS API calls

use thiserror::Error;

/// Error code the service returns for a missing object
pub const NOT_FOUND_EXCEPTION: &str = "NotFoundException";

/// Error codes worth retrying
const TRANSIENT_CODES: &[&str] = &[
    "TooManyRequestsException",
    "ThrottlingException",
    "ConflictException",
    "ServiceUnavailableException",
    "InternalFailure",
];

/// A failed API call, classified by the service's machine-readable code
#[derive(Debug, Clone, Error)]
#[error("{code} (HTTP {status}): {message}")]
pub struct ApiError {
    pub status: u16,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        self.code == NOT_FOUND_EXCEPTION
    }

    /// Throttling, conflicting in-flight changes and server-side failures
    pub fn is_transient(&self) -> bool {
        TRANSIENT_CODES.contains(&self.code.as_str()) || self.status == 429 || self.status >= 500
    }
}

/// Errors raised while talking to AWS
#[derive(Debug, Error)]
pub enum AwsError {
    /// The service answered with an error status
    #[error("API request failed: {0}")]
    Api(#[from] ApiError),

    /// The request never got a response
    #[error("failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not have the expected shape
    #[error("failed to parse response JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// No usable credentials
    #[error("credentials error: {0}")]
    Credentials(String),

    /// The request could not be signed
    #[error("signing error: {0}")]
    Signing(String),

    /// Resolving the caller identity failed
    #[error("caller identity lookup failed: {0}")]
    Identity(String),

    /// Invalid client configuration (region, endpoint, account)
    #[error("configuration error: {0}")]
    Config(String),
}

impl AwsError {
    /// The service-side error, if this is one
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.api_error().map(ApiError::is_not_found).unwrap_or(false)
    }

    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api(err) => err.is_transient(),
            Self::Transport(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}
