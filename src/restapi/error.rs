//! REST API handler error types.

use std::time::Duration;

use thiserror::Error;

use crate::aws::AwsError;

/// Errors surfaced to the host engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A remote call failed.
    #[error(transparent)]
    Aws(#[from] AwsError),

    /// The initial create call failed; nothing exists remotely.
    #[error("error creating API Gateway: {0}")]
    Create(#[source] AwsError),

    /// Importing the definition document failed. The REST API itself exists.
    #[error("error {action} API Gateway specification for {rest_api_id}: {source}")]
    Specification {
        action: &'static str,
        rest_api_id: String,
        #[source]
        source: AwsError,
    },

    /// Root discovery or the read-back failed after the REST API was created.
    #[error("API Gateway {rest_api_id} was created but could not be read back: {source}")]
    IncompleteCreate {
        rest_api_id: String,
        #[source]
        source: Box<Error>,
    },

    /// A field failed its constraint check; no remote call was made.
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// The service returned a policy that cannot be unescaped.
    #[error("error unescaping policy: {0}")]
    PolicyUnescape(String),

    /// Delete kept failing with transient errors until the deadline.
    #[error("timeout after {elapsed:?} deleting API Gateway {rest_api_id}: {source}")]
    DeleteTimeout {
        rest_api_id: String,
        elapsed: Duration,
        #[source]
        source: AwsError,
    },

    /// The state carries no REST API identifier.
    #[error("state has no REST API id")]
    MissingId,

    /// The service answered successfully with something unusable.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A request body could not be encoded.
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Error {
    /// Whether the underlying remote error is `NotFoundException`.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Aws(err) | Self::Create(err) => err.is_not_found(),
            Self::Specification { source, .. } | Self::DeleteTimeout { source, .. } => {
                source.is_not_found()
            },
            Self::IncompleteCreate { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Identifier of a REST API that exists despite the error (partial create).
    pub fn partial_rest_api_id(&self) -> Option<&str> {
        match self {
            Self::Specification { rest_api_id, .. } | Self::IncompleteCreate { rest_api_id, .. } => {
                Some(rest_api_id)
            },
            _ => None,
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Result alias for handler operations.
pub type Result<T> = std::result::Result<T, Error>;
