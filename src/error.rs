//! Error types for the Camunda operator

use thiserror::Error;

/// Main error type for operator operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Credential reference could not be resolved into raw bytes
    #[error("credential resolution error: {0}")]
    Credentials(String),

    /// Credential bytes were resolved but are not well-formed
    #[error("malformed credentials: {0}")]
    MalformedCredentials(String),

    /// OAuth2 token exchange was rejected or could not be reached
    #[error("authentication error: {0}")]
    Auth(String),

    /// Console API call failed (create/update/delete or a non-404 lookup)
    #[error("console API error: {0}")]
    Api(String),

    /// Validation error for CRD specs
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create a credential resolution error with the given message
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials(msg.into())
    }

    /// Create a malformed-credentials error with the given message
    pub fn malformed_credentials(msg: impl Into<String>) -> Self {
        Self::MalformedCredentials(msg.into())
    }

    /// Create an authentication error with the given message
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a console API error with the given message
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}
