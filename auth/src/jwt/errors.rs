use thiserror::Error;

/// Error type for JWT operations.
///
/// Every validation failure maps to `InvalidToken`. The check that rejected
/// the token is only logged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Could not validate credentials")]
    InvalidToken,
}
