use thiserror::Error;

use crate::user::errors::PasswordPolicyError;
use crate::user::errors::UserError;

/// Message returned for every token validation failure.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Could not validate credentials";

/// Error for token cache backend failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenCacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache value serialization failed: {0}")]
    Serialization(String),
}

/// Top-level error for authentication operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Internal(String),
}

impl AuthError {
    /// Uniform failure for any rejected token.
    pub fn invalid_token() -> Self {
        AuthError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.to_string())
    }

    pub fn invalid_credentials() -> Self {
        AuthError::Unauthorized("Incorrect username/email or password".to_string())
    }

    pub fn inactive_user() -> Self {
        AuthError::Forbidden("Inactive user".to_string())
    }
}

impl From<UserError> for AuthError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidUserId(_)
            | UserError::InvalidUsername(_)
            | UserError::InvalidEmail(_)
            | UserError::InvalidRole(_) => AuthError::Validation(err.to_string()),
            UserError::UsernameAlreadyExists(_) => {
                AuthError::Conflict("Username already taken".to_string())
            }
            UserError::EmailAlreadyExists(_) => {
                AuthError::Conflict("Email already registered".to_string())
            }
            UserError::NotFound(_) => AuthError::invalid_token(),
            UserError::DatabaseError(_) => {
                AuthError::Internal(err.to_string())
            }
        }
    }
}

impl From<PasswordPolicyError> for AuthError {
    fn from(err: PasswordPolicyError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<TokenCacheError> for AuthError {
    fn from(err: TokenCacheError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
