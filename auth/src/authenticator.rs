use std::future::Future;

use crate::jwt::Claims;
use crate::jwt::JwtConfig;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::TokenKind;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and JWT generation.
///
/// Provides high-level authentication operations by coordinating
/// password hashing and session token handling.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
}

/// Identity a token pair is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: String,
    pub username: String,
    pub scopes: Vec<String>,
}

/// Access and refresh token issued together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always "bearer"
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `config` - Token signing configuration
    ///
    /// # Returns
    /// Configured Authenticator instance
    pub fn new(config: JwtConfig) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            jwt_handler: JwtHandler::new(config),
        }
    }

    /// Underlying token handler.
    pub fn jwt(&self) -> &JwtHandler {
        &self.jwt_handler
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Whether a stored hash should be upgraded after a successful login.
    pub fn needs_rehash(&self, stored_hash: &str) -> bool {
        self.password_hasher.needs_rehash(stored_hash)
    }

    /// Verify a password against the stored hash.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Password verification failed
    pub fn verify_credentials(
        &self,
        password: &str,
        stored_hash: &str,
    ) -> Result<(), AuthenticationError> {
        if self.password_hasher.verify(password, stored_hash)? {
            Ok(())
        } else {
            Err(AuthenticationError::InvalidCredentials)
        }
    }

    /// Issue an access and refresh token for an already authenticated subject.
    ///
    /// # Errors
    /// * `JwtError` - Token generation failed
    pub fn issue_token_pair(&self, subject: &TokenSubject) -> Result<TokenPair, JwtError> {
        let access_token = self.jwt_handler.issue(
            TokenKind::Access,
            &subject.user_id,
            Some(&subject.username),
            &subject.scopes,
        )?;
        let refresh_token = self.jwt_handler.issue(
            TokenKind::Refresh,
            &subject.user_id,
            Some(&subject.username),
            &subject.scopes,
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in: self.jwt_handler.ttl(TokenKind::Access).num_seconds(),
        })
    }

    /// Validate a token of the expected kind, consulting the revocation check.
    ///
    /// # Errors
    /// * `InvalidToken` - Token validation failed
    pub async fn validate_token<F, Fut>(
        &self,
        token: &str,
        expected: TokenKind,
        is_revoked: F,
    ) -> Result<Claims, JwtError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = bool>,
    {
        self.jwt_handler.verify(token, expected, is_revoked).await
    }
}
