use async_trait::async_trait;
use chrono::Duration;
use serde_json::Value;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::errors::TokenCacheError;
use crate::domain::auth::models::Claims;
use crate::domain::auth::models::TokenPair;
use crate::user::models::CreateUserCommand;
use crate::user::models::User;

/// Port for registration, login and session token operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new account with role `user`, active.
    ///
    /// # Errors
    /// * `Conflict` - Username or email already registered
    /// * `Internal` - Hashing or storage failure
    async fn register(&self, command: CreateUserCommand) -> Result<User, AuthError>;

    /// Verify credentials and issue a fresh token pair.
    ///
    /// # Arguments
    /// * `identifier` - Email address or username
    /// * `password` - Plaintext password
    ///
    /// # Errors
    /// * `Unauthorized` - Unknown identifier or wrong password
    /// * `Forbidden` - Account is inactive
    async fn authenticate(&self, identifier: &str, password: &str)
        -> Result<TokenPair, AuthError>;

    /// Exchange a refresh token for a new pair, revoking the presented one.
    ///
    /// # Errors
    /// * `Unauthorized` - Token invalid, expired, wrong kind or revoked
    /// * `Forbidden` - Owner no longer exists or is inactive
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Revoke a refresh token.
    ///
    /// # Errors
    /// * `Unauthorized` - Token invalid, expired, wrong kind or already revoked
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;

    /// Validate an access token and return its claims.
    ///
    /// # Errors
    /// * `Unauthorized` - Token invalid, expired, wrong kind or revoked
    async fn verify_access_token(&self, access_token: &str) -> Result<Claims, AuthError>;
}

/// Key/value store with per-entry expiry, used for revocation markers.
#[async_trait]
pub trait TokenCache: Send + Sync + 'static {
    /// Insert or replace an entry that expires after `ttl`.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), TokenCacheError>;

    /// Fetch a live entry. Expired entries read as `None`.
    async fn get(&self, key: &str) -> Result<Option<Value>, TokenCacheError>;

    /// Remove a single entry.
    async fn invalidate(&self, key: &str) -> Result<(), TokenCacheError>;

    /// Purge every expired entry, returning how many were removed.
    async fn cleanup_expired(&self) -> Result<u64, TokenCacheError>;
}
