use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::TokenSubject;
use chrono::Utc;
use tokio::sync::OnceCell;
use tokio::task;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::errors::TokenCacheError;
use crate::domain::auth::models::revocation_key;
use crate::domain::auth::models::revocation_ttl;
use crate::domain::auth::models::Claims;
use crate::domain::auth::models::RevocationMarker;
use crate::domain::auth::models::TokenKind;
use crate::domain::auth::models::TokenPair;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::auth::ports::TokenCache;
use crate::user::models::CreateUserCommand;
use crate::user::models::Role;
use crate::user::models::User;
use crate::user::models::UserId;
use crate::user::models::Username;
use crate::user::ports::UserRepository;

/// Password verified against when the login identifier matches nobody.
const DECOY_PASSWORD: &str = "decoy-password-never-matches";

/// Domain service for registration, login and token rotation.
///
/// Argon2 work runs on the blocking pool. Refresh tokens are single use:
/// the presented token is revoked before a replacement pair is issued.
pub struct AuthService<UR, TC>
where
    UR: UserRepository,
    TC: TokenCache,
{
    repository: Arc<UR>,
    cache: Arc<TC>,
    authenticator: Arc<Authenticator>,
    decoy_hash: OnceCell<String>,
}

impl<UR, TC> AuthService<UR, TC>
where
    UR: UserRepository,
    TC: TokenCache,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Credential store
    /// * `cache` - Revocation marker store
    /// * `authenticator` - Password hashing and token signing
    pub fn new(repository: Arc<UR>, cache: Arc<TC>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            cache,
            authenticator,
            decoy_hash: OnceCell::new(),
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let authenticator = Arc::clone(&self.authenticator);

        task::spawn_blocking(move || authenticator.hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task failed: {}", e)))?
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
    }

    async fn verify_password(&self, password: String, stored_hash: String) -> Result<(), AuthError> {
        let authenticator = Arc::clone(&self.authenticator);

        let outcome =
            task::spawn_blocking(move || authenticator.verify_credentials(&password, &stored_hash))
                .await
                .map_err(|e| AuthError::Internal(format!("Verification task failed: {}", e)))?;

        match outcome {
            Ok(()) => Ok(()),
            Err(AuthenticationError::InvalidCredentials) => Err(AuthError::invalid_credentials()),
            Err(AuthenticationError::PasswordError(e)) => {
                tracing::error!(error = %e, "Stored password hash is unusable");
                Err(AuthError::Internal(e.to_string()))
            }
        }
    }

    /// Burn the same Argon2 cost as a real verification so unknown
    /// identifiers cannot be told apart by response time.
    async fn verify_against_decoy(&self, password: String) -> Result<(), AuthError> {
        let decoy_hash = self
            .decoy_hash
            .get_or_try_init(|| self.hash_password(DECOY_PASSWORD.to_string()))
            .await?
            .clone();

        match self.verify_password(password, decoy_hash).await {
            Ok(()) | Err(AuthError::Unauthorized(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, AuthError> {
        if let Some(user) = self.repository.find_by_email(identifier).await? {
            return Ok(Some(user));
        }

        match Username::new(identifier.to_string()) {
            Ok(username) => Ok(self.repository.find_by_username(&username).await?),
            Err(_) => Ok(None),
        }
    }

    /// Replace an outdated hash after a successful login. Failures are only logged.
    async fn upgrade_password_hash(&self, mut user: User, password: String) {
        let new_hash = match self.hash_password(password).await {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Password rehash failed");
                return;
            }
        };

        user.password_hash = new_hash;
        user.updated_at = Some(Utc::now());

        match self.repository.update(user).await {
            Ok(updated) => tracing::info!(user_id = %updated.id, "Password hash upgraded"),
            Err(e) => tracing::warn!(error = %e, "Persisting upgraded password hash failed"),
        }
    }

    fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        let subject = TokenSubject {
            user_id: user.id.to_string(),
            username: user.username.as_str().to_string(),
            scopes: user.scopes(),
        };

        self.authenticator.issue_token_pair(&subject).map_err(|e| {
            tracing::error!(error = %e, "Token issuance failed");
            AuthError::Internal(e.to_string())
        })
    }

    /// Revocation lookup handed to the verifier. Cache failures count as revoked.
    async fn is_revoked(&self, jti: String) -> bool {
        match self.cache.get(&revocation_key(&jti)).await {
            Ok(entry) => entry.is_some(),
            Err(e) => {
                tracing::error!(jti = %jti, error = %e, "Revocation lookup failed, rejecting token");
                true
            }
        }
    }

    async fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        self.authenticator
            .validate_token(token, expected, |jti| self.is_revoked(jti))
            .await
            .map_err(|_| AuthError::invalid_token())
    }

    /// Store a revocation marker for verified claims, kept for the token's
    /// remaining lifetime plus the buffer.
    async fn revoke(&self, claims: &Claims) -> Result<(), AuthError> {
        let marker = serde_json::to_value(RevocationMarker::revoked())
            .map_err(|e| TokenCacheError::Serialization(e.to_string()))?;
        let ttl = revocation_ttl(claims.remaining(Utc::now().timestamp()));

        self.cache
            .set(&revocation_key(&claims.jti), marker, ttl)
            .await
            .map_err(|e| {
                tracing::error!(jti = %claims.jti, error = %e, "Writing revocation marker failed");
                AuthError::from(e)
            })?;

        tracing::debug!(jti = %claims.jti, kind = %claims.kind, "Token revoked");
        Ok(())
    }
}

#[async_trait]
impl<UR, TC> AuthServicePort for AuthService<UR, TC>
where
    UR: UserRepository,
    TC: TokenCache,
{
    async fn register(&self, command: CreateUserCommand) -> Result<User, AuthError> {
        if self
            .repository
            .find_by_email(command.email.as_str())
            .await?
            .is_some()
        {
            return Err(AuthError::Conflict("Email already registered".to_string()));
        }

        if self
            .repository
            .find_by_username(&command.username)
            .await?
            .is_some()
        {
            return Err(AuthError::Conflict("Username already taken".to_string()));
        }

        let password_hash = self
            .hash_password(command.password.expose().to_string())
            .await?;

        let user = User {
            id: UserId::new(),
            username: command.username,
            email: command.email,
            password_hash,
            role: Role::User,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        };

        let created_user = self.repository.create(user).await?;

        tracing::info!(
            user_id = %created_user.id,
            username = %created_user.username,
            "User registered"
        );

        Ok(created_user)
    }

    async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<TokenPair, AuthError> {
        let Some(user) = self.find_by_identifier(identifier).await? else {
            self.verify_against_decoy(password.to_string()).await?;
            tracing::debug!("Login rejected: unknown identifier");
            return Err(AuthError::invalid_credentials());
        };

        self.verify_password(password.to_string(), user.password_hash.clone())
            .await?;

        if !user.is_active {
            tracing::debug!(user_id = %user.id, "Login rejected: inactive user");
            return Err(AuthError::inactive_user());
        }

        let pair = self.issue_pair(&user)?;

        if self.authenticator.needs_rehash(&user.password_hash) {
            self.upgrade_password_hash(user.clone(), password.to_string())
                .await;
        }

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.verify(refresh_token, TokenKind::Refresh).await?;

        let user_id = UserId::from_string(&claims.sub).map_err(|_| AuthError::invalid_token())?;

        let user = match self.repository.find_by_id(&user_id).await? {
            Some(user) if user.is_active => user,
            _ => {
                return Err(AuthError::Forbidden(
                    "User not found or inactive".to_string(),
                ))
            }
        };

        self.revoke(&claims).await?;

        let pair = self.issue_pair(&user)?;

        tracing::debug!(user_id = %user.id, "Token pair rotated");
        Ok(pair)
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self.verify(refresh_token, TokenKind::Refresh).await?;

        self.revoke(&claims).await?;

        tracing::info!(user_id = %claims.sub, "User logged out");
        Ok(())
    }

    async fn verify_access_token(&self, access_token: &str) -> Result<Claims, AuthError> {
        self.verify(access_token, TokenKind::Access).await
    }
}
