use std::fmt;
use std::future::Future;

use chrono::Duration;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::claims::TokenKind;
use super::errors::JwtError;

/// Signing configuration for [`JwtHandler`].
///
/// Built once at startup and handed to the handler; verification never
/// reads ambient state.
#[derive(Clone)]
pub struct JwtConfig {
    secret: Vec<u8>,
    algorithm: Algorithm,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl JwtConfig {
    /// Create a configuration with HS256, 15 minute access and 7 day refresh lifetimes.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (at least 32 bytes for HS256)
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: Algorithm::HS256,
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(7),
        }
    }

    /// Set the HMAC algorithm (HS256, HS384 or HS512).
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"***")
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish()
    }
}

/// JWT token handler for issuing and validating session tokens.
///
/// Uses a symmetric HMAC algorithm (HS256 by default).
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl JwtHandler {
    /// Create a new JWT handler from a signing configuration.
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(config: JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(&config.secret),
            decoding_key: DecodingKey::from_secret(&config.secret),
            algorithm: config.algorithm,
            access_token_ttl: config.access_token_ttl,
            refresh_token_ttl: config.refresh_token_ttl,
        }
    }

    /// Configured lifetime of a token kind.
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_token_ttl,
            TokenKind::Refresh => self.refresh_token_ttl,
        }
    }

    /// Issue a signed token of the given kind.
    ///
    /// # Arguments
    /// * `kind` - Access or refresh
    /// * `subject` - User identifier placed in `sub`
    /// * `username` - Optional display username
    /// * `scopes` - Authorization scopes (may be empty)
    ///
    /// # Returns
    /// Encoded JWT with a fresh `jti`
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(
        &self,
        kind: TokenKind,
        subject: &str,
        username: Option<&str>,
        scopes: &[String],
    ) -> Result<String, JwtError> {
        let mut claims = Claims::new(kind, subject, self.ttl(kind)).with_scopes(scopes.to_vec());
        if let Some(username) = username {
            claims = claims.with_username(username);
        }

        self.encode(&claims)
    }

    /// Encode claims into a JWT token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode a token, checking signature and expiry.
    ///
    /// Not meant for security decisions on its own: use [`JwtHandler::verify`],
    /// which also checks the token kind and revocation.
    ///
    /// # Errors
    /// * `InvalidToken` - Bad signature, expired, or malformed
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        self.decode_with(token, self.validation())
    }

    /// Full token validation.
    ///
    /// # Arguments
    /// * `token` - JWT token string
    /// * `expected` - Kind the caller requires
    /// * `is_revoked` - Resolves to true when the given jti has been revoked
    ///
    /// # Returns
    /// Decoded claims
    ///
    /// # Errors
    /// * `InvalidToken` - Decoding failed, wrong kind, or revoked
    pub async fn verify<F, Fut>(
        &self,
        token: &str,
        expected: TokenKind,
        is_revoked: F,
    ) -> Result<Claims, JwtError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = bool>,
    {
        let claims = self.decode(token)?;

        if claims.kind != expected {
            tracing::debug!(
                expected = %expected,
                actual = %claims.kind,
                "Token kind mismatch"
            );
            return Err(JwtError::InvalidToken);
        }

        if is_revoked(claims.jti.clone()).await {
            tracing::debug!(jti = %claims.jti, "Token has been revoked");
            return Err(JwtError::InvalidToken);
        }

        Ok(claims)
    }

    /// Extract the `jti` of a correctly signed token, even if it has expired.
    ///
    /// The signature is still verified so forged tokens cannot name
    /// arbitrary identifiers.
    pub fn extract_jti_unverified(&self, token: &str) -> Option<String> {
        let mut validation = self.validation();
        validation.validate_exp = false;

        self.decode_with(token, validation)
            .ok()
            .map(|claims| claims.jti)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }

    fn decode_with(&self, token: &str, validation: Validation) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(reason = ?e.kind(), "Token rejected");
                JwtError::InvalidToken
            })
    }
}
