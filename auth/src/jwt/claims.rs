use std::fmt;

use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Discriminator carried in the `type` claim.
///
/// Access tokens authorize requests; refresh tokens only mint new pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session token claims.
///
/// Both token kinds share this shape; only `kind` and the lifetime differ.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (user identifier)
    pub sub: String,

    /// Display username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Authorization scopes (role names)
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Token kind
    #[serde(rename = "type")]
    pub kind: TokenKind,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// JWT ID, the revocation key
    pub jti: String,
}

impl Claims {
    /// Create claims for a subject, issued now and expiring after `lifetime`.
    ///
    /// # Arguments
    /// * `kind` - Access or refresh
    /// * `subject` - Unique user identifier
    /// * `lifetime` - Time until the token expires
    ///
    /// # Returns
    /// Claims with sub, type, iat, exp and a fresh jti set
    pub fn new(kind: TokenKind, subject: impl ToString, lifetime: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + lifetime;

        Self {
            sub: subject.to_string(),
            username: None,
            scopes: Vec::new(),
            kind,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Set username.
    pub fn with_username(mut self, username: impl ToString) -> Self {
        self.username = Some(username.to_string());
        self
    }

    /// Set scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Set issued at (Unix timestamp).
    pub fn with_issued_at(mut self, iat: i64) -> Self {
        self.iat = iat;
        self
    }

    /// Set expiration (Unix timestamp).
    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.exp = exp;
        self
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Check if token is expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }

    /// Lifetime left at `current_timestamp`, never negative.
    pub fn remaining(&self, current_timestamp: i64) -> Duration {
        Duration::seconds((self.exp - current_timestamp).max(0))
    }
}
