use chrono::Duration;
use serde::Deserialize;
use serde::Serialize;

pub use auth::Claims;
pub use auth::TokenKind;
pub use auth::TokenPair;

/// Extra lifetime kept on a revocation marker past the token's own TTL.
pub const REVOCATION_BUFFER_MINUTES: i64 = 60;

/// Value stored under a revocation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationMarker {
    pub revoked: bool,
}

impl RevocationMarker {
    pub fn revoked() -> Self {
        Self { revoked: true }
    }
}

/// Cache key of the revocation marker for a token id.
pub fn revocation_key(jti: &str) -> String {
    format!("blacklist:{}", jti)
}

/// How long a revocation marker is kept for a token with `remaining` lifetime left.
pub fn revocation_ttl(remaining: Duration) -> Duration {
    remaining + Duration::minutes(REVOCATION_BUFFER_MINUTES)
}
