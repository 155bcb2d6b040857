//! Authentication utilities library
//!
//! Provides reusable authentication infrastructure:
//! - Password hashing (Argon2id) with rehash detection
//! - Access/refresh JWT issuance and validation with revocation hooks
//! - Authentication coordination
//!
//! Services define their own authentication ports and adapt these implementations.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! assert!(!hasher.needs_rehash(&hash));
//! ```
//!
//! ## JWT Tokens
//! ```
//! use auth::{JwtConfig, JwtHandler, TokenKind};
//!
//! let handler = JwtHandler::new(JwtConfig::new("secret_key_at_least_32_bytes_long!"));
//! let token = handler.issue(TokenKind::Access, "user123", Some("alice"), &[]).unwrap();
//! let claims = handler.decode(&token).unwrap();
//! assert_eq!(claims.kind, TokenKind::Access);
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, JwtConfig, TokenSubject};
//!
//! let auth = Authenticator::new(JwtConfig::new("secret_key_at_least_32_bytes_long!"));
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue a token pair
//! auth.verify_credentials("password123", &hash).unwrap();
//! let subject = TokenSubject {
//!     user_id: "user123".to_string(),
//!     username: "alice".to_string(),
//!     scopes: vec!["user".to_string()],
//! };
//! let pair = auth.issue_token_pair(&subject).unwrap();
//! println!("Access token: {}", pair.access_token);
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use authenticator::TokenPair;
pub use authenticator::TokenSubject;
pub use jwt::Claims;
pub use jwt::JwtConfig;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenKind;
pub use password::PasswordError;
pub use password::PasswordHasher;
