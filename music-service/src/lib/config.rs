use std::env;
use std::fmt;
use std::str::FromStr;

use auth::JwtConfig as TokenSigningConfig;
use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use jsonwebtoken::Algorithm;
use serde::Deserialize;

const MIN_SECRET_LENGTH: usize = 32;
const INSECURE_SECRETS: &[&str] = &["changeme", "secret", "change-me"];

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub app: AppConfig,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_access_token_expire_minutes")]
    pub access_token_expire_minutes: i64,
    #[serde(default = "default_refresh_token_expire_days")]
    pub refresh_token_expire_days: i64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_backend")]
    pub backend: CacheBackend,
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunEnvironment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_environment")]
    pub environment: RunEnvironment,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_token_expire_minutes() -> i64 {
    15
}

fn default_refresh_token_expire_days() -> i64 {
    7
}

fn default_cache_backend() -> CacheBackend {
    CacheBackend::Postgres
}

fn default_cleanup_interval_secs() -> u64 {
    300
}

fn default_environment() -> RunEnvironment {
    RunEnvironment::Development
}

fn default_cors_origins() -> String {
    "*".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            debug: false,
            cors_origins: default_cors_origins(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"***")
            .finish()
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"***")
            .field("algorithm", &self.algorithm)
            .field(
                "access_token_expire_minutes",
                &self.access_token_expire_minutes,
            )
            .field("refresh_token_expire_days", &self.refresh_token_expire_days)
            .finish()
    }
}

impl JwtConfig {
    /// Parse the configured algorithm, accepting only the HMAC family.
    pub fn algorithm(&self) -> Result<Algorithm, ConfigError> {
        let algorithm = Algorithm::from_str(&self.algorithm).map_err(|_| {
            ConfigError::Message(format!("Unknown JWT algorithm: {}", self.algorithm))
        })?;

        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
            other => Err(ConfigError::Message(format!(
                "JWT algorithm {:?} is not supported, use HS256, HS384 or HS512",
                other
            ))),
        }
    }

    /// Build the token signing configuration handed to the authenticator.
    pub fn signing_config(&self) -> Result<TokenSigningConfig, ConfigError> {
        Ok(TokenSigningConfig::new(self.secret.as_bytes())
            .with_algorithm(self.algorithm()?)
            .with_access_token_ttl(Duration::minutes(self.access_token_expire_minutes))
            .with_refresh_token_ttl(Duration::days(self.refresh_token_expire_days)))
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment == RunEnvironment::Production
    }

    /// Whether internal error details may be returned to callers.
    pub fn expose_internal_errors(&self) -> bool {
        self.environment == RunEnvironment::Development || self.debug
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject insecure or inconsistent settings.
    ///
    /// # Errors
    /// * `ConfigError::Message` - Lists every violated rule
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.jwt.secret.len() < MIN_SECRET_LENGTH
            || INSECURE_SECRETS.contains(&self.jwt.secret.to_lowercase().as_str())
        {
            errors.push(format!(
                "jwt.secret is insecure or shorter than {} bytes",
                MIN_SECRET_LENGTH
            ));
        }

        if let Err(e) = self.jwt.algorithm() {
            errors.push(e.to_string());
        }

        if self.jwt.access_token_expire_minutes <= 0 {
            errors.push("jwt.access_token_expire_minutes must be positive".to_string());
        }

        if self.jwt.refresh_token_expire_days <= 0 {
            errors.push("jwt.refresh_token_expire_days must be positive".to_string());
        }

        if self.cache.cleanup_interval_secs == 0 {
            errors.push("cache.cleanup_interval_secs must be positive".to_string());
        }

        if self.app.is_production() && self.app.debug {
            errors.push("app.debug must be false in production".to_string());
        }

        if self.app.is_production() && self.app.cors_origins.trim() == "*" {
            errors.push("app.cors_origins must not be '*' in production".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(format!(
                "Settings validation failed: {}",
                errors.join("; ")
            )))
        }
    }
}
