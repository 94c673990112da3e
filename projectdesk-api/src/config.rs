/// Configuration management for the API server
///
/// Settings are layered, later sources winning:
///
/// 1. Built-in defaults
/// 2. `projectdesk.toml` in the working directory (optional)
/// 3. `PROJECTDESK__<SECTION>__<KEY>` environment variables
/// 4. The conventional `DATABASE_URL`, `JWT_SECRET` and `REDIS_URL` variables
///
/// A `.env` file is loaded first when present.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `JWT_SECRET`: Session signing key, at least 32 characters (required)
/// - `REDIS_URL`: Shared login throttle store (optional, in-memory otherwise)
/// - `PROJECTDESK__API__PORT`: Port to bind to (default: 8080)
/// - `PROJECTDESK__API__CORS_ORIGINS`: Comma-separated origins or `*`
/// - `PROJECTDESK__BOOTSTRAP__ADMIN_EMAIL`: Registers a first Admin on startup
/// - `RUST_LOG`: Log filter (default: info)
///
/// # Example
///
/// ```no_run
/// use projectdesk_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use config as cfg;
use projectdesk_shared::auth::throttle::ThrottlePolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub login_throttle: LoginThrottleConfig,

    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Comma-separated allowed origins; `*` allows any origin
    pub cors_origins: String,

    /// Enables HSTS and the `Secure` cookie attribute
    pub production: bool,

    /// Emit logs as JSON lines
    pub json_logs: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Session token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 characters. Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Session lifetime in minutes
    pub ttl_minutes: i64,
}

/// Failed login lockout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginThrottleConfig {
    pub max_attempts: u32,
    pub lock_minutes: u64,

    /// Share lockouts through Redis when set
    pub redis_url: Option<String>,
}

/// First-run setup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Registered as an Admin at startup when no Admin exists yet
    pub admin_email: Option<String>,
}

impl Config {
    /// Loads configuration from `.env`, `projectdesk.toml` and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A required setting is missing
    /// - A value has the wrong type
    /// - `validate` rejects the result
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = Self::defaults()?
            .add_source(cfg::File::with_name("projectdesk").required(false))
            .add_source(
                cfg::Environment::with_prefix("PROJECTDESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("jwt.secret", env::var("JWT_SECRET").ok())?
            .set_override_option("login_throttle.redis_url", env::var("REDIS_URL").ok())?;

        Self::build(builder)
    }

    fn defaults() -> Result<cfg::ConfigBuilder<cfg::builder::DefaultState>, cfg::ConfigError> {
        cfg::Config::builder()
            .set_default("api.host", "0.0.0.0")?
            .set_default("api.port", 8080_i64)?
            .set_default("api.cors_origins", "*")?
            .set_default("api.production", false)?
            .set_default("api.json_logs", false)?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 10_i64)?
            .set_default("jwt.secret", "")?
            .set_default("jwt.ttl_minutes", 120_i64)?
            .set_default("login_throttle.max_attempts", 3_i64)?
            .set_default("login_throttle.lock_minutes", 15_i64)
    }

    fn build(builder: cfg::ConfigBuilder<cfg::builder::DefaultState>) -> anyhow::Result<Self> {
        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the server cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("DATABASE_URL environment variable is required");
        }

        if self.jwt.secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        if self.jwt.ttl_minutes <= 0 {
            anyhow::bail!("jwt.ttl_minutes must be positive");
        }

        if self.login_throttle.max_attempts == 0 {
            anyhow::bail!("login_throttle.max_attempts must be at least 1");
        }

        Ok(())
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Allowed CORS origins, trimmed and without blanks
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.api
            .cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origin_list().iter().any(|origin| origin == "*")
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.jwt.ttl_minutes)
    }

    pub fn throttle_policy(&self) -> ThrottlePolicy {
        ThrottlePolicy {
            max_attempts: self.login_throttle.max_attempts,
            lock_duration: Duration::from_secs(self.login_throttle.lock_minutes * 60),
        }
    }

    /// Redis URL for the throttle store, ignoring blank values
    pub fn redis_url(&self) -> Option<&str> {
        self.login_throttle
            .redis_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Bootstrap admin email, ignoring blank values
    pub fn bootstrap_admin_email(&self) -> Option<&str> {
        self.bootstrap
            .admin_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> anyhow::Result<Config> {
        Config::build(
            Config::defaults()?.add_source(cfg::File::from_str(toml, cfg::FileFormat::Toml)),
        )
    }

    const MINIMAL: &str = r#"
        [database]
        url = "postgresql://localhost/projectdesk"

        [jwt]
        secret = "test-secret-key-at-least-32-bytes-long"
    "#;

    #[test]
    fn test_defaults() {
        let config = from_toml(MINIMAL).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.ttl_minutes, 120);
        assert_eq!(config.session_ttl(), chrono::Duration::hours(2));
        assert_eq!(config.throttle_policy(), ThrottlePolicy::default());
        assert!(config.allows_any_origin());
        assert!(!config.api.production);
        assert!(config.redis_url().is_none());
        assert!(config.bootstrap_admin_email().is_none());
    }

    #[test]
    fn test_overrides() {
        let config = from_toml(
            r#"
            [api]
            port = 9000
            cors_origins = "https://desk.example.com, https://admin.example.com"
            production = true

            [database]
            url = "postgresql://localhost/projectdesk"

            [jwt]
            secret = "test-secret-key-at-least-32-bytes-long"

            [login_throttle]
            max_attempts = 5
            redis_url = "  "

            [bootstrap]
            admin_email = "root@example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.port, 9000);
        assert!(config.api.production);
        assert!(!config.allows_any_origin());
        assert_eq!(
            config.cors_origin_list(),
            vec!["https://desk.example.com", "https://admin.example.com"]
        );
        assert_eq!(config.throttle_policy().max_attempts, 5);
        assert!(config.redis_url().is_none());
        assert_eq!(config.bootstrap_admin_email(), Some("root@example.com"));
    }

    #[test]
    fn test_rejects_short_secret() {
        let err = from_toml(
            r#"
            [database]
            url = "postgresql://localhost/projectdesk"

            [jwt]
            secret = "too-short"
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("at least 32 characters"));
    }

    #[test]
    fn test_requires_database_url() {
        let err = from_toml(
            r#"
            [jwt]
            secret = "test-secret-key-at-least-32-bytes-long"
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("DATABASE_URL"));
    }
}
