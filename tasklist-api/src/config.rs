/// Configuration management for the API server
///
/// Configuration comes from environment variables, with a `.env` file
/// honored when present.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (unset = in-memory store)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `STORE_TIMEOUT_SECS`: Upper bound on a single store call (default: 10)
/// - `JWT_SECRET`: Token signing key (default: insecure fallback constant)
/// - `HOST`: Host to bind to (default: 0.0.0.0)
/// - `PORT`: Port to bind to (default: 5000)
/// - `APP_ENV` / `NODE_ENV`: `production` enables static bundle serving
/// - `STATIC_DIR`: Prebuilt frontend bundle (default: frontend/dist)
/// - `PASSWORD_HASH_MEMORY_KIB`, `PASSWORD_HASH_ITERATIONS`,
///   `PASSWORD_HASH_LANES`: Argon2id work factor
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use tasklist_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tasklist_shared::auth::jwt::DEFAULT_JWT_SECRET;
use tasklist_shared::auth::password::HashParams;
use tasklist_shared::store::DEFAULT_STORE_TIMEOUT;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Store configuration
    pub database: DatabaseConfig,

    /// Token configuration
    pub jwt: JwtConfig,

    /// Password hashing work factor
    pub password: HashParams,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Production mode serves the frontend bundle for non-API paths
    pub production: bool,

    /// Directory holding the prebuilt frontend bundle
    pub static_dir: PathBuf,
}

/// Store configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; `None` selects the in-memory store
    pub url: Option<String>,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Upper bound on a single store call
    pub store_timeout: Duration,
}

/// Token configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for token signing
    pub secret: String,

    /// True when `JWT_SECRET` was unset and the fallback constant is in use
    pub using_default_secret: bool,
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 5000u16)?;

        let environment = lookup("APP_ENV").or_else(|| lookup("NODE_ENV"));
        let production = environment
            .map(|e| e.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let static_dir = lookup("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("frontend/dist"));

        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        let store_timeout_secs =
            parse_or(&lookup, "STORE_TIMEOUT_SECS", DEFAULT_STORE_TIMEOUT.as_secs())?;

        let (secret, using_default_secret) = match lookup("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (DEFAULT_JWT_SECRET.to_string(), true),
        };

        let defaults = HashParams::default();
        let password = HashParams {
            memory_kib: parse_or(&lookup, "PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&lookup, "PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            lanes: parse_or(&lookup, "PASSWORD_HASH_LANES", defaults.lanes)?,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                production,
                static_dir,
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL"),
                max_connections,
                store_timeout: Duration::from_secs(store_timeout_secs),
            },
            jwt: JwtConfig {
                secret,
                using_default_secret,
            },
            password,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
