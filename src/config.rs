use std::str::FromStr;

use argon2::Params;
use tracing::warn;

/// Issuer stamped on every session token.
pub const TOKEN_ISSUER: &str = "ledgerly";

/// Signing secret used when `JWT_SECRET` is unset. Never acceptable in production.
pub const DEV_JWT_SECRET: &str = "dev-secret-key-change-in-production";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
}

impl JwtConfig {
    /// Falls back to [`DEV_JWT_SECRET`] when no secret is configured.
    pub fn from_secret(secret: Option<String>) -> Self {
        let secret = match secret.filter(|s| !s.is_empty()) {
            Some(s) => s,
            None => {
                warn!("JWT_SECRET not set; using development fallback secret");
                DEV_JWT_SECRET.to_string()
            }
        };
        Self {
            secret,
            issuer: TOKEN_ISSUER.to_string(),
        }
    }
}

/// Argon2id cost parameters. Fixed for the life of the process.
#[derive(Debug, Clone)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub hashing: HashingConfig,
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_timeout_secs: u64,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig::from_secret(std::env::var("JWT_SECRET").ok());
        let defaults = HashingConfig::default();
        let hashing = HashingConfig {
            memory_kib: env_or("HASH_MEMORY_KIB", defaults.memory_kib),
            iterations: env_or("HASH_ITERATIONS", defaults.iterations),
            parallelism: env_or("HASH_PARALLELISM", defaults.parallelism),
        };
        Ok(Self {
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            jwt,
            hashing,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 8080),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 15),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 5),
        })
    }
}
