/// Configuration management for the API server
///
/// Configuration comes from environment variables; a `.env` file is loaded
/// first when present.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 4000)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, or `*` (default: *)
/// - `PRODUCTION`: `true` enables HSTS (default: false)
/// - `JWT_SECRET`: Secret key for JWT signing, at least 32 characters (required)
/// - `JWT_TTL_HOURS`: Token lifetime in hours (default: 168)
/// - `AWS_REGION`: Region of the attachments bucket (required)
/// - `AWS_S3_BUCKET_NAME`: Attachments bucket (required)
/// - `S3_ENDPOINT`: Endpoint of an S3-compatible store (optional)
/// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
/// - `RUST_LOG`: Log filter (default: taskdeck_api=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use taskdeck_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use taskdeck_shared::auth::jwt::DEFAULT_TOKEN_TTL_HOURS;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS header)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be kept secret and be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,

    /// Token lifetime in hours
    pub ttl_hours: i64,
}

/// Attachment storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub region: String,
    pub bucket: String,
    pub endpoint: Option<String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

fn parse_or<T>(value: Option<String>, default: T, name: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", name, raw, e)),
        _ => Ok(default),
    }
}

fn parse_bool(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails
    /// to parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let ttl_hours = parse_or(lookup("JWT_TTL_HOURS"), DEFAULT_TOKEN_TTL_HOURS, "JWT_TTL_HOURS")?;
        if ttl_hours <= 0 {
            anyhow::bail!("JWT_TTL_HOURS must be positive");
        }

        Ok(Self {
            api: ApiConfig {
                host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(lookup("API_PORT"), 4000, "API_PORT")?,
                cors_origins: if cors_origins.is_empty() {
                    vec!["*".to_string()]
                } else {
                    cors_origins
                },
                production: parse_bool(lookup("PRODUCTION")),
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parse_or(
                    lookup("DATABASE_MAX_CONNECTIONS"),
                    10,
                    "DATABASE_MAX_CONNECTIONS",
                )?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                ttl_hours,
            },
            storage: StorageConfig {
                region: required("AWS_REGION")?,
                bucket: required("AWS_S3_BUCKET_NAME")?,
                endpoint: lookup("S3_ENDPOINT").filter(|v| !v.trim().is_empty()),
            },
            logging: LoggingConfig {
                format: parse_or(lookup("LOG_FORMAT"), LogFormat::Pretty, "LOG_FORMAT")?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgresql://localhost/taskdeck"),
            ("JWT_SECRET", "test-secret-key-at-least-32-bytes-long"),
            ("AWS_REGION", "us-east-1"),
            ("AWS_S3_BUCKET_NAME", "taskdeck-attachments"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> anyhow::Result<Config> {
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_vars()).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:4000");
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert!(!config.api.production);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.ttl_hours, 168);
        assert_eq!(config.storage.endpoint, None);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_vars();
        vars.insert("API_HOST", "127.0.0.1");
        vars.insert("API_PORT", "8081");
        vars.insert("CORS_ORIGINS", "http://localhost:3000, https://app.example.com");
        vars.insert("PRODUCTION", "true");
        vars.insert("S3_ENDPOINT", "http://localhost:9000");
        vars.insert("LOG_FORMAT", "json");
        vars.insert("JWT_TTL_HOURS", "1");

        let config = load(&vars).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8081");
        assert_eq!(
            config.api.cors_origins,
            vec!["http://localhost:3000", "https://app.example.com"]
        );
        assert!(config.api.production);
        assert_eq!(config.storage.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.jwt.ttl_hours, 1);
    }

    #[test]
    fn test_missing_required() {
        for key in ["DATABASE_URL", "JWT_SECRET", "AWS_REGION", "AWS_S3_BUCKET_NAME"] {
            let mut vars = base_vars();
            vars.remove(key);
            let err = load(&vars).unwrap_err().to_string();
            assert!(err.contains(key), "{}", err);
        }
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut vars = base_vars();
        vars.insert("JWT_SECRET", "too-short");
        assert!(load(&vars).unwrap_err().to_string().contains("32 characters"));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let mut vars = base_vars();
        vars.insert("API_PORT", "eighty");
        assert!(load(&vars).is_err());

        let mut vars = base_vars();
        vars.insert("LOG_FORMAT", "xml");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_secret_not_serialized() {
        let config = load(&base_vars()).unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert!(json["jwt"].get("secret").is_none());
    }
}
