//! Application configuration.
//!
//! Configuration is loaded from a YAML file merged with `FOLIO_`-prefixed
//! environment variables (`__` as the nesting separator), so any field can
//! be overridden without touching the file:
//!
//! ```text
//! FOLIO_PORT=8080
//! FOLIO_SECRET_KEY=...
//! FOLIO_AUTH__ACCESS_TOKEN_TTL=1h
//! FOLIO_UPLOADS__MAX_FILE_SIZE=10485760
//! DATABASE_URL=postgres://...
//! ```
//!
//! All fields have defaults; only the database URL and secret key are
//! required to start the server.

use clap::Parser;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "FOLIO_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment
/// variables. All fields have sensible defaults defined in the `Default`
/// implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// PostgreSQL connection string (also honored as plain DATABASE_URL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Secret key for JWT signing (required)
    pub secret_key: Option<String>,
    /// Email address for the initial admin user (created on first startup
    /// when no admin exists)
    pub admin_email: Option<String>,
    /// Password for the initial admin user
    pub admin_password: Option<String>,
    /// Token lifetimes and password rules
    pub auth: AuthConfig,
    /// File upload handling
    pub uploads: UploadConfig,
    /// Cross-origin settings for the HTTP API
    pub cors: CorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            secret_key: None,
            admin_email: None,
            admin_password: None,
            auth: AuthConfig::default(),
            uploads: UploadConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

/// Token lifetimes and password rules
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Access token lifetime (humantime format, e.g. "7d" or "30m")
    #[serde(with = "humantime_serde")]
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    #[serde(with = "humantime_serde")]
    pub refresh_token_ttl: Duration,
    /// Password length rules for registration and password changes
    pub password: PasswordConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_ttl: Duration::from_secs(7 * 24 * 3600),
            refresh_token_ttl: Duration::from_secs(30 * 24 * 3600),
            password: PasswordConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 100,
        }
    }
}

/// File upload handling
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Directory where uploaded files are stored (created at startup)
    pub dir: PathBuf,
    /// Per-file size cap in bytes
    pub max_file_size: u64,
    /// Maximum number of files accepted in one multipart request
    pub max_files: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            max_file_size: 5 * 1024 * 1024,
            max_files: 5,
        }
    }
}

/// Cross-origin settings for the HTTP API
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Origins allowed to call the API; "*" allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("FOLIO_").split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.secret_key.is_none() {
            return Err(Error::Internal {
                operation: "Config validation: secret_key is not configured. \
                 Please set FOLIO_SECRET_KEY environment variable or add secret_key to config file."
                    .to_string(),
            });
        }

        if self.auth.password.min_length > self.auth.password.max_length {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: Invalid password configuration: min_length ({}) cannot be greater than max_length ({})",
                    self.auth.password.min_length, self.auth.password.max_length
                ),
            });
        }

        if self.auth.password.min_length < 1 {
            return Err(Error::Internal {
                operation: "Config validation: Invalid password configuration: min_length must be at least 1".to_string(),
            });
        }

        if self.auth.access_token_ttl.as_secs() < 300 {
            // Less than 5 minutes
            return Err(Error::Internal {
                operation: "Config validation: access token lifetime is too short (minimum 5 minutes)".to_string(),
            });
        }

        if self.auth.refresh_token_ttl < self.auth.access_token_ttl {
            return Err(Error::Internal {
                operation: "Config validation: refresh token lifetime must not be shorter than the access token lifetime".to_string(),
            });
        }

        if self.uploads.max_file_size == 0 {
            return Err(Error::Internal {
                operation: "Config validation: uploads.max_file_size must be greater than zero".to_string(),
            });
        }

        if self.cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: CORS allowed_origins cannot be empty. Add at least one allowed origin.".to_string(),
            });
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.auth.access_token_ttl, Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.auth.refresh_token_ttl, Duration::from_secs(30 * 24 * 3600));
        assert_eq!(config.uploads.max_file_size, 5 * 1024 * 1024);
        assert_eq!(config.uploads.max_files, 5);
    }

    #[test]
    fn test_validation_requires_secret_key() {
        let config = Config::default();
        assert!(config.validate().is_err());

        let config = Config {
            secret_key: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_inverted_password_bounds() {
        let mut config = Config {
            secret_key: Some("secret".to_string()),
            ..Default::default()
        };
        config.auth.password.min_length = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "port: 4000\n")?;
            jail.set_env("FOLIO_HOST", "127.0.0.1");
            jail.set_env("FOLIO_AUTH__ACCESS_TOKEN_TTL", "30m");
            jail.set_env("DATABASE_URL", "postgres://localhost/folio");

            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
            };
            let config: Config = Config::figment(&args).extract()?;

            assert_eq!(config.port, 4000);
            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.auth.access_token_ttl, Duration::from_secs(1800));
            assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/folio"));
            Ok(())
        });
    }

    #[test]
    fn test_yaml_nested_sections() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
secret_key: test-secret
uploads:
  dir: /tmp/folio-uploads
  max_file_size: 1048576
cors:
  allowed_origins:
    - http://localhost:5173
"#,
            )?;

            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
            };
            let config: Config = Config::figment(&args).extract()?;

            assert_eq!(config.uploads.dir, PathBuf::from("/tmp/folio-uploads"));
            assert_eq!(config.uploads.max_file_size, 1048576);
            assert_eq!(config.cors.allowed_origins, vec!["http://localhost:5173"]);
            Ok(())
        });
    }
}
