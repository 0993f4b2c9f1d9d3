//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `IMGDROP_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `IMGDROP_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `IMGDROP_UPLOADS__MAX_FILE_SIZE=1048576` sets the `uploads.max_file_size` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # The shared upload secret (required)
//! IMGDROP_API_KEY="a-strong-secret"
//!
//! # Override server port
//! IMGDROP_PORT=8080
//!
//! # Override nested values
//! IMGDROP_UPLOADS__ROOT=/srv/uploads
//! ```

use crate::errors::Error;
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "IMGDROP_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields except `api_key` have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Shared secret clients must send in the `apiKey` multipart field (required)
    pub api_key: Option<String>,
    /// Base URL to use when building returned file URLs (e.g., "https://uploads.example.com").
    /// When unset, scheme and host are derived from the inbound request headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<Url>,
    /// Upload storage and validation settings
    pub uploads: UploadsConfig,
}

/// Upload storage and validation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    /// Filesystem root under which all uploaded files are stored.
    /// Created at startup if missing.
    pub root: PathBuf,
    /// URL path at which the storage root is publicly served (must start with `/`)
    pub public_path: String,
    /// Maximum accepted file size in bytes (default: 3 MiB)
    pub max_file_size: u64,
    /// Subdirectory used when the request does not name one
    pub default_dir: String,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./uploads"),
            public_path: "/uploads".to_string(),
            max_file_size: 3 * 1024 * 1024, // 3 MiB
            default_dir: "misc".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3010,
            api_key: None,
            public_base_url: None,
            uploads: UploadsConfig::default(),
        }
    }
}

impl Config {
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
            .merge(Env::prefixed("IMGDROP_").split("__"))
    }

    /// Validate the configuration, returning an error describing the first problem found.
    pub fn validate(&self) -> Result<(), Error> {
        match self.api_key.as_deref() {
            None | Some("") => {
                return Err(Error::Internal {
                    operation: "validate config: api_key is not configured. \
                     Please set IMGDROP_API_KEY or add api_key to the config file."
                        .to_string(),
                });
            }
            Some(_) => {}
        }

        if self.uploads.max_file_size == 0 {
            return Err(Error::Internal {
                operation: "validate config: uploads.max_file_size must be positive (default: 3145728 = 3 MiB)".to_string(),
            });
        }

        if !self.uploads.public_path.starts_with('/') || self.uploads.public_path.len() < 2 {
            return Err(Error::Internal {
                operation: format!(
                    "validate config: uploads.public_path ({}) must be a non-root path starting with '/'",
                    self.uploads.public_path
                ),
            });
        }

        if self.uploads.public_path.ends_with('/') {
            return Err(Error::Internal {
                operation: format!(
                    "validate config: uploads.public_path ({}) must not end with '/'",
                    self.uploads.public_path
                ),
            });
        }

        // The fallback directory goes through the same rules as request-supplied ones
        if crate::storage::sanitize_dir(&self.uploads.default_dir).ok().flatten().is_none() {
            return Err(Error::Internal {
                operation: format!(
                    "validate config: uploads.default_dir ({}) is not a valid directory name",
                    self.uploads.default_dir
                ),
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
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3010);
        assert_eq!(config.uploads.max_file_size, 3 * 1024 * 1024);
        assert_eq!(config.uploads.public_path, "/uploads");
        assert_eq!(config.uploads.default_dir, "misc");
    }

    #[test]
    fn test_yaml_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
api_key: hello
port: 9000
uploads:
  root: /srv/imgdrop
  max_file_size: 1048576
"#,
            )?;

            let args = Args {
                config: "test.yaml".to_string(),
                validate: false,
            };

            let config = Config::load(&args)?;

            assert_eq!(config.api_key.as_deref(), Some("hello"));
            assert_eq!(config.port, 9000);
            assert_eq!(config.uploads.root, PathBuf::from("/srv/imgdrop"));
            assert_eq!(config.uploads.max_file_size, 1048576);
            // Untouched values keep their defaults
            assert_eq!(config.uploads.public_path, "/uploads");

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
api_key: hello
"#,
            )?;

            jail.set_env("IMGDROP_HOST", "127.0.0.1");
            jail.set_env("IMGDROP_UPLOADS__MAX_FILE_SIZE", "2048");

            let args = Args {
                config: "test.yaml".to_string(),
                validate: false,
            };

            let config = Config::load(&args)?;

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.uploads.max_file_size, 2048);

            Ok(())
        });
    }

    #[test]
    fn test_validation_missing_api_key() {
        let config = Config::default();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("api_key is not configured"));
    }

    #[test]
    fn test_validation_bad_public_path() {
        let mut config = Config {
            api_key: Some("secret".to_string()),
            ..Config::default()
        };
        config.uploads.public_path = "uploads".to_string();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("public_path"));
    }

    #[test]
    fn test_validation_bad_default_dir() {
        let mut config = Config {
            api_key: Some("secret".to_string()),
            ..Config::default()
        };
        config.uploads.default_dir = "../escape".to_string();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("default_dir"));
    }

    #[test]
    fn test_validation_valid_config() {
        let config = Config {
            api_key: Some("secret".to_string()),
            ..Config::default()
        };

        assert!(config.validate().is_ok());
    }
}
