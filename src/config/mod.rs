//! TOML configuration with environment overrides.
//!
//! Configuration is read from `membergate.toml` (or a path given with
//! `--config`). Every field has a sensible default so a missing file is not
//! an error — except the token signing secret, which must be supplied via
//! the file or the `MEMBERGATE_TOKEN_SECRET` environment variable before
//! the gateway will start.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `[auth] token_secret`.
pub const TOKEN_SECRET_ENV: &str = "MEMBERGATE_TOKEN_SECRET";

/// Default config file name, resolved relative to the working directory.
const DEFAULT_CONFIG_FILE: &str = "membergate.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the SQLite database and other runtime state.
    pub workspace_dir: PathBuf,
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::from("data"),
            gateway: GatewayConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed to make credentialed CORS requests (the web client).
    pub client_url: String,
    /// Append `Secure` to the refresh cookie. Disable only for local
    /// development over plain HTTP.
    pub secure_cookies: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            client_url: "http://localhost:5173".into(),
            secure_cookies: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret for access tokens. Overridden by
    /// `MEMBERGATE_TOKEN_SECRET` when set.
    pub token_secret: String,
    /// Access token lifetime (seconds). Short by design: access tokens are
    /// stateless and cannot be revoked before expiry.
    pub access_ttl_secs: u64,
    /// Refresh token lifetime (seconds).
    pub refresh_ttl_secs: u64,
    /// How long rotated-out token hashes are kept for reuse detection
    /// (seconds). Must span at least one refresh-token lifetime.
    pub revoked_retention_secs: u64,
    /// Interval between retention sweeps (seconds).
    pub sweep_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 7 * 24 * 3600,
            revoked_retention_secs: 7 * 24 * 3600,
            sweep_interval_secs: 24 * 3600,
        }
    }
}

impl Config {
    /// Load configuration from the given path (or `membergate.toml` if it
    /// exists), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(secret) = std::env::var(TOKEN_SECRET_ENV) {
            if !secret.trim().is_empty() {
                config.auth.token_secret = secret;
            }
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Path of the SQLite database inside the workspace.
    pub fn db_path(&self) -> PathBuf {
        self.workspace_dir.join("membergate.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.auth.access_ttl_secs, 900);
        assert_eq!(config.auth.refresh_ttl_secs, 7 * 24 * 3600);
        assert_eq!(config.gateway.port, 3000);
        assert!(config.gateway.secure_cookies);
        assert!(config.auth.token_secret.is_empty());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("membergate.toml");
        std::fs::write(
            &path,
            "[gateway]\nport = 8080\n\n[auth]\ntoken_secret = \"shhh\"\naccess_ttl_secs = 60\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.auth.access_ttl_secs, 60);
        assert_eq!(config.auth.sweep_interval_secs, 24 * 3600);
        assert_eq!(config.auth.token_secret, "shhh");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("membergate.toml");
        std::fs::write(&path, "gateway = \"not a table\"").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn db_path_lives_in_workspace() {
        let config = Config::default();
        assert_eq!(config.db_path(), PathBuf::from("data/membergate.db"));
    }
}
