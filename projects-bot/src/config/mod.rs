//! Process configuration: environment settings and per-realm channels.

mod dependencies;

pub use dependencies::Dependencies;

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use projects_repository::{StoreSource, PROJECTS_NAMESPACE};
use projects_shared::{RealmConfig, RealmId};
use thiserror::Error;
use tracing::{info, warn};

/// Default path of the realm configuration file.
const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Settings read from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub store: StoreSource,
    pub config_path: PathBuf,
    pub namespace: String,
}

impl Settings {
    /// Read settings from environment variables, loading `.env` first if present.
    ///
    /// # Environment Variables
    ///
    /// - `PROJECTS_STORE`: `mock` or `postgres` (default: `postgres` when
    ///   `DATABASE_URL` is set, `mock` otherwise)
    /// - `DATABASE_URL`: PostgreSQL connection URL
    /// - `PROJECTS_CONFIG_PATH`: realm configuration file (default: config.json)
    /// - `PROJECTS_NAMESPACE`: namespace project records live in (default: projects)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok();
        let store = match env::var("PROJECTS_STORE").ok().as_deref() {
            Some("mock") => StoreSource::mock(),
            Some("postgres") => match database_url {
                Some(url) => StoreSource::live(url),
                None => {
                    return Err(ConfigError::invalid(
                        "PROJECTS_STORE=postgres requires DATABASE_URL",
                    ))
                }
            },
            Some(other) => {
                return Err(ConfigError::invalid(format!(
                    "unknown PROJECTS_STORE '{}'",
                    other
                )))
            }
            None => match database_url {
                Some(url) => StoreSource::live(url),
                None => {
                    warn!("DATABASE_URL not set, using in-memory store");
                    StoreSource::mock()
                }
            },
        };

        let config_path = env::var("PROJECTS_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let namespace =
            env::var("PROJECTS_NAMESPACE").unwrap_or_else(|_| PROJECTS_NAMESPACE.to_string());

        Ok(Self {
            store,
            config_path,
            namespace,
        })
    }
}

/// Registry channels for every configured realm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealmsConfig {
    realms: HashMap<RealmId, RealmConfig>,
}

impl RealmsConfig {
    pub fn new(realms: HashMap<RealmId, RealmConfig>) -> Self {
        Self { realms }
    }

    /// Parse a JSON object keyed by realm id.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::new)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), realms = config.realms.len(), "Realm configuration loaded");
        Ok(config)
    }

    pub fn realm(&self, realm: RealmId) -> Option<&RealmConfig> {
        self.realms.get(&realm)
    }

    pub fn with_realm(mut self, realm: RealmId, config: RealmConfig) -> Self {
        self.realms.insert(realm, config);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_realm_map() {
        let json = r#"{
            "1": { "RequestsChannelId": 10, "ProjectsCategoryId": 20, "FallbackNotifyChannel": 30 },
            "2": { "RequestsChannelId": 11, "ProjectsCategoryId": 21, "FallbackNotifyChannelId": 31 }
        }"#;

        let config = RealmsConfig::from_json(json).unwrap();

        assert_eq!(config.realm(1).unwrap().projects_category_id, 20);
        assert_eq!(config.realm(2).unwrap().fallback_notify_channel, 31);
        assert!(config.realm(3).is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let err = RealmsConfig::load(Path::new("/nonexistent/config.json")).unwrap_err();

        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_with_realm() {
        let realm = RealmConfig {
            requests_channel_id: 1,
            projects_category_id: 2,
            fallback_notify_channel: 3,
        };

        let config = RealmsConfig::default().with_realm(9, realm);

        assert_eq!(config.realm(9), Some(&realm));
    }
}
