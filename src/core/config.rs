//! Configuration management

use crate::core::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// VOS3000 servers managed by this control plane
    pub servers: Vec<ServerConfig>,
    pub http: HttpConfig,
    pub vos: VosConfig,
    pub client: ClientConfig,
    pub search: SearchConfig,
    pub cleanup: CleanupConfig,
}

/// One VOS3000 server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Unique display name, used in every `/servers/{server}/...` path
    pub name: String,
    /// Base URL of the VOS3000 web API, e.g. `http://10.0.0.5:1221`
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Address the control plane listens on
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VosConfig {
    /// Per-call timeout against a VOS3000 server (seconds)
    pub timeout_secs: u64,
    /// Path prefix of the VOS3000 external API
    pub endpoint_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Control plane base URL used by the CLI
    pub base_url: String,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Expand searched numbers to their 0/84 variants
    pub expand_variants: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CleanupConfig {
    /// Only treat virtual keys of exactly this many digits as deletable
    pub virtual_key_digits: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            http: HttpConfig::default(),
            vos: VosConfig::default(),
            client: ClientConfig::default(),
            search: SearchConfig::default(),
            cleanup: CleanupConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl Default for VosConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_VOS_TIMEOUT_SECS,
            endpoint_prefix: "/external/server".to_string(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: format!("http://{}", DEFAULT_BIND),
            timeout_secs: 10,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            expand_variants: true,
        }
    }
}

impl VosConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load and validate configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs the control plane cannot route by name
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for server in &self.servers {
            if server.name.trim().is_empty() {
                return Err(Error::ConfigError {
                    message: format!("server with url '{}' has an empty name", server.url),
                });
            }
            if server.url.trim().is_empty() {
                return Err(Error::ConfigError {
                    message: format!("server '{}' has no url", server.name),
                });
            }
            if !seen.insert(server.name.as_str()) {
                return Err(Error::ConfigError {
                    message: format!("duplicate server name '{}'", server.name),
                });
            }
        }
        Ok(())
    }

    /// Look up a configured server by name
    pub fn server(&self, name: &str) -> Result<&ServerConfig> {
        self.servers
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::ServerNotFound {
                name: name.to_string(),
            })
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("VOSADMIN_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let home = Self::vosadmin_home()?;
        Ok(home.join("config.toml"))
    }

    /// Get the vosadmin home directory
    pub fn vosadmin_home() -> Result<PathBuf> {
        if let Ok(home) = std::env::var("VOSADMIN_HOME") {
            return Ok(PathBuf::from(home));
        }

        ProjectDirs::from("dev", "vosadmin", "vosadmin")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| Error::ConfigError {
                message: "Could not determine vosadmin home directory".to_string(),
            })
    }
}

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_VOS_TIMEOUT_SECS: u64 = 45;
