use crate::ServerError;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the depot home directory.
pub const HOME_ENV: &str = "DEPOT_HOME";
const HOME_DIR_NAME: &str = ".depot";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Defaults to `<home>/repository`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_root: Option<PathBuf>,
    /// Consult the remote fallback resolver on local misses.
    #[serde(default)]
    pub proxy: bool,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_bind() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    4
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            repository_root: None,
            proxy: false,
            workers: default_workers(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|message| ServerError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(content).map_err(|e| e.to_string())?;
        if config.workers == 0 {
            return Err("workers must be at least 1".to_owned());
        }
        Ok(config)
    }

    /// Load the config file, writing the defaults out if it does not exist yet.
    pub fn load_or_init(path: &Path) -> Result<Self, ServerError> {
        if path.exists() {
            return Self::load(path);
        }
        info!("no configuration found, writing defaults to {}", path.display());
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ServerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| ServerError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn repository_root(&self, home: &Path) -> PathBuf {
        self.repository_root
            .clone()
            .unwrap_or_else(|| home.join("repository"))
    }
}

/// `<home>/config/depot.toml`.
pub fn config_path(home: &Path) -> PathBuf {
    home.join("config").join("depot.toml")
}

/// Resolve the home directory from `DEPOT_HOME`, then `$HOME/.depot`, then
/// the system temp directory.
pub fn resolve_home() -> PathBuf {
    resolve_home_from(std::env::var_os(HOME_ENV), std::env::var_os("HOME"))
}

fn resolve_home_from(depot_home: Option<OsString>, user_home: Option<OsString>) -> PathBuf {
    if let Some(home) = depot_home.filter(|h| !h.is_empty()) {
        return PathBuf::from(home);
    }
    if let Some(user) = user_home.filter(|h| !h.is_empty()) {
        let home = PathBuf::from(user).join(HOME_DIR_NAME);
        warn!("{HOME_ENV} is not set, using {}", home.display());
        return home;
    }
    let home = std::env::temp_dir().join(HOME_DIR_NAME);
    warn!(
        "neither {HOME_ENV} nor HOME is set, using the temporary directory {}",
        home.display()
    );
    home
}
