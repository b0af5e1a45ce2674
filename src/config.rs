use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_FILE_NAME: &str = ".gatorconfig.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate home directory for .gatorconfig.json")]
    NoHome,
    #[error("reading config {}: {source}", .path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("parsing config {}: {source}", .path.display())]
    Json { path: PathBuf, #[source] source: serde_json::Error },
}

/// Local user config: where the database lives and who is logged in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub db_url: String,
    #[serde(default)]
    pub current_user_name: String,
    #[serde(skip)]
    path: PathBuf,
}

impl Config {
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME)).ok_or(ConfigError::NoHome)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let mut config: Config = serde_json::from_str(&content)
            .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?;
        config.path = path.to_path_buf();
        Ok(config)
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Name of the logged-in user, if any.
    pub fn current_user(&self) -> Option<&str> {
        Some(self.current_user_name.as_str()).filter(|n| !n.is_empty())
    }

    pub fn set_user(&mut self, name: &str) -> Result<(), ConfigError> {
        self.current_user_name = name.to_string();
        self.save()
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|source| ConfigError::Json { path: self.path.clone(), source })?;
        write_private(&self.path, content.as_bytes())
            .map_err(|source| ConfigError::Io { path: self.path.clone(), source })
    }
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut f = std::fs::OpenOptions::new().write(true).create(true).truncate(true).mode(0o600).open(path)?;
    f.write_all(bytes)
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, bytes)
}

#[cfg(test)]
pub(crate) fn at_path(path: &Path, db_url: &str, current_user_name: &str) -> Config {
    Config { db_url: db_url.to_string(), current_user_name: current_user_name.to_string(), path: path.to_path_buf() }
}
