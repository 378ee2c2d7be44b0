use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::storage::RecordFormat;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "RANCH_DATA_DIR";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "RANCH_CONFIG_PATH";

/// User configuration, read from `~/.ranch/config.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding users, horses and barns files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Encoding for the record files
    #[serde(default)]
    pub format: RecordFormat,
}

impl Config {
    /// Loads the config from the provided path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Loads the config if the file exists, otherwise returns defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the config to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(&self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Picks the data directory: explicit flag, then `RANCH_DATA_DIR`, then
    /// the config file, then `default_dir`
    pub fn resolve_data_dir(
        &self,
        flag: Option<&Path>,
        env_value: Option<PathBuf>,
        default_dir: PathBuf,
    ) -> PathBuf {
        if let Some(dir) = flag {
            return dir.to_path_buf();
        }
        if let Some(dir) = env_value.filter(|d| !d.as_os_str().is_empty()) {
            return dir;
        }
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        default_dir
    }
}

/// Gets the directory holding ranch settings, `~/.ranch`
pub fn get_config_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home_dir.join(".ranch"))
}

/// Gets the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Determines where record files live for this run
pub fn determine_data_dir(flag: Option<&Path>) -> Result<(PathBuf, RecordFormat)> {
    let config = Config::load_or_default(get_config_path()?)?;
    let env_value = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
    let default_dir = get_config_dir()?.join("data");

    let dir = config.resolve_data_dir(flag, env_value, default_dir);
    log::debug!("using data directory {:?} ({})", dir, config.format);
    Ok((dir, config.format))
}
