use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::filter::FilterType;

const APP_DIR: &str = "yolo-tracker";
const CONFIG_FILE: &str = "config.toml";

/// Top-level configuration loaded from `config.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding local task storage and exports.
    #[serde(default)]
    data_dir: Option<PathBuf>,
    /// Window the board opens with.
    #[serde(default)]
    default_filter: Option<String>,
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Sync backend settings. Sign-in is refused unless `enabled` is set.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    #[serde(default)]
    pub enabled: bool,
    /// File mirroring the remote collections; defaults to `remote.json`
    /// inside the data directory.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl Config {
    /// Load from `path`, or from the platform config directory when `None`.
    /// A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.default_filter()?;
        Ok(())
    }

    pub fn default_filter(&self) -> Result<FilterType> {
        match &self.default_filter {
            Some(value) => value
                .parse::<FilterType>()
                .with_context(|| format!("invalid default_filter {value:?}")),
            None => Ok(FilterType::default()),
        }
    }

    /// Configured data directory, or the platform data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
        })
    }

    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.data_dir = Some(dir);
        self
    }

    pub fn remote_store_path(&self) -> PathBuf {
        self.remote
            .store_path
            .clone()
            .unwrap_or_else(|| self.data_dir().join("remote.json"))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn missing_config_returns_defaults() -> Result<()> {
        let dir = tempdir()?;
        let cfg = Config::from_file(&dir.path().join(CONFIG_FILE))?;
        assert!(!cfg.remote.enabled);
        assert_eq!(cfg.default_filter()?, FilterType::Day);
        Ok(())
    }

    #[test]
    fn load_full_config() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        let mut file = fs::File::create(&path)?;
        writeln!(
            file,
            "data_dir = \"/tmp/yolo\"\ndefault_filter = \"week\"\n\n[remote]\nenabled = true"
        )?;

        let cfg = Config::from_file(&path)?;
        assert_eq!(cfg.data_dir(), PathBuf::from("/tmp/yolo"));
        assert_eq!(cfg.default_filter()?, FilterType::Week);
        assert!(cfg.remote.enabled);
        assert_eq!(cfg.remote_store_path(), PathBuf::from("/tmp/yolo/remote.json"));
        Ok(())
    }

    #[test]
    fn bad_filter_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "default_filter = \"year\"\n")?;

        let Err(err) = Config::from_file(&path) else {
            panic!("unknown filter should error");
        };
        assert!(format!("{err:#}").contains("invalid default_filter"));
        Ok(())
    }
}
