//! Configuration management

use crate::bus::router::UnroutablePolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use pagecraft_protocol::{MenuItemDescriptor, DEFAULT_SHELL_ADDR};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Bus connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Address the shell listens on
    #[serde(default = "default_shell_addr")]
    pub shell_addr: String,
    /// What to do with commands that have no handler
    #[serde(default)]
    pub unroutable: UnroutablePolicy,
}

fn default_shell_addr() -> String {
    DEFAULT_SHELL_ADDR.to_string()
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            shell_addr: default_shell_addr(),
            unroutable: UnroutablePolicy::default(),
        }
    }
}

/// Document storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// How often the stored document is checked for outside changes
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval() -> u64 {
    1000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
        }
    }
}

/// Insertable blocks offered in the shell's Insert menu
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuConfig {
    #[serde(default = "default_insert_items")]
    pub insert_items: Vec<MenuItemDescriptor>,
}

fn default_insert_items() -> Vec<MenuItemDescriptor> {
    [
        ("Row", "layout"),
        ("Column", "layout"),
        ("Text Column", "layout"),
        ("Heading", "text"),
        ("Paragraph", "text"),
        ("Text", "text"),
        ("Image", "media"),
    ]
    .into_iter()
    .map(|(label, group)| MenuItemDescriptor::new(label, group))
    .collect()
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            insert_items: default_insert_items(),
        }
    }
}

/// Main front configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub menu: MenuConfig,
}

impl Config {
    /// Load configuration from the platform config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, defaults if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config =
                toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to the platform config directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = project_dirs()?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}

pub(crate) fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "pagecraft", "Pagecraft").context("Failed to determine config directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bus.shell_addr, "127.0.0.1:19420");
        assert_eq!(config.bus.unroutable, UnroutablePolicy::Log);
        assert_eq!(config.storage.poll_interval_ms, 1000);
        assert_eq!(config.menu.insert_items[0], MenuItemDescriptor::new("Row", "layout"));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.bus.shell_addr, config.bus.shell_addr);
        assert_eq!(parsed.menu.insert_items, config.menu.insert_items);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [bus]
            unroutable = "silent"

            [[menu.insert_items]]
            label = "Quote"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.bus.unroutable, UnroutablePolicy::Silent);
        assert_eq!(parsed.bus.shell_addr, DEFAULT_SHELL_ADDR);
        assert_eq!(parsed.menu.insert_items, vec![MenuItemDescriptor::new("Quote", "")]);
        assert_eq!(parsed.storage.poll_interval_ms, 1000);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.bus.shell_addr, DEFAULT_SHELL_ADDR);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.bus.shell_addr = "127.0.0.1:1".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.bus.shell_addr, "127.0.0.1:1");
    }
}
