use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cli::Cli;
use crate::files::collect_images;

pub const DEFAULT_CONFIG_FILE: &str = "multiview.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Raw keybind strings as the user typed them. They are normalized and parsed
/// by the keybind registry; a bad string disables only that binding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeybindConfig {
    pub next_image: String,
    pub previous_image: String,
    pub zoom_in: String,
    pub zoom_out: String,
    pub toggle_visibility: String,
}

impl Default for KeybindConfig {
    fn default() -> Self {
        Self {
            next_image: "ctrl+n".to_string(),
            previous_image: "ctrl+p".to_string(),
            zoom_in: "ctrl+shift+z".to_string(),
            zoom_out: "ctrl+z".to_string(),
            toggle_visibility: "ctrl+shift+v".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ordered image paths or URLs. Entries may be empty or unreadable.
    pub images: Vec<String>,
    pub allow_upscaling: bool,
    pub window_movable: bool,
    pub keybinds: KeybindConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            allow_upscaling: false,
            window_movable: true,
            keybinds: KeybindConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build the effective configuration: the config file (explicit, or the
    /// default file if present) followed by command-line overrides.
    pub fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default)?
                } else {
                    Self::default()
                }
            }
        };

        config
            .images
            .extend(collect_images(&cli.paths, cli.file_list.as_ref(), cli.recursive)?);
        if cli.allow_upscaling {
            config.allow_upscaling = true;
        }
        Ok(config)
    }
}
