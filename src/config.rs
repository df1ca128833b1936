// SPDX-License-Identifier: GPL-3.0-only

//! User configuration, persisted as `config.toml`

use crate::backends::camera::types::CameraFacing;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const CONFIG_FILE: &str = "config.toml";
const APP_NAME: &str = "framebooth";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Camera facing used on startup; remembered across sessions
    #[serde(default)]
    pub facing: CameraFacing,
    /// Overlay id selected on startup; absent or unknown ids fall back to
    /// the first catalog entry
    #[serde(default)]
    pub overlay: Option<String>,
    /// Override for the download directory
    #[serde(default)]
    pub save_dir: Option<PathBuf>,
    /// Mirror the preview horizontally for the front camera (selfie mode);
    /// never applied to captured pixels
    #[serde(default = "default_mirror_preview")]
    pub mirror_preview: bool,
}

fn default_mirror_preview() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            facing: CameraFacing::default(),
            overlay: None,
            save_dir: None,
            mirror_preview: true,
        }
    }
}

impl Config {
    /// Resolve the configured overlay id to a catalog index
    pub fn overlay_index(&self) -> Option<usize> {
        match self.overlay.as_deref() {
            None => Some(0),
            Some(id) => match crate::overlays::find(id) {
                Some(index) => Some(index),
                None => {
                    warn!(overlay = id, "Unknown overlay in config, using first entry");
                    Some(0)
                }
            },
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Config {
    if let Some(path) = default_config_path()
        && path.exists()
    {
        return load_from_path(&path);
    }
    Config::default()
}

/// Best-effort save; a failure is logged, never fatal
pub fn save(config: &Config) {
    let Some(path) = default_config_path() else {
        return;
    };
    if let Err(err) = save_to_path(config, &path) {
        warn!(path = %path.display(), error = %err, "Failed to save config");
    }
}

pub fn load_from_path(path: &Path) -> Config {
    match fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "Invalid config, using defaults");
            Config::default()
        }),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Could not read config");
            Config::default()
        }
    }
}

pub fn save_to_path(config: &Config, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_front_camera_first_overlay() {
        let config = Config::default();
        assert_eq!(config.facing, CameraFacing::Front);
        assert_eq!(config.overlay_index(), Some(0));
        assert!(config.mirror_preview);
    }

    #[test]
    fn unknown_overlay_id_falls_back_to_first() {
        let config = Config {
            overlay: Some("does-not-exist".to_string()),
            ..Config::default()
        };
        assert_eq!(config.overlay_index(), Some(0));
    }

    #[test]
    fn save_and_load_round_trip() {
        let config = Config {
            facing: CameraFacing::Back,
            overlay: Some("filmstrip".to_string()),
            save_dir: Some(PathBuf::from("/tmp/booth")),
            mirror_preview: false,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        save_to_path(&config, &path).unwrap();
        let loaded = load_from_path(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn invalid_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "not [valid toml").unwrap();

        assert_eq!(load_from_path(&path), Config::default());
    }
}
