//! TOML-backed editor configuration.
//!
//! Options live in a small typed tree serialized to `vredit.toml`. Every
//! field has a serde default, so a missing or partial file still yields a
//! fully-populated store, and first-run saves write every option out with
//! its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vredit_core::config::{keys, ConfigStore};

use crate::scan::{DEFAULT_MAX_RAY_DISTANCE, DEFAULT_SPHERE_RADIUS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize options: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// All editor options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    pub general: GeneralOptions,
    pub controls: ControlsOptions,
    pub selection: SelectionOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralOptions {
    /// Mirror of the edit-mode gate, kept in sync by the edit session.
    pub edit_mode_enabled: bool,
    /// Whether the first-run tutorial has been shown.
    pub tutorial_shown: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsOptions {
    /// Double-tap the trigger with a hand inside a static object to
    /// toggle edit mode.
    pub quick_edit_enabled: bool,
}

impl Default for ControlsOptions {
    fn default() -> Self {
        Self {
            quick_edit_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionOptions {
    /// Maximum ray-selection distance in game units.
    pub max_ray_distance: f32,
    /// Volume-selection sphere radius in game units.
    pub sphere_radius: f32,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            max_ray_distance: DEFAULT_MAX_RAY_DISTANCE,
            sphere_radius: DEFAULT_SPHERE_RADIUS,
        }
    }
}

/// [`ConfigStore`] backed by a TOML file.
pub struct TomlConfigStore {
    path: Option<PathBuf>,
    options: EditorOptions,
}

impl TomlConfigStore {
    /// A store with defaults and no backing file. Used in tests and when
    /// the host manages persistence itself.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            options: EditorOptions::default(),
        }
    }

    /// Load a store from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let options = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            options,
        })
    }

    /// Load a store, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(store) => {
                log::info!("Loaded editor options from {}", path.display());
                store
            }
            Err(err) => {
                log::warn!("No editor options ({err}), using defaults");
                Self {
                    path: Some(path.to_path_buf()),
                    options: EditorOptions::default(),
                }
            }
        }
    }

    /// Write the current options back to the backing file, if any.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = match &self.path {
            Some(path) => path,
            None => {
                log::trace!("TomlConfigStore: in-memory store, nothing to save");
                return Ok(());
            }
        };
        let content = toml::to_string_pretty(&self.options)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }
}

impl ConfigStore for TomlConfigStore {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match key {
            keys::EDIT_MODE_ENABLED => self.options.general.edit_mode_enabled,
            keys::TUTORIAL_SHOWN => self.options.general.tutorial_shown,
            keys::QUICK_EDIT_ENABLED => self.options.controls.quick_edit_enabled,
            _ => {
                log::trace!("TomlConfigStore: unknown bool option '{key}'");
                default
            }
        }
    }

    fn set_bool(&mut self, key: &str, value: bool) {
        match key {
            keys::EDIT_MODE_ENABLED => self.options.general.edit_mode_enabled = value,
            keys::TUTORIAL_SHOWN => self.options.general.tutorial_shown = value,
            keys::QUICK_EDIT_ENABLED => self.options.controls.quick_edit_enabled = value,
            _ => log::warn!("TomlConfigStore: ignoring unknown bool option '{key}'"),
        }
    }

    fn get_f32(&self, key: &str, default: f32) -> f32 {
        match key {
            keys::MAX_RAY_DISTANCE => self.options.selection.max_ray_distance,
            keys::SPHERE_RADIUS => self.options.selection.sphere_radius,
            _ => {
                log::trace!("TomlConfigStore: unknown float option '{key}'");
                default
            }
        }
    }

    fn set_f32(&mut self, key: &str, value: f32) {
        match key {
            keys::MAX_RAY_DISTANCE => self.options.selection.max_ray_distance = value,
            keys::SPHERE_RADIUS => self.options.selection.sphere_radius = value,
            _ => log::warn!("TomlConfigStore: ignoring unknown float option '{key}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_populated() {
        let store = TomlConfigStore::in_memory();
        assert!(store.get_bool(keys::QUICK_EDIT_ENABLED, false));
        assert!(!store.get_bool(keys::EDIT_MODE_ENABLED, true));
        assert_eq!(
            store.get_f32(keys::MAX_RAY_DISTANCE, 0.0),
            DEFAULT_MAX_RAY_DISTANCE
        );
        assert_eq!(store.get_f32(keys::SPHERE_RADIUS, 0.0), DEFAULT_SPHERE_RADIUS);
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut store = TomlConfigStore::in_memory();
        store.set_bool(keys::QUICK_EDIT_ENABLED, false);
        store.set_f32(keys::SPHERE_RADIUS, 42.0);
        assert!(!store.get_bool(keys::QUICK_EDIT_ENABLED, true));
        assert_eq!(store.get_f32(keys::SPHERE_RADIUS, 0.0), 42.0);
    }

    #[test]
    fn unknown_keys_fall_back_to_caller_default() {
        let mut store = TomlConfigStore::in_memory();
        assert!(store.get_bool("general:no-such-option", true));
        assert_eq!(store.get_f32("general:no-such-option", 7.0), 7.0);
        // Writes to unknown keys are dropped, not stored.
        store.set_bool("general:no-such-option", false);
        assert!(store.get_bool("general:no-such-option", true));
    }

    #[test]
    fn partial_toml_fills_missing_fields_with_defaults() {
        let options: EditorOptions = toml::from_str(
            "[controls]\n\
             quick_edit_enabled = false\n",
        )
        .unwrap();
        assert!(!options.controls.quick_edit_enabled);
        assert_eq!(options.selection.max_ray_distance, DEFAULT_MAX_RAY_DISTANCE);
        assert!(!options.general.tutorial_shown);
    }

    #[test]
    fn options_serialize_to_toml() {
        let options = EditorOptions::default();
        let text = toml::to_string_pretty(&options).unwrap();
        assert!(text.contains("quick_edit_enabled = true"));
        let back: EditorOptions = toml::from_str(&text).unwrap();
        assert!(back.controls.quick_edit_enabled);
    }

    #[test]
    fn load_or_default_survives_missing_file() {
        let store = TomlConfigStore::load_or_default(Path::new("/nonexistent/vredit.toml"));
        assert!(store.get_bool(keys::QUICK_EDIT_ENABLED, false));
    }
}
