//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Session defaults (technique, haptics, sound mode, sleep auto-mute)
//! - Daily practice goals per technique
//! - Custom techniques and presets merged over the built-in catalog
//!
//! Configuration is stored at `~/.config/breathwork/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::catalog::{Catalog, Preset, Technique};
use crate::error::{ConfigError, CoreError};

/// Audio behaviour passed through to the audio collaborator with every cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundMode {
    Off,
    #[default]
    Tones,
    /// Tones plus the technique's binaural beat.
    Binaural,
}

/// Runtime flags the session controller consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_technique")]
    pub default_technique: String,
    #[serde(default = "default_true")]
    pub haptics_enabled: bool,
    #[serde(default)]
    pub sound_mode: SoundMode,
    /// Switch sound off once the session crosses the sleep threshold.
    #[serde(default = "default_true")]
    pub sleep_auto_mute: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breathwork/config.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionSettings,
    /// Daily target minutes per technique id.
    #[serde(default)]
    pub goals: BTreeMap<String, u32>,
    #[serde(default)]
    pub techniques: Vec<Technique>,
    #[serde(default)]
    pub presets: Vec<Preset>,
}

fn default_technique() -> String {
    "box".into()
}
fn default_true() -> bool {
    true
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_technique: default_technique(),
            haptics_enabled: true,
            sound_mode: SoundMode::default(),
            sleep_auto_mute: true,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        if key.is_empty() {
            return Err(invalid("config key is empty".into()));
        }

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current
                    .get_mut(part)
                    .ok_or_else(|| invalid("unknown config key".into()))?;
                continue;
            }

            // `goals` is an open map, so new leaves are allowed there.
            let open_map = key.starts_with("goals.");
            let obj = current
                .as_object_mut()
                .ok_or_else(|| invalid("unknown config key".into()))?;
            let new_value = match obj.get(part) {
                Some(serde_json::Value::Bool(_)) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                ),
                Some(serde_json::Value::Number(_)) => parse_number(value)
                    .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                None if open_map => parse_number(value)
                    .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                Some(serde_json::Value::Object(_) | serde_json::Value::Array(_)) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                Some(_) => serde_json::Value::String(value.into()),
                None => return Err(invalid("unknown config key".into())),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(invalid("unknown config key".into()))
    }

    /// Location of the config file.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(&Self::path()?)
    }

    /// # Errors
    /// See [`load`](Self::load).
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
                .into()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    /// See [`save`](Self::save).
    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without saving.
    ///
    /// # Errors
    /// [`ConfigError::InvalidValue`] for an unknown key or a value that does
    /// not fit the field. The config is unchanged in that case.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// The built-in catalog with this config's custom entries merged in.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if a custom entry is invalid.
    pub fn catalog(&self) -> Result<Catalog, ConfigError> {
        Catalog::with_custom(self.techniques.clone(), self.presets.clone())
    }
}

fn parse_number(value: &str) -> Option<serde_json::Value> {
    if let Ok(n) = value.parse::<u64>() {
        return Some(serde_json::Value::Number(n.into()));
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.session.default_technique, "box");
        assert!(parsed.session.sleep_auto_mute);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [session]
            sound_mode = "binaural"

            [goals]
            "4-7-8" = 10
            "#,
        )
        .unwrap();
        assert_eq!(cfg.session.sound_mode, SoundMode::Binaural);
        assert!(cfg.session.haptics_enabled);
        assert_eq!(cfg.goals.get("4-7-8"), Some(&10));
    }

    #[test]
    fn custom_technique_joins_catalog() {
        let cfg: Config = toml::from_str(
            r#"
            [[techniques]]
            id = "long-exhale"
            name = "Long Exhale"
            steps = [
                { action = "inhale", duration_ms = 3000, scale = 1.5, text = "In", vibration = 40 },
                { action = "exhale", duration_ms = 9000, scale = 1.0, text = "Out", vibration = [20, 80, 20] },
            ]

            [[presets]]
            id = "exhale-then-box"
            name = "Exhale then box"
            segments = [
                { technique_id = "long-exhale", duration_secs = 60 },
                { technique_id = "box", duration_secs = 120 },
            ]
            "#,
        )
        .unwrap();
        let catalog = cfg.catalog().unwrap();
        let t = catalog.technique("long-exhale").unwrap();
        assert_eq!(t.cycle_duration_ms(), 12_000);
        assert_eq!(catalog.preset("exhale-then-box").unwrap().total_duration_secs(), 180);
        assert!(catalog.technique("box").is_ok());
    }

    #[test]
    fn get_and_set_by_dot_path() {
        let mut cfg = Config::default();
        assert_eq!(cfg.get("session.haptics_enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("session.sound_mode").as_deref(), Some("tones"));

        cfg.set("session.haptics_enabled", "false").unwrap();
        cfg.set("session.sound_mode", "off").unwrap();
        cfg.set("goals.box", "15").unwrap();
        assert!(!cfg.session.haptics_enabled);
        assert_eq!(cfg.session.sound_mode, SoundMode::Off);
        assert_eq!(cfg.goals.get("box"), Some(&15));
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("session.volume", "3"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("session.sound_mode", "loud").is_err());
        assert!(cfg.set("session.haptics_enabled", "maybe").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut cfg = cfg;
        cfg.set("session.default_technique", "coherent").unwrap();
        cfg.save_to(&path).unwrap();
        assert_eq!(
            Config::load_from(&path).unwrap().session.default_technique,
            "coherent"
        );
    }

    #[test]
    fn malformed_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "session = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(CoreError::Config(ConfigError::LoadFailed { .. }))
        ));
    }
}
