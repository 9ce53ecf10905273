use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use sb_core::{HEATMAP_WEEKS, MAX_HEATMAP_WEEKS};

use crate::error::{Result, StoreError};

/// User preferences kept in `config.toml` next to the profile databases.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sound_enabled: bool,
    pub sound_volume: f64,
    pub animations_enabled: bool,
    pub heatmap_weeks: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            sound_volume: 0.3,
            animations_enabled: true,
            heatmap_weeks: HEATMAP_WEEKS,
        }
    }
}

impl Settings {
    pub const KEYS: [&'static str; 4] = [
        "sound_enabled",
        "sound_volume",
        "animations_enabled",
        "heatmap_weeks",
    ];

    /// Read settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        let mut settings: Settings = toml::from_str(&raw).map_err(|e| {
            StoreError::Config(format!("{}: {e}", path.display()))
        })?;
        settings.clamp();
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = toml::to_string_pretty(self)
            .map_err(|e| StoreError::Config(format!("failed to encode: {e}")))?;
        fs::write(path, raw).map_err(|e| StoreError::io(path, e))
    }

    /// Assign one setting from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "sound_enabled" => self.sound_enabled = parse_value(key, value)?,
            "sound_volume" => self.sound_volume = parse_value(key, value)?,
            "animations_enabled" => self.animations_enabled = parse_value(key, value)?,
            "heatmap_weeks" => self.heatmap_weeks = parse_value(key, value)?,
            _ => {
                return Err(StoreError::Config(format!(
                    "unknown setting '{key}' (expected one of: {})",
                    Self::KEYS.join(", ")
                )));
            }
        }
        self.clamp();
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "sound_enabled" => Some(self.sound_enabled.to_string()),
            "sound_volume" => Some(self.sound_volume.to_string()),
            "animations_enabled" => Some(self.animations_enabled.to_string()),
            "heatmap_weeks" => Some(self.heatmap_weeks.to_string()),
            _ => None,
        }
    }

    fn clamp(&mut self) {
        self.sound_volume = if self.sound_volume.is_finite() {
            self.sound_volume.clamp(0.0, 1.0)
        } else {
            0.3
        };
        self.heatmap_weeks = self.heatmap_weeks.clamp(1, MAX_HEATMAP_WEEKS);
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| StoreError::Config(format!("invalid value for {key}: {e}")))
}
