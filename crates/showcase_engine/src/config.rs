use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::app::{LayoutConstants, DEFAULT_MAX_SCALE, DEFAULT_MIN_FONT_SIZE};

pub const CONFIG_FILE_NAME: &str = "showcase.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at '{field}': {source}")]
    Parse {
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables for layout, occupancy and timing. Every field is optional in
/// the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ShowcaseConfig {
    pub base_width: f32,
    pub base_height: f32,
    pub room_width: f32,
    pub room_height: f32,
    pub rooms_per_floor: u32,
    pub max_floors: u32,
    pub max_scale: f32,
    pub min_font_size: f32,
    pub resize_transition_ms: u64,
    pub fade_duration_ms: u64,
    pub display_duration_ms: u64,
    pub background_color: u32,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            base_width: 1200.0,
            base_height: 800.0,
            room_width: 800.0,
            room_height: 450.0,
            rooms_per_floor: 3,
            max_floors: 5,
            max_scale: DEFAULT_MAX_SCALE,
            min_font_size: DEFAULT_MIN_FONT_SIZE,
            resize_transition_ms: 300,
            fade_duration_ms: 1000,
            display_duration_ms: 2000,
            background_color: 0x1a1a2e,
        }
    }
}

impl ShowcaseConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config: Self = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let field = error.path().to_string();
            ConfigError::Parse {
                field,
                source: error.into_inner(),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// A missing file means defaults; a present but broken file is an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            info!(path = %path.display(), "config_defaults_used");
            return Ok(Self::default());
        }
        let config = Self::load(path)?;
        info!(path = %path.display(), "config_loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("baseWidth", self.base_width)?;
        positive("baseHeight", self.base_height)?;
        positive("roomWidth", self.room_width)?;
        positive("roomHeight", self.room_height)?;
        positive("maxScale", self.max_scale)?;
        if !self.min_font_size.is_finite() || self.min_font_size < 0.0 {
            return Err(ConfigError::Invalid {
                field: "minFontSize",
                reason: format!("must be a non-negative number, got {}", self.min_font_size),
            });
        }
        if self.rooms_per_floor == 0 {
            return Err(ConfigError::Invalid {
                field: "roomsPerFloor",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_floors == 0 {
            return Err(ConfigError::Invalid {
                field: "maxFloors",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.background_color > 0xff_ff_ff {
            return Err(ConfigError::Invalid {
                field: "backgroundColor",
                reason: format!("expected 0xRRGGBB, got {:#x}", self.background_color),
            });
        }
        Ok(())
    }

    pub fn layout_constants(&self) -> LayoutConstants {
        LayoutConstants {
            base_width: self.base_width,
            base_height: self.base_height,
            room_width: self.room_width,
            room_height: self.room_height,
            max_scale: self.max_scale,
            min_font_size: self.min_font_size,
        }
    }

    pub fn resize_transition(&self) -> Duration {
        Duration::from_millis(self.resize_transition_ms)
    }

    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms)
    }

    pub fn display_duration(&self) -> Duration {
        Duration::from_millis(self.display_duration_ms)
    }

    pub fn background_rgba(&self) -> [u8; 4] {
        let [_, r, g, b] = self.background_color.to_be_bytes();
        [r, g, b, 0xff]
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be a positive number, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_layout() {
        let config = ShowcaseConfig::default();
        let constants = config.layout_constants();

        assert_eq!(constants, LayoutConstants::default());
        assert_eq!(config.rooms_per_floor, 3);
        assert_eq!(config.max_floors, 5);
        assert_eq!(config.resize_transition(), Duration::from_millis(300));
        assert_eq!(config.fade_duration(), Duration::from_millis(1000));
        assert_eq!(config.background_rgba(), [0x1a, 0x1a, 0x2e, 0xff]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let config = ShowcaseConfig::from_json_str(r#"{ "roomsPerFloor": 4, "maxScale": 1.5 }"#)
            .expect("partial config");

        assert_eq!(config.rooms_per_floor, 4);
        assert_eq!(config.max_scale, 1.5);
        assert_eq!(config.base_width, 1200.0);
        assert_eq!(config.max_floors, 5);
    }

    #[test]
    fn parse_error_reports_field_path() {
        let error = ShowcaseConfig::from_json_str(r#"{ "maxFloors": "many" }"#)
            .expect_err("wrong type");

        match error {
            ConfigError::Parse { field, .. } => assert_eq!(field, "maxFloors"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = ShowcaseConfig::from_json_str(r#"{ "roomsPerFlor": 4 }"#)
            .expect_err("typo in key");
        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn validation_rejects_zero_rooms_and_non_positive_sizes() {
        let error = ShowcaseConfig::from_json_str(r#"{ "roomsPerFloor": 0 }"#)
            .expect_err("zero rooms");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                field: "roomsPerFloor",
                ..
            }
        ));

        let config = ShowcaseConfig {
            base_height: -1.0,
            ..ShowcaseConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "baseHeight",
                ..
            })
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config =
            ShowcaseConfig::load_or_default(&dir.path().join(CONFIG_FILE_NAME)).expect("defaults");
        assert_eq!(config, ShowcaseConfig::default());
    }

    #[test]
    fn present_file_is_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{ "backgroundColor": 1193046 }"#).expect("write config");

        let config = ShowcaseConfig::load_or_default(&path).expect("load");
        assert_eq!(config.background_rgba(), [0x12, 0x34, 0x56, 0xff]);
    }
}
