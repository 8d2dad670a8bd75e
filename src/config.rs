use crate::error::{FxError, Result};
use crate::palette::{Rgb, parse_hex_color};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Per-effect knobs: the ambient creation budget and the spawn threshold
/// a uniform draw must exceed for a triggered spawn.
///
/// Only banshee pointer wisps and bow arrows spawn on a draw, so the other
/// effects ignore `spawn_threshold`. The emblem builds two clouds and gives
/// each of them `count` points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub count: usize,
    pub spawn_threshold: f32,
}

impl Tuning {
    pub fn defaults_for(effect: &str) -> Self {
        let (count, spawn_threshold) = match effect {
            "banshee" => (100, 0.7),
            "runes" => (15, 1.0),
            "portal" => (20, 1.0),
            "realm" => (100, 1.0),
            "bow" => (20, 0.994),
            "emblem" => (500, 1.0),
            _ => (50, 1.0),
        };
        Self { count, spawn_threshold }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TuningOverride {
    count: Option<usize>,
    spawn_threshold: Option<f32>,
}

/// Optional JSON config file. Command-line flags take precedence.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub seed: Option<u64>,
    pub bg_color: Option<String>,
    effects: HashMap<String, TuningOverride>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| FxError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| FxError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn tuning(&self, effect: &str) -> Tuning {
        let mut tuning = Tuning::defaults_for(effect);
        if let Some(over) = self.effects.get(effect) {
            if let Some(count) = over.count {
                tuning.count = count;
            }
            if let Some(threshold) = over.spawn_threshold {
                tuning.spawn_threshold = threshold.clamp(0.0, 1.0);
            }
        }
        tuning
    }

    pub fn background(&self) -> Result<Option<Rgb>> {
        match &self.bg_color {
            None => Ok(None),
            Some(hex) => parse_hex_color(hex)
                .map(Some)
                .ok_or_else(|| FxError::InvalidColor(hex.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("{}").unwrap();
        assert_eq!(config.seed, None);
        assert_eq!(config.tuning("banshee"), Tuning { count: 100, spawn_threshold: 0.7 });
        assert_eq!(config.tuning("runes").count, 15);
    }

    #[test]
    fn overrides_apply_per_effect() {
        let config = Config::parse(
            r#"{
                "seed": 42,
                "bg_color": "1a1b26",
                "effects": { "banshee": { "count": 40, "spawn_threshold": 1.5 } }
            }"#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.background().unwrap(), Some((0x1a, 0x1b, 0x26)));
        assert_eq!(config.tuning("banshee"), Tuning { count: 40, spawn_threshold: 1.0 });
        assert_eq!(config.tuning("portal").count, 20);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse(r#"{ "sed": 1 }"#).is_err());
        assert!(Config::parse(r#"{ "effects": { "bow": { "cnt": 1 } } }"#).is_err());
    }

    #[test]
    fn bad_color_is_an_error() {
        let config = Config::parse(r#"{ "bg_color": "nope" }"#).unwrap();
        assert!(matches!(config.background(), Err(FxError::InvalidColor(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
