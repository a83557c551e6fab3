use std::{env, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use revo_engine::ConversionParams;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub version: u32,
    pub weight_root: Option<String>,
    pub index_root: Option<String>,
    pub last_params: ConversionParams,
}

impl AppSettings {
    pub const CURRENT_VERSION: u32 = 1;
    const SETTINGS_PATH: &'static str = "revo_settings.json";

    pub fn load() -> Result<Self> {
        if !Path::new(Self::SETTINGS_PATH).exists() {
            return Ok(Self::default());
        }

        let data = fs::read_to_string(Self::SETTINGS_PATH)
            .context("failed to read settings file")?;
        let settings: AppSettings = serde_json::from_str(&data)
            .context("failed to parse settings file")?;

        if settings.version != Self::CURRENT_VERSION {
            tracing::warn!(
                "Settings version {} does not match current version {}",
                settings.version,
                Self::CURRENT_VERSION
            );
        }

        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        let data = serde_json::to_string_pretty(self)
            .context("failed to serialize settings")?;
        fs::write(Self::SETTINGS_PATH, data)
            .context("failed to write settings file")?;
        Ok(())
    }

    /// Weights directory, with the `weight_root` environment variable
    /// taking precedence over the stored value.
    pub fn resolved_weight_root(&self) -> String {
        env::var("weight_root")
            .ok()
            .or_else(|| self.weight_root.clone())
            .unwrap_or_else(|| "weights".to_string())
    }

    /// Index directory, with the `index_root` environment variable taking
    /// precedence over the stored value.
    pub fn resolved_index_root(&self) -> String {
        env::var("index_root")
            .ok()
            .or_else(|| self.index_root.clone())
            .unwrap_or_else(|| "indexes".to_string())
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            weight_root: None,
            index_root: None,
            last_params: ConversionParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_through_json() {
        let settings = AppSettings {
            weight_root: Some("weights".into()),
            ..AppSettings::default()
        };
        let data = serde_json::to_string(&settings).unwrap();
        let restored: AppSettings = serde_json::from_str(&data).unwrap();
        assert_eq!(restored.version, AppSettings::CURRENT_VERSION);
        assert_eq!(restored.weight_root.as_deref(), Some("weights"));
        assert_eq!(restored.last_params, ConversionParams::default());
    }

    #[test]
    fn stored_roots_are_used_when_env_is_unset() {
        let settings = AppSettings {
            weight_root: Some("my-weights".into()),
            index_root: None,
            ..AppSettings::default()
        };
        // Test processes do not set weight_root/index_root.
        if env::var("weight_root").is_err() {
            assert_eq!(settings.resolved_weight_root(), "my-weights");
        }
        if env::var("index_root").is_err() {
            assert_eq!(settings.resolved_index_root(), "indexes");
        }
    }
}
