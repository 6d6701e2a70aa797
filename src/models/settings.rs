//! Runtime settings, read from `osu-lens.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const CLIENT_ID_ENV: &str = "OSU_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "OSU_CLIENT_SECRET";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub pipeline: PipelineSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub oauth_url: String,
    /// Where raw `.osu` files are downloaded from, by beatmap id.
    pub osu_file_base: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://osu.ppy.sh/api/v2".to_string(),
            oauth_url: "https://osu.ppy.sh/oauth/token".to_string(),
            osu_file_base: "https://osu.ppy.sh/osu".to_string(),
            client_id: None,
            client_secret: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Grace period between a reload request and the second cache lookup.
    pub reload_grace_ms: u64,
    /// Container whose direct children are beatmap set rows.
    pub listing_selector: String,
    /// Popup listing the difficulties of one set.
    pub popup_selector: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            reload_grace_ms: 1300,
            listing_selector: ".beatmapsets__items".to_string(),
            popup_selector: ".beatmaps-popup__group".to_string(),
        }
    }
}

impl PipelineSettings {
    pub fn reload_grace(&self) -> Duration {
        Duration::from_millis(self.reload_grace_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { max_entries: 1000 }
    }
}

impl Settings {
    /// Loads settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::info!("SETTINGS: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Environment credentials take precedence over the file.
    pub fn apply_env(&mut self) {
        if let Ok(id) = std::env::var(CLIENT_ID_ENV) {
            self.api.client_id = Some(id);
        }
        if let Ok(secret) = std::env::var(CLIENT_SECRET_ENV) {
            self.api.client_secret = Some(secret);
        }
    }
}
