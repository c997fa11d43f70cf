//! Persistent CLI configuration.

use std::path::{Path, PathBuf};

use beviamo_core::util::{is_http_url, normalize_text_option};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";

pub const ENV_BUCKET_URL: &str = "BEVIAMO_BUCKET_URL";
pub const ENV_TECHNICIAN: &str = "BEVIAMO_TECHNICIAN";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    /// Name recorded as `updatedBy` on shared writes
    #[serde(default)]
    pub technician: Option<String>,
    #[serde(default)]
    pub bucket_base_url: Option<String>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join("beviamo").join(CONFIG_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

pub fn normalize_bucket_url(raw: String) -> Result<String, String> {
    let url = normalize_text_option(Some(raw))
        .ok_or_else(|| "Bucket URL cannot be empty".to_string())?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(format!("Bucket URL must include http:// or https://: {url}"))
    }
}

impl CliConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Bucket URL from the environment, falling back to the config file
    pub fn bucket_base_url(&self) -> Option<String> {
        normalize_text_option(std::env::var(ENV_BUCKET_URL).ok())
            .or_else(|| normalize_text_option(self.bucket_base_url.clone()))
    }

    /// Technician from the environment, falling back to the config file
    pub fn technician(&self) -> Option<String> {
        normalize_text_option(std::env::var(ENV_TECHNICIAN).ok())
            .or_else(|| normalize_text_option(self.technician.clone()))
    }

    fn normalize(&mut self) {
        self.technician = normalize_text_option(self.technician.clone());
        self.bucket_base_url = normalize_text_option(self.bucket_base_url.clone())
            .map(|url| url.trim_end_matches('/').to_string());
    }
}
