use crate::logging;
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

/// Environment variable that overrides the configured submission base URL.
pub const API_URL_ENV: &str = "PROMESA_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
struct Settings {
    api_base_url: String,
}

/// Runtime configuration: the base URL of the submission backend. Loaded
/// from `configuration.json` under the app data directory, with the
/// environment variable taking precedence. There is no other
/// environment-dependent behavior.
#[derive(Debug, Clone)]
pub struct Config {
    settings: Settings,
    filepath: PathBuf,
}

impl Config {
    pub fn new() -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        let filepath = prefix.join("configuration.json");

        let mut settings = Settings::default();
        if filepath.exists() {
            let config_str = fs::read_to_string(&filepath)?;
            match serde_json::from_str::<Settings>(&config_str) {
                Ok(user_settings) => settings = user_settings,
                Err(err) => logging::warn(format!(
                    "Could not parse {}: {}",
                    filepath.display(),
                    err
                )),
            }
        }

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                settings.api_base_url = url.trim().to_string();
            }
        }
        if settings.api_base_url.is_empty() {
            logging::warn(format!(
                "No submission URL configured; set {API_URL_ENV} or edit {}",
                filepath.display()
            ));
        }

        Ok(Self { settings, filepath })
    }

    /// Configuration pinned to a known base URL, bypassing file and
    /// environment lookup.
    pub fn with_base_url(url: &str) -> Self {
        Self {
            settings: Settings {
                api_base_url: url.to_string(),
            },
            filepath: PathBuf::new(),
        }
    }

    #[doc(hidden)]
    pub fn for_tests(url: &str) -> Self {
        Self::with_base_url(url)
    }

    pub fn api_base_url(&self) -> &str {
        &self.settings.api_base_url
    }

    /// Persist the current settings to the configuration file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.filepath.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.filepath, serialized)?;
        Ok(())
    }
}

pub fn get_app_data_prefix() -> Result<PathBuf> {
    if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(config_home).join("promesa"));
    }
    if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(&home).join(".config").join("promesa");
        if path.exists() {
            return Ok(path);
        }
        return Ok(PathBuf::from(home).join(".promesa"));
    }
    if let Some(user_profile) = std::env::var_os("USERPROFILE") {
        return Ok(PathBuf::from(user_profile).join(".promesa"));
    }

    Err(eyre::eyre!(
        "Could not determine application data directory"
    ))
}
