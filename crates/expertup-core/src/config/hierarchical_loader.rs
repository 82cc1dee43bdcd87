//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. User config (~/.expertup/config.yaml)
//! 3. Environment variables (EXPERTUP_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::{RuntimeConfig, UpdateConfig};
use crate::utils::get_home_dir;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use serde_yaml_ng::{Mapping, Value};
use std::env;
use std::fs;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// Embedded defaults file
const RUNTIME_DEFAULTS_FILE: &str = "runtime-defaults.yaml";

/// User configuration file name inside the config directory
const USER_CONFIG_FILE: &str = "config.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a new hierarchical config loader
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the standard config directory (~/.expertup)
    fn get_config_dir() -> Result<Utf8PathBuf> {
        let home = get_home_dir()
            .map_err(|_| Error::invalid_config("Could not determine home directory"))?;

        let config_dir = Utf8PathBuf::from_path_buf(home.join(".expertup"))
            .map_err(|p| Error::invalid_config(format!("Non UTF-8 home directory: {:?}", p)))?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        Ok(config_dir)
    }

    /// Load runtime configuration with hierarchical precedence
    ///
    /// The user file is merged key by key over the embedded defaults, so a
    /// file holding a single setting leaves every other default in place.
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        let mut document = Self::load_embedded_config::<Value>(RUNTIME_DEFAULTS_FILE)?;
        let mut source = RUNTIME_DEFAULTS_FILE.to_string();

        let user_config_path = self.user_config_path();
        if user_config_path.exists() {
            debug!("Loading user configuration from {}", user_config_path);
            let overlay = self.load_yaml_file::<Value>(&user_config_path)?;
            Self::merge_values(&mut document, overlay);
            source = user_config_path.to_string();
        }

        let config: RuntimeConfig = serde_yaml_ng::from_value(document)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", source, e)))?;

        self.apply_env_overrides(config)
    }

    /// Persist the update section to the user config file
    ///
    /// Other sections already present in the file are preserved.
    pub fn save_update_config(&self, update: &UpdateConfig) -> Result<()> {
        let path = self.user_config_path();

        let mut document = if path.exists() {
            let content = fs::read_to_string(&path)?;
            match serde_yaml_ng::from_str::<Value>(&content)? {
                Value::Mapping(mapping) => mapping,
                Value::Null => Mapping::new(),
                _ => {
                    return Err(Error::invalid_config(format!(
                        "{} must contain a YAML mapping",
                        path
                    )))
                }
            }
        } else {
            Mapping::new()
        };

        document.insert(
            Value::String("update".to_string()),
            serde_yaml_ng::to_value(update)?,
        );

        fs::create_dir_all(&self.config_dir)?;
        fs::write(&path, serde_yaml_ng::to_string(&Value::Mapping(document))?)?;
        debug!("Saved update settings to {}", path);

        Ok(())
    }

    /// Load an embedded configuration file
    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        let config: T = serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })?;

        Ok(config)
    }

    /// Load a YAML file and parse it
    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let config: T = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        Ok(config)
    }

    /// Deep-merge `overlay` into `base`; mappings merge per key, anything else replaces
    fn merge_values(base: &mut Value, overlay: Value) {
        match (base, overlay) {
            (_, Value::Null) => {}
            (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
                for (key, value) in overlay_map {
                    match base_map.get_mut(&key) {
                        Some(existing) => Self::merge_values(existing, value),
                        None => {
                            base_map.insert(key, value);
                        }
                    }
                }
            }
            (base, overlay) => *base = overlay,
        }
    }

    /// Apply environment variable overrides to runtime config
    fn apply_env_overrides(&self, mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Ok(val) = env::var("EXPERTUP_HTTP_TIMEOUT_SECS") {
            config.network.http_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("EXPERTUP_HTTP_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("EXPERTUP_DOWNLOAD_TIMEOUT_SECS") {
            config.network.download_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("EXPERTUP_DOWNLOAD_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("EXPERTUP_GITHUB_REPO_OWNER") {
            config.github.repo_owner = val;
        }

        if let Ok(val) = env::var("EXPERTUP_GITHUB_REPO_NAME") {
            config.github.repo_name = val;
        }

        if let Ok(val) = env::var("EXPERTUP_GITHUB_API_URL") {
            config.github.api_url = val;
        }

        if let Ok(val) = env::var("EXPERTUP_CHANNEL") {
            config.update.channel = val.parse().map_err(Error::invalid_config)?;
        }

        if let Ok(val) = env::var("EXPERTUP_NOTIFY_ON_AUTO_UPDATE") {
            config.update.notify_on_auto_update = val.parse().map_err(|_| {
                Error::invalid_config("EXPERTUP_NOTIFY_ON_AUTO_UPDATE must be true or false")
            })?;
        }

        if let Ok(val) = env::var("EXPERTUP_NO_COLOR") {
            config.display.color_enabled = !val.parse().unwrap_or(false);
        }

        Ok(config)
    }

    /// Path of the user config file
    pub fn user_config_path(&self) -> Utf8PathBuf {
        self.config_dir.join(USER_CONFIG_FILE)
    }
}
