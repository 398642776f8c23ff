//! User configuration loaded from `$XDG_CONFIG_HOME/ssbprep/config.toml`.
//!
//! Every field has a default, so a missing file or a missing section is fine. A file
//! that fails to parse is a soft failure: the caller gets defaults plus the parse
//! error as a warning string to log once logging is up.
//!
//! ```toml
//! [gateway]
//! api_key = "..."            # or GEMINI_API_KEY in the environment
//! model = "gemini-2.5-flash"
//! tts_model = "gemini-2.5-flash-preview-tts"
//! timeout_secs = 60
//!
//! [storage]
//! data_dir = ".ssbprep"
//!
//! [ui]
//! theme = "catppuccin-mocha"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable that overrides `gateway.api_key`.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub storage: StorageConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub tts_model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".into(),
            tts_model: "gemini-2.5-flash-preview-tts".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".into(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Holds the SQLite database, the log file, and synthesized audio.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".ssbprep"),
        }
    }
}

impl StorageConfig {
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("ssbprep.db")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("ssbprep.log")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.data_dir.join("audio")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub theme: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: "catppuccin-mocha".into(),
        }
    }
}

/// Returns the path to the config file.
///
/// Prefers `$XDG_CONFIG_HOME/ssbprep/config.toml`; falls back to
/// `~/.config/ssbprep/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("ssbprep").join("config.toml")
}

impl Config {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the `toml` error message when the text is not valid for this schema.
    pub fn from_toml(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|e| e.to_string())
    }

    /// Loads the config from `path`, applying the API-key environment override.
    ///
    /// Returns the config and an optional warning. A missing file is not a warning.
    pub fn load_from(path: &Path) -> (Self, Option<String>) {
        let (mut cfg, warning) = match std::fs::read_to_string(path) {
            Ok(raw) => match Self::from_toml(&raw) {
                Ok(cfg) => (cfg, None),
                Err(e) => (
                    Self::default(),
                    Some(format!("config parse error in {}: {}", path.display(), e)),
                ),
            },
            Err(_) => (Self::default(), None),
        };
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                cfg.gateway.api_key = Some(key);
            }
        }
        (cfg, warning)
    }

    /// Loads from [`config_path`].
    pub fn load() -> (Self, Option<String>) {
        Self::load_from(&config_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = Config::from_toml("[ui]\ntheme = \"dark\"\n").unwrap();
        assert_eq!(cfg.ui.theme, "dark");
        assert_eq!(cfg.gateway.model, "gemini-2.5-flash");
        assert_eq!(cfg.storage.db_path(), PathBuf::from(".ssbprep/ssbprep.db"));
    }

    #[test]
    fn bad_toml_is_reported_not_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gateway\nmodel = 3").unwrap();
        let (cfg, warning) = Config::load_from(&path);
        assert!(warning.is_some());
        assert_eq!(cfg.gateway.timeout_secs, 60);
    }
}
