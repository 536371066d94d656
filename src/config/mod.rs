// brandforge: Branding context and prompt injection for AI site generation
// License: Apache-2.0

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("home directory not found")]
    NoHomeDir,
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Key-value file holding the branding profile, relative to `data_dir`.
    #[serde(default = "default_kv_file")]
    pub kv_file: String,
    /// Object store file holding logo assets, relative to `data_dir`.
    #[serde(default = "default_assets_file")]
    pub assets_file: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_subpath")]
    pub subpath: String,
    /// Empty means the platform download directory.
    #[serde(default)]
    pub downloads_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            kv_file: default_kv_file(),
            assets_file: default_assets_file(),
            namespace: default_namespace(),
            subpath: default_subpath(),
            downloads_dir: String::new(),
        }
    }
}

fn default_data_dir() -> String {
    "~/.brandforge".to_string()
}
fn default_kv_file() -> String {
    "branding.json".to_string()
}
fn default_assets_file() -> String {
    "assets.json".to_string()
}
fn default_namespace() -> String {
    "brandforge".to_string()
}
fn default_subpath() -> String {
    "brand_logos".to_string()
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: String::new(),
        }
    }
}

fn default_relay_url() -> String {
    "http://localhost:5173/api/brandfetch".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptConfig {
    /// Empty means the built-in base prompt.
    #[serde(default)]
    pub base_prompt_file: String,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a JSON file, falling back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str(&contents)?
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Write this configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply environment variable overrides (prefix: BRANDFORGE_)
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("BRANDFORGE_STORAGE_DATA_DIR") {
            self.storage.data_dir = v;
        }
        if let Ok(v) = std::env::var("BRANDFORGE_STORAGE_NAMESPACE") {
            self.storage.namespace = v;
        }
        if let Ok(v) = std::env::var("BRANDFORGE_STORAGE_DOWNLOADS_DIR") {
            self.storage.downloads_dir = v;
        }
        if let Ok(v) = std::env::var("BRANDFORGE_EXTRACTOR_RELAY_URL") {
            self.extractor.relay_url = v;
        }
        if let Ok(v) = std::env::var("BRANDFORGE_EXTRACTOR_TIMEOUT_SECS") {
            if let Ok(n) = v.parse() {
                self.extractor.timeout_secs = n;
            }
        }
        if let Ok(v) = std::env::var("BRANDFORGE_EXTRACTOR_USER_AGENT") {
            self.extractor.user_agent = v;
        }
        if let Ok(v) = std::env::var("BRANDFORGE_PROMPT_BASE_PROMPT_FILE") {
            self.prompt.base_prompt_file = v;
        }
    }

    /// Resolve the data directory, expanding `~` to the home directory.
    pub fn data_path(&self) -> Result<PathBuf, ConfigError> {
        expand_tilde(&self.storage.data_dir)
    }

    pub fn kv_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.data_path()?.join(&self.storage.kv_file))
    }

    pub fn assets_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.data_path()?.join(&self.storage.assets_file))
    }

    /// Where fallback logo downloads go: the configured directory, else the
    /// platform download directory, else `<data_dir>/downloads`.
    pub fn downloads_path(&self) -> Result<PathBuf, ConfigError> {
        if !self.storage.downloads_dir.is_empty() {
            return expand_tilde(&self.storage.downloads_dir);
        }
        match dirs::download_dir() {
            Some(dir) => Ok(dir),
            None => Ok(self.data_path()?.join("downloads")),
        }
    }

    pub fn base_prompt_path(&self) -> Result<Option<PathBuf>, ConfigError> {
        if self.prompt.base_prompt_file.is_empty() {
            return Ok(None);
        }
        expand_tilde(&self.prompt.base_prompt_file).map(Some)
    }

    /// Get the default config file path: ~/.brandforge/config.json
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".brandforge").join("config.json"))
    }

    /// Validate configuration for basic correctness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extractor.relay_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "extractor.relay_url",
                reason: "must not be empty".to_string(),
            });
        }
        if let Err(e) = url::Url::parse(&self.extractor.relay_url) {
            return Err(ConfigError::Invalid {
                field: "extractor.relay_url",
                reason: e.to_string(),
            });
        }
        if self.extractor.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "extractor.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.storage.namespace.trim_matches('/').is_empty() {
            return Err(ConfigError::Invalid {
                field: "storage.namespace",
                reason: "must not be empty".to_string(),
            });
        }
        if self.storage.subpath.trim_matches('/').is_empty() {
            tracing::warn!("storage.subpath is empty, logos will be stored at the namespace root");
        }
        Ok(())
    }
}

fn expand_tilde(path: &str) -> Result<PathBuf, ConfigError> {
    if let Some(stripped) = path.strip_prefix('~') {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(path.strip_prefix("~/").unwrap_or(stripped)))
    } else {
        Ok(PathBuf::from(path))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.storage.data_dir, "~/.brandforge");
        assert_eq!(cfg.storage.namespace, "brandforge");
        assert_eq!(cfg.storage.subpath, "brand_logos");
        assert_eq!(cfg.extractor.timeout_secs, 15);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_json() {
        let json = r#"{"extractor": {"relay_url": "https://relay.example.com/brand"}}"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.extractor.relay_url, "https://relay.example.com/brand");
        assert_eq!(cfg.extractor.timeout_secs, 15);
        assert_eq!(cfg.storage.kv_file, "branding.json");
    }

    #[test]
    fn test_data_path_tilde() {
        let cfg = Config::default();
        let path = cfg.data_path().unwrap();
        assert!(path.to_str().unwrap().contains("brandforge"));
        assert!(!path.to_str().unwrap().starts_with('~'));
        assert!(cfg.kv_path().unwrap().ends_with("branding.json"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.extractor.timeout_secs = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { field: "extractor.timeout_secs", .. })
        ));

        let mut cfg = Config::default();
        cfg.extractor.relay_url = " ".into();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.storage.namespace = "/".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let mut cfg = Config::default();
        cfg.storage.downloads_dir = "/tmp/logos".into();
        cfg.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.storage.downloads_dir, "/tmp/logos");
        assert_eq!(loaded.downloads_path().unwrap(), PathBuf::from("/tmp/logos"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = Config::load(&tmp.path().join("absent.json")).unwrap();
        assert_eq!(cfg.storage.assets_file, "assets.json");
    }

    #[test]
    fn test_env_override_applies_without_file() {
        let tmp = TempDir::new().unwrap();
        std::env::set_var("BRANDFORGE_EXTRACTOR_TIMEOUT_SECS", "42");
        let cfg = Config::load(&tmp.path().join("absent.json")).unwrap();
        std::env::remove_var("BRANDFORGE_EXTRACTOR_TIMEOUT_SECS");
        assert_eq!(cfg.extractor.timeout_secs, 42);
    }
}
