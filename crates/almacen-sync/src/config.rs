//! # Console Configuration
//!
//! Resolved once at process start and handed to the [`Console`](crate::Console)
//! explicitly. Nothing reads a base URL from global state.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ALMACEN_API_URL=https://api.example.com/api/                       │
//! │     ALMACEN_EXPORT_DIR=/srv/exports                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config PATH, or ~/.config/almacen/console.toml (Linux)           │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! base_url = "http://localhost:3000/api/"
//! timeout_secs = 15
//! retry_max_elapsed_secs = 10   # 0 disables GET retries
//!
//! [export]
//! output_dir = "exports"
//! branding_image = "logo.png"
//! company_name = "Almacén Central"
//! rows_per_batch = 200
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// API Settings
// =============================================================================

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every resource path is joined onto.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Upper bound for GET retries (seconds). 0 disables retries.
    #[serde(default = "default_retry_max_elapsed")]
    pub retry_max_elapsed_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000/api/".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_retry_max_elapsed() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            retry_max_elapsed_secs: default_retry_max_elapsed(),
        }
    }
}

impl ApiConfig {
    /// Parsed base URL with a trailing slash, so `join("products")` appends.
    pub fn endpoint(&self) -> SyncResult<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }

        let url = Url::parse(&raw)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(SyncError::InvalidUrl(format!(
                "API URL must use http:// or https://, got: {}",
                other
            ))),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `None` when retries are disabled.
    pub fn retry_max_elapsed(&self) -> Option<Duration> {
        (self.retry_max_elapsed_secs > 0).then(|| Duration::from_secs(self.retry_max_elapsed_secs))
    }
}

// =============================================================================
// Export Settings
// =============================================================================

/// Where and how reports are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Optional logo drawn in the header band.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding_image: Option<PathBuf>,

    #[serde(default = "default_company_name")]
    pub company_name: String,

    /// Workbook rows written per batch.
    #[serde(default = "default_rows_per_batch")]
    pub rows_per_batch: usize,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_company_name() -> String {
    "Almacén".to_string()
}

fn default_rows_per_batch() -> usize {
    200
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            output_dir: default_output_dir(),
            branding_image: None,
            company_name: default_company_name(),
            rows_per_batch: default_rows_per_batch(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete console configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

impl ConsoleConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (console.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading console config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load console config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Console config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        self.api.endpoint()?;

        if self.api.timeout_secs == 0 {
            return Err(SyncError::InvalidConfig("timeout_secs must be greater than 0".into()));
        }

        if self.export.rows_per_batch == 0 {
            return Err(SyncError::InvalidConfig("rows_per_batch must be greater than 0".into()));
        }

        if self.export.company_name.trim().is_empty() {
            return Err(SyncError::InvalidConfig("company_name must not be empty".into()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `ALMACEN_*` overrides from `lookup`.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("ALMACEN_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(timeout) = lookup("ALMACEN_API_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.api.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid ALMACEN_API_TIMEOUT_SECS"),
            }
        }

        if let Some(dir) = lookup("ALMACEN_EXPORT_DIR") {
            debug!(dir = %dir, "Overriding export directory from environment");
            self.export.output_dir = PathBuf::from(dir);
        }

        if let Some(image) = lookup("ALMACEN_BRANDING_IMAGE") {
            self.export.branding_image = Some(PathBuf::from(image));
        }

        if let Some(name) = lookup("ALMACEN_COMPANY_NAME") {
            self.export.company_name = name;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "almacen").map(|dirs| dirs.config_dir().join("console.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ConsoleConfig::default();
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.export.rows_per_batch, 200);
        assert_eq!(config.export.company_name, "Almacén");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_gets_trailing_slash() {
        let api = ApiConfig {
            base_url: "https://tienda.example.com/api".into(),
            ..Default::default()
        };
        let url = api.endpoint().unwrap();
        assert_eq!(url.join("products").unwrap().as_str(), "https://tienda.example.com/api/products");
    }

    #[test]
    fn test_config_validation() {
        let mut config = ConsoleConfig::default();

        config.api.base_url = "ftp://files".into();
        assert!(config.validate().unwrap_err().is_config_error());

        config.api.base_url = "not a url".into();
        assert!(config.validate().is_err());

        config.api.base_url = default_base_url();
        config.export.rows_per_batch = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("ALMACEN_API_URL", "https://prod.example.com/"),
            ("ALMACEN_API_TIMEOUT_SECS", "nope"),
            ("ALMACEN_EXPORT_DIR", "/tmp/reportes"),
            ("ALMACEN_COMPANY_NAME", "Ferretería Sur"),
        ]
        .into_iter()
        .collect();

        let mut config = ConsoleConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "https://prod.example.com/");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.export.output_dir, PathBuf::from("/tmp/reportes"));
        assert_eq!(config.export.company_name, "Ferretería Sur");
        assert!(config.export.branding_image.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ConsoleConfig = toml::from_str("[export]\ncompany_name = \"Kiosco\"\n").unwrap();
        assert_eq!(config.export.company_name, "Kiosco");
        assert_eq!(config.api, ApiConfig::default());
        assert_eq!(config.api.retry_max_elapsed(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_toml_serialization() {
        let config = ConsoleConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[export]"));
    }
}
