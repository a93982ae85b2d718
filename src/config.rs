use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::DirectoryCopy;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub content_store: ContentStoreSettings,
    #[serde(default)]
    pub geocoder: GeocoderSettings,
    #[serde(default)]
    pub directory: DirectorySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// Headless content store connection
#[derive(Debug, Clone, Deserialize)]
pub struct ContentStoreSettings {
    pub project_id: String,
    pub dataset: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Read through the store's CDN; also enables the local response cache
    #[serde(default)]
    pub use_cdn: bool,
    pub token: Option<String>,
    /// Overrides the host derived from `project_id`
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_size")]
    pub cache_size: u64,
}

impl ContentStoreSettings {
    /// Settings for a store at a fixed base URL, CDN off
    pub fn with_base_url(base_url: impl Into<String>, project_id: &str, dataset: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            dataset: dataset.to_string(),
            api_version: default_api_version(),
            use_cdn: false,
            token: None,
            base_url: Some(base_url.into()),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_size: default_cache_size(),
        }
    }
}

fn default_api_version() -> String { "2025-01-01".to_string() }
fn default_timeout_secs() -> u64 { 10 }
fn default_cache_ttl_secs() -> u64 { 60 }
fn default_cache_size() -> u64 { 256 }

/// Postcode lookup service
#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderSettings {
    #[serde(default = "default_geocoder_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_geocoder_url() -> String { "https://api.postcodes.io".to_string() }

/// Fallback heading copy for the listing page
#[derive(Debug, Clone, Deserialize)]
pub struct DirectorySettings {
    #[serde(default = "default_title")]
    pub default_title: String,
    #[serde(default = "default_subtitle")]
    pub default_subtitle: String,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            default_title: default_title(),
            default_subtitle: default_subtitle(),
        }
    }
}

impl DirectorySettings {
    pub fn copy(&self) -> DirectoryCopy {
        DirectoryCopy {
            title: self.default_title.clone(),
            subtitle: self.default_subtitle.clone(),
        }
    }
}

fn default_title() -> String { DirectoryCopy::default().title }
fn default_subtitle() -> String { DirectoryCopy::default().subtitle }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with CARE_)
    /// 5. The content store's conventional SANITY_* variables
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CARE__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("CARE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("CARE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.content_store.project_id.trim().is_empty() {
            return Err(ConfigError::Message("content_store.project_id must not be empty".into()));
        }
        if self.content_store.dataset.trim().is_empty() {
            return Err(ConfigError::Message("content_store.dataset must not be empty".into()));
        }
        Ok(())
    }
}

/// Apply the store's conventional environment variables on top of the layered config
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let overrides = [
        ("content_store.project_id", "SANITY_PROJECT_ID"),
        ("content_store.dataset", "SANITY_DATASET"),
        ("content_store.api_version", "SANITY_API_VERSION"),
        ("content_store.token", "SANITY_API_TOKEN"),
    ];

    let mut builder = Config::builder().add_source(settings);
    for (key, var) in overrides {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<Settings, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    #[test]
    fn test_defaults_fill_optional_sections() {
        let settings = from_toml(
            r#"
            [content_store]
            project_id = "abc123"
            dataset = "production"
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.content_store.api_version, "2025-01-01");
        assert!(!settings.content_store.use_cdn);
        assert_eq!(settings.geocoder.base_url, "https://api.postcodes.io");
        assert_eq!(settings.directory.default_title, "Care Directory");
    }

    #[test]
    fn test_missing_content_store_is_an_error() {
        assert!(from_toml("[server]\nport = 9000\n").is_err());
    }

    #[test]
    fn test_blank_dataset_is_an_error() {
        let result = from_toml(
            r#"
            [content_store]
            project_id = "abc123"
            dataset = " "
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }
}
