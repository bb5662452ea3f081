use config::{Config, Environment, File, FileFormat};
use lazy_static::lazy_static;
use serde::Deserialize;
use std::sync::RwLock;

use super::error::{Error, Result};

lazy_static! {
    // Global configuration state, initialized once at startup.
    static ref CONFIG: RwLock<Config> = RwLock::new(Config::default());
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

/// Conversion defaults, overridable from the command line
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    pub num_threads: usize,
    pub dry_run: bool,
}

/// Typed view over the merged configuration sources
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub debug: bool,
    pub log: LogConfig,
    pub convert: ConvertConfig,
}

impl AppConfig {
    /// Initialize the global configuration from the embedded defaults plus
    /// `APP_*` environment overrides.
    pub fn init(default_config: Option<&str>) -> Result<()> {
        let mut builder = Config::builder();

        // Embed default configuration contents
        if let Some(contents) = default_config {
            builder = builder.add_source(File::from_str(contents, FileFormat::Toml));
        }

        // Merge settings with environment variables, e.g. APP_CONVERT__DRY_RUN
        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build()?;

        let mut writer = CONFIG
            .write()
            .map_err(|_| Error::new("Configuration lock poisoned"))?;
        *writer = config;

        Ok(())
    }

    /// Override one key in the global configuration.
    pub fn set(key: &str, value: &str) -> Result<()> {
        let mut writer = CONFIG
            .write()
            .map_err(|_| Error::new("Configuration lock poisoned"))?;

        let updated = Config::builder()
            .add_source(writer.clone())
            .set_override(key, value)?
            .build()?;
        *writer = updated;

        Ok(())
    }

    /// Get a single value by key.
    pub fn get<'de, T>(key: &str) -> Result<T>
    where
        T: Deserialize<'de>,
    {
        let reader = CONFIG
            .read()
            .map_err(|_| Error::new("Configuration lock poisoned"))?;

        Ok(reader.get::<T>(key)?)
    }

    /// Deserialize the whole configuration into the typed `AppConfig` view.
    pub fn fetch() -> Result<AppConfig> {
        let reader = CONFIG
            .read()
            .map_err(|_| Error::new("Configuration lock poisoned"))?;

        Ok(reader.clone().try_deserialize()?)
    }
}
