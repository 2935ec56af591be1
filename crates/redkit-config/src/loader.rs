//! Configuration loader with layered sources.

use crate::properties::PropertiesSource;
use crate::{format_validation_errors, AppConfig, ConfigValidator};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use redkit_core::{RedkitError, RedkitResult};
use std::path::Path;
use tracing::{debug, info};

type Builder = ConfigBuilder<DefaultState>;

/// Name of the legacy properties file looked up in the config directory.
pub const PROPERTIES_FILE: &str = "redis.properties";

/// Loads [`AppConfig`] once at startup.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: AppConfig,
}

impl ConfigLoader {
    /// Loads configuration from a directory.
    ///
    /// Sources are applied in order, later ones winning:
    /// 1. `{dir}/default.toml`
    /// 2. `{dir}/{environment}.toml` (`REDKIT_ENVIRONMENT`, default `development`)
    /// 3. `{dir}/redis.properties`
    /// 4. `{dir}/local.toml` - not committed to version control
    /// 5. Environment variables with the `REDKIT__` prefix, e.g. `REDKIT__REDIS__HOST`
    pub fn new(config_dir: impl AsRef<Path>) -> RedkitResult<Self> {
        let config_dir = config_dir.as_ref();

        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("REDKIT_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        info!(
            config_dir = %config_dir.display(),
            environment = %environment,
            "Loading configuration"
        );

        let mut builder = Config::builder();
        builder = Self::add_toml(builder, config_dir, "default");
        builder = Self::add_toml(builder, config_dir, &environment);
        builder = builder
            .add_source(PropertiesSource::new(config_dir.join(PROPERTIES_FILE)).required(false));
        builder = Self::add_toml(builder, config_dir, "local");

        let builder = builder
            .add_source(
                Environment::with_prefix("REDKIT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override("app.environment", environment)
            .map_err(config_error)?;

        Self::finish(builder)
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> RedkitResult<Self> {
        Self::new("./config")
    }

    /// Loads configuration from a single `.properties` file on top of the defaults.
    pub fn from_properties_file(path: impl AsRef<Path>) -> RedkitResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration from properties file");

        let builder = Config::builder().add_source(PropertiesSource::new(path));
        Self::finish(builder)
    }

    /// Returns the loaded configuration.
    #[must_use]
    pub fn get(&self) -> &AppConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    #[must_use]
    pub fn into_config(self) -> AppConfig {
        self.config
    }

    fn add_toml(builder: Builder, config_dir: &Path, name: &str) -> Builder {
        let path = config_dir.join(format!("{}.toml", name));
        if !path.exists() {
            return builder;
        }
        debug!(path = %path.display(), "Loading config file");
        builder.add_source(File::from(path.as_path()).required(false))
    }

    fn finish(builder: Builder) -> RedkitResult<Self> {
        let config: AppConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)?;

        ConfigValidator::validate(&config)
            .map_err(|errors| RedkitError::configuration(format_validation_errors(&errors)))?;

        info!(
            redis = %config.redis.address(),
            database = config.redis.database,
            max_active = config.pool.max_active,
            max_idle = config.pool.max_idle,
            "Configuration loaded"
        );

        Ok(Self { config })
    }
}

fn config_error(err: ConfigError) -> RedkitError {
    RedkitError::configuration(err.to_string())
}
