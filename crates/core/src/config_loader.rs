use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration by merging defaults, TOML, and
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml")
    }

    /// Loads configuration from a specific TOML file path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("APP_").split("__"))
            .extract()?;

        Ok(config)
    }
}
