use std::path::Path;

use serde::Deserialize;

use crate::error::{EtlError, Result};
use crate::store::DatabaseConfig;

/// Application settings, layered from defaults, an optional
/// `weather-etl.toml` file, and `WEATHER_ETL_*` environment variables
/// (e.g. `WEATHER_ETL_DATABASE__KIND=postgres`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
}

impl AppConfig {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("database.kind", "sqlite")
            .map_err(|e| EtlError::Config(e.to_string()))?
            .set_default("database.path", "weather_data.db")
            .map_err(|e| EtlError::Config(e.to_string()))?;

        builder = match config_file {
            Some(path) => builder.add_source(config::File::from(path.to_path_buf())),
            None => builder.add_source(config::File::with_name("weather-etl").required(false)),
        };

        builder = builder.add_source(
            config::Environment::with_prefix("WEATHER_ETL").separator("__"),
        );

        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| EtlError::Config(e.to_string()))
    }
}
