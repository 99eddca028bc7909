use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::WarehouseError;

/// Environment variable holding the warehouse database path or DSN.
/// Takes precedence over every `warehouse.toml` on disk.
pub const WAREHOUSE_ENV: &str = "MARKET_MAP_WAREHOUSE";

const CONFIG_FILE_NAME: &str = "warehouse.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WarehouseConfig {
    /// Path to the DuckDB database file, or `:memory:`.
    pub database: String,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    warehouse: WarehouseConfig,
}

/// Resolves warehouse credentials, in order: the [`WAREHOUSE_ENV`]
/// environment variable, `~/.config/market-map/warehouse.toml`, then
/// `./warehouse.toml`.
///
/// # Errors
///
/// * `WarehouseError::NoCredentials` if no source yields a configuration
/// * `WarehouseError::Config` if a config file exists but fails to parse
/// * `WarehouseError::Io` if a config file exists but cannot be read
pub fn resolve() -> Result<WarehouseConfig, WarehouseError> {
    if let Ok(dsn) = std::env::var(WAREHOUSE_ENV) {
        if !dsn.trim().is_empty() {
            log::debug!("using warehouse database from {WAREHOUSE_ENV}");
            return Ok(WarehouseConfig { database: dsn });
        }
    }

    let searched = candidate_paths();

    for path in &searched {
        if path.is_file() {
            log::debug!("reading warehouse config from {}", path.display());
            let contents = std::fs::read_to_string(path)?;
            return parse_config(&contents, path);
        }
    }

    Err(WarehouseError::NoCredentials { searched })
}

/// Config file locations, in resolution order.
#[must_use]
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(2);

    if let Some(home) = home_dir() {
        paths.push(
            home.join(".config")
                .join("market-map")
                .join(CONFIG_FILE_NAME),
        );
    }

    paths.push(PathBuf::from(CONFIG_FILE_NAME));

    paths
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

fn parse_config(contents: &str, path: &Path) -> Result<WarehouseConfig, WarehouseError> {
    let file: ConfigFile =
        toml::from_str(contents).map_err(|source| WarehouseError::Config {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;

    Ok(file.warehouse)
}
