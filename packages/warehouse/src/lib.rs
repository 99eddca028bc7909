#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

pub mod assemble;
pub mod config;
pub mod db;
pub mod queries;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WarehouseError {
    /// No connection string was found in the environment, the user config
    /// dir, or the working directory.
    #[error(
        "no warehouse configuration found; set {env} or create one of: {}",
        format_searched(searched),
        env = config::WAREHOUSE_ENV
    )]
    NoCredentials { searched: Vec<PathBuf> },
    /// A `warehouse.toml` was found but could not be parsed.
    #[error("invalid warehouse config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
    #[error(transparent)]
    Database(#[from] duckdb::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_searched(searched: &[PathBuf]) -> String {
    searched
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
