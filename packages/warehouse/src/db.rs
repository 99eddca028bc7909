use duckdb::Connection;

use crate::{WarehouseError, config::WarehouseConfig};

/// Opens the DuckDB database named by the resolved configuration.
///
/// # Errors
///
/// * `WarehouseError::Database` if DuckDB fails to open the file
pub fn connect(config: &WarehouseConfig) -> Result<Connection, WarehouseError> {
    let conn = if config.database == ":memory:" {
        Connection::open_in_memory()?
    } else {
        Connection::open(&config.database)?
    };

    log::debug!("connected to warehouse database {}", config.database);

    Ok(conn)
}
