#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! District boundary polygons and the join that attaches warehouse
//! records to them.

pub mod boundaries;
pub mod join;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("failed to read boundary file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse boundary file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<geojson::Error>,
    },
    /// The boundary file parsed but is not a `FeatureCollection`.
    #[error("boundary file {path} is not a GeoJSON FeatureCollection")]
    NotFeatureCollection { path: PathBuf },
    /// The boundary file contained no usable district features.
    #[error("boundary file {path} contains no district polygons")]
    Empty { path: PathBuf },
}
