#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The classification engine: metric catalog, bin classifier, matrix
//! resolver, and legend builder.
//!
//! Metric definitions (warehouse column, bin thresholds, threshold
//! descriptions, missing-value policy) live in TOML files under `catalog/`
//! and are baked into the binary at compile time. [`catalog::Catalog::load`]
//! parses and validates them: every [`Metric`] variant must have exactly one
//! definition and every bin table must partition the real line with no gap
//! or overlap.
//!
//! [`Metric`]: market_map_district_models::Metric

pub mod catalog;
pub mod classify;
pub mod legend;
pub mod matrix;

use market_map_district_models::Metric;
use thiserror::Error;

/// Errors that can occur while loading or validating the metric catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A catalog TOML file failed to parse.
    #[error("Failed to parse catalog entry '{name}': {source}")]
    Parse {
        /// File stem of the offending catalog entry.
        name: String,
        #[source]
        source: Box<toml::de::Error>,
    },

    /// Two catalog files declare the same metric.
    #[error("Duplicate catalog entry for metric {metric}")]
    Duplicate {
        /// The doubly-defined metric.
        metric: Metric,
    },

    /// A metric has no catalog file.
    #[error("No catalog entry for metric {metric}")]
    MissingMetric {
        /// The undefined metric.
        metric: Metric,
    },

    /// A catalog entry failed semantic validation.
    #[error("Invalid catalog entry for {metric}: {message}")]
    Validation {
        /// The metric whose definition is invalid.
        metric: Metric,
        /// What the validator rejected.
        message: String,
    },
}
