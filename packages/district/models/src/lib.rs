#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Canonical district KPI domain types.
//!
//! This crate defines the closed metric catalog identifiers, bin levels,
//! classification outcomes, and the row/selection types shared across the
//! entire market-map system. All packages normalize onto these types; the
//! classification engine never sees warehouse SQL or map geometry.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The closed set of district KPIs the system knows how to fetch, bin, and
/// describe.
///
/// Every variant must have a matching definition in the metric catalog
/// (thresholds, descriptions, warehouse column); the catalog is validated
/// for completeness at load time.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Metric {
    /// Total AEPS market size for the district, in Crore.
    AepsMarketSize,
    /// Our AEPS GTV as a share of the district market size.
    MarketShare,
    /// Transacting agents per 10k population.
    #[serde(rename = "TRANS_DENSITY_10K")]
    #[strum(serialize = "TRANS_DENSITY_10K")]
    TransDensity10k,
    /// Super-performer agents per 10k population.
    #[serde(rename = "SP_DENSITY_10K")]
    #[strum(serialize = "SP_DENSITY_10K")]
    SpDensity10k,
    /// CMS GTV for the district, in Crore.
    CmsGtv,
    /// Share of transacting agents visited by field staff in the month.
    MonthlyVisitCoverage,
    /// Count of active commission-earning distribution partners.
    PartnerPresence,
    /// Count of field staff mapped to the district.
    FieldPresence,
    /// Won-back super-performers as a percentage of the potential pool.
    SpWinbackRatio,
}

impl Metric {
    /// All metrics, in catalog display order.
    pub const ALL: &[Self] = &[
        Self::AepsMarketSize,
        Self::MarketShare,
        Self::TransDensity10k,
        Self::SpDensity10k,
        Self::CmsGtv,
        Self::MonthlyVisitCoverage,
        Self::PartnerPresence,
        Self::FieldPresence,
        Self::SpWinbackRatio,
    ];
}

/// One of the three real classification levels of a single metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinLevel {
    Low,
    Med,
    High,
}

impl BinLevel {
    /// Display form used in class labels and legends (`Low`/`Med`/`High`).
    #[must_use]
    pub const fn pretty(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Med => "Med",
            Self::High => "High",
        }
    }
}

/// The classification outcome of a single metric value.
///
/// `Missing` covers absent values, NaN, and defensive fall-through when a
/// misconfigured bin table leaves a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bin {
    Low,
    Med,
    High,
    Missing,
}

impl Bin {
    /// The real level behind this bin, or `None` for `Missing`.
    #[must_use]
    pub const fn level(self) -> Option<BinLevel> {
        match self {
            Self::Low => Some(BinLevel::Low),
            Self::Med => Some(BinLevel::Med),
            Self::High => Some(BinLevel::High),
            Self::Missing => None,
        }
    }
}

impl From<BinLevel> for Bin {
    fn from(level: BinLevel) -> Self {
        match level {
            BinLevel::Low => Self::Low,
            BinLevel::Med => Self::Med,
            BinLevel::High => Self::High,
        }
    }
}

/// A half-open numeric interval `[lower, upper)`.
///
/// Unbounded ends are represented by the infinities, so a full bin table
/// covers the real line without sentinel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinRange {
    pub lower: f64,
    pub upper: f64,
}

impl BinRange {
    /// Whether `value` falls in `[lower, upper)`.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value < self.upper
    }
}

/// Per-metric bin thresholds: three half-open intervals partitioning the
/// real line.
///
/// `low` and `med` are `[lower, upper)`; `high` is matched on its lower
/// bound only, so it owns the whole upper tail including `+inf`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinDefinition {
    pub low: BinRange,
    pub med: BinRange,
    pub high: BinRange,
}

impl BinDefinition {
    /// The interval for a given level.
    #[must_use]
    pub const fn range(&self, level: BinLevel) -> &BinRange {
        match level {
            BinLevel::Low => &self.low,
            BinLevel::Med => &self.med,
            BinLevel::High => &self.high,
        }
    }
}

/// Canonicalizes a district or state name for joining warehouse rows to
/// boundary features: trims, uppercases, and collapses internal whitespace
/// runs to a single space.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// One row of the assembled per-district dataset for a reporting month.
///
/// `values` holds only the metrics that resolved to a number; an absent key
/// means the value is missing and must classify as [`Bin::Missing`].
/// Assembled fresh per request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictRecord {
    /// Normalized (uppercase, trimmed) district name — the join key.
    pub district: String,
    pub state: String,
    pub values: BTreeMap<Metric, f64>,
}

impl DistrictRecord {
    /// The value of `metric` for this district, if present.
    #[must_use]
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }
}

/// The resolved matrix outcome for one district and one metric pair.
///
/// `label` already encodes the bin pair for display
/// (e.g. `Red (Ref=Med, Ach=Low)`); the reserved "No Data" outcome carries
/// no bin suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub reference_bin: Bin,
    pub achievement_bin: Bin,
    pub label: String,
    /// Hex fill color for the district polygon.
    pub color: String,
}

/// One legend swatch: a display label and its hex color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

/// Geographic scope of a generated map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    National,
    /// A single state, by its canonical uppercase name.
    State(String),
}

impl Scope {
    /// Display label used in the map title (`National` or the state name).
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::National => "National",
            Self::State(name) => name,
        }
    }

    /// Filesystem-safe slug used in artifact names.
    #[must_use]
    pub fn slug(&self) -> String {
        self.label().replace(' ', "_")
    }
}

/// The closed list of states offered for state-scope maps.
pub const STATES: &[&str] = &[
    "ANDHRA PRADESH",
    "BIHAR",
    "CHHATTISGARH",
    "DELHI_NCR",
    "HARYANA",
    "JHARKHAND",
    "KARNATAKA",
    "KERALA",
    "MADHYA PRADESH",
    "MAHARASHTRA",
    "ODISHA",
    "PUNJAB",
    "TAMIL NADU",
    "UTTAR PRADESH",
    "WEST BENGAL",
];

/// First month with warehouse coverage.
pub const FIRST_REPORT_MONTH: (i32, u32) = (2024, 4);

impl std::str::FromStr for ReportMonth {
    type Err = InvalidMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A reporting month, always the first day of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportMonth(NaiveDate);

impl ReportMonth {
    /// Creates a report month from a year and 1-based month number.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Parses `YYYY-MM` or `YYYY-MM-DD`; day-of-month input snaps to the
    /// first of the month.
    pub fn parse(s: &str) -> Result<Self, InvalidMonthError> {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d"))
            .map_err(|_| InvalidMonthError {
                input: s.to_string(),
            })?;
        Self::new(date.year(), date.month()).ok_or_else(|| InvalidMonthError {
            input: s.to_string(),
        })
    }

    /// The underlying first-of-month date.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }

    /// ISO form used in SQL parameters and artifact names (`YYYY-MM-DD`).
    #[must_use]
    pub fn iso(self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// Human-readable label (`Jun 2025`).
    #[must_use]
    pub fn label(self) -> String {
        self.0.format("%b %Y").to_string()
    }

    /// All selectable months from [`FIRST_REPORT_MONTH`] through the last
    /// complete month before `today`, oldest first.
    ///
    /// The current month is never offered — its warehouse tables are still
    /// being written.
    #[must_use]
    pub fn options(today: NaiveDate) -> Vec<Self> {
        let (start_year, start_month) = FIRST_REPORT_MONTH;
        let Some(start) = Self::new(start_year, start_month) else {
            return Vec::new();
        };
        let Some(current) = Self::new(today.year(), today.month()) else {
            return Vec::new();
        };

        let mut options = Vec::new();
        let mut month = start;
        while month < current {
            options.push(month);
            match month.0.checked_add_months(Months::new(1)) {
                Some(next) => month = Self(next),
                None => break,
            }
        }
        options
    }
}

impl std::fmt::Display for ReportMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.iso())
    }
}

/// Error returned for unparseable month selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMonthError {
    /// The rejected input.
    pub input: String,
}

impl std::fmt::Display for InvalidMonthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid month '{}': expected YYYY-MM or YYYY-MM-DD",
            self.input
        )
    }
}

impl std::error::Error for InvalidMonthError {}
