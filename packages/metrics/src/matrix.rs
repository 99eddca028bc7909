//! Matrix resolver: maps a (reference, achievement) bin pair to its class.
//!
//! The 3×3 table is fixed domain configuration. Reference is the row axis
//! and achievement the column axis — swapping the two selected metrics
//! swaps the axes and therefore the outcome, which is intentional.

use market_map_district_models::{Bin, BinLevel, Classification};

/// Label of the reserved missing-data class.
pub const NO_DATA_LABEL: &str = "No Data";

/// Neutral gray fill of the reserved missing-data class.
pub const NO_DATA_COLOR: &str = "#d9d9d9";

/// One cell of the classification matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixClass {
    /// Base class label, without the bin-pair suffix.
    pub label: &'static str,
    /// Hex fill color.
    pub color: &'static str,
}

/// The 3×3 class table: (reference row, achievement column) → class.
pub const MATRIX: &[((BinLevel, BinLevel), MatrixClass)] = &[
    (
        (BinLevel::Low, BinLevel::Low),
        MatrixClass {
            label: "Light Red",
            color: "#ffb3b3",
        },
    ),
    (
        (BinLevel::Low, BinLevel::Med),
        MatrixClass {
            label: "Yellow",
            color: "#ffff66",
        },
    ),
    (
        (BinLevel::Low, BinLevel::High),
        MatrixClass {
            label: "Light Green",
            color: "#b7ffb7",
        },
    ),
    (
        (BinLevel::Med, BinLevel::Low),
        MatrixClass {
            label: "Red",
            color: "#ff3333",
        },
    ),
    (
        (BinLevel::Med, BinLevel::Med),
        MatrixClass {
            label: "Mustard",
            color: "#ffcc33",
        },
    ),
    (
        (BinLevel::Med, BinLevel::High),
        MatrixClass {
            label: "Green",
            color: "#33cc33",
        },
    ),
    (
        (BinLevel::High, BinLevel::Low),
        MatrixClass {
            label: "Dark Red",
            color: "#8b0000",
        },
    ),
    (
        (BinLevel::High, BinLevel::Med),
        MatrixClass {
            label: "Orange",
            color: "#ff7f00",
        },
    ),
    (
        (BinLevel::High, BinLevel::High),
        MatrixClass {
            label: "Dark Green",
            color: "#006400",
        },
    ),
];

/// The matrix cell for a real bin pair.
///
/// # Panics
///
/// Never panics: [`MATRIX`] enumerates all nine combinations.
#[must_use]
pub fn class_for(reference: BinLevel, achievement: BinLevel) -> &'static MatrixClass {
    MATRIX
        .iter()
        .find(|((r, a), _)| *r == reference && *a == achievement)
        .map(|(_, class)| class)
        .expect("matrix covers all nine bin pairs")
}

/// Display label for a matrix cell, encoding the bin pair
/// (`Red (Ref=Med, Ach=Low)`).
#[must_use]
pub fn display_label(class: &MatrixClass, reference: BinLevel, achievement: BinLevel) -> String {
    format!(
        "{} (Ref={}, Ach={})",
        class.label,
        reference.pretty(),
        achievement.pretty()
    )
}

/// Resolves a bin pair to its classification outcome.
///
/// A missing bin on either axis short-circuits to the reserved "No Data"
/// class before any table lookup.
#[must_use]
pub fn resolve(reference: Bin, achievement: Bin) -> Classification {
    let (Some(ref_level), Some(ach_level)) = (reference.level(), achievement.level()) else {
        return Classification {
            reference_bin: reference,
            achievement_bin: achievement,
            label: NO_DATA_LABEL.to_string(),
            color: NO_DATA_COLOR.to_string(),
        };
    };

    let class = class_for(ref_level, ach_level);
    Classification {
        reference_bin: reference,
        achievement_bin: achievement,
        label: display_label(class, ref_level, ach_level),
        color: class.color.to_string(),
    }
}
