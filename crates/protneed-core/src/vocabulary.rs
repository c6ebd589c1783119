//! Protection Vocabulary
//!
//! The fixed level scale and the set of independent protection dimensions.
//! Both are closed enumerations; derivation never mixes values across
//! dimensions and never compares levels from different scales.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Protection level on the single, totally ordered scale.
///
/// Variant order is the scale order, so `Ord` and `max` follow the
/// maximum principle directly.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionLevel {
    /// Lowest level; also the result when nothing is assigned
    #[default]
    Normal,
    /// High protection need
    High,
    /// Very high protection need
    VeryHigh,
}

impl ProtectionLevel {
    /// Human-readable label used in exported tables
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::High => "High",
            Self::VeryHigh => "Very high",
        }
    }
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Independent protection dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Integrity
    Integrity,
    /// Availability
    Availability,
    /// Confidentiality
    Confidentiality,
}

impl Dimension {
    /// Canonical order; export columns follow it
    pub const ALL: [Self; 3] = [Self::Integrity, Self::Availability, Self::Confidentiality];

    /// Number of dimensions
    pub const COUNT: usize = Self::ALL.len();

    /// Column key, e.g. `confidentiality`
    #[inline]
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Integrity => "integrity",
            Self::Availability => "availability",
            Self::Confidentiality => "confidentiality",
        }
    }

    /// Dense index into per-dimension tables
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Integrity => 0,
            Self::Availability => 1,
            Self::Confidentiality => 2,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Explicit, analyst-assigned protection need.
///
/// Never produced by the engine; see [`crate::DerivedNeed`] for computed results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtectionNeed {
    level: ProtectionLevel,
    rationale: String,
}

impl ProtectionNeed {
    /// Create a need with its justification text
    #[inline]
    pub fn new(level: ProtectionLevel, rationale: impl Into<String>) -> Self {
        Self {
            level,
            rationale: rationale.into(),
        }
    }

    /// Assigned level
    #[inline]
    #[must_use]
    pub fn level(&self) -> ProtectionLevel {
        self.level
    }

    /// Free-text rationale
    #[inline]
    #[must_use]
    pub fn rationale(&self) -> &str {
        &self.rationale
    }
}
