// Child age bands and their derivation from ages and persisted codes.
//
// Bands are ordered by restrictiveness: the first variant is the strictest.
// `from_code` is lenient and total because it reads persisted settings that
// may predate the current band set; `FromStr` is strict and meant for
// configuration files where a typo should fail loudly.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;

/// Legacy codes written by older settings versions, with the band they map to.
const LEGACY_CODES: [(&str, AgeGroup); 3] = [
    ("UNDER_10", AgeGroup::Under8),
    ("UNDER_12", AgeGroup::Under13),
    ("UNDER_14", AgeGroup::Under13),
];

/// Band used when a persisted code cannot be recognised.
///
/// This is the least restrictive band. Product has not confirmed this
/// choice; every fallback is logged at warn level so it stays visible.
pub const FALLBACK_AGE_GROUP: AgeGroup = AgeGroup::Under16;

/// Supported child age bands, strictest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "UNDER_5")]
    Under5,
    #[serde(rename = "UNDER_8")]
    Under8,
    #[serde(rename = "UNDER_13")]
    Under13,
    #[serde(rename = "UNDER_16")]
    Under16,
}

/// How a persisted code was resolved to a band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeResolution {
    /// The code was one of the four canonical codes.
    Canonical(AgeGroup),
    /// The code was a recognised legacy code and was remapped.
    Legacy { from: String, to: AgeGroup },
    /// The code was not recognised; the permissive fallback band was used.
    Fallback { code: String, to: AgeGroup },
}

impl CodeResolution {
    pub fn age_group(&self) -> AgeGroup {
        match self {
            CodeResolution::Canonical(group) => *group,
            CodeResolution::Legacy { to, .. } | CodeResolution::Fallback { to, .. } => *to,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, CodeResolution::Fallback { .. })
    }
}

impl AgeGroup {
    /// Returns all bands, strictest first.
    pub fn all() -> &'static [AgeGroup] {
        &[
            AgeGroup::Under5,
            AgeGroup::Under8,
            AgeGroup::Under13,
            AgeGroup::Under16,
        ]
    }

    /// Upper bound of the band. Exclusive for every band but `Under16`.
    pub const fn max_age(&self) -> i32 {
        match self {
            AgeGroup::Under5 => 5,
            AgeGroup::Under8 => 8,
            AgeGroup::Under13 => 13,
            AgeGroup::Under16 => 16,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            AgeGroup::Under5 => "Under 5",
            AgeGroup::Under8 => "Under 8",
            AgeGroup::Under13 => "Under 13",
            AgeGroup::Under16 => "Under 16",
        }
    }

    /// Canonical persisted code, e.g. `"UNDER_8"`.
    pub const fn code(&self) -> &'static str {
        match self {
            AgeGroup::Under5 => "UNDER_5",
            AgeGroup::Under8 => "UNDER_8",
            AgeGroup::Under13 => "UNDER_13",
            AgeGroup::Under16 => "UNDER_16",
        }
    }

    /// Maps an age in years to its band.
    ///
    /// Boundary ages belong to the next, less restrictive band: 5 is
    /// `Under8`, 8 is `Under13`, 13 and above are `Under16`. Negative ages
    /// clamp to `Under5`.
    pub fn from_age(age: i32) -> AgeGroup {
        if age < 5 {
            AgeGroup::Under5
        } else if age < 8 {
            AgeGroup::Under8
        } else if age < 13 {
            AgeGroup::Under13
        } else {
            AgeGroup::Under16
        }
    }

    /// Resolves a persisted code, reporting how it was resolved.
    pub fn resolve_code(code: &str) -> CodeResolution {
        if let Some(group) = Self::canonical(code) {
            return CodeResolution::Canonical(group);
        }
        if let Some((_, group)) = LEGACY_CODES.iter().find(|(legacy, _)| *legacy == code) {
            return CodeResolution::Legacy {
                from: code.to_string(),
                to: *group,
            };
        }
        log::warn!(
            "Unrecognised age group code {:?}; falling back to least restrictive band {}",
            code,
            FALLBACK_AGE_GROUP.code()
        );
        CodeResolution::Fallback {
            code: code.to_string(),
            to: FALLBACK_AGE_GROUP,
        }
    }

    /// Maps a persisted code to its band.
    ///
    /// Matching is exact and case-sensitive. Legacy codes are remapped and
    /// anything else resolves to [`FALLBACK_AGE_GROUP`].
    pub fn from_code(code: &str) -> AgeGroup {
        Self::resolve_code(code).age_group()
    }

    /// Returns true if `self` is strictly more restrictive than `other`.
    pub fn is_stricter_than(&self, other: AgeGroup) -> bool {
        *self < other
    }

    /// Bands less restrictive than `self`, nearest first.
    pub fn looser_bands(&self) -> impl Iterator<Item = AgeGroup> + '_ {
        Self::all().iter().copied().filter(move |group| self.is_stricter_than(*group))
    }

    fn canonical(code: &str) -> Option<AgeGroup> {
        Self::all().iter().copied().find(|group| group.code() == code)
    }
}

impl FromStr for AgeGroup {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::canonical(s).ok_or_else(|| ConfigError::UnknownAgeGroup(s.to_string()))
    }
}

impl std::fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
