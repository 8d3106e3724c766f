// Engine configuration: baseline, per-band thresholds, precedence and the
// data each rule is compiled from.
//
// A configuration is plain data. It is parsed, validated and then compiled
// once into an immutable `GuardianEngine`; nothing here is consulted per
// classification call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::age_group::AgeGroup;
use crate::engine::{PrecedencePolicy, DEFAULT_PRECEDENCE};
use crate::error::{ConfigError, ParseError};
use crate::scorer::{DEFAULT_BASELINE, SCORE_MAX, SCORE_MIN};

/// Complete configuration for a [`crate::GuardianEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Score every classification starts from before rules apply.
    pub baseline: i32,

    /// Minimum score per band for content to be allowed.
    pub thresholds: AgeThresholds,

    /// Which terminal outcome wins when trust and an absolute block collide.
    pub precedence: PrecedencePolicy,

    pub trusted_channels: TrustedChannelConfig,

    pub blocklist: BlocklistConfig,

    pub patterns: PatternConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            baseline: DEFAULT_BASELINE,
            thresholds: AgeThresholds::default(),
            precedence: DEFAULT_PRECEDENCE,
            trusted_channels: TrustedChannelConfig::default(),
            blocklist: BlocklistConfig::default(),
            patterns: PatternConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from a JSON string. Missing sections keep their
    /// defaults.
    pub fn from_json(json: &str) -> Result<EngineConfig, ParseError> {
        serde_json::from_str(json).map_err(|e| ParseError::JsonParseError(e.to_string()))
    }

    /// Serialize the configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String, ParseError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ParseError::SerializationError(e.to_string()))
    }

    /// Validate every section. Pattern compilation is checked later, when
    /// the rules are built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !score_in_range(self.baseline) {
            return Err(ConfigError::InvalidBaseline(self.baseline));
        }
        self.thresholds.validate()?;
        self.trusted_channels.validate()?;
        self.blocklist.validate()?;
        self.patterns.validate()?;
        Ok(())
    }
}

fn score_in_range(value: i32) -> bool {
    (SCORE_MIN..=SCORE_MAX).contains(&value)
}

// ============================================================================
// AGE THRESHOLDS
// ============================================================================

/// Minimum safe score per band. Stricter bands must not have a lower
/// threshold than looser ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgeThresholds {
    pub under_5: i32,
    pub under_8: i32,
    pub under_13: i32,
    pub under_16: i32,
}

impl Default for AgeThresholds {
    fn default() -> Self {
        AgeThresholds {
            under_5: 85,
            under_8: 75,
            under_13: 60,
            under_16: 45,
        }
    }
}

impl AgeThresholds {
    pub fn get(&self, age_group: AgeGroup) -> i32 {
        match age_group {
            AgeGroup::Under5 => self.under_5,
            AgeGroup::Under8 => self.under_8,
            AgeGroup::Under13 => self.under_13,
            AgeGroup::Under16 => self.under_16,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for group in AgeGroup::all() {
            let value = self.get(*group);
            if !score_in_range(value) {
                return Err(ConfigError::InvalidThreshold {
                    age_group: group.code().to_string(),
                    value,
                });
            }
        }

        for pair in AgeGroup::all().windows(2) {
            let (stricter, looser) = (pair[0], pair[1]);
            if self.get(stricter) < self.get(looser) {
                return Err(ConfigError::NonMonotoneThresholds {
                    stricter: stricter.code().to_string(),
                    stricter_value: self.get(stricter),
                    looser: looser.code().to_string(),
                    looser_value: self.get(looser),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// TRUSTED CHANNELS
// ============================================================================

/// Allow-list of channel identifiers.
///
/// Entries are exact ids, or namespaces written `namespace/*` which match
/// any id starting with `namespace/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustedChannelConfig {
    pub channels: Vec<String>,

    /// Whether a match ends the rule chain.
    pub terminal: bool,

    /// Score adopted outright on a terminal match.
    pub trusted_score: i32,

    /// Positive contribution on a non-terminal match.
    pub bonus: i32,
}

impl Default for TrustedChannelConfig {
    fn default() -> Self {
        TrustedChannelConfig {
            channels: vec![
                "trusted-kids-channel".to_string(),
                "pbs-kids".to_string(),
                "sesame-street".to_string(),
                "nasa-kids/*".to_string(),
            ],
            terminal: true,
            trusted_score: SCORE_MAX,
            bonus: 20,
        }
    }
}

impl TrustedChannelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for entry in &self.channels {
            let id = entry.trim();
            if id.is_empty() || id == "*" || id == "/*" {
                return Err(ConfigError::EmptyTrustedChannel);
            }
        }
        if !score_in_range(self.trusted_score) {
            return Err(ConfigError::InvalidWeight {
                name: "trusted_channels.trusted_score".to_string(),
                reason: format!("{} is outside [0, 100]", self.trusted_score),
            });
        }
        if self.bonus <= 0 {
            return Err(ConfigError::InvalidWeight {
                name: "trusted_channels.bonus".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// KEYWORD BLOCKLIST
// ============================================================================

/// Terms configured for one band.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BandTerms {
    /// Any match blocks outright.
    pub absolute: Vec<String>,
    /// Matches lower the score without ending the chain.
    pub borderline: Vec<String>,
}

impl BandTerms {
    fn new(absolute: &[&str], borderline: &[&str]) -> Self {
        BandTerms {
            absolute: absolute.iter().map(|t| t.to_string()).collect(),
            borderline: borderline.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Per-band keyword lists.
///
/// Each band lists only the terms it adds on top of the looser bands; the
/// effective list of a band is its own terms plus those of every looser
/// band, so stricter bands always block a superset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlocklistConfig {
    pub bands: BTreeMap<AgeGroup, BandTerms>,

    /// Contribution per distinct borderline term matched.
    pub borderline_penalty: i32,

    /// Floor for the summed borderline contribution.
    pub max_penalty: i32,
}

impl Default for BlocklistConfig {
    fn default() -> Self {
        let mut bands = BTreeMap::new();
        bands.insert(
            AgeGroup::Under16,
            BandTerms::new(
                &[
                    "porn", "pornography", "xxx", "nsfw", "hentai", "nude", "nudes", "gore",
                    "beheading", "absolute-blocklist-term",
                ],
                &["gambling", "casino", "drugs", "vape", "vaping"],
            ),
        );
        bands.insert(
            AgeGroup::Under13,
            BandTerms::new(
                &["explicit", "onlyfans", "strip club"],
                &[
                    "horror", "murder", "blood", "kill", "killing", "creepypasta", "alcohol",
                    "beer", "prank gone wrong",
                ],
            ),
        );
        bands.insert(
            AgeGroup::Under8,
            BandTerms::new(
                &["jumpscare", "jump scare"],
                &["scary", "zombie", "fight", "gun", "guns", "weapon", "weapons", "dating"],
            ),
        );
        bands.insert(
            AgeGroup::Under5,
            BandTerms::new(&[], &["monster", "ghost", "battle", "war"]),
        );

        BlocklistConfig {
            bands,
            borderline_penalty: -30,
            max_penalty: -90,
        }
    }
}

impl BlocklistConfig {
    /// Effective terms for a band: its own plus every looser band's.
    pub fn effective_terms(&self, age_group: AgeGroup) -> BandTerms {
        let mut terms = BandTerms::default();
        let bands = std::iter::once(age_group).chain(age_group.looser_bands());
        for band in bands {
            if let Some(own) = self.bands.get(&band) {
                terms.absolute.extend(own.absolute.iter().cloned());
                terms.borderline.extend(own.borderline.iter().cloned());
            }
        }
        terms
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (band, terms) in &self.bands {
            let mut all = terms.absolute.iter().chain(terms.borderline.iter());
            if all.any(|t| t.trim().is_empty()) {
                return Err(ConfigError::EmptyTerm(band.code().to_string()));
            }
        }
        if self.borderline_penalty >= 0 {
            return Err(ConfigError::InvalidWeight {
                name: "blocklist.borderline_penalty".to_string(),
                reason: "must be negative".to_string(),
            });
        }
        if self.max_penalty > self.borderline_penalty {
            return Err(ConfigError::InvalidWeight {
                name: "blocklist.max_penalty".to_string(),
                reason: "must not be smaller in magnitude than borderline_penalty".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// SUSPICIOUS PATTERNS
// ============================================================================

/// Tuning for the heuristic pattern rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Contribution per fired signal.
    pub signal_penalty: i32,

    /// Floor for the summed contribution.
    pub max_penalty: i32,

    /// Length of a `!`/`?` run that counts as excessive.
    pub punctuation_run: usize,

    /// Minimum emoji count before density is considered.
    pub emoji_min_count: usize,

    /// Emoji share of non-whitespace characters that counts as clickbait.
    pub emoji_density: f64,

    /// Uppercase share of title letters that counts as shouting.
    pub shouting_ratio: f64,

    /// Minimum letters in the title before shouting is considered.
    pub shouting_min_letters: usize,

    /// Extra scam/phishing templates (regex, matched case-insensitively),
    /// in addition to the built-in ones.
    pub scam_phrases: Vec<String>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        PatternConfig {
            signal_penalty: -10,
            max_penalty: -40,
            punctuation_run: 3,
            emoji_min_count: 3,
            emoji_density: 0.15,
            shouting_ratio: 0.7,
            shouting_min_letters: 10,
            scam_phrases: Vec::new(),
        }
    }
}

impl PatternConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signal_penalty >= 0 {
            return Err(ConfigError::InvalidWeight {
                name: "patterns.signal_penalty".to_string(),
                reason: "must be negative".to_string(),
            });
        }
        if self.max_penalty > self.signal_penalty {
            return Err(ConfigError::InvalidWeight {
                name: "patterns.max_penalty".to_string(),
                reason: "must not be smaller in magnitude than signal_penalty".to_string(),
            });
        }
        if self.punctuation_run < 2 {
            return Err(ConfigError::InvalidWeight {
                name: "patterns.punctuation_run".to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        for (name, ratio) in [
            ("patterns.emoji_density", self.emoji_density),
            ("patterns.shouting_ratio", self.shouting_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(ConfigError::InvalidWeight {
                    name: name.to_string(),
                    reason: format!("{} is outside (0.0, 1.0]", ratio),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_thresholds_must_be_monotone() {
        let thresholds = AgeThresholds {
            under_5: 60,
            under_8: 70,
            under_13: 50,
            under_16: 40,
        };
        assert!(matches!(
            thresholds.validate(),
            Err(ConfigError::NonMonotoneThresholds { .. })
        ));
    }

    #[test]
    fn test_threshold_out_of_range() {
        let thresholds = AgeThresholds {
            under_5: 101,
            ..AgeThresholds::default()
        };
        assert!(matches!(
            thresholds.validate(),
            Err(ConfigError::InvalidThreshold { value: 101, .. })
        ));
    }

    #[test]
    fn test_baseline_out_of_range() {
        let config = EngineConfig {
            baseline: -1,
            ..EngineConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidBaseline(-1)));
    }

    #[test]
    fn test_effective_terms_are_supersets() {
        let blocklist = BlocklistConfig::default();
        let mut previous: Option<BandTerms> = None;
        for group in AgeGroup::all().iter().rev() {
            let terms = blocklist.effective_terms(*group);
            if let Some(looser) = &previous {
                assert!(looser.absolute.iter().all(|t| terms.absolute.contains(t)));
                assert!(looser.borderline.iter().all(|t| terms.borderline.contains(t)));
            }
            previous = Some(terms);
        }
        let under_5 = blocklist.effective_terms(AgeGroup::Under5);
        assert!(under_5.borderline.contains(&"monster".to_string()));
        assert!(under_5.absolute.contains(&"nsfw".to_string()));
    }

    #[test]
    fn test_blank_term_rejected() {
        let mut blocklist = BlocklistConfig::default();
        blocklist
            .bands
            .entry(AgeGroup::Under8)
            .or_default()
            .borderline
            .push("  ".to_string());
        assert_eq!(
            blocklist.validate(),
            Err(ConfigError::EmptyTerm("UNDER_8".to_string()))
        );
    }

    #[test]
    fn test_penalties_must_be_negative() {
        let patterns = PatternConfig {
            signal_penalty: 5,
            ..PatternConfig::default()
        };
        assert!(patterns.validate().is_err());

        let trusted = TrustedChannelConfig {
            bonus: 0,
            ..TrustedChannelConfig::default()
        };
        assert!(trusted.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_and_partial_config() {
        let json = r#"{
            "baseline": 90,
            "thresholds": { "under_5": 95 },
            "precedence": "trust_overrides_block",
            "blocklist": { "bands": { "UNDER_16": { "absolute": ["forbidden"] } } }
        }"#;
        let config = EngineConfig::from_json(json).unwrap();
        assert_eq!(config.baseline, 90);
        assert_eq!(config.thresholds.under_5, 95);
        assert_eq!(config.thresholds.under_8, 75);
        assert_eq!(config.precedence, PrecedencePolicy::TrustOverridesBlock);
        assert_eq!(config.blocklist.bands.len(), 1);
        assert_eq!(config.blocklist.borderline_penalty, -30);

        let reparsed = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, reparsed);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(ParseError::JsonParseError(_))
        ));
    }
}
