// Keyword blocklist rule
//
// Scans every text field for band-specific terms. Each band's list is
// compiled once into two case-insensitive regex sets (absolute and
// borderline), one pattern per configured term, so overlapping terms such
// as "gun" and "gun fight" are counted independently. Terms are anchored
// on word boundaries so "war" does not fire on "award" and "kill" does not
// fire on "skills".

use regex::{RegexSet, RegexSetBuilder};
use std::collections::{BTreeSet, HashMap};

use super::{RuleKind, RuleOutcome};
use crate::age_group::AgeGroup;
use crate::config::BlocklistConfig;
use crate::content_metadata::ContentMetadata;
use crate::error::ConfigError;
use crate::scorer::SCORE_MIN;

/// Normalized terms and their compiled patterns, index-aligned.
#[derive(Debug, Clone)]
struct TermSet {
    terms: Vec<String>,
    patterns: RegexSet,
}

/// Compiled matchers for one band.
#[derive(Debug, Clone)]
struct CompiledBand {
    absolute: Option<TermSet>,
    borderline: Option<TermSet>,
}

/// Configured terms found in the inspected fields. Each term keeps the first
/// field it was seen in; entries are in field order.
#[derive(Debug, Default)]
struct Hits {
    found: Vec<(String, String)>,
}

impl Hits {
    fn is_empty(&self) -> bool {
        self.found.is_empty()
    }

    fn len(&self) -> usize {
        self.found.len()
    }

    fn record(&mut self, term: &str, field: &str) {
        if !self.found.iter().any(|(seen, _)| seen == term) {
            self.found.push((term.to_string(), field.to_string()));
        }
    }

    /// `'war', 'kill' in title; 'casino' in tag`
    fn describe(&self) -> String {
        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
        for (term, field) in &self.found {
            match groups.iter_mut().find(|(name, _)| name == field) {
                Some((_, terms)) => terms.push(term),
                None => groups.push((field, vec![term])),
            }
        }
        groups
            .iter()
            .map(|(field, terms)| format!("'{}' in {}", terms.join("', '"), field))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn into_terms(self) -> Vec<String> {
        self.found.into_iter().map(|(term, _)| term).collect()
    }
}

/// Band-aware keyword matcher.
///
/// Stricter bands use the union of their own terms and every looser band's
/// terms (see [`BlocklistConfig::effective_terms`]), so a term blocked for
/// `Under16` is also blocked for every younger band. Since every configured
/// term is matched on its own, a superset of terms never yields fewer hits.
#[derive(Debug, Clone)]
pub struct KeywordBlocklistRule {
    bands: HashMap<AgeGroup, CompiledBand>,
    borderline_penalty: i32,
    max_penalty: i32,
}

impl KeywordBlocklistRule {
    /// Compiles every band's blocklist. Fails only on a term that cannot be
    /// turned into a pattern.
    pub fn from_config(config: &BlocklistConfig) -> Result<Self, ConfigError> {
        let mut bands = HashMap::new();
        for group in AgeGroup::all() {
            let terms = config.effective_terms(*group);
            let compiled = CompiledBand {
                absolute: compile_terms(&terms.absolute)?,
                borderline: compile_terms(&terms.borderline)?,
            };
            bands.insert(*group, compiled);
        }

        Ok(KeywordBlocklistRule {
            bands,
            borderline_penalty: config.borderline_penalty,
            max_penalty: config.max_penalty,
        })
    }

    /// Absolute-tier match for this band, as a terminal block outcome.
    pub fn absolute_match(
        &self,
        metadata: &ContentMetadata,
        age_group: AgeGroup,
    ) -> Option<RuleOutcome> {
        let band = self.bands.get(&age_group)?;
        let hits = scan(band.absolute.as_ref()?, metadata);
        if hits.is_empty() {
            return None;
        }
        let reason = format!("absolute block term {}", hits.describe());
        Some(
            RuleOutcome::terminal(RuleKind::KeywordBlocklist, SCORE_MIN, reason)
                .with_matches(hits.into_terms()),
        )
    }

    pub fn evaluate(&self, metadata: &ContentMetadata, age_group: AgeGroup) -> RuleOutcome {
        if let Some(block) = self.absolute_match(metadata, age_group) {
            return block;
        }

        let Some(borderline) = self
            .bands
            .get(&age_group)
            .and_then(|band| band.borderline.as_ref())
        else {
            return RuleOutcome::neutral(RuleKind::KeywordBlocklist);
        };

        let hits = scan(borderline, metadata);
        if hits.is_empty() {
            return RuleOutcome::neutral(RuleKind::KeywordBlocklist);
        }

        let count = i32::try_from(hits.len()).unwrap_or(i32::MAX);
        let contribution = count
            .saturating_mul(self.borderline_penalty)
            .max(self.max_penalty);
        let reason = format!("borderline term {}", hits.describe());
        RuleOutcome::adjust(RuleKind::KeywordBlocklist, contribution, reason)
            .with_matches(hits.into_terms())
    }
}

/// Normalizes terms (trimmed, lowercased, single-spaced, deduplicated) and
/// compiles one case-insensitive whole-word pattern per term. Returns `None`
/// for an empty list.
fn compile_terms(terms: &[String]) -> Result<Option<TermSet>, ConfigError> {
    let unique: Vec<String> = terms
        .iter()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if unique.is_empty() {
        return Ok(None);
    }

    let alternatives: Vec<String> = unique.iter().map(|t| term_pattern(t)).collect();
    let patterns = RegexSetBuilder::new(&alternatives)
        .case_insensitive(true)
        .build()
        .map_err(|e| ConfigError::InvalidPattern {
            pattern: alternatives.join("|"),
            reason: e.to_string(),
        })?;

    Ok(Some(TermSet {
        terms: unique,
        patterns,
    }))
}

/// Escapes a term, lets internal whitespace match any whitespace run, and
/// adds `\b` on each side that starts or ends with a word character.
fn term_pattern(term: &str) -> String {
    let body = term
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");

    let starts_word = term.chars().next().is_some_and(is_word_char);
    let ends_word = term.chars().last().is_some_and(is_word_char);
    format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        body,
        if ends_word { r"\b" } else { "" }
    )
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn scan(set: &TermSet, metadata: &ContentMetadata) -> Hits {
    let mut hits = Hits::default();
    for (field, text) in metadata.text_fields() {
        for index in set.patterns.matches(text).into_iter() {
            hits.record(&set.terms[index], field);
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BandTerms;
    use std::collections::BTreeMap;

    fn rule() -> KeywordBlocklistRule {
        let mut bands = BTreeMap::new();
        bands.insert(
            AgeGroup::Under16,
            BandTerms {
                absolute: vec!["nsfw".to_string()],
                borderline: vec!["casino".to_string()],
            },
        );
        bands.insert(
            AgeGroup::Under8,
            BandTerms {
                absolute: vec![],
                borderline: vec!["war".to_string(), "kill".to_string(), "jump scare".to_string()],
            },
        );
        KeywordBlocklistRule::from_config(&BlocklistConfig {
            bands,
            borderline_penalty: -30,
            max_penalty: -50,
        })
        .unwrap()
    }

    #[test]
    fn test_absolute_term_is_terminal_for_every_band() {
        let rule = rule();
        let metadata = ContentMetadata::new("Totally NSFW clip");
        for group in AgeGroup::all() {
            let outcome = rule.evaluate(&metadata, *group);
            assert!(outcome.terminal, "{group:?}");
            assert_eq!(outcome.contribution, 0);
            assert_eq!(outcome.matched, vec!["nsfw".to_string()]);
        }
    }

    #[test]
    fn test_word_boundaries_prevent_partial_matches() {
        let rule = rule();
        for title in ["Award winning skills", "Warhammer painting", "Killer whales"] {
            let outcome = rule.evaluate(&ContentMetadata::new(title), AgeGroup::Under5);
            assert!(outcome.is_neutral(), "{title} should not match");
        }
        let outcome = rule.evaluate(&ContentMetadata::new("The war of the ants"), AgeGroup::Under5);
        assert_eq!(outcome.contribution, -30);
    }

    #[test]
    fn test_case_insensitive_and_phrase_whitespace() {
        let rule = rule();
        let metadata = ContentMetadata::builder()
            .title("Best JUMP   Scare ever")
            .build();
        let outcome = rule.evaluate(&metadata, AgeGroup::Under8);
        assert_eq!(outcome.matched, vec!["jump scare".to_string()]);
    }

    #[test]
    fn test_band_specific_lists() {
        let rule = rule();
        let metadata = ContentMetadata::new("war documentary");
        assert_eq!(rule.evaluate(&metadata, AgeGroup::Under8).contribution, -30);
        assert!(rule.evaluate(&metadata, AgeGroup::Under13).is_neutral());
        assert!(rule.evaluate(&metadata, AgeGroup::Under16).is_neutral());
    }

    #[test]
    fn test_penalty_counts_distinct_terms_and_caps() {
        let rule = rule();
        let metadata = ContentMetadata::builder()
            .title("war war war")
            .description("kill the casino boss")
            .build();
        let outcome = rule.evaluate(&metadata, AgeGroup::Under5);
        assert_eq!(outcome.matched.len(), 3);
        assert_eq!(outcome.contribution, -50);

        let single = rule.evaluate(&ContentMetadata::new("war war war"), AgeGroup::Under5);
        assert_eq!(single.contribution, -30);
    }

    #[test]
    fn test_tags_and_extra_fields_are_scanned() {
        let rule = rule();
        let metadata = ContentMetadata::builder()
            .title("Fun video")
            .add_tag("Casino")
            .build();
        let outcome = rule.evaluate(&metadata, AgeGroup::Under16);
        assert_eq!(outcome.reason.as_deref(), Some("borderline term 'casino' in tag"));

        let extra = ContentMetadata::builder()
            .title("Fun video")
            .extra_field("captions", "this is nsfw")
            .build();
        assert!(rule.evaluate(&extra, AgeGroup::Under16).terminal);
    }

    #[test]
    fn test_empty_metadata_is_neutral() {
        let outcome = rule().evaluate(&ContentMetadata::default(), AgeGroup::Under5);
        assert!(outcome.is_neutral());
    }

    #[test]
    fn test_term_pattern_handles_punctuation() {
        assert_eq!(term_pattern("c++"), r"\bc\+\+");
        assert_eq!(term_pattern("strip club"), r"\bstrip\s+club\b");
        let set = compile_terms(&["c++".to_string()]).unwrap().unwrap();
        assert!(set.patterns.is_match("learn C++ today"));
    }

    #[test]
    fn test_overlapping_terms_are_counted_separately() {
        let mut bands = BTreeMap::new();
        bands.insert(
            AgeGroup::Under16,
            BandTerms {
                absolute: vec![],
                borderline: vec!["gun".to_string(), "fight".to_string()],
            },
        );
        bands.insert(
            AgeGroup::Under5,
            BandTerms {
                absolute: vec![],
                borderline: vec!["gun fight".to_string()],
            },
        );
        let rule = KeywordBlocklistRule::from_config(&BlocklistConfig {
            bands,
            borderline_penalty: -30,
            max_penalty: -90,
        })
        .unwrap();

        let metadata = ContentMetadata::new("Gun  fight");
        let loose = rule.evaluate(&metadata, AgeGroup::Under16);
        let strict = rule.evaluate(&metadata, AgeGroup::Under5);
        assert_eq!(loose.contribution, -60);
        assert_eq!(strict.contribution, -90);
        assert_eq!(strict.matched, vec!["fight", "gun", "gun fight"]);
    }

    #[test]
    fn test_reason_names_the_field_of_each_term() {
        let rule = rule();
        let metadata = ContentMetadata::builder()
            .title("war games")
            .add_tag("casino")
            .build();
        let outcome = rule.evaluate(&metadata, AgeGroup::Under5);
        assert_eq!(
            outcome.reason.as_deref(),
            Some("borderline term 'war' in title; 'casino' in tag")
        );
        assert_eq!(outcome.matched, vec!["war", "casino"]);
    }
}
