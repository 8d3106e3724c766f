// Trusted channel rule
//
// Matches the content's channel identifier against an allow-list. Runs first
// so a trusted source is never penalised by a downstream false positive.
// Only the identifier is consulted; display names are free text anyone can
// set and are left to the keyword rule.

use std::collections::HashSet;

use super::{RuleKind, RuleOutcome};
use crate::age_group::AgeGroup;
use crate::config::TrustedChannelConfig;
use crate::content_metadata::ContentMetadata;

const NAMESPACE_SUFFIX: &str = "/*";

/// Allow-list check on the channel identifier.
///
/// # Matching
/// - Exact: `pbs-kids` matches only `pbs-kids`
/// - Namespaced: `nasa-kids/*` matches `nasa-kids/space-songs` but not
///   `nasa-kids` or `nasa-kidsfake/x`
///
/// Matching is case-sensitive after trimming surrounding whitespace.
#[derive(Debug, Clone)]
pub struct TrustedChannelRule {
    exact: HashSet<String>,

    /// Namespace prefixes including the trailing `/`.
    namespaces: Vec<String>,

    terminal: bool,
    trusted_score: i32,
    bonus: i32,
}

impl TrustedChannelRule {
    pub fn from_config(config: &TrustedChannelConfig) -> Self {
        let mut exact = HashSet::new();
        let mut namespaces = Vec::new();

        for entry in &config.channels {
            let entry = entry.trim();
            match entry.strip_suffix(NAMESPACE_SUFFIX) {
                Some(namespace) => namespaces.push(format!("{}/", namespace)),
                None => {
                    exact.insert(entry.to_string());
                }
            }
        }

        TrustedChannelRule {
            exact,
            namespaces,
            terminal: config.terminal,
            trusted_score: config.trusted_score,
            bonus: config.bonus,
        }
    }

    /// Returns the allow-list entry that matches `channel`, if any.
    pub fn matching_entry(&self, channel: &str) -> Option<String> {
        if self.exact.contains(channel) {
            return Some(channel.to_string());
        }
        self.namespaces
            .iter()
            .find(|prefix| channel.len() > prefix.len() && channel.starts_with(prefix.as_str()))
            .map(|prefix| format!("{}*", prefix))
    }

    pub fn evaluate(&self, metadata: &ContentMetadata, _age_group: AgeGroup) -> RuleOutcome {
        let Some(channel) = metadata.channel_key() else {
            return RuleOutcome::neutral(RuleKind::TrustedChannel);
        };
        let Some(entry) = self.matching_entry(channel) else {
            return RuleOutcome::neutral(RuleKind::TrustedChannel);
        };

        let reason = format!("trusted channel {}", channel);
        let outcome = if self.terminal {
            RuleOutcome::terminal(RuleKind::TrustedChannel, self.trusted_score, reason)
        } else {
            RuleOutcome::adjust(RuleKind::TrustedChannel, self.bonus, reason)
        };
        outcome.with_matches(vec![entry])
    }
}
