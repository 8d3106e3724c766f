//! # Rules Module
//!
//! The three safety checks and the fixed chain they run in:
//! - TrustedChannelRule: positive, usually terminal, for allow-listed sources
//! - KeywordBlocklistRule: absolute (terminal) and borderline keyword matches
//! - SuspiciousPatternRule: advisory heuristics, never terminal
//!
//! Rules are a closed enum rather than trait objects so the chain order is
//! fixed at construction and visible in one place.

pub mod keyword_blocklist;
pub mod suspicious_pattern;
pub mod trusted_channel;

pub use keyword_blocklist::KeywordBlocklistRule;
pub use suspicious_pattern::{PatternSignal, SuspiciousPatternRule};
pub use trusted_channel::TrustedChannelRule;

use serde::{Deserialize, Serialize};

use crate::age_group::AgeGroup;
use crate::config::EngineConfig;
use crate::content_metadata::ContentMetadata;
use crate::error::ConfigError;

/// Identifies which rule produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    TrustedChannel,
    KeywordBlocklist,
    SuspiciousPattern,
}

impl RuleKind {
    /// Position in the chain; lower runs first.
    pub const fn priority(&self) -> u32 {
        match self {
            RuleKind::TrustedChannel => 0,
            RuleKind::KeywordBlocklist => 1,
            RuleKind::SuspiciousPattern => 2,
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleKind::TrustedChannel => write!(f, "trusted_channel"),
            RuleKind::KeywordBlocklist => write!(f, "keyword_blocklist"),
            RuleKind::SuspiciousPattern => write!(f, "suspicious_pattern"),
        }
    }
}

// ============================================================================
// RULE OUTCOME
// ============================================================================

/// Result of one rule evaluating one `(metadata, age group)` pair.
///
/// For a non-terminal outcome `contribution` is added to the running score.
/// For a terminal outcome it is the final score itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: RuleKind,
    pub contribution: i32,
    pub terminal: bool,
    pub reason: Option<String>,
    /// Terms, channel entries or signals that triggered the outcome.
    pub matched: Vec<String>,
}

impl RuleOutcome {
    /// Zero contribution, non-terminal. Used when a rule has nothing to say.
    pub fn neutral(rule: RuleKind) -> Self {
        RuleOutcome {
            rule,
            contribution: 0,
            terminal: false,
            reason: None,
            matched: Vec::new(),
        }
    }

    /// Non-terminal adjustment of the running score.
    pub fn adjust(rule: RuleKind, contribution: i32, reason: impl Into<String>) -> Self {
        RuleOutcome {
            rule,
            contribution,
            terminal: false,
            reason: Some(reason.into()),
            matched: Vec::new(),
        }
    }

    /// Terminal outcome fixing the final score.
    pub fn terminal(rule: RuleKind, score: i32, reason: impl Into<String>) -> Self {
        RuleOutcome {
            rule,
            contribution: score,
            terminal: true,
            reason: Some(reason.into()),
            matched: Vec::new(),
        }
    }

    pub fn with_matches(mut self, matched: Vec<String>) -> Self {
        self.matched = matched;
        self
    }

    /// True if the outcome neither moves the score nor ends the chain.
    pub fn is_neutral(&self) -> bool {
        !self.terminal && self.contribution == 0
    }

    /// Strips the terminal flag, keeping the outcome in the trail for
    /// explanation. A demoted outcome contributes nothing.
    pub fn demoted(mut self, note: &str) -> Self {
        self.terminal = false;
        self.contribution = 0;
        self.reason = Some(match self.reason.take() {
            Some(reason) => format!("{} ({})", reason, note),
            None => note.to_string(),
        });
        self
    }
}

// ============================================================================
// RULE
// ============================================================================

/// One safety check.
#[derive(Debug, Clone)]
pub enum Rule {
    TrustedChannel(TrustedChannelRule),
    KeywordBlocklist(KeywordBlocklistRule),
    SuspiciousPattern(SuspiciousPatternRule),
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::TrustedChannel(_) => RuleKind::TrustedChannel,
            Rule::KeywordBlocklist(_) => RuleKind::KeywordBlocklist,
            Rule::SuspiciousPattern(_) => RuleKind::SuspiciousPattern,
        }
    }

    /// Evaluates the rule. Total: an inability to judge is a neutral outcome.
    pub fn evaluate(&self, metadata: &ContentMetadata, age_group: AgeGroup) -> RuleOutcome {
        match self {
            Rule::TrustedChannel(rule) => rule.evaluate(metadata, age_group),
            Rule::KeywordBlocklist(rule) => rule.evaluate(metadata, age_group),
            Rule::SuspiciousPattern(rule) => rule.evaluate(metadata, age_group),
        }
    }

    /// Terminal block this rule would issue regardless of trust, if any.
    pub fn absolute_block(
        &self,
        metadata: &ContentMetadata,
        age_group: AgeGroup,
    ) -> Option<RuleOutcome> {
        match self {
            Rule::KeywordBlocklist(rule) => rule.absolute_match(metadata, age_group),
            Rule::TrustedChannel(_) | Rule::SuspiciousPattern(_) => None,
        }
    }
}

// ============================================================================
// RULE CHAIN
// ============================================================================

/// The fixed, priority-ordered rule list: trust, then exact blocklist, then
/// heuristics.
#[derive(Debug, Clone)]
pub struct RuleChain {
    rules: [Rule; 3],
}

impl RuleChain {
    /// Compiles every rule from configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let chain = RuleChain {
            rules: [
                Rule::TrustedChannel(TrustedChannelRule::from_config(&config.trusted_channels)),
                Rule::KeywordBlocklist(KeywordBlocklistRule::from_config(&config.blocklist)?),
                Rule::SuspiciousPattern(SuspiciousPatternRule::from_config(&config.patterns)?),
            ],
        };
        debug_assert!(chain
            .rules
            .windows(2)
            .all(|w| w[0].kind().priority() < w[1].kind().priority()));
        Ok(chain)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn kinds(&self) -> Vec<RuleKind> {
        self.rules.iter().map(Rule::kind).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
