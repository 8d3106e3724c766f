//! # Guardian Engine
//!
//! The single classification entry point. For one `(metadata, age group)`
//! pair it:
//! 1. Runs the rule chain in fixed priority order (trust, blocklist, patterns)
//! 2. Stops at the first terminal outcome, subject to the precedence policy
//! 3. Folds the collected outcomes into a Guardian Score
//! 4. Compares the score with the band's threshold to allow or block
//!
//! The engine is immutable after construction. Every structure it consults
//! is built once in [`GuardianEngine::new`], so a shared reference can be
//! used from any number of threads without locking.

use serde::{Deserialize, Serialize};

use crate::age_group::AgeGroup;
use crate::config::{AgeThresholds, EngineConfig};
use crate::content_metadata::ContentMetadata;
use crate::error::GuardianResult;
use crate::rules::{Rule, RuleChain, RuleKind, RuleOutcome};
use crate::scorer::{Scorer, SCORE_MIN};
use crate::verdict::{Verdict, VerdictDetails};

/// Which terminal outcome wins when a trusted channel publishes content
/// carrying an absolute-block term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecedencePolicy {
    /// Absolute blocklist matches beat trust. The trusted outcome stays in
    /// the trail, demoted, and the block decides.
    BlockOverridesTrust,
    /// The first terminal outcome in chain order wins, so trust beats any
    /// later block.
    TrustOverridesBlock,
}

/// Child safety fails closed: an absolute block is never waived by trust.
pub const DEFAULT_PRECEDENCE: PrecedencePolicy = PrecedencePolicy::BlockOverridesTrust;

const OVERRIDDEN_NOTE: &str = "overridden by absolute block";

/// Immutable, thread-safe content safety classifier.
#[derive(Debug, Clone)]
pub struct GuardianEngine {
    rules: RuleChain,
    scorer: Scorer,
    thresholds: AgeThresholds,
    precedence: PrecedencePolicy,
}

impl GuardianEngine {
    /// Validates the configuration and compiles every rule. This is the only
    /// place engine construction can fail.
    pub fn new(config: EngineConfig) -> GuardianResult<Self> {
        config.validate()?;
        let rules = RuleChain::from_config(&config)?;

        log::info!(
            "Guardian engine ready: {} rules, baseline {}, precedence {:?}",
            rules.len(),
            config.baseline,
            config.precedence
        );

        Ok(GuardianEngine {
            rules,
            scorer: Scorer::new(config.baseline),
            thresholds: config.thresholds,
            precedence: config.precedence,
        })
    }

    /// Engine built from the shipped default configuration.
    pub fn with_defaults() -> GuardianResult<Self> {
        Self::new(EngineConfig::default())
    }

    /// Engine built from a JSON configuration document.
    pub fn from_json(json: &str) -> GuardianResult<Self> {
        let config = EngineConfig::from_json(json)?;
        Self::new(config)
    }

    pub fn threshold_for(&self, age_group: AgeGroup) -> i32 {
        self.thresholds.get(age_group)
    }

    pub fn precedence(&self) -> PrecedencePolicy {
        self.precedence
    }

    pub fn baseline(&self) -> i32 {
        self.scorer.baseline()
    }

    /// Rule kinds in the order they run.
    pub fn rule_order(&self) -> Vec<RuleKind> {
        self.rules.kinds()
    }

    /// Classifies one content item for one age band. Total: every input
    /// produces a verdict.
    pub fn classify(&self, metadata: &ContentMetadata, age_group: AgeGroup) -> Verdict {
        let outcomes = self.run_rules(metadata, age_group);
        let score = self.scorer.aggregate(outcomes);
        let threshold = self.threshold_for(age_group);
        let allowed = score.value >= threshold;

        let mut reasons = deciding_reasons(&score.outcomes, score.decided_by);
        if !allowed {
            reasons.push(format!("score {} below threshold {}", score.value, threshold));
        }
        if reasons.is_empty() {
            reasons.push("no safety rule fired".to_string());
        }

        let details = VerdictDetails {
            age_group,
            threshold,
            score,
            reasons,
        };
        let verdict = if allowed {
            Verdict::Allowed(details)
        } else {
            Verdict::Blocked(details)
        };

        log::debug!(
            "Classified {:?}: {}",
            metadata.content_id.as_deref().unwrap_or(&metadata.title),
            verdict
        );
        verdict
    }

    /// Classifies several items for the same band, preserving input order.
    pub fn classify_batch(&self, items: &[ContentMetadata], age_group: AgeGroup) -> Vec<Verdict> {
        items
            .iter()
            .map(|metadata| self.classify(metadata, age_group))
            .collect()
    }

    /// Runs the chain, stopping at the deciding terminal outcome.
    fn run_rules(&self, metadata: &ContentMetadata, age_group: AgeGroup) -> Vec<RuleOutcome> {
        let rules: Vec<&Rule> = self.rules.iter().collect();
        let mut outcomes = Vec::with_capacity(rules.len());

        for (index, rule) in rules.iter().enumerate() {
            let outcome = rule.evaluate(metadata, age_group);
            log::debug!(
                "{} -> contribution {}, terminal {}",
                outcome.rule,
                outcome.contribution,
                outcome.terminal
            );

            if !outcome.terminal {
                outcomes.push(outcome);
                continue;
            }

            let is_terminal_allow = outcome.contribution > SCORE_MIN;
            if is_terminal_allow && self.precedence == PrecedencePolicy::BlockOverridesTrust {
                let block = rules[index + 1..]
                    .iter()
                    .find_map(|later| later.absolute_block(metadata, age_group));
                if let Some(block) = block {
                    log::info!(
                        "{} outcome overridden by {} absolute block",
                        outcome.rule,
                        block.rule
                    );
                    outcomes.push(outcome.demoted(OVERRIDDEN_NOTE));
                    outcomes.push(block);
                    break;
                }
            }
            outcomes.push(outcome);
            break;
        }
        outcomes
    }
}

/// Reasons with the deciding terminal outcome first, then the rest in
/// chain order.
fn deciding_reasons(outcomes: &[RuleOutcome], decided_by: Option<RuleKind>) -> Vec<String> {
    let deciding = outcomes
        .iter()
        .position(|o| o.terminal && Some(o.rule) == decided_by);

    let mut reasons = Vec::new();
    if let Some(index) = deciding {
        reasons.extend(outcomes[index].reason.clone());
    }
    reasons.extend(
        outcomes
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != deciding)
            .filter_map(|(_, o)| o.reason.clone()),
    );
    reasons
}
