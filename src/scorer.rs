// Folds ordered rule outcomes into a single bounded Guardian Score.
//
// The running score starts at the baseline ("safe until shown otherwise")
// and is clamped to [SCORE_MIN, SCORE_MAX] after every step, so every
// intermediate value recorded in the trail is itself a valid score. The
// first terminal outcome replaces the running score outright and ends the
// fold; outcomes after it are kept for explanation but not applied.

use serde::{Deserialize, Serialize};

use crate::rules::{RuleKind, RuleOutcome};

pub const SCORE_MIN: i32 = 0;
pub const SCORE_MAX: i32 = 100;

/// Starting score when no configuration overrides it.
pub const DEFAULT_BASELINE: i32 = SCORE_MAX;

/// Clamps a value into the valid score range.
#[inline]
pub fn clamp_score(value: i32) -> i32 {
    value.clamp(SCORE_MIN, SCORE_MAX)
}

/// Bounded safety score plus the outcomes that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianScore {
    /// Final score, higher is safer.
    pub value: i32,

    /// Every outcome the engine collected, in rule order.
    pub outcomes: Vec<RuleOutcome>,

    /// Running score after each applied step, baseline first.
    pub trail: Vec<i32>,

    /// Rule whose terminal outcome fixed the score, if any.
    pub decided_by: Option<RuleKind>,
}

impl GuardianScore {
    /// True if a terminal outcome short-circuited the fold.
    pub fn is_short_circuited(&self) -> bool {
        self.decided_by.is_some()
    }
}

/// Aggregates rule outcomes from a fixed baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scorer {
    baseline: i32,
}

impl Scorer {
    /// Creates a scorer. An out-of-range baseline is clamped; configuration
    /// validation rejects it before this point.
    pub fn new(baseline: i32) -> Self {
        Scorer {
            baseline: clamp_score(baseline),
        }
    }

    pub fn baseline(&self) -> i32 {
        self.baseline
    }

    pub fn aggregate(&self, outcomes: Vec<RuleOutcome>) -> GuardianScore {
        let mut running = self.baseline;
        let mut trail = Vec::with_capacity(outcomes.len() + 1);
        trail.push(running);
        let mut decided_by = None;

        for outcome in &outcomes {
            if outcome.terminal {
                running = clamp_score(outcome.contribution);
                trail.push(running);
                decided_by = Some(outcome.rule);
                break;
            }
            running = clamp_score(running.saturating_add(outcome.contribution));
            trail.push(running);
        }

        GuardianScore {
            value: running,
            outcomes,
            trail,
            decided_by,
        }
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE)
    }
}
