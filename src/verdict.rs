// The engine's gating decision.

use serde::{Deserialize, Serialize};

use crate::age_group::AgeGroup;
use crate::scorer::GuardianScore;

/// Evidence behind a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictDetails {
    pub age_group: AgeGroup,

    /// Minimum score the band required.
    pub threshold: i32,

    pub score: GuardianScore,

    /// Human-readable reasons, deciding reason first.
    pub reasons: Vec<String>,
}

/// Allowed or blocked, with the score and reasons that led there.
///
/// Built fresh for every classification call and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Verdict {
    Allowed(VerdictDetails),
    Blocked(VerdictDetails),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed(_))
    }

    pub fn is_blocked(&self) -> bool {
        !self.is_allowed()
    }

    pub fn details(&self) -> &VerdictDetails {
        match self {
            Verdict::Allowed(details) | Verdict::Blocked(details) => details,
        }
    }

    pub fn score(&self) -> &GuardianScore {
        &self.details().score
    }

    pub fn reasons(&self) -> &[String] {
        &self.details().reasons
    }

    /// `"allowed"` or `"blocked"`.
    pub fn decision(&self) -> &'static str {
        match self {
            Verdict::Allowed(_) => "allowed",
            Verdict::Blocked(_) => "blocked",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let details = self.details();
        write!(
            f,
            "{} for {} (score {} / threshold {})",
            self.decision(),
            details.age_group,
            details.score.value,
            details.threshold
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::Scorer;

    fn details(value_baseline: i32) -> VerdictDetails {
        VerdictDetails {
            age_group: AgeGroup::Under8,
            threshold: 75,
            score: Scorer::new(value_baseline).aggregate(Vec::new()),
            reasons: vec!["no rule fired".to_string()],
        }
    }

    #[test]
    fn test_accessors() {
        let verdict = Verdict::Blocked(details(40));
        assert!(verdict.is_blocked());
        assert_eq!(verdict.score().value, 40);
        assert_eq!(verdict.reasons(), &["no rule fired".to_string()]);
        assert_eq!(verdict.to_string(), "blocked for Under 8 (score 40 / threshold 75)");
    }

    #[test]
    fn test_serializes_with_decision_tag() {
        let value = serde_json::to_value(Verdict::Allowed(details(100))).unwrap();
        assert_eq!(value["decision"], "allowed");
        assert_eq!(value["age_group"], "UNDER_8");
        assert_eq!(value["score"]["value"], 100);
    }
}
