// Audit records for classification decisions.
//
// A record captures what was decided, for which band, from which evidence,
// and a digest of the inspected metadata so the decision can be tied back to
// the exact content without storing it. Records carry a hash over their own
// fields for tamper detection. Persisting them is the caller's concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::age_group::AgeGroup;
use crate::content_metadata::ContentMetadata;
use crate::error::ParseError;
use crate::rules::{RuleKind, RuleOutcome};
use crate::verdict::Verdict;

/// Compact view of one rule outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    pub rule: RuleKind,
    pub contribution: i32,
    pub terminal: bool,
    pub reason: Option<String>,
}

impl From<&RuleOutcome> for OutcomeSummary {
    fn from(outcome: &RuleOutcome) -> Self {
        OutcomeSummary {
            rule: outcome.rule,
            contribution: outcome.contribution,
            terminal: outcome.terminal,
            reason: outcome.reason.clone(),
        }
    }
}

/// One classification decision with provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub record_id: Uuid,
    pub classified_at: DateTime<Utc>,
    pub content_id: Option<String>,

    /// SHA-256 of the inspected metadata fields.
    pub content_digest: String,

    pub age_group: AgeGroup,
    pub decision: String,
    pub score: i32,
    pub threshold: i32,
    pub decided_by: Option<RuleKind>,
    pub outcomes: Vec<OutcomeSummary>,

    /// SHA-256 over every field above.
    pub record_hash: String,
}

impl ClassificationRecord {
    /// Builds a record for `verdict`, which must have been produced from
    /// `metadata`.
    pub fn new(metadata: &ContentMetadata, verdict: &Verdict) -> Self {
        Self::at(metadata, verdict, Utc::now())
    }

    /// Same as [`ClassificationRecord::new`] with an explicit timestamp.
    pub fn at(metadata: &ContentMetadata, verdict: &Verdict, classified_at: DateTime<Utc>) -> Self {
        let details = verdict.details();
        let mut record = ClassificationRecord {
            record_id: Uuid::new_v4(),
            classified_at,
            content_id: metadata.content_id.clone(),
            content_digest: content_digest(metadata),
            age_group: details.age_group,
            decision: verdict.decision().to_string(),
            score: details.score.value,
            threshold: details.threshold,
            decided_by: details.score.decided_by,
            outcomes: details.score.outcomes.iter().map(OutcomeSummary::from).collect(),
            record_hash: String::new(),
        };

        // Compute hash after all fields are set
        record.record_hash = record.compute_hash();
        record
    }

    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.record_id.as_bytes());
        hasher.update(self.classified_at.timestamp_millis().to_le_bytes());
        hash_optional(&mut hasher, self.content_id.as_deref());
        hash_str(&mut hasher, &self.content_digest);
        hash_str(&mut hasher, self.age_group.code());
        hash_str(&mut hasher, &self.decision);
        hasher.update(self.score.to_le_bytes());
        hasher.update(self.threshold.to_le_bytes());
        hash_optional(&mut hasher, self.decided_by.map(|r| r.to_string()).as_deref());

        hasher.update((self.outcomes.len() as u64).to_le_bytes());
        for outcome in &self.outcomes {
            hash_str(&mut hasher, &outcome.rule.to_string());
            hasher.update(outcome.contribution.to_le_bytes());
            hasher.update([u8::from(outcome.terminal)]);
            hash_optional(&mut hasher, outcome.reason.as_deref());
        }

        format!("{:x}", hasher.finalize())
    }

    /// Verify the record hash
    pub fn verify_hash(&self) -> bool {
        self.compute_hash() == self.record_hash
    }

    pub fn is_allowed(&self) -> bool {
        self.decision == "allowed"
    }

    pub fn to_json(&self) -> Result<String, ParseError> {
        serde_json::to_string(self).map_err(|e| ParseError::SerializationError(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        serde_json::from_str(json).map_err(|e| ParseError::JsonParseError(e.to_string()))
    }
}

// Length-prefixed so text cannot shift between adjacent fields.
fn hash_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn hash_optional(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(value) => {
            hasher.update([1u8]);
            hash_str(hasher, value);
        }
        None => hasher.update([0u8]),
    }
}

/// SHA-256 over every field rules can inspect, with field separators so
/// moving text between fields changes the digest.
pub fn content_digest(metadata: &ContentMetadata) -> String {
    let mut hasher = Sha256::new();
    hasher.update(metadata.channel_id.as_ref().map(|c| c.as_str()).unwrap_or("").as_bytes());
    hasher.update([0u8]);
    hasher.update(metadata.title.as_bytes());
    hasher.update([0u8]);
    hasher.update(metadata.description.as_deref().unwrap_or("").as_bytes());
    hasher.update([0u8]);
    hasher.update(metadata.channel_name.as_deref().unwrap_or("").as_bytes());
    for tag in &metadata.tags {
        hasher.update([1u8]);
        hasher.update(tag.as_bytes());
    }
    for (key, value) in &metadata.extra_fields {
        hasher.update([2u8]);
        hasher.update(key.as_bytes());
        hasher.update([0u8]);
        hasher.update(value.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GuardianEngine;

    fn classify(metadata: &ContentMetadata) -> Verdict {
        GuardianEngine::with_defaults()
            .unwrap()
            .classify(metadata, AgeGroup::Under8)
    }

    #[test]
    fn test_record_reflects_verdict() {
        let metadata = ContentMetadata::builder()
            .content_id("vid-42")
            .title("Zombie fight")
            .build();
        let verdict = classify(&metadata);
        let record = ClassificationRecord::new(&metadata, &verdict);

        assert_eq!(record.content_id.as_deref(), Some("vid-42"));
        assert_eq!(record.decision, "blocked");
        assert!(!record.is_allowed());
        assert_eq!(record.score, verdict.score().value);
        assert_eq!(record.threshold, 75);
        assert_eq!(record.outcomes.len(), 3);
        assert!(record.verify_hash());
    }

    #[test]
    fn test_tampering_is_detected() {
        let metadata = ContentMetadata::new("Zombie fight");
        let mut record = ClassificationRecord::new(&metadata, &classify(&metadata));
        record.decision = "allowed".to_string();
        assert!(!record.verify_hash());
    }

    #[test]
    fn test_hash_separates_adjacent_fields() {
        let metadata = ContentMetadata::new("Zombie fight");
        let mut record = ClassificationRecord::new(&metadata, &classify(&metadata));

        record.outcomes[0].reason = Some("ab".to_string());
        record.outcomes[1].reason = Some("c".to_string());
        let before = record.compute_hash();
        record.outcomes[0].reason = Some("a".to_string());
        record.outcomes[1].reason = Some("bc".to_string());
        assert_ne!(record.compute_hash(), before);

        record.content_id = Some(String::new());
        let empty_id = record.compute_hash();
        record.content_id = None;
        assert_ne!(record.compute_hash(), empty_id);
    }

    #[test]
    fn test_json_round_trip_keeps_hash_valid() {
        let metadata = ContentMetadata::new("Alphabet song");
        let record = ClassificationRecord::new(&metadata, &classify(&metadata));
        let parsed = ClassificationRecord::from_json(&record.to_json().unwrap()).unwrap();
        assert_eq!(parsed, record);
        assert!(parsed.verify_hash());
    }

    #[test]
    fn test_content_digest_is_field_sensitive() {
        let a = ContentMetadata::builder().title("ab").description("c").build();
        let b = ContentMetadata::builder().title("a").description("bc").build();
        assert_ne!(content_digest(&a), content_digest(&b));
        assert_eq!(content_digest(&a), content_digest(&a.clone()));
        assert_eq!(content_digest(&a).len(), 64);
    }
}
