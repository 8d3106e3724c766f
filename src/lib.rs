//! # Guardian Engine
//!
//! Deterministic content safety classification. Given media metadata and a
//! child's age band, produces a bounded Guardian Score and an allow/block
//! verdict from a fixed chain of rules.
//!
//! ```
//! use guardian_engine::{AgeGroup, ContentMetadata, GuardianEngine};
//!
//! let engine = GuardianEngine::with_defaults().unwrap();
//! let video = ContentMetadata::builder()
//!     .channel_id("trusted-kids-channel")
//!     .title("fun educational video")
//!     .build();
//! assert!(engine.classify(&video, AgeGroup::from_age(6)).is_allowed());
//! ```

pub mod age_group;
pub mod audit;
pub mod config;
pub mod content_metadata;
pub mod engine;
pub mod error;
pub mod rules;
pub mod scorer;
pub mod verdict;

pub use age_group::{AgeGroup, CodeResolution, FALLBACK_AGE_GROUP};

pub use content_metadata::{ChannelId, ContentMetadata, ContentMetadataBuilder};

pub use config::{
    AgeThresholds,          // Per-band minimum safe score
    BandTerms,              // Absolute/borderline terms for one band
    BlocklistConfig,        // Keyword rule configuration
    EngineConfig,           // Complete engine configuration
    PatternConfig,          // Heuristic rule configuration
    TrustedChannelConfig,   // Allow-list configuration
};

pub use rules::{
    KeywordBlocklistRule, PatternSignal, Rule, RuleChain, RuleKind, RuleOutcome,
    SuspiciousPatternRule, TrustedChannelRule,
};

pub use scorer::{clamp_score, GuardianScore, Scorer, DEFAULT_BASELINE, SCORE_MAX, SCORE_MIN};

pub use engine::{GuardianEngine, PrecedencePolicy, DEFAULT_PRECEDENCE};

pub use verdict::{Verdict, VerdictDetails};

pub use audit::{content_digest, ClassificationRecord, OutcomeSummary};

pub use error::{ConfigError, GuardianError, GuardianResult, ParseError};
