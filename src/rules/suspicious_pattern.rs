// Suspicious pattern rule
//
// Heuristic red flags rather than exact terms: clickbait punctuation and
// emoji, shouting titles, scam/phishing templates, and a cheerful title
// paired with a disturbing description. Heuristics misfire more often than
// exact matches, so this rule only lowers the score and is never terminal.
// It is the same for every band; age gating happens in the engine threshold.

use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};

use super::{RuleKind, RuleOutcome};
use crate::age_group::AgeGroup;
use crate::config::PatternConfig;
use crate::content_metadata::ContentMetadata;
use crate::error::ConfigError;

/// Scam and phishing phrasing aimed at children.
const BUILTIN_SCAM_PHRASES: &[&str] = &[
    r"\bfree\s+(?:robux|v-?bucks|gems|coins|skins)\b",
    r"\bclick\s+(?:the\s+|this\s+|my\s+)?link\b",
    r"\byou(?:'ve|\s+have)?\s+won\s+(?:a|an|the|free)\b",
    r"\bgift\s*cards?\b",
    r"\b(?:enter|give|send)\s+(?:me\s+)?your\s+(?:password|address|phone\s+number)\b",
    r"\bsubscribe\s+(?:and|to)\s+win\b",
    r"\bdm\s+me\b",
    r"\blimited\s+time\s+only\b",
];

const POSITIVE_WORDS: &[&str] = &[
    "fun", "happy", "learn", "learning", "educational", "friendly", "cute", "gentle", "calm",
    "family", "sing", "song", "songs", "play", "nursery", "lullaby", "colors", "colours",
];

const NEGATIVE_WORDS: &[&str] = &[
    "scary", "horror", "creepy", "dead", "death", "blood", "bloody", "kill", "hate", "violent",
    "nightmare", "disturbing", "evil", "terror", "injection", "surgery", "suicide",
];

/// A heuristic signal the rule can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternSignal {
    ExcessivePunctuation,
    EmojiDensity,
    Shouting,
    ScamPhrase,
    SentimentMismatch,
}

impl std::fmt::Display for PatternSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternSignal::ExcessivePunctuation => write!(f, "excessive_punctuation"),
            PatternSignal::EmojiDensity => write!(f, "emoji_density"),
            PatternSignal::Shouting => write!(f, "shouting"),
            PatternSignal::ScamPhrase => write!(f, "scam_phrase"),
            PatternSignal::SentimentMismatch => write!(f, "sentiment_mismatch"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuspiciousPatternRule {
    scam_phrases: RegexSet,
    signal_penalty: i32,
    max_penalty: i32,
    punctuation_run: usize,
    emoji_min_count: usize,
    emoji_density: f64,
    shouting_ratio: f64,
    shouting_min_letters: usize,
}

impl SuspiciousPatternRule {
    /// Compiles built-in and configured scam templates. A configured
    /// template that is not a valid regex is a construction error.
    pub fn from_config(config: &PatternConfig) -> Result<Self, ConfigError> {
        for phrase in &config.scam_phrases {
            if let Err(e) = regex::Regex::new(phrase) {
                return Err(ConfigError::InvalidPattern {
                    pattern: phrase.clone(),
                    reason: e.to_string(),
                });
            }
        }

        let patterns = BUILTIN_SCAM_PHRASES
            .iter()
            .map(|p| p.to_string())
            .chain(config.scam_phrases.iter().cloned());
        let scam_phrases = RegexSetBuilder::new(patterns)
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigError::InvalidPattern {
                pattern: "scam phrase set".to_string(),
                reason: e.to_string(),
            })?;

        Ok(SuspiciousPatternRule {
            scam_phrases,
            signal_penalty: config.signal_penalty,
            max_penalty: config.max_penalty,
            punctuation_run: config.punctuation_run,
            emoji_min_count: config.emoji_min_count,
            emoji_density: config.emoji_density,
            shouting_ratio: config.shouting_ratio,
            shouting_min_letters: config.shouting_min_letters,
        })
    }

    /// Every signal that fires for this metadata, in a fixed order.
    pub fn signals(&self, metadata: &ContentMetadata) -> Vec<PatternSignal> {
        let title = metadata.title_text().unwrap_or("");
        let description = metadata.description_text().unwrap_or("");
        let mut signals = Vec::new();

        if [title, description]
            .iter()
            .any(|text| longest_punctuation_run(text) >= self.punctuation_run)
        {
            signals.push(PatternSignal::ExcessivePunctuation);
        }
        if self.is_emoji_dense(title) {
            signals.push(PatternSignal::EmojiDensity);
        }
        if self.is_shouting(title) {
            signals.push(PatternSignal::Shouting);
        }
        if metadata
            .text_fields()
            .any(|(_, text)| self.scam_phrases.is_match(text))
        {
            signals.push(PatternSignal::ScamPhrase);
        }
        if sentiments_conflict(title, description) {
            signals.push(PatternSignal::SentimentMismatch);
        }
        signals
    }

    pub fn evaluate(&self, metadata: &ContentMetadata, _age_group: AgeGroup) -> RuleOutcome {
        let signals = self.signals(metadata);
        if signals.is_empty() {
            return RuleOutcome::neutral(RuleKind::SuspiciousPattern);
        }

        let count = i32::try_from(signals.len()).unwrap_or(i32::MAX);
        let contribution = count.saturating_mul(self.signal_penalty).max(self.max_penalty);
        let names: Vec<String> = signals.iter().map(|s| s.to_string()).collect();
        let reason = format!("suspicious patterns: {}", names.join(", "));
        RuleOutcome::adjust(RuleKind::SuspiciousPattern, contribution, reason).with_matches(names)
    }

    fn is_emoji_dense(&self, text: &str) -> bool {
        let visible = text.chars().filter(|c| !c.is_whitespace()).count();
        let emoji = text.chars().filter(|c| is_emoji(*c)).count();
        if visible == 0 || emoji < self.emoji_min_count {
            return false;
        }
        emoji as f64 / visible as f64 >= self.emoji_density
    }

    fn is_shouting(&self, text: &str) -> bool {
        let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.len() < self.shouting_min_letters {
            return false;
        }
        let upper = letters.iter().filter(|c| c.is_uppercase()).count();
        upper as f64 / letters.len() as f64 >= self.shouting_ratio
    }
}

fn longest_punctuation_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if matches!(c, '!' | '?' | '！' | '？') {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0x2B00..=0x2BFF
    )
}

/// Lexicon sentiment: positive minus negative word count.
fn sentiment(text: &str) -> i32 {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .map(|w| {
            if POSITIVE_WORDS.contains(&w.as_str()) {
                1
            } else if NEGATIVE_WORDS.contains(&w.as_str()) {
                -1
            } else {
                0
            }
        })
        .sum()
}

fn sentiments_conflict(title: &str, description: &str) -> bool {
    let (t, d) = (sentiment(title), sentiment(description));
    (t > 0 && d < 0) || (t < 0 && d > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> SuspiciousPatternRule {
        SuspiciousPatternRule::from_config(&PatternConfig::default()).unwrap()
    }

    #[test]
    fn test_calm_title_is_neutral() {
        let metadata = ContentMetadata::builder()
            .title("Fun educational video about planets")
            .description("Learn the names of the planets with a happy song.")
            .build();
        assert!(rule().evaluate(&metadata, AgeGroup::Under5).is_neutral());
    }

    #[test]
    fn test_punctuation_run() {
        assert_eq!(longest_punctuation_run("what?!?! no"), 4);
        assert_eq!(longest_punctuation_run("hi! there?"), 1);
        let signals = rule().signals(&ContentMetadata::new("You won't believe this!!!"));
        assert_eq!(signals, vec![PatternSignal::ExcessivePunctuation]);
    }

    #[test]
    fn test_emoji_density() {
        let rule = rule();
        assert!(rule.is_emoji_dense("OMG 😱😱😱 wow"));
        assert!(!rule.is_emoji_dense("Rocket launch 🚀"));
    }

    #[test]
    fn test_shouting_needs_enough_letters() {
        let rule = rule();
        assert!(rule.is_shouting("THIS IS THE BEST VIDEO EVER"));
        assert!(!rule.is_shouting("ABC SONG"));
        assert!(!rule.is_shouting("NASA explains the Moon"));
    }

    #[test]
    fn test_scam_phrases_anywhere() {
        let metadata = ContentMetadata::builder()
            .title("Minecraft build")
            .add_tag("FREE ROBUX")
            .build();
        assert_eq!(rule().signals(&metadata), vec![PatternSignal::ScamPhrase]);
    }

    #[test]
    fn test_custom_scam_phrase() {
        let config = PatternConfig {
            scam_phrases: vec![r"\bsecret\s+code\b".to_string()],
            ..PatternConfig::default()
        };
        let rule = SuspiciousPatternRule::from_config(&config).unwrap();
        let signals = rule.signals(&ContentMetadata::new("Type the Secret Code now"));
        assert_eq!(signals, vec![PatternSignal::ScamPhrase]);
    }

    #[test]
    fn test_invalid_custom_pattern_fails_construction() {
        let config = PatternConfig {
            scam_phrases: vec!["(unclosed".to_string()],
            ..PatternConfig::default()
        };
        assert!(matches!(
            SuspiciousPatternRule::from_config(&config),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_sentiment_mismatch() {
        let metadata = ContentMetadata::builder()
            .title("Happy nursery song for kids")
            .description("creepy blood scene, very disturbing")
            .build();
        assert_eq!(rule().signals(&metadata), vec![PatternSignal::SentimentMismatch]);
    }

    #[test]
    fn test_penalty_accumulates_and_caps() {
        let rule = rule();
        let metadata = ContentMetadata::builder()
            .title("HAPPY FUN SONG CLICK THE LINK 😱😱😱😱😱😱!!!")
            .description("creepy blood")
            .build();
        let outcome = rule.evaluate(&metadata, AgeGroup::Under16);
        assert_eq!(outcome.matched.len(), 5);
        assert_eq!(outcome.contribution, -40);
        assert!(!outcome.terminal);
    }
}
