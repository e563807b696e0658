//! Linguistic feature extraction for fragment classification
//!
//! Derives 17 boolean surface indicators from a sentence: punctuation,
//! closed-class word lists (auxiliaries, conjunctions, ...), discourse
//! starters and naive suffix heuristics.
//!
//! Feature groups:
//!   0       : auxiliary verbs
//!   1..8    : punctuation presence
//!   8..12   : closed word lists (interjections, conjunctions, temporal, opinion)
//!  12..16   : adverb suffix, discourse starter, past/gerund suffixes
//!  16       : leading capital letter
//!
//! The suffix heuristics deliberately over-match ("fly", "red", "king"):
//! the classical model was trained on exactly these definitions.

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::OnceLock;

/// Number of features produced by the extractor.
pub const NUM_FEATURES: usize = 17;

/// Feature names in schema order.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "has_auxiliary",
    "has_fullstop",
    "has_question_mark",
    "has_exclamation_mark",
    "has_comma",
    "has_semicolon",
    "has_colon",
    "has_quotation",
    "has_expression",
    "has_conjunction",
    "has_temporal",
    "has_opinion_adverb",
    "has_adverb",
    "has_starter",
    "has_past_verb",
    "has_gerund",
    "starts_capitalized",
];

// ---------------------------------------------------------------------------
// Closed word lists
// ---------------------------------------------------------------------------

const AUXILIARIES: &[&str] = &[
    "am", "is", "are", "was", "were", "be", "being", "been", "have", "has", "had", "do", "does",
    "did", "can", "could", "shall", "should", "will", "would", "may", "might", "must",
];

const CONJUNCTIONS: &[&str] = &[
    "and", "but", "or", "nor", "for", "yet", "so", "although", "because", "since", "unless",
    "while", "where", "if", "then", "than", "that",
];

const TEMPORAL_MARKERS: &[&str] = &[
    "today",
    "tomorrow",
    "yesterday",
    "now",
    "then",
    "soon",
    "later",
    "before",
    "after",
    "while",
    "during",
    "until",
    "never",
    "always",
    "often",
    "sometimes",
    "rarely",
];

const OPINION_ADVERBS: &[&str] = &[
    "fortunately",
    "unfortunately",
    "surprisingly",
    "obviously",
    "clearly",
    "frankly",
    "honestly",
    "remarkably",
    "interestingly",
    "sadly",
    "happily",
    "strangely",
    "certainly",
    "undoubtedly",
    "hopefully",
];

const EXPRESSIONS: &[&str] = &[
    "oh", "ah", "wow", "ouch", "hey", "hmm", "umm", "uh", "oops", "yay", "hurray", "alas", "phew",
    "whew", "yikes",
];

/// Discourse markers that open a sentence.
const STARTERS: &[&str] = &[
    "well",
    "so",
    "now",
    "then",
    "therefore",
    "however",
    "moreover",
    "furthermore",
    "nevertheless",
    "anyway",
    "firstly",
    "secondly",
    "finally",
    "in conclusion",
    "besides",
];

// ---------------------------------------------------------------------------
// Feature identifiers
// ---------------------------------------------------------------------------

/// A single named feature. The discriminant is its index in [`FEATURE_NAMES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    HasAuxiliary,
    HasFullstop,
    HasQuestionMark,
    HasExclamationMark,
    HasComma,
    HasSemicolon,
    HasColon,
    HasQuotation,
    HasExpression,
    HasConjunction,
    HasTemporal,
    HasOpinionAdverb,
    HasAdverb,
    HasStarter,
    HasPastVerb,
    HasGerund,
    StartsCapitalized,
}

impl Feature {
    /// All features, in schema order.
    pub const ALL: [Feature; NUM_FEATURES] = [
        Feature::HasAuxiliary,
        Feature::HasFullstop,
        Feature::HasQuestionMark,
        Feature::HasExclamationMark,
        Feature::HasComma,
        Feature::HasSemicolon,
        Feature::HasColon,
        Feature::HasQuotation,
        Feature::HasExpression,
        Feature::HasConjunction,
        Feature::HasTemporal,
        Feature::HasOpinionAdverb,
        Feature::HasAdverb,
        Feature::HasStarter,
        Feature::HasPastVerb,
        Feature::HasGerund,
        Feature::StartsCapitalized,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| Self::ALL[i])
    }
}

// ---------------------------------------------------------------------------
// Feature set
// ---------------------------------------------------------------------------

/// Fixed set of 17 boolean indicators. Every feature is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FeatureSet {
    values: [bool; NUM_FEATURES],
}

impl FeatureSet {
    pub fn is_set(&self, feature: Feature) -> bool {
        self.values[feature.index()]
    }

    /// Look up a feature by its schema name.
    pub fn get(&self, name: &str) -> Option<bool> {
        Feature::from_name(name).map(|f| self.is_set(f))
    }

    /// Iterate `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        NUM_FEATURES
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of features that fired.
    pub fn count_set(&self) -> usize {
        self.values.iter().filter(|&&v| v).count()
    }

    pub fn as_array(&self) -> &[bool; NUM_FEATURES] {
        &self.values
    }

    fn set(&mut self, feature: Feature, value: bool) {
        self.values[feature.index()] = value;
    }
}

impl Serialize for FeatureSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(NUM_FEATURES))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Builds a `\b(?:w1|w2|...)\b` matcher for a closed word list.
fn word_list_matcher(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("valid regex")
}

/// Extracts [`FeatureSet`]s from text. Matchers are compiled once in `new`.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    auxiliaries: Regex,
    conjunctions: Regex,
    temporal: Regex,
    opinion_adverbs: Regex,
    expressions: Regex,
    /// Marker at text start, or after `.`/`?`/`!` plus exactly one whitespace char
    starters: Regex,
    adverb_suffix: Regex,
    past_suffix: Regex,
    gerund_suffix: Regex,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        let starter_words = STARTERS
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");

        Self {
            auxiliaries: word_list_matcher(AUXILIARIES),
            conjunctions: word_list_matcher(CONJUNCTIONS),
            temporal: word_list_matcher(TEMPORAL_MARKERS),
            opinion_adverbs: word_list_matcher(OPINION_ADVERBS),
            expressions: word_list_matcher(EXPRESSIONS),
            starters: Regex::new(&format!(r"(?:^|[.?!][\s\x1c-\x1f])(?:{starter_words})\b"))
                .expect("valid regex"),
            adverb_suffix: Regex::new(r"\b\w+ly\b").expect("valid regex"),
            past_suffix: Regex::new(r"\b\w+ed\b").expect("valid regex"),
            gerund_suffix: Regex::new(r"\b\w+ing\b").expect("valid regex"),
        }
    }

    /// Process-wide extractor, compiled on first use.
    pub fn shared() -> &'static FeatureExtractor {
        static EXTRACTOR: OnceLock<FeatureExtractor> = OnceLock::new();
        EXTRACTOR.get_or_init(FeatureExtractor::new)
    }

    /// Extract all 17 features. Never fails; empty text yields all-false.
    pub fn extract(&self, text: &str) -> FeatureSet {
        let mut features = FeatureSet::default();
        if text.is_empty() {
            return features;
        }

        // Case-sensitive checks on the raw text
        features.set(
            Feature::StartsCapitalized,
            text.starts_with(|c: char| c.is_ascii_uppercase()),
        );
        features.set(Feature::HasFullstop, text.contains('.'));
        features.set(Feature::HasQuestionMark, text.contains('?'));
        features.set(Feature::HasExclamationMark, text.contains('!'));
        features.set(Feature::HasComma, text.contains(','));
        features.set(Feature::HasSemicolon, text.contains(';'));
        features.set(Feature::HasColon, text.contains(':'));
        features.set(
            Feature::HasQuotation,
            text.contains(|c: char| c == '\'' || c == '"'),
        );

        let lower = text.to_lowercase();

        features.set(Feature::HasAuxiliary, self.auxiliaries.is_match(&lower));
        features.set(Feature::HasConjunction, self.conjunctions.is_match(&lower));
        features.set(Feature::HasTemporal, self.temporal.is_match(&lower));
        features.set(
            Feature::HasOpinionAdverb,
            self.opinion_adverbs.is_match(&lower),
        );
        features.set(Feature::HasExpression, self.expressions.is_match(&lower));
        features.set(Feature::HasStarter, self.starters.is_match(&lower));
        features.set(Feature::HasAdverb, self.adverb_suffix.is_match(&lower));
        features.set(Feature::HasPastVerb, self.past_suffix.is_match(&lower));
        features.set(Feature::HasGerund, self.gerund_suffix.is_match(&lower));

        features
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract features with the shared extractor.
pub fn extract_features(text: &str) -> FeatureSet {
    FeatureExtractor::shared().extract(text)
}
