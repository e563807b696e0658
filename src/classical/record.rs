//! Fixed-schema input record for the classical pipeline
//!
//! One row: the raw text plus the 17 extracted features. The column schema
//! is declared here once and shared by every pipeline implementation.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::features::{FeatureExtractor, FeatureSet, FEATURE_NAMES, NUM_FEATURES};

/// Column holding the raw input text.
pub const TEXT_COLUMN: &str = "Processed Text";

/// Number of columns in a record.
pub const NUM_COLUMNS: usize = NUM_FEATURES + 1;

/// Record columns in order: text first, then features in schema order.
pub const RECORD_COLUMNS: [&str; NUM_COLUMNS] = [
    TEXT_COLUMN,
    FEATURE_NAMES[0],
    FEATURE_NAMES[1],
    FEATURE_NAMES[2],
    FEATURE_NAMES[3],
    FEATURE_NAMES[4],
    FEATURE_NAMES[5],
    FEATURE_NAMES[6],
    FEATURE_NAMES[7],
    FEATURE_NAMES[8],
    FEATURE_NAMES[9],
    FEATURE_NAMES[10],
    FEATURE_NAMES[11],
    FEATURE_NAMES[12],
    FEATURE_NAMES[13],
    FEATURE_NAMES[14],
    FEATURE_NAMES[15],
    FEATURE_NAMES[16],
];

/// A single cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordValue<'a> {
    Text(&'a str),
    Flag(bool),
}

/// Single-row record passed to a [`Pipeline`](super::Pipeline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    text: String,
    features: FeatureSet,
}

impl FeatureRecord {
    pub fn new(text: impl Into<String>, features: FeatureSet) -> Self {
        Self {
            text: text.into(),
            features,
        }
    }

    /// Build a record by running `extractor` over `text`.
    pub fn from_text(text: &str, extractor: &FeatureExtractor) -> Self {
        Self::new(text, extractor.extract(text))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &RECORD_COLUMNS
    }

    /// Look up a cell by column name.
    pub fn value(&self, column: &str) -> Option<RecordValue<'_>> {
        if column == TEXT_COLUMN {
            return Some(RecordValue::Text(&self.text));
        }
        self.features.get(column).map(RecordValue::Flag)
    }

    /// Iterate cells in column order.
    pub fn cells(&self) -> impl Iterator<Item = (&'static str, RecordValue<'_>)> + '_ {
        std::iter::once((TEXT_COLUMN, RecordValue::Text(self.text.as_str()))).chain(
            self.features
                .iter()
                .map(|(name, value)| (name, RecordValue::Flag(value))),
        )
    }
}

impl Serialize for FeatureRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(NUM_COLUMNS))?;
        map.serialize_entry(TEXT_COLUMN, &self.text)?;
        for (name, value) in self.features.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}
