

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};
use tracing::warn;

use crate::core::error::{Result, SegError};
use crate::{EMBEDDING_DIM, SCALAR_FEATURES};


pub const LEXICON_FLAG: usize = 0;
pub const KNOWLEDGE_GRAPH_FLAG: usize = 1;
pub const NPMI: usize = 2;
pub const UCI: usize = 3;
pub const SIMILARITY: usize = 4;


#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {

    pub(crate) fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn lexicon_flag(&self) -> f64 {
        self.values[LEXICON_FLAG]
    }

    pub fn knowledge_graph_flag(&self) -> f64 {
        self.values[KNOWLEDGE_GRAPH_FLAG]
    }

    pub fn npmi(&self) -> f64 {
        self.values[NPMI]
    }

    pub fn uci(&self) -> f64 {
        self.values[UCI]
    }

    pub fn similarity(&self) -> f64 {
        self.values[SIMILARITY]
    }

    pub fn word_blocks(&self) -> usize {
        (self.values.len() - SCALAR_FEATURES) / EMBEDDING_DIM
    }


    pub fn word_embedding(&self, index: usize) -> Option<&[f64]> {
        let start = SCALAR_FEATURES + index * EMBEDDING_DIM;
        self.values.get(start..start + EMBEDDING_DIM)
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}


pub const fn vector_len(word_count: usize) -> usize {
    SCALAR_FEATURES + EMBEDDING_DIM * word_count
}


#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WidthPolicy {

    Variable,

    Pad,

    Strict,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureLayout {
    pub max_words: usize,
    pub policy: WidthPolicy,
}

impl FeatureLayout {
    pub fn new(max_words: usize, policy: WidthPolicy) -> Self {
        Self { max_words, policy }
    }


    pub fn width(&self) -> usize {
        vector_len(self.max_words)
    }

    pub fn conform(&self, vector: FeatureVector) -> Result<FeatureVector> {
        let blocks = vector.word_blocks();
        if self.policy == WidthPolicy::Variable || blocks == self.max_words {
            return Ok(vector);
        }

        let target = self.width();
        let mut values = vector.into_values();

        if blocks > self.max_words {
            if self.policy == WidthPolicy::Strict {
                return Err(SegError::ShapeMismatch {
                    expected: target,
                    actual: values.len(),
                });
            }
            warn!(
                "Truncating {} word blocks to {}",
                blocks, self.max_words
            );
            values.truncate(target);
        } else {
            values.resize(target, 0.0);
        }

        Ok(FeatureVector::from_values(values))
    }
}

impl Default for FeatureLayout {
    fn default() -> Self {
        Self::new(crate::DEFAULT_MAX_WORDS, WidthPolicy::Pad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn vector_with_words(words: usize) -> FeatureVector {
        let mut values = vec![1.0, 0.0, 0.5, 2.5, 0.8];
        for w in 0..words {
            values.extend(std::iter::repeat(w as f64 + 1.0).take(EMBEDDING_DIM));
        }
        FeatureVector::from_values(values)
    }

    #[test]
    fn test_default_width_matches_two_word_table() {
        assert_eq!(FeatureLayout::default().width(), 605);
        assert_eq!(vector_len(1), 305);
    }

    #[test]
    fn test_accessors() {
        let v = vector_with_words(2);
        assert_eq!(v.lexicon_flag(), 1.0);
        assert_eq!(v.knowledge_graph_flag(), 0.0);
        assert_eq!(v.npmi(), 0.5);
        assert_eq!(v.uci(), 2.5);
        assert_eq!(v.similarity(), 0.8);
        assert_eq!(v.word_blocks(), 2);
        assert_eq!(v.word_embedding(1).unwrap()[0], 2.0);
        assert!(v.word_embedding(2).is_none());
    }

    #[test]
    fn test_pad_short_phrase() {
        let layout = FeatureLayout::new(2, WidthPolicy::Pad);
        let v = layout.conform(vector_with_words(1)).unwrap();
        assert_eq!(v.len(), 605);
        assert_eq!(v.word_embedding(0).unwrap()[0], 1.0);
        assert!(v.word_embedding(1).unwrap().iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_pad_truncates_long_phrase() {
        let layout = FeatureLayout::new(2, WidthPolicy::Pad);
        let v = layout.conform(vector_with_words(3)).unwrap();
        assert_eq!(v.len(), 605);
        assert_eq!(v.word_embedding(1).unwrap()[0], 2.0);
    }

    #[test]
    fn test_strict_rejects_long_phrase() {
        let layout = FeatureLayout::new(2, WidthPolicy::Strict);
        let err = layout.conform(vector_with_words(3)).unwrap_err();
        assert!(matches!(
            err,
            SegError::ShapeMismatch {
                expected: 605,
                actual: 905
            }
        ));
        assert_eq!(layout.conform(vector_with_words(1)).unwrap().len(), 605);
    }

    #[test]
    fn test_variable_keeps_natural_length() {
        let layout = FeatureLayout::new(2, WidthPolicy::Variable);
        assert_eq!(layout.conform(vector_with_words(3)).unwrap().len(), 905);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(WidthPolicy::from_str("strict").unwrap(), WidthPolicy::Strict);
        assert!(WidthPolicy::from_str("fixed").is_err());
    }
}
