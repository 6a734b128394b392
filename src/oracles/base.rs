
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;


#[derive(Error, Debug)]
pub enum LookupError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{source_name} returned an error: {message}")]
    Service {
        source_name: String,
        message: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{source_name} lookup timed out after {secs}s")]
    Timeout { source_name: String, secs: u64 },
}


#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PmiScore {
    pub npmi: f64,
    pub uci: f64,
}

impl PmiScore {
    pub const SENTINEL: f64 = 0.0;

    pub fn new(npmi: f64, uci: f64) -> Self {
        Self { npmi, uci }
    }

    pub fn sentinel() -> Self {
        Self::new(Self::SENTINEL, Self::SENTINEL)
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.npmi, self.uci]
    }
}


#[async_trait]
pub trait MembershipOracle: Send + Sync {

    async fn exists(&self, candidates: &[String]) -> Result<bool, LookupError>;


    fn source_name(&self) -> &str;
}


#[async_trait]
pub trait CooccurrenceScorer: Send + Sync {

    async fn score(&self, phrase: &str) -> Result<PmiScore, LookupError>;


    fn source_name(&self) -> &str;
}


pub trait EmbeddingOracle: Send + Sync {

    fn similarity(&self, phrase: &str) -> f64;


    fn embedding(&self, word: &str) -> Vec<f32>;


    fn dimension(&self) -> usize;
}


#[async_trait]
impl MembershipOracle for Arc<dyn MembershipOracle> {
    async fn exists(&self, candidates: &[String]) -> Result<bool, LookupError> {
        (**self).exists(candidates).await
    }

    fn source_name(&self) -> &str {
        (**self).source_name()
    }
}


#[async_trait]
impl CooccurrenceScorer for Arc<dyn CooccurrenceScorer> {
    async fn score(&self, phrase: &str) -> Result<PmiScore, LookupError> {
        (**self).score(phrase).await
    }

    fn source_name(&self) -> &str {
        (**self).source_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pmi_order_is_npmi_then_uci() {
        assert_eq!(PmiScore::new(0.25, -1.5).to_array(), [0.25, -1.5]);
    }

    #[test]
    fn test_sentinel_is_zero() {
        assert_eq!(PmiScore::sentinel().to_array(), [0.0, 0.0]);
    }
}
