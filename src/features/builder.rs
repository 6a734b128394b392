

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};
use tracing::{debug, warn};

use super::candidates::expand;
use super::layout::{vector_len, FeatureVector};
use crate::core::error::{Result, SegError};
use crate::oracles::base::{LookupError, MembershipOracle, PmiScore};
use crate::oracles::Services;
use crate::DEFAULT_LOOKUP_TIMEOUT;


#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
pub enum LookupPolicy {
    #[default]
    #[serde(rename = "abort")]
    #[strum(serialize = "abort")]
    Abort,

    #[serde(rename = "zero")]
    #[strum(serialize = "zero")]
    TreatAsMiss,
}


pub struct FeatureVectorBuilder {
    services: Services,
    lookup_policy: LookupPolicy,
    lookup_timeout: Duration,
}

impl FeatureVectorBuilder {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            lookup_policy: LookupPolicy::Abort,
            lookup_timeout: Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT),
        }
    }

    pub fn with_lookup_policy(mut self, policy: LookupPolicy) -> Self {
        self.lookup_policy = policy;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn services(&self) -> &Services {
        &self.services
    }


    pub async fn build(&self, phrase: &str) -> Result<FeatureVector> {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        let mut features = Vec::with_capacity(vector_len(words.len()));

        let candidates = expand(phrase, true);
        let lexicon = self.membership(&self.services.lexicon, &candidates).await?;
        features.push(lexicon);
        let knowledge_graph = self
            .membership(&self.services.knowledge_graph, &candidates)
            .await?;
        features.push(knowledge_graph);

        let pmi = self.cooccurrence(phrase).await?;
        features.extend(pmi.to_array());

        let embeddings = &self.services.embeddings;
        features.push(embeddings.similarity(phrase));

        let dim = embeddings.dimension();
        for word in &words {
            let vector = embeddings.embedding(word);
            if vector.len() != dim {
                return Err(SegError::ShapeMismatch {
                    expected: dim,
                    actual: vector.len(),
                });
            }
            features.extend(vector.into_iter().map(f64::from));
        }

        debug!(
            "Built {} features for '{}'",
            features.len(),
            crate::safe_truncate_ellipsis(phrase, 40)
        );

        Ok(FeatureVector::from_values(features))
    }

    async fn membership(
        &self,
        oracle: &Arc<dyn MembershipOracle>,
        candidates: &[String],
    ) -> Result<f64> {
        let source = oracle.source_name().to_string();
        let found = self
            .absorb(&source, self.bounded(&source, oracle.exists(candidates)).await, false)?;
        Ok(if found { 1.0 } else { 0.0 })
    }

    async fn cooccurrence(&self, phrase: &str) -> Result<PmiScore> {
        let scorer = &self.services.cooccurrence;
        let source = scorer.source_name().to_string();
        self.absorb(
            &source,
            self.bounded(&source, scorer.score(phrase)).await,
            PmiScore::sentinel(),
        )
    }

    async fn bounded<T, F>(&self, source: &str, lookup: F) -> std::result::Result<T, LookupError>
    where
        F: Future<Output = std::result::Result<T, LookupError>>,
    {
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout {
                source_name: source.to_string(),
                secs: self.lookup_timeout.as_secs(),
            }),
        }
    }

    fn absorb<T>(
        &self,
        source: &str,
        result: std::result::Result<T, LookupError>,
        fallback: T,
    ) -> Result<T> {
        match (result, self.lookup_policy) {
            (Ok(value), _) => Ok(value),
            (Err(e), LookupPolicy::TreatAsMiss) => {
                warn!("{} lookup failed, treating as miss: {}", source, e);
                Ok(fallback)
            }
            (Err(e), LookupPolicy::Abort) => Err(e.into()),
        }
    }
}
