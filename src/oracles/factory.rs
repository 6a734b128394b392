

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use super::base::{CooccurrenceScorer, EmbeddingOracle, MembershipOracle};
use super::cache::{CachedMembership, CachedScorer};
use super::palmetto::PalmettoClient;
use super::wikidata::WikidataClient;
use super::word2vec::Word2Vec;
use super::wordnet::WordnetIndex;
use crate::EMBEDDING_DIM;
use crate::core::config::PipelineConfig;
use crate::core::error::{Result, SegError};


#[derive(Clone)]
pub struct Services {
    pub lexicon: Arc<dyn MembershipOracle>,
    pub knowledge_graph: Arc<dyn MembershipOracle>,
    pub cooccurrence: Arc<dyn CooccurrenceScorer>,
    pub embeddings: Arc<dyn EmbeddingOracle>,
}

impl Services {
    pub fn new(
        lexicon: Arc<dyn MembershipOracle>,
        knowledge_graph: Arc<dyn MembershipOracle>,
        cooccurrence: Arc<dyn CooccurrenceScorer>,
        embeddings: Arc<dyn EmbeddingOracle>,
    ) -> Self {
        Self {
            lexicon,
            knowledge_graph,
            cooccurrence,
            embeddings,
        }
    }

    // Blocking model and index loads run once here, before any extraction.
    pub async fn init(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;

        let wordnet_path = required_path(&config.wordnet_path, "wordnet_path")?;
        let w2v_path = required_path(&config.w2v_path, "w2v_path")?;

        let lexicon = tokio::task::spawn_blocking(move || WordnetIndex::load(&wordnet_path))
            .await
            .map_err(|e| SegError::Internal(format!("WordNet loader panicked: {}", e)))??;

        let knowledge_graph = WikidataClient::new(
            config.wikidata_endpoint.clone(),
            config.http_proxy.as_deref(),
            config.https_proxy.as_deref(),
            config.lookup_timeout(),
        )?;
        let cooccurrence = PalmettoClient::new(config.palmetto_url.clone(), config.lookup_timeout())?;

        info!("Start loading Word2Vec model (this might take a while...)");
        let embeddings = tokio::task::spawn_blocking(move || Word2Vec::load(&w2v_path))
            .await
            .map_err(|e| SegError::Internal(format!("Word2Vec loader panicked: {}", e)))??;

        if embeddings.dimension() != EMBEDDING_DIM {
            return Err(SegError::Model(format!(
                "embedding model has {} dimensions, expected {}",
                embeddings.dimension(),
                EMBEDDING_DIM
            )));
        }
        info!("Finish loading feature extraction services");

        Ok(Self {
            lexicon: Arc::new(lexicon),
            knowledge_graph: Arc::new(CachedMembership::new(
                Arc::new(knowledge_graph),
                config.cache_size,
                config.cache_ttl_secs,
            )),
            cooccurrence: Arc::new(CachedScorer::new(
                Arc::new(cooccurrence),
                config.cache_size,
                config.cache_ttl_secs,
            )),
            embeddings: Arc::new(embeddings),
        })
    }
}

fn required_path(path: &Option<PathBuf>, key: &str) -> Result<PathBuf> {
    path.clone()
        .ok_or_else(|| SegError::Config(format!("{} is required", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    #[tokio::test]
    async fn test_init_requires_model_paths() {
        let config = PipelineConfig::default();
        let err = Services::init(&config).await.err().unwrap();
        assert!(err.to_string().contains("wordnet_path"));
    }

    #[tokio::test]
    async fn test_init_rejects_wrong_embedding_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let lemmas = dir.path().join("lemmas.txt");
        fs::write(&lemmas, "hot_dog\n").unwrap();
        let model = dir.path().join("model.txt");
        let mut file = fs::File::create(&model).unwrap();
        writeln!(file, "hot 1 0 0").unwrap();

        let config = PipelineConfig {
            wordnet_path: Some(lemmas),
            w2v_path: Some(model),
            ..Default::default()
        };
        assert!(matches!(
            Services::init(&config).await,
            Err(SegError::Model(_))
        ));
    }

    #[tokio::test]
    async fn test_init_builds_all_services() {
        let dir = tempfile::tempdir().unwrap();
        let lemmas = dir.path().join("lemmas.txt");
        fs::write(&lemmas, "hot_dog\n").unwrap();
        let model = dir.path().join("model.txt");
        let values = vec!["0.5"; EMBEDDING_DIM].join(" ");
        fs::write(&model, format!("hot {}\ndog {}\n", values, values)).unwrap();

        let config = PipelineConfig {
            wordnet_path: Some(lemmas),
            w2v_path: Some(model),
            ..Default::default()
        };
        let services = Services::init(&config).await.unwrap();

        assert_eq!(services.embeddings.dimension(), EMBEDDING_DIM);
        assert_eq!(services.lexicon.source_name(), "wordnet");
        assert_eq!(services.knowledge_graph.source_name(), "wikidata");
        assert_eq!(services.cooccurrence.source_name(), "palmetto");
        assert!(services.lexicon.exists(&["Hot Dog".to_string()]).await.unwrap());
    }
}
