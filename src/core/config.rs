

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{Result, SegError};
use crate::dataset::SplitBoundary;
use crate::features::{LookupPolicy, WidthPolicy};
use crate::{
    DEFAULT_CACHE_SIZE, DEFAULT_CACHE_TTL, DEFAULT_LOOKUP_TIMEOUT, DEFAULT_MAX_WORDS,
    DEFAULT_PALMETTO_URL, DEFAULT_TRAIN_RATIO, DEFAULT_WIKIDATA_ENDPOINT, DEFAULT_WORKERS,
};

const ENV_PREFIX: &str = "NPSEG";


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {

    pub data_path: PathBuf,
    pub output_path: PathBuf,
    pub w2v_path: Option<PathBuf>,
    pub wordnet_path: Option<PathBuf>,


    pub wikidata_endpoint: String,
    pub palmetto_url: String,
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub lookup_timeout_secs: u64,
    pub on_lookup_failure: LookupPolicy,


    pub cache_size: usize,
    pub cache_ttl_secs: u64,


    pub workers: usize,
    pub skip_failed_phrases: bool,
    pub max_words: usize,
    pub width_policy: WidthPolicy,


    pub train_ratio: f64,
    pub split_boundary: SplitBoundary,


    pub classifier_url: Option<String>,
    pub model_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("datasets/raw_data.csv"),
            output_path: PathBuf::from("datasets/prepared_data.csv"),
            w2v_path: None,
            wordnet_path: None,

            wikidata_endpoint: DEFAULT_WIKIDATA_ENDPOINT.to_string(),
            palmetto_url: DEFAULT_PALMETTO_URL.to_string(),
            http_proxy: None,
            https_proxy: None,
            lookup_timeout_secs: DEFAULT_LOOKUP_TIMEOUT,
            on_lookup_failure: LookupPolicy::Abort,

            cache_size: DEFAULT_CACHE_SIZE,
            cache_ttl_secs: DEFAULT_CACHE_TTL,

            workers: DEFAULT_WORKERS,
            skip_failed_phrases: false,
            max_words: DEFAULT_MAX_WORDS,
            width_policy: WidthPolicy::Pad,

            train_ratio: DEFAULT_TRAIN_RATIO,
            split_boundary: SplitBoundary::Inclusive,

            classifier_url: None,
            model_path: None,
        }
    }
}

impl PipelineConfig {

    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize::<Self>()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.train_ratio) {
            return Err(SegError::Config(format!(
                "train_ratio must be within [0, 1], got {}",
                self.train_ratio
            )));
        }
        if self.workers == 0 {
            return Err(SegError::Config("workers must be at least 1".to_string()));
        }
        if self.max_words == 0 {
            return Err(SegError::Config("max_words must be at least 1".to_string()));
        }
        if self.lookup_timeout_secs == 0 {
            return Err(SegError::Config(
                "lookup_timeout_secs must be at least 1".to_string(),
            ));
        }

        let urls = [
            Some(("wikidata_endpoint", &self.wikidata_endpoint)),
            Some(("palmetto_url", &self.palmetto_url)),
            self.http_proxy.as_ref().map(|u| ("http_proxy", u)),
            self.https_proxy.as_ref().map(|u| ("https_proxy", u)),
            self.classifier_url.as_ref().map(|u| ("classifier_url", u)),
        ];
        for (key, value) in urls.into_iter().flatten() {
            Url::parse(value)
                .map_err(|e| SegError::Config(format!("{} is not a valid URL ({}): {}", key, value, e)))?;
        }

        Ok(())
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}
