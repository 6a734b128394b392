

pub mod core;
pub mod dataset;
pub mod eval;
pub mod features;
pub mod oracles;
pub mod utils;

pub use utils::{safe_truncate, safe_truncate_ellipsis};


pub use core::config::PipelineConfig;
pub use core::error::{Result, SegError};
pub use dataset::{Dataset, DatasetPartitioner, Partition};
pub use eval::{evaluate, ConfusionCounts, EvaluationReport};
pub use features::{ExtractionPipeline, FeatureLayout, FeatureVector, FeatureVectorBuilder};
pub use oracles::Services;


pub const EMBEDDING_DIM: usize = 300;


pub const SCALAR_FEATURES: usize = 5;


pub const DEFAULT_WORKERS: usize = 10;


pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;


pub const DEFAULT_MAX_WORDS: usize = 2;


pub const DEFAULT_WIKIDATA_ENDPOINT: &str = "https://query.wikidata.org/sparql";


pub const DEFAULT_PALMETTO_URL: &str = "http://palmetto.aksw.org/palmetto-webapp/service";


pub const DEFAULT_LOOKUP_TIMEOUT: u64 = 30;


pub const DEFAULT_CACHE_SIZE: usize = 1000;


pub const DEFAULT_CACHE_TTL: u64 = 300;
