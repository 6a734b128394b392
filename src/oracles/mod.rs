

pub mod base;
pub mod cache;
pub mod factory;
pub mod palmetto;
pub mod wikidata;
pub mod word2vec;
pub mod wordnet;

pub use base::{CooccurrenceScorer, EmbeddingOracle, LookupError, MembershipOracle, PmiScore};
pub use cache::{CachedMembership, CachedScorer, LookupCache};
pub use factory::Services;
pub use palmetto::PalmettoClient;
pub use wikidata::WikidataClient;
pub use word2vec::Word2Vec;
pub use wordnet::WordnetIndex;
