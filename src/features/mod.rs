

pub mod builder;
pub mod candidates;
pub mod layout;
pub mod pipeline;

pub use builder::{FeatureVectorBuilder, LookupPolicy};
pub use candidates::{case_variants, expand, stem};
pub use layout::{vector_len, FeatureLayout, FeatureVector, WidthPolicy};
pub use pipeline::{BatchExtraction, ExtractionPipeline, LabeledVector};
