

pub mod inference;
pub mod metrics;

pub use inference::{
    apply_inference_defaults, argmax, classify, run_inference, Classifier, InferenceJob,
    InferenceOutcome, RemoteClassifier, DEFAULT_INFERENCE_DATA, DEFAULT_INFERENCE_OUTPUT,
};
pub use metrics::{evaluate, ConfusionCounts, EvaluationReport};
