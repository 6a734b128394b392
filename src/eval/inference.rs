

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::metrics::{evaluate, EvaluationReport};
use crate::core::config::PipelineConfig;
use crate::core::error::{Result, SegError};
use crate::dataset::{extract_labels, write_predictions, DatasetPartitioner, Partition};
use crate::features::FeatureLayout;


#[async_trait]
pub trait Classifier: Send + Sync {

    async fn load(&self, model_path: &Path) -> Result<()>;

    /// One probability row per input vector, one column per class.
    async fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;
}

#[async_trait]
impl Classifier for Arc<dyn Classifier> {
    async fn load(&self, model_path: &Path) -> Result<()> {
        (**self).load(model_path).await
    }

    async fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        (**self).predict(features).await
    }
}


#[derive(Serialize)]
struct LoadRequest<'a> {
    path: &'a str,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    features: &'a [Vec<f64>],
}

#[derive(Deserialize)]
struct PredictResponse {
    probabilities: Vec<Vec<f64>>,
}


pub struct RemoteClassifier {
    base_url: String,
    client: Client,
}

impl RemoteClassifier {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("RemoteClassifier initialized: url={}", base_url);

        Ok(Self {
            base_url,
            client: Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn load(&self, model_path: &Path) -> Result<()> {
        let path = model_path.to_string_lossy();
        self.client
            .post(format!("{}/load", self.base_url))
            .json(&LoadRequest { path: &path })
            .send()
            .await?
            .error_for_status()
            .map_err(|e| SegError::Classifier(format!("loading {} failed: {}", path, e)))?;

        info!("Model loaded");
        Ok(())
    }

    async fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        debug!("Requesting predictions for {} rows", features.len());

        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&PredictRequest { features })
            .send()
            .await?
            .error_for_status()
            .map_err(|e| SegError::Classifier(e.to_string()))?
            .json::<PredictResponse>()
            .await?;

        if response.probabilities.len() != features.len() {
            return Err(SegError::ShapeMismatch {
                expected: features.len(),
                actual: response.probabilities.len(),
            });
        }
        Ok(response.probabilities)
    }
}


/// Index of the largest probability; ties resolve to the lowest index.
pub fn argmax(probabilities: &[f64]) -> Option<usize> {
    probabilities
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &p)| match best {
            Some((_, max)) if p <= max || p.is_nan() => best,
            _ if p.is_nan() => best,
            _ => Some((i, p)),
        })
        .map(|(i, _)| i)
}


pub async fn classify<C: Classifier + ?Sized>(
    classifier: &C,
    partition: &Partition,
) -> Result<Vec<u8>> {
    if partition.is_empty() {
        return Ok(Vec::new());
    }

    let outputs = classifier.predict(&partition.features).await?;
    if outputs.len() != partition.len() {
        return Err(SegError::ShapeMismatch {
            expected: partition.len(),
            actual: outputs.len(),
        });
    }

    outputs
        .iter()
        .enumerate()
        .map(|(row, probabilities)| {
            let class = argmax(probabilities).ok_or_else(|| {
                SegError::Classifier(format!("no class probabilities for row {}", row))
            })?;
            u8::try_from(class)
                .map_err(|_| SegError::Classifier(format!("class index {} out of range", class)))
        })
        .collect()
}

pub const DEFAULT_INFERENCE_DATA: &str = "datasets/prepared_data.csv";
pub const DEFAULT_INFERENCE_OUTPUT: &str = "datasets/inference_data.csv";

// Paths still at the extraction defaults were not set by a file or the environment.
pub fn apply_inference_defaults(config: &mut PipelineConfig) {
    let defaults = PipelineConfig::default();
    if config.data_path == defaults.data_path {
        config.data_path = PathBuf::from(DEFAULT_INFERENCE_DATA);
    }
    if config.output_path == defaults.output_path {
        config.output_path = PathBuf::from(DEFAULT_INFERENCE_OUTPUT);
    }
}


#[derive(Debug, Clone)]
pub struct InferenceJob {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    pub output_path: PathBuf,
    pub feature_vec_dim: usize,
    pub print_stats: bool,
}

impl InferenceJob {
    pub fn from_config(config: &PipelineConfig, print_stats: bool) -> Result<Self> {
        let model_path = config
            .model_path
            .clone()
            .ok_or_else(|| SegError::Config("model_path is required for inference".to_string()))?;

        Ok(Self {
            data_path: config.data_path.clone(),
            model_path,
            output_path: config.output_path.clone(),
            feature_vec_dim: FeatureLayout::new(config.max_words, config.width_policy).width(),
            print_stats,
        })
    }
}


#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    pub predictions: Vec<u8>,
    pub report: Option<EvaluationReport>,
}


pub async fn run_inference<C: Classifier + ?Sized>(
    classifier: &C,
    job: &InferenceJob,
) -> Result<InferenceOutcome> {
    if !job.data_path.exists() {
        return Err(SegError::Config(format!(
            "data file not found: {}",
            job.data_path.display()
        )));
    }

    let dataset = DatasetPartitioner::new(job.feature_vec_dim, 1.0)?
        .load(&job.data_path)
        .await?;

    classifier.load(&job.model_path).await?;
    let predictions = classify(classifier, &dataset.train).await?;

    let report = if !job.print_stats {
        None
    } else if dataset.is_labeled {
        let labels = extract_labels(&job.data_path).await?;
        Some(evaluate(&labels, &predictions)?)
    } else {
        warn!("Evaluation requested but {} carries no labels", job.data_path.display());
        None
    };

    write_predictions(&job.output_path, &predictions).await?;

    Ok(InferenceOutcome {
        predictions,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use parking_lot::Mutex;
    use serde_json::json;

    struct FixedClassifier {
        outputs: Vec<Vec<f64>>,
        loaded: Mutex<Option<PathBuf>>,
    }

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn load(&self, model_path: &Path) -> Result<()> {
            *self.loaded.lock() = Some(model_path.to_path_buf());
            Ok(())
        }

        async fn predict(&self, _features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
            Ok(self.outputs.clone())
        }
    }

    fn fixed(outputs: Vec<Vec<f64>>) -> FixedClassifier {
        FixedClassifier {
            outputs,
            loaded: Mutex::new(None),
        }
    }

    #[test]
    fn test_inference_defaults_fill_untouched_paths() {
        let mut config = PipelineConfig::default();
        apply_inference_defaults(&mut config);
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_INFERENCE_DATA));
        assert_eq!(config.output_path, PathBuf::from(DEFAULT_INFERENCE_OUTPUT));
    }

    #[test]
    fn test_inference_defaults_keep_paths_from_config_file() {
        use std::io::Write;

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "data_path = \"/data/my_table.csv\"\noutput_path = \"/data/predictions.csv\""
        )
        .unwrap();

        let mut config = PipelineConfig::load(Some(file.path())).unwrap();
        apply_inference_defaults(&mut config);
        assert_eq!(config.data_path, PathBuf::from("/data/my_table.csv"));
        assert_eq!(config.output_path, PathBuf::from("/data/predictions.csv"));

        let job = InferenceJob::from_config(
            &PipelineConfig {
                model_path: Some(PathBuf::from("model.prm")),
                ..config
            },
            false,
        )
        .unwrap();
        assert_eq!(job.data_path, PathBuf::from("/data/my_table.csv"));
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.2, 0.8]), Some(1));
        assert_eq!(argmax(&[0.9, 0.1]), Some(0));
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[f64::NAN, 0.3]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[tokio::test]
    async fn test_classify_partition() {
        let partition = Partition {
            features: vec![vec![0.0; 3]; 3],
            labels: None,
            width: 3,
        };
        let classifier = fixed(vec![vec![0.1, 0.9], vec![0.7, 0.3], vec![0.4, 0.6]]);
        assert_eq!(classify(&classifier, &partition).await.unwrap(), vec![1, 0, 1]);
    }

    #[tokio::test]
    async fn test_classify_rejects_missing_rows() {
        let partition = Partition {
            features: vec![vec![0.0; 2]; 3],
            labels: None,
            width: 2,
        };
        let classifier = fixed(vec![vec![0.1, 0.9]]);
        assert!(matches!(
            classify(&classifier, &partition).await,
            Err(SegError::ShapeMismatch {
                expected: 3,
                actual: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_short_prediction_writes_no_results() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("prepared.csv");
        std::fs::write(&data_path, "0.1,0.2\n0.3,0.4\n0.5,0.6\n").unwrap();

        let job = InferenceJob {
            data_path,
            model_path: PathBuf::from("model.prm"),
            output_path: dir.path().join("inference.csv"),
            feature_vec_dim: 2,
            print_stats: false,
        };
        let classifier = fixed(vec![vec![0.2, 0.8]]);

        assert!(matches!(
            run_inference(&classifier, &job).await,
            Err(SegError::ShapeMismatch { .. })
        ));
        assert!(!job.output_path.exists());
    }

    #[tokio::test]
    async fn test_run_inference_writes_results_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("prepared.csv");
        std::fs::write(&data_path, "0.1,0.2,1\n0.3,0.4,1\n0.5,0.6,0\n0.7,0.8,0\n").unwrap();

        let job = InferenceJob {
            data_path,
            model_path: PathBuf::from("model.prm"),
            output_path: dir.path().join("inference.csv"),
            feature_vec_dim: 2,
            print_stats: true,
        };
        let classifier = fixed(vec![
            vec![0.2, 0.8],
            vec![0.6, 0.4],
            vec![0.9, 0.1],
            vec![0.3, 0.7],
        ]);

        let outcome = run_inference(&classifier, &job).await.unwrap();
        assert_eq!(outcome.predictions, vec![1, 0, 0, 1]);
        let report = outcome.report.unwrap();
        assert_eq!(report.accuracy, Some(50.0));
        assert_eq!(
            std::fs::read_to_string(&job.output_path).unwrap(),
            "1\n0\n0\n1\n"
        );
        assert_eq!(
            classifier.loaded.lock().clone(),
            Some(PathBuf::from("model.prm"))
        );
    }

    #[tokio::test]
    async fn test_run_inference_unlabeled_skips_report() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("prepared.csv");
        std::fs::write(&data_path, "0.1,0.2\n0.3,0.4\n").unwrap();

        let job = InferenceJob {
            data_path,
            model_path: PathBuf::from("model.prm"),
            output_path: dir.path().join("inference.csv"),
            feature_vec_dim: 2,
            print_stats: true,
        };
        let classifier = fixed(vec![vec![0.2, 0.8], vec![0.6, 0.4]]);

        let outcome = run_inference(&classifier, &job).await.unwrap();
        assert!(outcome.report.is_none());
        assert_eq!(outcome.predictions, vec![1, 0]);
    }

    #[tokio::test]
    async fn test_missing_data_file() {
        let job = InferenceJob {
            data_path: PathBuf::from("/nonexistent/prepared.csv"),
            model_path: PathBuf::from("model.prm"),
            output_path: PathBuf::from("/nonexistent/out.csv"),
            feature_vec_dim: 2,
            print_stats: false,
        };
        assert!(matches!(
            run_inference(&fixed(vec![]), &job).await,
            Err(SegError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_remote_classifier_round_trip() {
        let mut server = Server::new_async().await;
        let load = server
            .mock("POST", "/load")
            .match_body(Matcher::Json(json!({"path": "model.prm"})))
            .with_status(200)
            .create_async()
            .await;
        let predict = server
            .mock("POST", "/predict")
            .match_body(Matcher::PartialJson(json!({"features": [[0.5, 1.0]]})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"probabilities": [[0.25, 0.75]]}"#)
            .create_async()
            .await;

        let classifier = RemoteClassifier::new(server.url(), Duration::from_secs(5)).unwrap();
        classifier.load(Path::new("model.prm")).await.unwrap();
        let outputs = classifier.predict(&[vec![0.5, 1.0]]).await.unwrap();

        assert_eq!(outputs, vec![vec![0.25, 0.75]]);
        load.assert_async().await;
        predict.assert_async().await;
    }

    #[tokio::test]
    async fn test_remote_classifier_row_count_mismatch() {
        let mut server = Server::new_async().await;
        let _predict = server
            .mock("POST", "/predict")
            .with_status(200)
            .with_body(r#"{"probabilities": [[0.25, 0.75]]}"#)
            .create_async()
            .await;

        let classifier = RemoteClassifier::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = classifier
            .predict(&[vec![0.5], vec![0.1]])
            .await
            .unwrap_err();
        assert!(matches!(err, SegError::ShapeMismatch { expected: 2, actual: 1 }));
    }

    #[tokio::test]
    async fn test_remote_classifier_load_failure() {
        let mut server = Server::new_async().await;
        let _load = server
            .mock("POST", "/load")
            .with_status(404)
            .create_async()
            .await;

        let classifier = RemoteClassifier::new(server.url(), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            classifier.load(Path::new("missing.prm")).await,
            Err(SegError::Classifier(_))
        ));
    }
}
