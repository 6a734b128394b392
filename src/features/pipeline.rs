

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::builder::FeatureVectorBuilder;
use super::layout::{FeatureLayout, FeatureVector};
use crate::core::config::PipelineConfig;
use crate::core::error::{Result, SegError};
use crate::dataset::RawRow;
use crate::oracles::Services;


#[derive(Debug, Clone, PartialEq)]
pub struct LabeledVector {
    pub phrase: String,
    pub vector: FeatureVector,
    pub label: Option<u8>,
}


#[derive(Debug)]
pub struct BatchExtraction {

    pub vectors: Vec<(usize, FeatureVector)>,

    pub failed: Vec<(usize, String, String)>,
}

impl BatchExtraction {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.vectors.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }
}

type Slot = Option<Result<FeatureVector>>;


pub struct ExtractionPipeline {
    builder: Arc<FeatureVectorBuilder>,
    layout: FeatureLayout,
    workers: usize,
    show_progress: bool,
}

impl ExtractionPipeline {
    pub fn new(builder: FeatureVectorBuilder, workers: usize) -> Self {
        let workers = workers.max(1);
        info!("ExtractionPipeline initialized: workers={}", workers);

        Self {
            builder: Arc::new(builder),
            layout: FeatureLayout::default(),
            workers,
            show_progress: false,
        }
    }

    pub fn from_config(services: Services, config: &PipelineConfig) -> Self {
        let builder = FeatureVectorBuilder::new(services)
            .with_lookup_policy(config.on_lookup_failure)
            .with_lookup_timeout(config.lookup_timeout());

        Self::new(builder, config.workers)
            .with_layout(FeatureLayout::new(config.max_words, config.width_policy))
    }

    pub fn with_layout(mut self, layout: FeatureLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn layout(&self) -> FeatureLayout {
        self.layout
    }

    pub fn workers(&self) -> usize {
        self.workers
    }


    pub async fn extract_all(&self, phrases: &[String]) -> Result<Vec<FeatureVector>> {
        let slots = self.dispatch(phrases, true).await?;

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| match slot {
                Some(result) => result,
                None => Err(SegError::Internal(format!(
                    "no result for phrase #{}",
                    index
                ))),
            })
            .collect()
    }


    pub async fn extract_partial(&self, phrases: &[String]) -> Result<BatchExtraction> {
        let slots = self.dispatch(phrases, false).await?;

        let mut vectors = Vec::with_capacity(slots.len());
        let mut failed = Vec::new();
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(Ok(vector)) => vectors.push((index, vector)),
                Some(Err(e)) => failed.push((index, phrases[index].clone(), e.to_string())),
                None => failed.push((
                    index,
                    phrases[index].clone(),
                    "no result".to_string(),
                )),
            }
        }

        info!(
            "Batch extraction complete: {}/{} built, {} failed",
            vectors.len(),
            phrases.len(),
            failed.len()
        );

        Ok(BatchExtraction { vectors, failed })
    }


    pub async fn extract_labeled(
        &self,
        rows: &[RawRow],
        skip_failed: bool,
    ) -> Result<Vec<LabeledVector>> {
        let phrases: Vec<String> = rows.iter().map(|r| r.phrase.clone()).collect();

        let indexed: Vec<(usize, FeatureVector)> = if skip_failed {
            let batch = self.extract_partial(&phrases).await?;
            for (index, phrase, error) in &batch.failed {
                warn!("Skipping phrase #{} ({}): {}", index, phrase, error);
            }
            batch.vectors
        } else {
            self.extract_all(&phrases).await?.into_iter().enumerate().collect()
        };

        Ok(indexed
            .into_iter()
            .map(|(index, vector)| LabeledVector {
                phrase: rows[index].phrase.clone(),
                vector,
                label: rows[index].label,
            })
            .collect())
    }

    // Tasks finish in any order; each result lands in the slot of its input index.
    async fn dispatch(&self, phrases: &[String], fail_fast: bool) -> Result<Vec<Slot>> {
        debug!(
            "Dispatching {} phrases to {} workers (fail_fast={})",
            phrases.len(),
            self.workers,
            fail_fast
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for (index, phrase) in phrases.iter().cloned().enumerate() {
            let builder = Arc::clone(&self.builder);
            let semaphore = Arc::clone(&semaphore);
            let layout = self.layout;

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return (index, Err(SegError::Internal("worker pool closed".to_string())));
                };
                let result = match builder.build(&phrase).await {
                    Ok(vector) => layout.conform(vector),
                    Err(e) => Err(e),
                };
                (index, result)
            });
        }

        let progress = self.progress_bar(phrases.len());
        let mut slots: Vec<Slot> = (0..phrases.len()).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            let (index, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tasks.abort_all();
                    progress.finish_and_clear();
                    return Err(SegError::Internal(format!("Task panic: {}", e)));
                }
            };
            progress.inc(1);

            if fail_fast {
                if let Err(e) = &result {
                    tasks.abort_all();
                    progress.finish_and_clear();
                    return Err(SegError::Extraction {
                        index,
                        phrase: phrases[index].clone(),
                        error: e.to_string(),
                    });
                }
            }
            slots[index] = Some(result);
        }

        progress.finish_and_clear();
        Ok(slots)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("np feature extraction");
        pb
    }
}
