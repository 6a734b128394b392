

use std::path::Path;

use csv_async::StringRecord;
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};
use tracing::{info, warn};

use super::csv_io::{parse_label, read_rows};
use crate::core::config::PipelineConfig;
use crate::core::error::{Result, SegError};
use crate::features::FeatureLayout;
use crate::DEFAULT_TRAIN_RATIO;


#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SplitBoundary {
    /// train = rows[..split], test = rows[split..]
    #[default]
    Inclusive,
    /// Drops row `split - 1` from both partitions.
    Legacy,
}


#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub features: Vec<Vec<f64>>,
    pub labels: Option<Vec<u8>>,
    pub width: usize,
}

impl Partition {
    fn slice(features: &[Vec<f64>], labels: Option<&[u8]>, width: usize) -> Self {
        Self {
            features: features.to_vec(),
            labels: labels.map(|l| l.to_vec()),
            width,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}


#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub train: Partition,
    /// `None` when the split leaves no rows for testing.
    pub test: Option<Partition>,
    pub is_labeled: bool,
}

impl Dataset {
    pub fn total_rows(&self) -> usize {
        self.train.len() + self.test.as_ref().map_or(0, Partition::len)
    }
}


#[derive(Debug, Clone)]
pub struct DatasetPartitioner {
    feature_vec_dim: usize,
    train_ratio: f64,
    boundary: SplitBoundary,
}

impl DatasetPartitioner {
    pub fn new(feature_vec_dim: usize, train_ratio: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&train_ratio) || train_ratio.is_nan() {
            return Err(SegError::Config(format!(
                "train_ratio must be within [0, 1], got {}",
                train_ratio
            )));
        }
        if feature_vec_dim == 0 {
            return Err(SegError::Config("feature_vec_dim must be positive".to_string()));
        }

        Ok(Self {
            feature_vec_dim,
            train_ratio,
            boundary: SplitBoundary::default(),
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let layout = FeatureLayout::new(config.max_words, config.width_policy);
        Ok(Self::new(layout.width(), config.train_ratio)?.with_boundary(config.split_boundary))
    }

    pub fn with_boundary(mut self, boundary: SplitBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn feature_vec_dim(&self) -> usize {
        self.feature_vec_dim
    }

    pub fn train_ratio(&self) -> f64 {
        self.train_ratio
    }

    pub async fn load(&self, path: &Path) -> Result<Dataset> {
        let records = read_rows(path).await?;
        let dataset = self.split(&records)?;

        info!(
            "Loaded {} rows from {}: train={}, test={}, labeled={}",
            dataset.total_rows(),
            path.display(),
            dataset.train.len(),
            dataset.test.as_ref().map_or(0, Partition::len),
            dataset.is_labeled
        );
        Ok(dataset)
    }

    pub fn split(&self, records: &[StringRecord]) -> Result<Dataset> {
        let (features, labels) = self.parse(records)?;
        let n = features.len();
        let split = ((n as f64) * self.train_ratio).floor() as usize;
        let split = split.min(n);

        let train_end = match self.boundary {
            SplitBoundary::Inclusive => split,
            SplitBoundary::Legacy if split > 0 => {
                warn!("Legacy split boundary: row {} is in neither partition", split - 1);
                split - 1
            }
            SplitBoundary::Legacy => 0,
        };

        let width = self.feature_vec_dim;
        let train = Partition::slice(
            &features[..train_end],
            labels.as_deref().map(|l| &l[..train_end]),
            width,
        );
        let test = (split < n).then(|| {
            Partition::slice(
                &features[split..],
                labels.as_deref().map(|l| &l[split..]),
                width,
            )
        });

        Ok(Dataset {
            train,
            test,
            is_labeled: labels.is_some(),
        })
    }

    // Labeled iff the first row carries one extra column.
    fn parse(&self, records: &[StringRecord]) -> Result<(Vec<Vec<f64>>, Option<Vec<u8>>)> {
        let Some(first) = records.first() else {
            return Ok((Vec::new(), None));
        };

        let dim = self.feature_vec_dim;
        let is_labeled = if first.len() == dim + 1 {
            true
        } else if first.len() == dim {
            false
        } else {
            return Err(SegError::malformed(
                0,
                format!("expected {} or {} columns, got {}", dim, dim + 1, first.len()),
            ));
        };
        let row_width = if is_labeled { dim + 1 } else { dim };

        let mut features = Vec::with_capacity(records.len());
        let mut labels = is_labeled.then(|| Vec::with_capacity(records.len()));

        for (index, record) in records.iter().enumerate() {
            if record.len() != row_width {
                return Err(SegError::malformed(
                    index,
                    format!("expected {} columns, got {}", row_width, record.len()),
                ));
            }

            let row = record
                .iter()
                .take(dim)
                .enumerate()
                .map(|(column, field)| {
                    field.trim().parse::<f64>().map_err(|_| {
                        SegError::malformed(
                            index,
                            format!("column {} value '{}' is not numeric", column, field),
                        )
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            features.push(row);

            if let Some(labels) = labels.as_mut() {
                labels.push(parse_label(&record[dim], index)?);
            }
        }

        Ok((features, labels))
    }
}

impl Default for DatasetPartitioner {
    fn default() -> Self {
        Self {
            feature_vec_dim: FeatureLayout::default().width(),
            train_ratio: DEFAULT_TRAIN_RATIO,
            boundary: SplitBoundary::default(),
        }
    }
}
