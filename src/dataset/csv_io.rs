

use std::path::Path;

use csv_async::{AsyncReaderBuilder, AsyncWriterBuilder, StringRecord};
use futures::StreamExt;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::core::error::{Result, SegError};
use crate::features::LabeledVector;
use crate::utils::strip_bom_and_nul;


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub phrase: String,
    pub label: Option<u8>,
}

impl RawRow {
    pub fn new(phrase: impl Into<String>, label: Option<u8>) -> Self {
        Self {
            phrase: phrase.into(),
            label,
        }
    }
}


pub async fn read_rows(path: &Path) -> Result<Vec<StringRecord>> {
    let bytes = tokio::fs::read(path).await?;
    let content = String::from_utf8(bytes).map_err(|e| {
        SegError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;
    let content = strip_bom_and_nul(&content);

    let mut reader = AsyncReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b',')
        .quote(b'"')
        .create_reader(content.as_bytes());

    let mut rows = Vec::new();
    let mut records = reader.records();
    while let Some(record) = records.next().await {
        rows.push(record?);
    }

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}


pub fn parse_label(field: &str, index: usize) -> Result<u8> {
    let value: f64 = field
        .trim()
        .parse()
        .map_err(|_| SegError::malformed(index, format!("label '{}' is not numeric", field)))?;

    if value == 0.0 {
        Ok(0)
    } else if value == 1.0 {
        Ok(1)
    } else {
        Err(SegError::malformed(
            index,
            format!("label {} is not 0 or 1", field.trim()),
        ))
    }
}


pub async fn read_raw_rows(path: &Path) -> Result<Vec<RawRow>> {
    let records = read_rows(path).await?;
    let Some(first) = records.first() else {
        return Ok(Vec::new());
    };

    let width = first.len();
    if !(1..=2).contains(&width) {
        return Err(SegError::malformed(
            0,
            format!("expected 1 or 2 columns, got {}", width),
        ));
    }

    let mut rows = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        if record.len() != width {
            return Err(SegError::malformed(
                index,
                format!("expected {} columns, got {}", width, record.len()),
            ));
        }
        let phrase = record[0].trim();
        if phrase.is_empty() {
            return Err(SegError::malformed(index, "empty noun phrase"));
        }
        let label = if width == 2 {
            Some(parse_label(&record[1], index)?)
        } else {
            None
        };
        rows.push(RawRow::new(phrase, label));
    }

    info!(
        "Loaded {} noun phrases ({})",
        rows.len(),
        if width == 2 { "labeled" } else { "unlabeled" }
    );
    Ok(rows)
}


pub async fn extract_labels(path: &Path) -> Result<Vec<u8>> {
    read_rows(path)
        .await?
        .iter()
        .enumerate()
        .map(|(index, record)| match record.iter().last() {
            Some(field) => parse_label(field, index),
            None => Err(SegError::malformed(index, "empty row")),
        })
        .collect()
}

// Rows go to a temp file in the destination directory, renamed into place only on success.
async fn write_atomic<I>(path: &Path, records: I) -> Result<usize>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(parent).await?;

    let temp = NamedTempFile::new_in(parent)?;
    let file = tokio::fs::File::from_std(temp.reopen()?);
    let mut writer = AsyncWriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .create_writer(file);

    let mut written = 0;
    for record in records {
        writer.write_record(&record).await?;
        written += 1;
    }
    writer.flush().await?;
    drop(writer);

    temp.persist(path)?;
    Ok(written)
}


pub async fn write_feature_table(path: &Path, rows: &[LabeledVector]) -> Result<()> {
    let records = rows.iter().map(|row| {
        let mut record: Vec<String> = row.vector.values().iter().map(|v| v.to_string()).collect();
        if let Some(label) = row.label {
            record.push(label.to_string());
        }
        record
    });

    let written = write_atomic(path, records).await?;
    info!("Feature table written: {} rows to {}", written, path.display());
    Ok(())
}


pub async fn write_predictions(path: &Path, predictions: &[u8]) -> Result<()> {
    let records = predictions.iter().map(|p| vec![p.to_string()]);
    write_atomic(path, records).await?;
    info!("Results of inference saved in {}", path.display());
    Ok(())
}
