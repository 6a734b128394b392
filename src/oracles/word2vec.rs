

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use super::base::EmbeddingOracle;
use crate::core::error::{Result, SegError};

// Header counts are untrusted; the map grows past this on its own.
const MAX_PREALLOCATED_WORDS: usize = 1 << 20;


pub struct Word2Vec {
    vectors: HashMap<String, Vec<f32>>,
    dimension: usize,
}

impl Word2Vec {

    pub fn load(path: &Path) -> Result<Self> {
        let is_binary = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("bin"));

        let reader = BufReader::new(File::open(path)?);
        let model = if is_binary {
            Self::read_binary(reader)?
        } else {
            Self::read_text(reader)?
        };

        info!(
            "Word2Vec model loaded: {} words, dim={} ({})",
            model.vectors.len(),
            model.dimension,
            path.display()
        );

        Ok(model)
    }

    pub fn from_vectors<I>(dimension: usize, vectors: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        let mut map = HashMap::new();
        for (word, vector) in vectors {
            if vector.len() != dimension {
                return Err(SegError::Model(format!(
                    "vector for '{}' has {} dims, expected {}",
                    word,
                    vector.len(),
                    dimension
                )));
            }
            map.insert(word, vector);
        }
        Ok(Self {
            vectors: map,
            dimension,
        })
    }

    fn read_text<R: BufRead>(reader: R) -> Result<Self> {
        let mut vectors = HashMap::new();
        let mut dimension = None;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else {
                continue;
            };
            let values: Vec<&str> = parts.collect();

            // Optional "<count> <dim>" header.
            if line_no == 0 && values.len() == 1 && word.parse::<usize>().is_ok() {
                dimension = Some(values[0].parse::<usize>().map_err(|e| {
                    SegError::Model(format!("invalid header dimension: {}", e))
                })?);
                continue;
            }

            let vector = values
                .iter()
                .map(|v| v.parse::<f32>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| SegError::Model(format!("line {}: {}", line_no + 1, e)))?;

            let expected = *dimension.get_or_insert(vector.len());
            if vector.len() != expected {
                return Err(SegError::Model(format!(
                    "line {}: {} dims, expected {}",
                    line_no + 1,
                    vector.len(),
                    expected
                )));
            }
            vectors.insert(word.to_string(), vector);
        }

        let dimension = dimension
            .filter(|d| *d > 0)
            .ok_or_else(|| SegError::Model("model file contains no vectors".to_string()))?;

        Ok(Self { vectors, dimension })
    }

    fn read_binary<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut header = String::new();
        reader.read_line(&mut header)?;
        let mut fields = header.split_whitespace().map(str::parse::<usize>);
        let (count, dimension) = match (fields.next(), fields.next()) {
            (Some(Ok(count)), Some(Ok(dim))) if dim > 0 => (count, dim),
            _ => {
                return Err(SegError::Model(format!(
                    "invalid binary header: {:?}",
                    header.trim()
                )));
            }
        };

        let mut vectors = HashMap::with_capacity(count.min(MAX_PREALLOCATED_WORDS));
        let mut buf = vec![0u8; dimension * 4];
        for i in 0..count {
            let mut word = Vec::new();
            reader.read_until(b' ', &mut word)?;
            if word.last() == Some(&b' ') {
                word.pop();
            }
            let word = String::from_utf8_lossy(&word).trim_start_matches('\n').to_string();
            if word.is_empty() {
                return Err(SegError::Model(format!("truncated model at entry {}", i)));
            }

            reader.read_exact(&mut buf)?;
            let vector = buf
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            vectors.insert(word, vector);
        }

        Ok(Self { vectors, dimension })
    }

    fn lookup(&self, word: &str) -> Option<&Vec<f32>> {
        self.vectors
            .get(word)
            .or_else(|| self.vectors.get(&word.to_lowercase()))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.lookup(word).is_some()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectors.len()
    }
}


pub fn cosine_similarity(vec1: &[f32], vec2: &[f32]) -> f64 {
    if vec1.len() != vec2.len() || vec1.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = vec1.iter().zip(vec2.iter()).map(|(a, b)| a * b).sum();
    let mag1: f32 = vec1.iter().map(|a| a * a).sum::<f32>().sqrt();
    let mag2: f32 = vec2.iter().map(|b| b * b).sum::<f32>().sqrt();

    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }

    (dot_product / (mag1 * mag2)) as f64
}

impl EmbeddingOracle for Word2Vec {
    // Mean cosine over every pair of in-vocabulary words.
    fn similarity(&self, phrase: &str) -> f64 {
        let known: Vec<&Vec<f32>> = phrase
            .split_whitespace()
            .filter_map(|w| self.lookup(w))
            .collect();

        if known.len() < 2 {
            return 0.0;
        }

        let mut total = 0.0;
        let mut pairs = 0usize;
        for (i, a) in known.iter().enumerate() {
            for b in &known[i + 1..] {
                total += cosine_similarity(a, b);
                pairs += 1;
            }
        }
        total / pairs as f64
    }

    fn embedding(&self, word: &str) -> Vec<f32> {
        match self.lookup(word) {
            Some(vector) => vector.clone(),
            None => {
                debug!("Out-of-vocabulary word: {}", word);
                vec![0.0; self.dimension]
            }
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn toy_model() -> Word2Vec {
        Word2Vec::from_vectors(
            3,
            [
                ("hot".to_string(), vec![1.0, 0.0, 0.0]),
                ("dog".to_string(), vec![1.0, 1.0, 0.0]),
                ("cat".to_string(), vec![0.0, 0.0, 1.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_similarity_is_mean_pairwise_cosine() {
        let model = toy_model();
        let expected = 1.0 / 2f64.sqrt();
        assert!((model.similarity("hot dog") - expected).abs() < 1e-6);
        assert!(model.similarity("hot cat").abs() < 1e-6);
        // (hot,dog)=0.7071, (hot,cat)=0, (dog,cat)=0
        assert!((model.similarity("hot dog cat") - expected / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_similarity_needs_two_known_words() {
        let model = toy_model();
        assert_eq!(model.similarity("dog"), 0.0);
        assert_eq!(model.similarity("dog unicorn"), 0.0);
        assert_eq!(model.similarity(""), 0.0);
    }

    #[test]
    fn test_unknown_word_falls_back_to_zero_vector() {
        let model = toy_model();
        assert_eq!(model.embedding("unicorn"), vec![0.0, 0.0, 0.0]);
        assert_eq!(model.embedding("DOG"), vec![1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_from_vectors_rejects_wrong_dimension() {
        let result = Word2Vec::from_vectors(3, [("hot".to_string(), vec![1.0, 0.0])]);
        assert!(matches!(result, Err(SegError::Model(_))));
    }

    #[test]
    fn test_load_text_format_with_header() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "2 3\nhot 1 0 0\ndog 0.5 0.5 0\n").unwrap();

        let model = Word2Vec::load(file.path()).unwrap();
        assert_eq!(model.dimension(), 3);
        assert_eq!(model.vocabulary_size(), 2);
        assert_eq!(model.embedding("dog"), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_load_text_format_rejects_ragged_rows() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "hot 1 0 0\ndog 0.5 0.5\n").unwrap();
        assert!(Word2Vec::load(file.path()).is_err());
    }

    #[test]
    fn test_binary_header_with_huge_count_is_a_model_error() {
        let mut file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(b"100000000000 300\n").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            Word2Vec::load(file.path()),
            Err(SegError::Model(_))
        ));
    }

    #[test]
    fn test_load_binary_format() {
        let mut file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(b"2 2\n").unwrap();
        for (word, vector) in [("hot", [1.0f32, 2.0]), ("dog", [-1.0f32, 0.25])] {
            file.write_all(word.as_bytes()).unwrap();
            file.write_all(b" ").unwrap();
            for v in vector {
                file.write_all(&v.to_le_bytes()).unwrap();
            }
            file.write_all(b"\n").unwrap();
        }
        file.flush().unwrap();

        let model = Word2Vec::load(file.path()).unwrap();
        assert_eq!(model.dimension(), 2);
        assert_eq!(model.embedding("hot"), vec![1.0, 2.0]);
        assert_eq!(model.embedding("dog"), vec![-1.0, 0.25]);
    }
}
