

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use super::base::{LookupError, MembershipOracle};
use crate::core::error::{Result, SegError};

const INDEX_FILES: [&str; 4] = ["index.noun", "index.verb", "index.adj", "index.adv"];


pub struct WordnetIndex {
    lemmas: HashSet<String>,
}

impl WordnetIndex {

    pub fn load(path: &Path) -> Result<Self> {
        let mut lemmas = HashSet::new();

        if path.is_dir() {
            let mut found = 0;
            for name in INDEX_FILES {
                let file = path.join(name);
                if file.exists() {
                    Self::read_index(&fs::read_to_string(&file)?, &mut lemmas);
                    found += 1;
                }
            }
            if found == 0 {
                return Err(SegError::Config(format!(
                    "No WordNet index files found in {}",
                    path.display()
                )));
            }
        } else {
            Self::read_index(&fs::read_to_string(path)?, &mut lemmas);
        }

        info!(
            "WordNet index loaded: {} lemmas from {}",
            lemmas.len(),
            path.display()
        );

        Ok(Self { lemmas })
    }

    pub fn from_lemmas<I, S>(lemmas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            lemmas: lemmas
                .into_iter()
                .map(|l| Self::normalize(l.as_ref()))
                .collect(),
        }
    }

    // License header lines in the dict files start with whitespace.
    fn read_index(content: &str, lemmas: &mut HashSet<String>) {
        for line in content.lines() {
            if line.is_empty() || line.starts_with(char::is_whitespace) {
                continue;
            }
            if let Some(lemma) = line.split_whitespace().next() {
                lemmas.insert(Self::normalize(lemma));
            }
        }
    }

    fn normalize(candidate: &str) -> String {
        candidate
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.lemmas.contains(&Self::normalize(candidate))
    }

    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }
}

#[async_trait]
impl MembershipOracle for WordnetIndex {
    async fn exists(&self, candidates: &[String]) -> std::result::Result<bool, LookupError> {
        let hit = candidates.iter().find(|c| self.contains(c));
        if let Some(candidate) = hit {
            debug!("WordNet hit: {}", candidate);
        }
        Ok(hit.is_some())
    }

    fn source_name(&self) -> &str {
        "wordnet"
    }
}
