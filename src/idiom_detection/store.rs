//! In-memory pattern store with constant posting lists.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Result, bail};
use log::{debug, info, warn};

use crate::error::IdiomError;
use crate::idiom_detection::models::{PatternId, PatternRecord};
use crate::idiom_detection::patterns::{
    PatternDatabase, check_format_version, compile_entry, parse_json_database, read_database,
};
use crate::linguistics::normalize_word;

/// All compiled patterns, indexed by id and by required constant word forms.
///
/// Built once and shared read-only (behind an `Arc`) by every request.
#[derive(Debug, Clone, Default)]
pub struct PatternStore {
    patterns: Vec<PatternRecord>,
    index_by_id: HashMap<PatternId, usize>,
    /// Normalized word form -> ids of patterns whose required constants use it.
    /// Each list is sorted and free of duplicates.
    postings: HashMap<String, Vec<PatternId>>,
}

impl PatternStore {
    /// Load a store from a JSON database or a compact `*.zst` artifact.
    pub fn load(path: &Path) -> Result<Self, IdiomError> {
        let database = read_database(path).map_err(IdiomError::load)?;
        let store = Self::build(&database).map_err(IdiomError::load)?;
        info!(
            "Loaded {} patterns ({} indexed word forms) from {}",
            store.len(),
            store.postings.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn from_json_str(content: &str) -> Result<Self, IdiomError> {
        let database = parse_json_database(content).map_err(IdiomError::load)?;
        Self::from_database(&database)
    }

    pub fn from_database(database: &PatternDatabase) -> Result<Self, IdiomError> {
        Self::build(database).map_err(IdiomError::load)
    }

    fn build(database: &PatternDatabase) -> Result<Self> {
        check_format_version(database)?;

        let mut store = Self::default();
        let mut seen_phrases: HashMap<String, PatternId> = HashMap::new();

        for entry in &database.patterns {
            if let Some(first) = store.index_by_id.get(&entry.id) {
                bail!(
                    "pattern {}: duplicate id (first defined at position {})",
                    entry.id,
                    first
                );
            }

            let record = compile_entry(entry)?;

            let phrase_key = normalize_word(&record.phrase);
            if let Some(other) = seen_phrases.insert(phrase_key, record.id) {
                warn!(
                    "Patterns {} and {} share the phrase {:?}",
                    other, record.id, record.phrase
                );
            }

            store.index(record);
        }

        for ids in store.postings.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }

        debug!(
            "Built posting lists for {} word forms",
            store.postings.len()
        );
        Ok(store)
    }

    fn index(&mut self, record: PatternRecord) {
        let forms: HashSet<&String> = record
            .constants()
            .flat_map(|(_, group)| group.terms())
            .flat_map(|term| term.forms.iter())
            .collect();

        for form in forms {
            self.postings
                .entry(form.clone())
                .or_default()
                .push(record.id);
        }

        self.index_by_id.insert(record.id, self.patterns.len());
        self.patterns.push(record);
    }

    /// Ids of every pattern whose required constants accept the token.
    pub fn lookup_by_constant(&self, token: &str) -> &[PatternId] {
        self.postings
            .get(&normalize_word(token))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get(&self, id: PatternId) -> Option<&PatternRecord> {
        self.index_by_id.get(&id).map(|&index| &self.patterns[index])
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Patterns in database order.
    pub fn iter(&self) -> impl Iterator<Item = &PatternRecord> {
        self.patterns.iter()
    }
}
