//! Idiom Detection Engine
//!
//! This module recognizes idioms, fixed phrases and phrasal verbs in English
//! sentences by aligning them against a compiled pattern database.

pub mod align;
pub mod candidates;
pub mod models;
pub mod patterns;
pub mod query;
pub mod rank;
pub mod results;
pub mod store;
#[cfg(test)]
mod test_utils;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::debug;
use rayon::prelude::*;

use crate::config::MatcherConfig;
use crate::error::IdiomError;
use crate::linguistics::{AnnotationWorkers, LinguisticAdapter};

pub use align::attempt_match;
pub use candidates::select_candidates;
pub use models::{Match, PatternId, PatternRecord};
pub use query::Query;
pub use rank::rank;
pub use results::{FindOptions, FindOptionsBuilder, IdiomResult, MatchSpan, project};
pub use store::PatternStore;

/// Idiom detection engine that orchestrates the matching pipeline.
///
/// The finder owns a shared, read-only pattern store and a linguistic
/// adapter. It is cheap to clone and safe to use from many threads at once.
#[derive(Clone)]
pub struct IdiomFinder {
    store: Arc<PatternStore>,
    adapter: Arc<dyn LinguisticAdapter>,
    workers: Arc<AnnotationWorkers>,
    config: MatcherConfig,
}

impl std::fmt::Debug for IdiomFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdiomFinder")
            .field("patterns", &self.store.len())
            .field("stalled_annotations", &self.workers.stalled())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IdiomFinder {
    /// Create a finder over an already loaded store.
    ///
    /// Fails with `InvalidArgument` when the configuration breaks the scoring
    /// contract (see [`MatcherConfig::validate`]).
    pub fn new(
        store: Arc<PatternStore>,
        adapter: Arc<dyn LinguisticAdapter>,
        config: MatcherConfig,
    ) -> Result<Self, IdiomError> {
        config.validate()?;
        Ok(Self {
            store,
            adapter,
            workers: Arc::new(AnnotationWorkers::new(config.max_stalled_annotations)),
            config,
        })
    }

    /// Load the pattern database at `path` and create a finder over it.
    pub fn from_path(
        path: &Path,
        adapter: Arc<dyn LinguisticAdapter>,
        config: MatcherConfig,
    ) -> Result<Self, IdiomError> {
        let store = PatternStore::load(path)?;
        Self::new(Arc::new(store), adapter, config)
    }

    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Timed-out adapter calls that have not returned yet.
    pub fn stalled_annotations(&self) -> usize {
        self.workers.stalled()
    }

    /// Find the idioms in a sentence.
    ///
    /// This runs the full pipeline:
    /// 1. Annotate the sentence (tokens, tags, lemmas) within the time budget
    /// 2. Select candidate patterns from the constant posting lists
    /// 3. Align every candidate in parallel
    /// 4. Rank by score (ties by pattern id) and keep `limit` matches
    /// 5. Project each match into the requested output shape
    ///
    /// A sentence without idioms yields an empty list.
    pub fn find(
        &self,
        sentence: &str,
        options: &FindOptions,
    ) -> Result<Vec<IdiomResult>, IdiomError> {
        validate_request(sentence, options)?;

        let query = self.annotate(sentence, options)?;
        let matches = self.find_matches(&query, options.limit)?;

        Ok(matches
            .iter()
            .map(|m| project(m, &query, options))
            .collect())
    }

    /// Annotate a sentence into a query, honoring the request's time budget.
    pub fn annotate(&self, sentence: &str, options: &FindOptions) -> Result<Query, IdiomError> {
        let timeout = options
            .timeout
            .unwrap_or_else(|| self.config.annotation_timeout());
        let tokens = self
            .workers
            .annotate(Arc::clone(&self.adapter), sentence, timeout)?;
        Ok(Query::new(sentence, tokens))
    }

    /// Align the store against an annotated query and rank the matches.
    pub fn find_matches<'s>(
        &'s self,
        query: &Query,
        limit: usize,
    ) -> Result<Vec<Match<'s>>, IdiomError> {
        let started = Instant::now();
        let candidates = select_candidates(&self.store, query);

        let matches: Vec<Match<'s>> = candidates
            .par_iter()
            .filter_map(|&pattern| attempt_match(pattern, query, &self.config))
            .collect();

        debug!(
            "{} candidates, {} matches for {:?} in {:?}",
            candidates.len(),
            matches.len(),
            query.text,
            started.elapsed()
        );

        rank(matches, limit)
    }
}

fn validate_request(sentence: &str, options: &FindOptions) -> Result<(), IdiomError> {
    if sentence.trim().is_empty() {
        return Err(IdiomError::InvalidArgument(
            "sentence must not be empty".to_string(),
        ));
    }
    if options.limit == 0 {
        return Err(IdiomError::InvalidArgument(
            "limit must be at least 1".to_string(),
        ));
    }
    Ok(())
}
