//! Matcher tuning knobs.
//!
//! Every field has a default so an empty (or absent) TOML file yields the
//! stock configuration. Unknown keys are rejected to catch typos early.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::IdiomError;

/// Weights used to score an alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringWeights {
    /// Points per matched word of a required constant.
    pub required_word: f64,
    /// Points per matched word of an optional constant.
    pub optional_word: f64,
    /// Bonus when a lead verb precedes the matched span.
    pub lead_verb_bonus: f64,
    /// Penalty per unconsumed token inside the matched span.
    pub dispersion_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            required_word: 1.0,
            optional_word: 0.5,
            lead_verb_bonus: 1.0,
            dispersion_penalty: 0.1,
        }
    }
}

/// Configuration of the alignment search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatcherConfig {
    /// Maximum number of unconsumed tokens between two consecutive anchored words.
    pub max_gap: usize,
    /// Maximum number of tokens a single variable slot may absorb.
    pub max_variable_tokens: usize,
    /// How many tokens before the span are searched for a lead verb.
    pub lead_verb_window: usize,
    /// Upper bound on search nodes visited per pattern attempt.
    pub max_alignment_steps: usize,
    /// Default time budget for the linguistic adapter, in milliseconds.
    pub annotation_timeout_ms: u64,
    /// Abandoned adapter calls allowed to linger before new requests are refused.
    pub max_stalled_annotations: usize,
    pub scoring: ScoringWeights,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_gap: 3,
            max_variable_tokens: 4,
            lead_verb_window: 3,
            max_alignment_steps: 20_000,
            annotation_timeout_ms: 5_000,
            max_stalled_annotations: 8,
            scoring: ScoringWeights::default(),
        }
    }
}

impl MatcherConfig {
    /// Load a configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    pub fn annotation_timeout(&self) -> Duration {
        Duration::from_millis(self.annotation_timeout_ms)
    }

    /// Check that the weights keep the scoring contract.
    ///
    /// A satisfied optional word may widen the span by at most `max_gap`
    /// unconsumed tokens, so its weight must outrun that much penalty.
    pub fn validate(&self) -> Result<(), IdiomError> {
        let w = &self.scoring;
        for (name, value) in [
            ("required_word", w.required_word),
            ("optional_word", w.optional_word),
            ("lead_verb_bonus", w.lead_verb_bonus),
            ("dispersion_penalty", w.dispersion_penalty),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(IdiomError::InvalidArgument(format!(
                    "scoring.{name} must be a positive number, got {value}"
                )));
            }
        }

        if w.optional_word <= w.dispersion_penalty * self.max_gap as f64 {
            return Err(IdiomError::InvalidArgument(format!(
                "scoring.optional_word ({}) must exceed dispersion_penalty x max_gap ({})",
                w.optional_word,
                w.dispersion_penalty * self.max_gap as f64
            )));
        }

        if self.max_variable_tokens == 0 {
            return Err(IdiomError::InvalidArgument(
                "max_variable_tokens must be at least 1".to_string(),
            ));
        }

        if self.max_stalled_annotations == 0 {
            return Err(IdiomError::InvalidArgument(
                "max_stalled_annotations must be at least 1".to_string(),
            ));
        }

        if self.max_alignment_steps == 0 {
            return Err(IdiomError::InvalidArgument(
                "max_alignment_steps must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
