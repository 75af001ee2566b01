//! Request options and caller-facing result records.

use std::time::Duration;

use derive_builder::Builder;
use serde::Serialize;

use crate::error::IdiomError;
use crate::idiom_detection::models::{Match, PatternId};
use crate::idiom_detection::query::Query;

/// Default number of results returned per sentence.
pub const DEFAULT_LIMIT: usize = 10;

/// Per-request options of [`IdiomFinder::find`](crate::IdiomFinder::find).
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(build_fn(skip))]
pub struct FindOptions {
    /// Maximum number of results.
    #[builder(default)]
    pub limit: usize,
    /// Return the HTML variants of phrase and definition.
    #[builder(default)]
    pub html: bool,
    /// Include the matched token and character span.
    #[builder(default)]
    pub span: bool,
    /// Include the entry's location in the source dictionary.
    #[builder(default)]
    pub debug_range: bool,
    /// Include the pattern id.
    #[builder(default)]
    pub debug_id: bool,
    /// Time budget for the linguistic adapter; the finder's configured
    /// default applies when unset.
    #[builder(default, setter(strip_option))]
    pub timeout: Option<Duration>,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            html: false,
            span: false,
            debug_range: false,
            debug_id: false,
            timeout: None,
        }
    }
}

impl FindOptionsBuilder {
    pub fn build(&self) -> Result<FindOptions, IdiomError> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            return Err(IdiomError::InvalidArgument(
                "limit must be at least 1".to_string(),
            ));
        }

        Ok(FindOptions {
            limit,
            html: self.html.unwrap_or_default(),
            span: self.span.unwrap_or_default(),
            debug_range: self.debug_range.unwrap_or_default(),
            debug_id: self.debug_id.unwrap_or_default(),
            timeout: self.timeout.flatten(),
        })
    }
}

/// Token and character range of a match, end exclusive on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
    pub start_token: usize,
    pub end_token: usize,
    pub start_char: usize,
    pub end_char: usize,
}

/// One idiom found in a sentence, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdiomResult {
    pub phrase: String,
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<MatchSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_range: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<PatternId>,
}

/// Shape a ranked match into the record the caller asked for.
pub fn project(m: &Match<'_>, query: &Query, options: &FindOptions) -> IdiomResult {
    let pattern = m.pattern;

    let (phrase, definition) = if options.html {
        (
            pattern.phrase_html.as_ref().unwrap_or(&pattern.phrase),
            pattern
                .definition_html
                .as_ref()
                .unwrap_or(&pattern.definition),
        )
    } else {
        (&pattern.phrase, &pattern.definition)
    };

    let span = if options.span {
        query
            .char_span(m.span)
            .map(|(start_char, end_char)| MatchSpan {
                start_token: m.span.start,
                end_token: m.span.end,
                start_char,
                end_char,
            })
    } else {
        None
    };

    IdiomResult {
        phrase: phrase.clone(),
        definition: definition.clone(),
        span,
        entry_range: options
            .debug_range
            .then_some(pattern.source_span)
            .flatten()
            .map(|range| [range.start, range.end]),
        entry_id: options.debug_id.then_some(pattern.id),
    }
}
