//! Error type surfaced at the library boundary.

use std::time::Duration;

use thiserror::Error;

/// Errors reported by the idiom finder.
///
/// A sentence without any matching idiom is not an error: it yields an empty
/// result list. Alignment failures of individual patterns are ordinary control
/// flow inside the matcher and never show up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IdiomError {
    /// The pattern database is malformed or inconsistent.
    #[error("failed to load pattern database: {0}")]
    Load(String),

    /// Caller-supplied parameters violate the contract (empty sentence, zero limit, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The linguistic adapter failed or produced malformed output.
    #[error("linguistic service error: {0}")]
    LinguisticService(String),

    /// The linguistic adapter did not answer within the time budget.
    #[error("linguistic service timed out after {} ms", .0.as_millis())]
    LinguisticServiceTimeout(Duration),
}

impl IdiomError {
    /// Render an anyhow chain into a load error, keeping every context layer.
    pub(crate) fn load(err: anyhow::Error) -> Self {
        Self::Load(format!("{err:#}"))
    }

    /// Render an anyhow chain into a linguistic service error.
    pub(crate) fn linguistic(err: anyhow::Error) -> Self {
        Self::LinguisticService(format!("{err:#}"))
    }
}
