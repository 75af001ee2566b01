//! Ordering and truncation of scored matches.

use std::cmp::Ordering;

use crate::error::IdiomError;
use crate::idiom_detection::models::Match;

/// Total order on matches: higher score first, then lower pattern id.
pub fn compare_matches(a: &Match<'_>, b: &Match<'_>) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.pattern.id.cmp(&b.pattern.id))
}

/// Sort matches best-first and keep at most `limit` of them.
pub fn rank<'p>(mut matches: Vec<Match<'p>>, limit: usize) -> Result<Vec<Match<'p>>, IdiomError> {
    if limit == 0 {
        return Err(IdiomError::InvalidArgument(
            "limit must be at least 1".to_string(),
        ));
    }

    matches.sort_by(compare_matches);
    matches.truncate(limit);
    Ok(matches)
}
