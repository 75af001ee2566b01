//! Candidate selection: cheap pre-filter in front of the alignment search.

use std::collections::BTreeSet;

use crate::idiom_detection::models::{PatternId, PatternRecord};
use crate::idiom_detection::query::Query;
use crate::idiom_detection::store::PatternStore;

/// Select the patterns that could possibly align with the query.
///
/// Unions the posting lists of every query key, then keeps a pattern only if
/// each of its required constant groups has an alternative whose words all
/// occur somewhere in the sentence. Word order is ignored here, so the result
/// may contain patterns that later fail to align, but never misses one that
/// would align. Candidates are returned in ascending id order.
pub fn select_candidates<'s>(store: &'s PatternStore, query: &Query) -> Vec<&'s PatternRecord> {
    let ids: BTreeSet<PatternId> = query
        .keys()
        .flat_map(|key| store.lookup_by_constant(key).iter().copied())
        .collect();

    ids.into_iter()
        .filter_map(|id| store.get(id))
        .filter(|pattern| has_all_required_constants(pattern, query))
        .collect()
}

fn has_all_required_constants(pattern: &PatternRecord, query: &Query) -> bool {
    pattern.constants().all(|(_, group)| {
        group
            .alternatives
            .iter()
            .any(|alt| alt.terms.iter().all(|term| query.contains_term(term)))
    })
}
