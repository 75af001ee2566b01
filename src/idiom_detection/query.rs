//! Query representation for idiom matching.

use std::collections::HashMap;

use crate::idiom_detection::models::{Term, TokenSpan};
use crate::linguistics::AnnotatedToken;

/// An annotated sentence ready for matching.
///
/// Every token contributes two lookup keys, its normalized surface form and
/// its lemma; `positions_by_key` maps each key to the sorted token positions
/// that carry it.
#[derive(Debug, Clone)]
pub struct Query {
    pub text: String,
    pub tokens: Vec<AnnotatedToken>,
    positions_by_key: HashMap<String, Vec<usize>>,
}

impl Query {
    pub fn new(text: &str, tokens: Vec<AnnotatedToken>) -> Self {
        let mut positions_by_key: HashMap<String, Vec<usize>> = HashMap::new();

        for (position, token) in tokens.iter().enumerate() {
            positions_by_key
                .entry(token.norm.clone())
                .or_default()
                .push(position);
            if token.lemma != token.norm {
                positions_by_key
                    .entry(token.lemma.clone())
                    .or_default()
                    .push(position);
            }
        }

        Self {
            text: text.to_string(),
            tokens,
            positions_by_key,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Distinct lookup keys of the sentence.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.positions_by_key.keys().map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.positions_by_key.contains_key(key)
    }

    /// Whether any form of the term occurs in the sentence.
    pub fn contains_term(&self, term: &Term) -> bool {
        term.forms.iter().any(|form| self.contains_key(form))
    }

    /// Sorted positions of tokens matching the term.
    pub fn occurrences(&self, term: &Term) -> Vec<usize> {
        let mut positions: Vec<usize> = term
            .forms
            .iter()
            .filter_map(|form| self.positions_by_key.get(form))
            .flatten()
            .copied()
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }

    /// Whether the token at `position` matches the term.
    pub fn token_matches(&self, position: usize, term: &Term) -> bool {
        self.tokens
            .get(position)
            .is_some_and(|token| term.matches(&token.norm) || term.matches(&token.lemma))
    }

    /// Character range covered by a token span, end exclusive.
    pub fn char_span(&self, span: TokenSpan) -> Option<(usize, usize)> {
        if span.is_empty() {
            return None;
        }
        let first = self.tokens.get(span.start)?;
        let last = self.tokens.get(span.end - 1)?;
        Some((first.start_char, last.end_char))
    }
}
