//! Builders shared by the idiom detection unit tests.

use std::collections::BTreeMap;

use crate::idiom_detection::models::VariableClass;
use crate::idiom_detection::patterns::{
    ElementEntry, ElementKind, FORMAT_VERSION, LeadVerbEntry, PatternDatabase, PatternEntry,
};
use crate::idiom_detection::query::Query;
use crate::idiom_detection::store::PatternStore;
use crate::linguistics::{AnnotatedToken, PartOfSpeech, normalize_word};

fn group(kind: ElementKind, alternatives: &[&str], floating: bool) -> ElementEntry {
    ElementEntry {
        kind,
        alternatives: alternatives.iter().map(|s| s.to_string()).collect(),
        text: None,
        class: None,
        floating,
        optional: false,
    }
}

pub fn constant(alternatives: &[&str]) -> ElementEntry {
    group(ElementKind::Constant, alternatives, false)
}

pub fn optional(alternatives: &[&str]) -> ElementEntry {
    group(ElementKind::Optional, alternatives, false)
}

pub fn floating(alternatives: &[&str]) -> ElementEntry {
    group(ElementKind::Constant, alternatives, true)
}

pub fn variable(class: VariableClass) -> ElementEntry {
    ElementEntry {
        kind: ElementKind::Variable,
        alternatives: Vec::new(),
        text: Some("something".to_string()),
        class: Some(class),
        floating: false,
        optional: false,
    }
}

pub fn optional_variable(class: VariableClass) -> ElementEntry {
    ElementEntry {
        optional: true,
        ..variable(class)
    }
}

pub fn entry(id: u32, phrase: &str, elements: Vec<ElementEntry>) -> PatternEntry {
    PatternEntry {
        id,
        range: None,
        phrase: phrase.to_string(),
        phrase_html: None,
        definition: format!("meaning of {phrase}"),
        definition_html: None,
        elements,
        lead_verbs: None,
        word_forms: BTreeMap::new(),
    }
}

pub fn with_lead_verbs(mut entry: PatternEntry, verbs: &[&str], mandatory: bool) -> PatternEntry {
    entry.lead_verbs = Some(LeadVerbEntry {
        verbs: verbs.iter().map(|s| s.to_string()).collect(),
        mandatory,
    });
    entry
}

pub fn database(patterns: Vec<PatternEntry>) -> PatternDatabase {
    PatternDatabase {
        format_version: FORMAT_VERSION,
        patterns,
    }
}

pub fn store(patterns: Vec<PatternEntry>) -> PatternStore {
    PatternStore::from_database(&database(patterns)).unwrap()
}

/// Build a query from `word/PENN[/lemma]` tokens separated by single spaces.
///
/// The lemma defaults to the normalized word.
pub fn query(tagged: &str) -> Query {
    let mut tokens = Vec::new();
    let mut words = Vec::new();
    let mut offset = 0;

    for item in tagged.split(' ') {
        let mut parts = item.splitn(3, '/');
        let text = parts.next().unwrap();
        let pos = PartOfSpeech::from_penn(parts.next().unwrap());
        let lemma = parts.next().map(normalize_word).unwrap_or_else(|| normalize_word(text));
        let end = offset + text.chars().count();

        tokens.push(AnnotatedToken {
            text: text.to_string(),
            norm: normalize_word(text),
            lemma,
            pos,
            start_char: offset,
            end_char: end,
        });
        words.push(text);
        offset = end + 1;
    }

    Query::new(&words.join(" "), tokens)
}
