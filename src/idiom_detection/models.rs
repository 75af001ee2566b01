//! Core data structures for idiom detection.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::linguistics::{PartOfSpeech, normalize_word};

/// Unique identifier of a pattern inside a store.
pub type PatternId = u32;

/// One word of a pattern together with the surface forms that count as it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// The word as written in the dictionary entry.
    pub literal: String,
    /// Normalized accepted forms; always contains the normalized literal.
    pub forms: HashSet<String>,
}

impl Term {
    pub fn new<'a>(literal: &str, extra_forms: impl IntoIterator<Item = &'a str>) -> Self {
        let mut forms: HashSet<String> = extra_forms
            .into_iter()
            .map(normalize_word)
            .filter(|form| !form.is_empty())
            .collect();
        forms.insert(normalize_word(literal));

        Self {
            literal: literal.to_string(),
            forms,
        }
    }

    /// A term accepting only its own literal.
    pub fn exact(literal: &str) -> Self {
        Self::new(literal, std::iter::empty::<&str>())
    }

    pub fn matches(&self, key: &str) -> bool {
        self.forms.contains(key)
    }
}

/// A run of words that must appear in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    pub terms: Vec<Term>,
}

impl Alternative {
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// A constant element: one of several alternative word runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantGroup {
    pub alternatives: Vec<Alternative>,
    /// Floating groups may appear anywhere near the anchored span instead of
    /// in dictionary order.
    pub floating: bool,
}

impl ConstantGroup {
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.alternatives.iter().flat_map(|alt| alt.terms.iter())
    }
}

/// Grammatical class a variable slot accepts.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VariableClass {
    /// A noun phrase ("someone", "something").
    #[default]
    Nominal,
    /// A verb ("do something").
    Verbal,
    /// A possessive ("one's", "someone's").
    Possessive,
    /// Any single word.
    Any,
}

impl VariableClass {
    /// Whether the token can be the head that satisfies the slot.
    pub fn accepts_head(self, pos: PartOfSpeech) -> bool {
        use PartOfSpeech::*;
        match self {
            Self::Nominal => matches!(pos, Noun | ProperNoun | Pronoun | Numeral),
            Self::Verbal => matches!(pos, Verb | Auxiliary),
            Self::Possessive => matches!(pos, PossessivePronoun | Possessive | Pronoun),
            Self::Any => !pos.is_punctuation(),
        }
    }

    /// Whether the token may sit inside the slot without being its head.
    pub fn accepts_modifier(self, pos: PartOfSpeech) -> bool {
        use PartOfSpeech::*;
        match self {
            Self::Nominal => {
                matches!(pos, Determiner | Adjective | Possessive | PossessivePronoun | Numeral)
            }
            Self::Verbal => pos == Adverb,
            Self::Possessive => matches!(pos, Noun | ProperNoun | Determiner | Adjective),
            Self::Any => false,
        }
    }

    pub fn accepts(self, pos: PartOfSpeech) -> bool {
        self.accepts_head(pos) || self.accepts_modifier(pos)
    }
}

/// A slot matched by grammatical class, never by literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSlot {
    /// Placeholder text from the dictionary entry ("someone", "one's").
    pub label: String,
    pub class: VariableClass,
    pub optional: bool,
}

/// One element of a pattern, in dictionary order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Constant(ConstantGroup),
    Optional(ConstantGroup),
    Variable(VariableSlot),
}

impl Element {
    /// The constant group of a required or optional element.
    pub fn group(&self) -> Option<&ConstantGroup> {
        match self {
            Self::Constant(group) | Self::Optional(group) => Some(group),
            Self::Variable(_) => None,
        }
    }

    pub fn is_floating(&self) -> bool {
        self.group().is_some_and(|group| group.floating)
    }
}

/// Verbs one of which may (or must) precede the matched span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadVerbs {
    pub verbs: Vec<Term>,
    /// When false the constraint is advisory and only affects scoring.
    pub mandatory: bool,
}

impl LeadVerbs {
    pub fn matches(&self, key: &str) -> bool {
        self.verbs.iter().any(|verb| verb.matches(key))
    }
}

/// Location of the entry in the source dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: u32,
    pub end: u32,
}

/// A compiled idiom pattern. Immutable once the store is built.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternRecord {
    pub id: PatternId,
    pub phrase: String,
    pub phrase_html: Option<String>,
    pub definition: String,
    pub definition_html: Option<String>,
    pub elements: Vec<Element>,
    pub lead_verbs: Option<LeadVerbs>,
    pub source_span: Option<SourceSpan>,
}

impl PatternRecord {
    /// Required constant groups with their element index.
    pub fn constants(&self) -> impl Iterator<Item = (usize, &ConstantGroup)> {
        self.elements.iter().enumerate().filter_map(|(i, e)| match e {
            Element::Constant(group) => Some((i, group)),
            _ => None,
        })
    }

    /// Optional constant groups with their element index.
    pub fn optional_constants(&self) -> impl Iterator<Item = (usize, &ConstantGroup)> {
        self.elements.iter().enumerate().filter_map(|(i, e)| match e {
            Element::Optional(group) => Some((i, group)),
            _ => None,
        })
    }

    /// Variable slots with their element index.
    pub fn variables(&self) -> impl Iterator<Item = (usize, &VariableSlot)> {
        self.elements.iter().enumerate().filter_map(|(i, e)| match e {
            Element::Variable(slot) => Some((i, slot)),
            _ => None,
        })
    }
}

/// What kind of element a set of matched tokens satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchedKind {
    Constant,
    Optional,
    Variable,
}

/// Token positions consumed by one satisfied element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementMatch {
    /// Index into [`PatternRecord::elements`].
    pub element: usize,
    pub kind: MatchedKind,
    pub positions: Vec<usize>,
}

/// Token range covered by a match, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl TokenSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A scored alignment of one pattern against one sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    pub pattern: &'a PatternRecord,
    pub score: f64,
    /// Satisfied elements, ordered by element index.
    pub elements: Vec<ElementMatch>,
    /// Position of the lead verb, if one was found.
    pub lead_verb: Option<usize>,
    pub span: TokenSpan,
}

impl Match<'_> {
    /// Element indices of the optional constants this match satisfied.
    pub fn satisfied_optionals(&self) -> Vec<usize> {
        self.elements
            .iter()
            .filter(|m| m.kind == MatchedKind::Optional)
            .map(|m| m.element)
            .collect()
    }

    /// All token positions consumed by the match, sorted.
    pub fn consumed_positions(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .elements
            .iter()
            .flat_map(|m| m.positions.iter().copied())
            .collect();
        positions.sort_unstable();
        positions
    }
}
