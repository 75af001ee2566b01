//! Reading, validating and compiling the pattern database.
//!
//! Two on-disk encodings carry the same [`PatternDatabase`] structure:
//! plain JSON for authoring and review, and a compact artifact (bincode,
//! then zstd) for shipping. Every entry is validated while it is compiled
//! into a [`PatternRecord`]; a bad entry fails the whole load.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::idiom_detection::models::{
    Alternative, ConstantGroup, Element, LeadVerbs, PatternRecord, SourceSpan, Term,
    VariableClass, VariableSlot,
};
use crate::linguistics::normalize_word;
use crate::linguistics::tokenize::tokenize_phrase;

/// Schema version this build reads and writes.
pub const FORMAT_VERSION: u32 = 1;

/// zstd level used for the compact artifact.
const ARTIFACT_COMPRESSION_LEVEL: i32 = 19;

/// Upper bound on the word runs one alternative may expand into through
/// multi-word forms.
const MAX_EXPANDED_ALTERNATIVES: usize = 64;

/// Placeholder label for variable elements that carry no text.
const DEFAULT_VARIABLE_LABEL: &str = "something";

/// Serialized pattern database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDatabase {
    pub format_version: u32,
    pub patterns: Vec<PatternEntry>,
}

/// Serialized form of one dictionary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub id: u32,

    /// Start and end offsets of the entry in the source dictionary.
    #[serde(default)]
    pub range: Option<[u32; 2]>,

    pub phrase: String,

    #[serde(default)]
    pub phrase_html: Option<String>,

    pub definition: String,

    #[serde(default)]
    pub definition_html: Option<String>,

    pub elements: Vec<ElementEntry>,

    #[serde(default)]
    pub lead_verbs: Option<LeadVerbEntry>,

    /// Extra surface forms keyed by literal word.
    #[serde(default)]
    pub word_forms: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Constant,
    Optional,
    Variable,
}

/// Serialized form of one pattern element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementEntry {
    pub kind: ElementKind,

    /// Alternative word runs of a constant or optional element.
    #[serde(default)]
    pub alternatives: Vec<String>,

    /// Placeholder text of a variable element.
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub class: Option<VariableClass>,

    #[serde(default)]
    pub floating: bool,

    /// Marks a variable slot as optional.
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadVerbEntry {
    pub verbs: Vec<String>,
    #[serde(default)]
    pub mandatory: bool,
}

/// Read a database from disk, choosing the decoder by file extension.
///
/// `*.json` is parsed as JSON; `*.zst` is treated as a compact artifact.
pub fn read_database(path: &Path) -> Result<PatternDatabase> {
    let is_artifact = path.extension().and_then(|ext| ext.to_str()) == Some("zst");

    let database = if is_artifact {
        let compressed = fs::read(path)
            .with_context(|| format!("Failed to read pattern artifact: {}", path.display()))?;
        decode_artifact(&compressed)
            .with_context(|| format!("Invalid pattern artifact: {}", path.display()))?
    } else {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pattern database: {}", path.display()))?;
        parse_json_database(&content)
            .with_context(|| format!("Invalid pattern database: {}", path.display()))?
    };

    check_format_version(&database)?;
    Ok(database)
}

pub fn parse_json_database(content: &str) -> Result<PatternDatabase> {
    let database: PatternDatabase = serde_json::from_str(content)?;
    Ok(database)
}

/// Encode a database as a compact artifact.
pub fn encode_artifact(database: &PatternDatabase) -> Result<Vec<u8>> {
    let encoded = bincode::serde::encode_to_vec(database, bincode::config::standard())
        .context("Failed to encode pattern database")?;
    zstd::encode_all(encoded.as_slice(), ARTIFACT_COMPRESSION_LEVEL)
        .context("Failed to compress pattern database")
}

pub fn decode_artifact(compressed: &[u8]) -> Result<PatternDatabase> {
    let bytes = zstd::decode_all(compressed).context("Failed to decompress pattern artifact")?;
    let (database, _): (PatternDatabase, usize) =
        bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .context("Failed to decode pattern artifact")?;
    Ok(database)
}

/// Write a database to disk as a compact artifact.
pub fn write_artifact(database: &PatternDatabase, path: &Path) -> Result<()> {
    let bytes = encode_artifact(database)?;
    fs::write(path, bytes)
        .with_context(|| format!("Failed to write pattern artifact: {}", path.display()))
}

pub fn check_format_version(database: &PatternDatabase) -> Result<()> {
    if database.format_version != FORMAT_VERSION {
        bail!(
            "unsupported format_version {} (expected {})",
            database.format_version,
            FORMAT_VERSION
        );
    }
    Ok(())
}

/// Validate an entry and compile it into a pattern record.
pub fn compile_entry(entry: &PatternEntry) -> Result<PatternRecord> {
    compile_entry_inner(entry).with_context(|| format!("pattern {}", entry.id))
}

fn compile_entry_inner(entry: &PatternEntry) -> Result<PatternRecord> {
    if entry.phrase.trim().is_empty() {
        bail!("phrase is empty");
    }

    let word_forms: WordForms = entry
        .word_forms
        .iter()
        .map(|(word, forms)| (normalize_word(word), forms.as_slice()))
        .collect();

    let mut elements = Vec::with_capacity(entry.elements.len());
    for (index, element) in entry.elements.iter().enumerate() {
        let compiled = match element.kind {
            ElementKind::Constant | ElementKind::Optional => {
                let group = compile_group(element, &word_forms)
                    .with_context(|| format!("element {index}"))?;
                if element.kind == ElementKind::Constant {
                    Element::Constant(group)
                } else {
                    Element::Optional(group)
                }
            }
            ElementKind::Variable => Element::Variable(VariableSlot {
                label: element
                    .text
                    .clone()
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_VARIABLE_LABEL.to_string()),
                class: element.class.unwrap_or_default(),
                optional: element.optional,
            }),
        };
        elements.push(compiled);
    }

    if !elements.iter().any(|e| matches!(e, Element::Constant(_))) {
        bail!("pattern has no required constant");
    }

    let lead_verbs = match &entry.lead_verbs {
        Some(lead) => {
            let verbs: Vec<Term> = lead
                .verbs
                .iter()
                .filter(|verb| !verb.trim().is_empty())
                .map(|verb| compile_lead_verb(verb, &word_forms))
                .collect::<Result<_>>()?;
            if verbs.is_empty() {
                bail!("lead verb list is empty");
            }
            Some(LeadVerbs {
                verbs,
                mandatory: lead.mandatory,
            })
        }
        None => None,
    };

    let source_span = entry.range.map(|[start, end]| SourceSpan { start, end });
    if let Some(span) = source_span
        && span.start > span.end
    {
        return Err(anyhow!("range [{}, {}] is reversed", span.start, span.end));
    }

    Ok(PatternRecord {
        id: entry.id,
        phrase: entry.phrase.clone(),
        phrase_html: entry.phrase_html.clone(),
        definition: entry.definition.clone(),
        definition_html: entry.definition_html.clone(),
        elements,
        lead_verbs,
        source_span,
    })
}

type WordForms<'e> = BTreeMap<String, &'e [String]>;

fn forms_of<'e>(word_forms: &WordForms<'e>, word: &str) -> &'e [String] {
    word_forms
        .get(&normalize_word(word))
        .copied()
        .unwrap_or_default()
}

fn compile_group(element: &ElementEntry, word_forms: &WordForms<'_>) -> Result<ConstantGroup> {
    if element.alternatives.is_empty() {
        bail!("constant element has no alternatives");
    }

    let mut alternatives = Vec::with_capacity(element.alternatives.len());
    for alternative in &element.alternatives {
        alternatives.extend(expand_alternative(alternative, word_forms)?);
    }

    Ok(ConstantGroup {
        alternatives,
        floating: element.floating,
    })
}

/// Compile one dictionary alternative into the word runs that realize it.
///
/// Every word is split the way sentences are split. Single-token word forms
/// fold into the word's term; a form spanning several tokens (`well to do`
/// for `well-to-do`), or any form of a word that itself splits (`don't`),
/// yields an additional run.
fn expand_alternative(
    alternative: &str,
    word_forms: &WordForms<'_>,
) -> Result<Vec<Alternative>> {
    let mut runs: Vec<Vec<Term>> = vec![Vec::new()];

    for word in alternative.split_whitespace() {
        let renderings = word_renderings(word, word_forms);
        if runs.len() * renderings.len() > MAX_EXPANDED_ALTERNATIVES {
            bail!(
                "alternative {alternative:?} expands into more than {MAX_EXPANDED_ALTERNATIVES} word runs"
            );
        }
        runs = runs
            .iter()
            .flat_map(|run| {
                renderings.iter().map(move |rendering| {
                    let mut next = run.clone();
                    next.extend(rendering.iter().cloned());
                    next
                })
            })
            .collect();
    }

    if runs.iter().any(Vec::is_empty) {
        bail!("constant element has an empty alternative");
    }
    Ok(runs.into_iter().map(|terms| Alternative { terms }).collect())
}

fn word_renderings(word: &str, word_forms: &WordForms<'_>) -> Vec<Vec<Term>> {
    let exact = |pieces: &[String]| -> Vec<Term> {
        pieces.iter().map(|piece| Term::exact(piece)).collect()
    };
    let pieces = tokenize_phrase(word);
    let forms: Vec<Vec<String>> = forms_of(word_forms, word)
        .iter()
        .map(|form| tokenize_phrase(form))
        .filter(|form| !form.is_empty())
        .collect();

    match pieces.as_slice() {
        [single] => {
            let (single_forms, multi_forms): (Vec<_>, Vec<_>) =
                forms.into_iter().partition(|form| form.len() == 1);
            let term = Term::new(single, single_forms.iter().map(|form| form[0].as_str()));
            let mut renderings = vec![vec![term]];
            renderings.extend(multi_forms.iter().map(|form| exact(form.as_slice())));
            renderings
        }
        _ => {
            let mut renderings = vec![exact(pieces.as_slice())];
            renderings.extend(forms.iter().map(|form| exact(form.as_slice())));
            renderings
        }
    }
}

/// Lead verbs are matched against one sentence token, so the verb and each
/// of its forms must be a single token.
fn compile_lead_verb(verb: &str, word_forms: &WordForms<'_>) -> Result<Term> {
    let [word] = tokenize_phrase(verb).try_into().map_err(|pieces: Vec<String>| {
        anyhow!("lead verb {verb:?} is not a single word ({} tokens)", pieces.len())
    })?;

    let mut extra = Vec::new();
    for form in forms_of(word_forms, verb) {
        match tokenize_phrase(form).as_slice() {
            [] => {}
            [single] => extra.push(single.clone()),
            _ => bail!("word form {form:?} of lead verb {verb:?} is not a single word"),
        }
    }

    Ok(Term::new(&word, extra.iter().map(String::as_str)))
}
