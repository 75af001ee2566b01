//! Tests for pattern database parsing and compilation.

use std::fs;

use super::*;
use crate::idiom_detection::models::{Element, PatternRecord, SourceSpan, VariableClass};
use anyhow::Result;
use tempfile::tempdir;

fn entry_json(elements: &str) -> String {
    format!(
        r#"{{"format_version": 1, "patterns": [{{
            "id": 3, "range": [10, 14], "phrase": "give someone a hand",
            "definition": "to help someone",
            "elements": {elements},
            "lead_verbs": {{"verbs": ["give", "lend"], "mandatory": false}},
            "word_forms": {{"give": ["gave", "given"], "Hand": ["hands"]}}
        }}]}}"#
    )
}

fn compile_first(json: &str) -> Result<PatternRecord> {
    let database = parse_json_database(json)?;
    compile_entry(&database.patterns[0])
}

#[test]
fn test_compile_entry_builds_elements() {
    let json = entry_json(
        r#"[
            {"kind": "constant", "alternatives": ["give", "lend"]},
            {"kind": "variable", "text": "someone", "class": "nominal"},
            {"kind": "optional", "alternatives": ["a"]},
            {"kind": "constant", "alternatives": ["hand"], "floating": true}
        ]"#,
    );

    let record = compile_first(&json).unwrap();

    assert_eq!(record.id, 3);
    assert_eq!(record.elements.len(), 4);
    assert_eq!(record.constants().count(), 2);
    assert_eq!(record.optional_constants().count(), 1);
    assert_eq!(record.variables().count(), 1);
    assert_eq!(record.source_span, Some(SourceSpan { start: 10, end: 14 }));

    let Element::Constant(give) = &record.elements[0] else {
        panic!("expected a constant");
    };
    assert_eq!(give.alternatives.len(), 2);
    assert!(give.alternatives[0].terms[0].matches("gave"));
    assert!(!give.floating);

    let Element::Variable(slot) = &record.elements[1] else {
        panic!("expected a variable");
    };
    assert_eq!(slot.label, "someone");
    assert_eq!(slot.class, VariableClass::Nominal);

    assert!(record.elements[3].is_floating());
    let hand = record.elements[3].group().unwrap();
    assert!(hand.alternatives[0].terms[0].matches("hands"));

    let lead = record.lead_verbs.unwrap();
    assert!(!lead.mandatory);
    assert!(lead.matches("given"));
    assert!(lead.matches("lend"));
}

#[test]
fn test_multi_word_alternative_splits_into_terms() {
    let json = entry_json(
        r#"[{"kind": "constant", "alternatives": ["nick of  time"]}]"#,
    );
    let record = compile_first(&json).unwrap();
    let group = record.elements[0].group().unwrap();
    let literals: Vec<&str> = group.alternatives[0]
        .terms
        .iter()
        .map(|t| t.literal.as_str())
        .collect();
    assert_eq!(literals, vec!["nick", "of", "time"]);
}

fn entry_with_forms(elements: &str, lead_verbs: &str, word_forms: &str) -> String {
    format!(
        r#"{{"format_version": 1, "patterns": [{{
            "id": 8, "phrase": "p", "definition": "d",
            "elements": {elements},
            "lead_verbs": {lead_verbs},
            "word_forms": {word_forms}
        }}]}}"#
    )
}

fn literal_runs(record: &PatternRecord, element: usize) -> Vec<Vec<String>> {
    record.elements[element]
        .group()
        .unwrap()
        .alternatives
        .iter()
        .map(|alt| alt.terms.iter().map(|t| t.literal.clone()).collect())
        .collect()
}

#[test]
fn test_contraction_splits_like_sentence_tokens() {
    let json = entry_with_forms(
        r#"[{"kind": "constant", "alternatives": ["don't"]},
            {"kind": "constant", "alternatives": ["hold"]}]"#,
        "null",
        "{}",
    );
    let record = compile_first(&json).unwrap();

    assert_eq!(literal_runs(&record, 0), vec![vec!["do", "n't"]]);
    let terms = &record.elements[0].group().unwrap().alternatives[0].terms;
    assert!(terms[0].matches("do"));
    assert!(terms[1].matches("n't"));
}

#[test]
fn test_multi_word_form_adds_alternative() {
    let json = entry_with_forms(
        r#"[{"kind": "constant", "alternatives": ["well-to-do"]}]"#,
        "null",
        r#"{"well-to-do": ["well to do", "welltodo"]}"#,
    );
    let record = compile_first(&json).unwrap();

    assert_eq!(
        literal_runs(&record, 0),
        vec![vec!["well-to-do"], vec!["well", "to", "do"]]
    );
    let first = &record.elements[0].group().unwrap().alternatives[0].terms[0];
    assert!(first.matches("welltodo"));
}

#[test]
fn test_forms_of_contraction_become_alternatives() {
    let json = entry_with_forms(
        r#"[{"kind": "constant", "alternatives": ["can't wait"]}]"#,
        "null",
        r#"{"can't": ["cannot", "can not"]}"#,
    );
    let record = compile_first(&json).unwrap();

    assert_eq!(
        literal_runs(&record, 0),
        vec![
            vec!["ca", "n't", "wait"],
            vec!["cannot", "wait"],
            vec!["can", "not", "wait"],
        ]
    );
}

#[test]
fn test_runaway_form_expansion_is_rejected() {
    let json = entry_with_forms(
        r#"[{"kind": "constant", "alternatives": ["a b c d"]}]"#,
        "null",
        r#"{"a": ["a a", "a a a"], "b": ["b b", "b b b"], "c": ["c c", "c c c"], "d": ["d d", "d d d"]}"#,
    );
    let message = format!("{:#}", compile_first(&json).unwrap_err());
    assert!(message.contains("element 0"), "{message}");
    assert!(message.contains("word runs"), "{message}");
}

#[test]
fn test_multi_word_lead_verb_is_rejected() {
    let json = entry_with_forms(
        r#"[{"kind": "constant", "alternatives": ["x"]}]"#,
        r#"{"verbs": ["give up"], "mandatory": false}"#,
        "{}",
    );
    let message = format!("{:#}", compile_first(&json).unwrap_err());
    assert!(message.contains("not a single word"), "{message}");
}

#[test]
fn test_multi_word_lead_verb_form_is_rejected() {
    let json = entry_with_forms(
        r#"[{"kind": "constant", "alternatives": ["x"]}]"#,
        r#"{"verbs": ["get"], "mandatory": false}"#,
        r#"{"get": ["got", "have got"]}"#,
    );
    let message = format!("{:#}", compile_first(&json).unwrap_err());
    assert!(message.contains("\"have got\""), "{message}");
}

#[test]
fn test_variable_defaults() {
    let json = entry_json(
        r#"[{"kind": "constant", "alternatives": ["hand"]}, {"kind": "variable"}]"#,
    );
    let record = compile_first(&json).unwrap();
    let Element::Variable(slot) = &record.elements[1] else {
        panic!("expected a variable");
    };
    assert_eq!(slot.label, "something");
    assert_eq!(slot.class, VariableClass::Nominal);
    assert!(!slot.optional);
}

#[test]
fn test_pattern_without_required_constant_is_rejected() {
    let json = entry_json(
        r#"[{"kind": "optional", "alternatives": ["a"]}, {"kind": "variable"}]"#,
    );
    let err = compile_first(&json).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("pattern 3"), "{message}");
    assert!(message.contains("no required constant"), "{message}");
}

#[test]
fn test_empty_alternative_is_rejected() {
    let json = entry_json(r#"[{"kind": "constant", "alternatives": ["  "]}]"#);
    let err = compile_first(&json).unwrap_err();
    assert!(format!("{err:#}").contains("element 0"));
}

#[test]
fn test_constant_without_alternatives_is_rejected() {
    let json = entry_json(r#"[{"kind": "constant"}]"#);
    assert!(compile_first(&json).is_err());
}

#[test]
fn test_empty_lead_verb_list_is_rejected() {
    let json = r#"{"format_version": 1, "patterns": [{
        "id": 1, "phrase": "x", "definition": "y",
        "elements": [{"kind": "constant", "alternatives": ["x"]}],
        "lead_verbs": {"verbs": [], "mandatory": true}
    }]}"#;
    let err = compile_first(json).unwrap_err();
    assert!(format!("{err:#}").contains("lead verb list is empty"));
}

#[test]
fn test_empty_phrase_is_rejected() {
    let json = r#"{"format_version": 1, "patterns": [{
        "id": 1, "phrase": " ", "definition": "y",
        "elements": [{"kind": "constant", "alternatives": ["x"]}]
    }]}"#;
    assert!(compile_first(json).is_err());
}

#[test]
fn test_unknown_element_kind_fails_to_parse() {
    let json = entry_json(r#"[{"kind": "wildcard", "alternatives": ["x"]}]"#);
    assert!(parse_json_database(&json).is_err());
}

#[test]
fn test_read_database_rejects_unknown_version() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("patterns.json");
    fs::write(&path, r#"{"format_version": 2, "patterns": []}"#).unwrap();

    let err = read_database(&path).unwrap_err();
    assert!(err.to_string().contains("unsupported format_version 2"));
}

#[test]
fn test_artifact_preserves_database() {
    let dir = tempdir().unwrap();
    let database = parse_json_database(&entry_json(
        r#"[
            {"kind": "constant", "alternatives": ["give"]},
            {"kind": "variable", "text": "someone", "optional": true},
            {"kind": "constant", "alternatives": ["hand"], "floating": true}
        ]"#,
    ))
    .unwrap();

    let path = dir.path().join("patterns.bincode.zst");
    write_artifact(&database, &path).unwrap();

    let restored = read_database(&path).unwrap();
    assert_eq!(restored, database);
}

#[test]
fn test_read_database_reports_path_on_malformed_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let err = read_database(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.json"));
}
