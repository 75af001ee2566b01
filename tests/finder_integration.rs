use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use idiomscan::{
    FindOptions, FindOptionsBuilder, IdiomError, IdiomFinder, LinguisticAdapter, MatcherConfig,
    PartOfSpeech, PatternStore, RawToken, RuleBasedAdapter,
};

const SAMPLE_DB: &str = "testdata/patterns/sample.json";
const EFFORT_SENTENCE: &str =
    "The plan didn't work, but I'll give you an A for effort for trying.";

fn sample_finder() -> IdiomFinder {
    IdiomFinder::from_path(
        Path::new(SAMPLE_DB),
        Arc::new(RuleBasedAdapter::new()),
        MatcherConfig::default(),
    )
    .expect("sample database should load")
}

fn phrases(finder: &IdiomFinder, sentence: &str) -> Vec<String> {
    finder
        .find(sentence, &FindOptions::default())
        .expect("find should succeed")
        .into_iter()
        .map(|r| r.phrase)
        .collect()
}

/// Delegates to the rule-based adapter but stalls on its first call.
struct SlowFirstCallAdapter {
    calls: AtomicUsize,
    delay: Duration,
}

impl LinguisticAdapter for SlowFirstCallAdapter {
    fn tokenize(&self, text: &str) -> Result<Vec<RawToken>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            thread::sleep(self.delay);
        }
        RuleBasedAdapter::new().tokenize(text)
    }

    fn tag(&self, tokens: &[RawToken]) -> Result<Vec<PartOfSpeech>> {
        RuleBasedAdapter::new().tag(tokens)
    }

    fn lemmatize(&self, token: &str, pos: PartOfSpeech) -> Result<String> {
        RuleBasedAdapter::new().lemmatize(token, pos)
    }
}

/// Hangs in `tokenize` until released, then behaves like the rule-based adapter.
struct GatedAdapter {
    released: Arc<AtomicBool>,
}

impl LinguisticAdapter for GatedAdapter {
    fn tokenize(&self, text: &str) -> Result<Vec<RawToken>> {
        while !self.released.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(2));
        }
        RuleBasedAdapter::new().tokenize(text)
    }

    fn tag(&self, tokens: &[RawToken]) -> Result<Vec<PartOfSpeech>> {
        RuleBasedAdapter::new().tag(tokens)
    }

    fn lemmatize(&self, token: &str, pos: PartOfSpeech) -> Result<String> {
        RuleBasedAdapter::new().lemmatize(token, pos)
    }
}

/// Splits on whitespace and fails to tag anything.
struct BrokenTaggerAdapter;

impl LinguisticAdapter for BrokenTaggerAdapter {
    fn tokenize(&self, text: &str) -> Result<Vec<RawToken>> {
        let mut offset = 0;
        Ok(text
            .split(' ')
            .map(|word| {
                let token = RawToken::new(word, offset);
                offset += word.chars().count() + 1;
                token
            })
            .collect())
    }

    fn tag(&self, _tokens: &[RawToken]) -> Result<Vec<PartOfSpeech>> {
        Err(anyhow!("tagger model not loaded"))
    }

    fn lemmatize(&self, token: &str, _pos: PartOfSpeech) -> Result<String> {
        Ok(token.to_string())
    }
}

#[test]
fn test_effort_scenario_with_limit_one() {
    let finder = sample_finder();
    let options = FindOptionsBuilder::default().limit(1).build().unwrap();

    let results = finder.find(EFFORT_SENTENCE, &options).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].phrase, "an A for effort");
    assert_eq!(
        results[0].definition,
        "acknowledgement for having tried to do something"
    );
}

#[test]
fn test_ranking_is_monotonic_with_id_tie_break() {
    let finder = sample_finder();
    let query = finder
        .annotate(EFFORT_SENTENCE, &FindOptions::default())
        .unwrap();
    let matches = finder.find_matches(&query, 10).unwrap();

    let ids: Vec<u32> = matches.iter().map(|m| m.pattern.id).collect();
    assert_eq!(ids, vec![1, 2]);
    for pair in matches.windows(2) {
        assert!(
            pair[0].score > pair[1].score
                || (pair[0].score == pair[1].score && pair[0].pattern.id < pair[1].pattern.id)
        );
    }
}

#[test]
fn test_results_are_deterministic() {
    let finder = sample_finder();
    let options = FindOptionsBuilder::default()
        .span(true)
        .debug_id(true)
        .debug_range(true)
        .build()
        .unwrap();

    let first = finder.find(EFFORT_SENTENCE, &options).unwrap();
    for _ in 0..10 {
        assert_eq!(finder.find(EFFORT_SENTENCE, &options).unwrap(), first);
    }
    assert_eq!(first[0].entry_id, Some(1));
    assert_eq!(first[0].entry_range, Some([1043, 1047]));
}

#[test]
fn test_html_output_and_span() {
    let finder = sample_finder();
    let options = FindOptionsBuilder::default()
        .html(true)
        .span(true)
        .limit(1)
        .build()
        .unwrap();

    let results = finder.find(EFFORT_SENTENCE, &options).unwrap();
    assert_eq!(results[0].phrase, "<b>an A for effort</b>");
    // No HTML definition in the database, so the plain one is used.
    assert_eq!(
        results[0].definition,
        "acknowledgement for having tried to do something"
    );

    let span = results[0].span.unwrap();
    assert_eq!((span.start_token, span.end_token), (11, 15));
    assert_eq!(
        &EFFORT_SENTENCE[span.start_char..span.end_char],
        "an A for effort"
    );
}

#[test]
fn test_sentence_without_known_constants_is_empty() {
    let finder = sample_finder();
    assert!(phrases(&finder, "Nothing here matches anything at all.").is_empty());
}

#[test]
fn test_zero_limit_is_invalid() {
    let finder = sample_finder();
    let options = FindOptions {
        limit: 0,
        ..FindOptions::default()
    };
    assert!(matches!(
        finder.find(EFFORT_SENTENCE, &options),
        Err(IdiomError::InvalidArgument(_))
    ));
}

#[test]
fn test_optional_constant_never_lowers_the_score() {
    let finder = sample_finder();
    let score_of = |sentence: &str| {
        let query = finder.annotate(sentence, &FindOptions::default()).unwrap();
        finder
            .find_matches(&query, 10)
            .unwrap()
            .into_iter()
            .find(|m| m.pattern.id == 1)
            .map(|m| m.score)
            .unwrap()
    };

    let with_optional = score_of("I'll give you an A for effort.");
    let without_optional = score_of("I'll give you A for effort.");
    assert!(with_optional > without_optional);
}

#[test]
fn test_required_constants_are_necessary() {
    let finder = sample_finder();
    let found = phrases(&finder, "I'll give you an A for trying.");
    assert!(!found.contains(&"an A for effort".to_string()));
}

#[test]
fn test_variable_classes_separate_patterns() {
    let finder = sample_finder();
    assert_eq!(
        phrases(&finder, "They were accustomed to the noise."),
        vec!["accustomed to someone or something"]
    );
    assert_eq!(
        phrases(&finder, "She grew accustomed to waking early."),
        vec!["accustomed to doing something"]
    );
}

#[test]
fn test_floating_constant_before_anchor() {
    let finder = sample_finder();
    assert_eq!(
        phrases(&finder, "The beans were spilled by Tom."),
        vec!["spill the beans"]
    );
}

#[test]
fn test_mandatory_lead_verb() {
    let finder = sample_finder();
    assert_eq!(
        phrases(&finder, "It cost an arm and a leg."),
        vec!["cost an arm and a leg"]
    );
    assert!(phrases(&finder, "He broke an arm and a leg.").is_empty());
}

#[test]
fn test_load_errors() {
    for (file, expected) in [
        ("testdata/patterns/duplicate_id.json", "duplicate id"),
        ("testdata/patterns/no_constants.json", "no required constant"),
        ("testdata/patterns/malformed.json", "malformed.json"),
        ("testdata/patterns/does_not_exist.json", "does_not_exist.json"),
    ] {
        match PatternStore::load(Path::new(file)) {
            Err(IdiomError::Load(message)) => {
                assert!(message.contains(expected), "{file}: {message}")
            }
            other => panic!("{file}: expected a load error, got {other:?}"),
        }
    }
}

#[test]
fn test_load_is_idempotent() {
    let first = PatternStore::load(Path::new(SAMPLE_DB)).unwrap();
    let second = PatternStore::load(Path::new(SAMPLE_DB)).unwrap();

    assert_eq!(first.len(), 6);
    assert_eq!(first.len(), second.len());
    for record in first.iter() {
        assert_eq!(second.get(record.id), Some(record));
    }
}

#[test]
fn test_timeout_then_healthy_call() {
    let store = PatternStore::load(Path::new(SAMPLE_DB)).unwrap();
    let finder = IdiomFinder::new(
        Arc::new(store),
        Arc::new(SlowFirstCallAdapter {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(500),
        }),
        MatcherConfig::default(),
    )
    .unwrap();

    let hurried = FindOptions {
        timeout: Some(Duration::from_millis(20)),
        ..FindOptions::default()
    };
    assert_eq!(
        finder.find(EFFORT_SENTENCE, &hurried),
        Err(IdiomError::LinguisticServiceTimeout(Duration::from_millis(20)))
    );

    let results = finder.find(EFFORT_SENTENCE, &FindOptions::default()).unwrap();
    assert_eq!(results[0].phrase, "an A for effort");
}

#[test]
fn test_adapter_failure_is_reported() {
    let store = PatternStore::load(Path::new(SAMPLE_DB)).unwrap();
    let finder = IdiomFinder::new(
        Arc::new(store),
        Arc::new(BrokenTaggerAdapter),
        MatcherConfig::default(),
    )
    .unwrap();

    assert_eq!(
        finder.find("an A for effort", &FindOptions::default()),
        Err(IdiomError::LinguisticService(
            "tagger model not loaded".to_string()
        ))
    );
}

#[test]
fn test_shipped_database_loads() {
    let store = PatternStore::load(Path::new("resources/idioms/patterns.json")).unwrap();
    assert!(store.len() >= 20);
    assert!(!store.lookup_by_constant("beans").is_empty());
    assert!(!store.lookup_by_constant("n't").is_empty());

    let finder = IdiomFinder::new(
        Arc::new(store),
        Arc::new(RuleBasedAdapter::new()),
        MatcherConfig::default(),
    )
    .unwrap();
    let breath = phrases(&finder, "Don't hold your breath.");
    assert!(breath.contains(&"don't hold your breath".to_string()), "{breath:?}");
    let wealthy = phrases(&finder, "They are a well to do family.");
    assert!(wealthy.contains(&"well-to-do".to_string()), "{wealthy:?}");
}

#[test]
fn test_hung_adapter_does_not_pile_up_workers() {
    let released = Arc::new(AtomicBool::new(false));
    let store = PatternStore::load(Path::new(SAMPLE_DB)).unwrap();
    let config = MatcherConfig {
        max_stalled_annotations: 2,
        ..MatcherConfig::default()
    };
    let finder = IdiomFinder::new(
        Arc::new(store),
        Arc::new(GatedAdapter {
            released: Arc::clone(&released),
        }),
        config,
    )
    .unwrap();

    let hurried = FindOptions {
        timeout: Some(Duration::from_millis(5)),
        ..FindOptions::default()
    };
    for _ in 0..25 {
        assert!(finder.find(EFFORT_SENTENCE, &hurried).is_err());
    }
    assert_eq!(finder.stalled_annotations(), 2);

    released.store(true, Ordering::SeqCst);
    let deadline = Instant::now() + Duration::from_secs(5);
    while finder.stalled_annotations() > 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(finder.stalled_annotations(), 0);

    let results = finder.find(EFFORT_SENTENCE, &FindOptions::default()).unwrap();
    assert_eq!(results[0].phrase, "an A for effort");
}

fn finder_for(json: &str) -> IdiomFinder {
    IdiomFinder::new(
        Arc::new(PatternStore::from_json_str(json).unwrap()),
        Arc::new(RuleBasedAdapter::new()),
        MatcherConfig::default(),
    )
    .unwrap()
}

#[test]
fn test_contraction_constant_matches_sentence() {
    let finder = finder_for(
        r#"{"format_version": 1, "patterns": [{
            "id": 1, "phrase": "don't hold your breath", "definition": "don't expect it soon",
            "elements": [
                {"kind": "constant", "alternatives": ["don't"]},
                {"kind": "constant", "alternatives": ["hold"]},
                {"kind": "constant", "alternatives": ["breath"]}
            ]
        }]}"#,
    );

    assert_eq!(
        phrases(&finder, "Don't hold your breath."),
        vec!["don't hold your breath"]
    );
    assert_eq!(
        phrases(&finder, "Don’t hold your breath."),
        vec!["don't hold your breath"]
    );
    assert!(phrases(&finder, "Do hold your breath.").is_empty());
}

#[test]
fn test_split_word_form_matches_sentence() {
    let finder = finder_for(
        r#"{"format_version": 1, "patterns": [{
            "id": 1, "phrase": "well-to-do", "definition": "wealthy",
            "elements": [{"kind": "constant", "alternatives": ["well-to-do"]}],
            "word_forms": {"well-to-do": ["well to do"]}
        }]}"#,
    );

    assert_eq!(phrases(&finder, "a well-to-do family"), vec!["well-to-do"]);
    assert_eq!(phrases(&finder, "a well to do family"), vec!["well-to-do"]);
}
