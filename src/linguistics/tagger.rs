//! Lexicon-and-heuristics part-of-speech tagger.
//!
//! Closed-class words (determiners, pronouns, auxiliaries, prepositions, ...)
//! come from a fixed lexicon. Open-class words are guessed from their
//! suffix and the tag of the previous token, falling back to `Noun`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::linguistics::lemmatize::is_known_verb;
use crate::linguistics::{PartOfSpeech, RawToken, normalize_word};

static LEXICON: Lazy<HashMap<&'static str, PartOfSpeech>> = Lazy::new(|| {
    use PartOfSpeech::*;

    let groups: &[(PartOfSpeech, &[&str])] = &[
        (
            Determiner,
            &[
                "a", "an", "the", "this", "that", "these", "those", "every", "each", "some",
                "any", "no", "another", "either", "neither", "all", "both", "such", "which",
                "what", "whatever",
            ],
        ),
        (
            Pronoun,
            &[
                "i", "me", "you", "he", "him", "she", "her", "it", "we", "us", "they", "them",
                "myself", "yourself", "himself", "herself", "itself", "ourselves", "yourselves",
                "themselves", "someone", "somebody", "something", "anyone", "anybody",
                "anything", "everyone", "everybody", "everything", "nobody", "nothing", "one",
                "who", "whom", "mine", "yours", "ours", "theirs", "hers",
            ],
        ),
        (
            PossessivePronoun,
            &["my", "your", "his", "its", "our", "their", "whose"],
        ),
        (
            Auxiliary,
            &[
                "be", "am", "is", "are", "was", "were", "been", "being", "have", "has", "had",
                "do", "does", "did", "will", "would", "shall", "should", "can", "could", "may",
                "might", "must", "'ll", "'d", "'m", "'re", "'ve", "ca", "wo",
            ],
        ),
        (
            Preposition,
            &[
                "about", "above", "across", "after", "against", "along", "among", "around",
                "at", "before", "behind", "below", "beneath", "beside", "between", "beyond",
                "by", "despite", "down", "during", "except", "for", "from", "in", "inside",
                "into", "like", "near", "of", "off", "on", "onto", "out", "outside", "over",
                "past", "since", "through", "throughout", "till", "toward", "towards", "under",
                "underneath", "until", "up", "upon", "with", "within", "without",
            ],
        ),
        (
            Conjunction,
            &[
                "and", "or", "but", "nor", "yet", "so", "because", "although", "though", "if",
                "unless", "whereas", "while", "than",
            ],
        ),
        (Particle, &["to"]),
        (
            Adverb,
            &[
                "not", "n't", "never", "very", "really", "just", "also", "too", "quite",
                "rather", "then", "here", "there", "now", "always", "often", "sometimes", "ever",
                "even", "still", "already", "again", "soon", "almost", "enough", "perhaps",
                "maybe", "how", "when", "where", "why", "away", "back",
            ],
        ),
        (
            Interjection,
            &["oh", "ah", "wow", "hey", "alas", "oops", "yes", "hello"],
        ),
        (
            Numeral,
            &[
                "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
                "twelve", "twenty", "thirty", "hundred", "thousand", "million", "billion",
            ],
        ),
    ];

    let mut lexicon = HashMap::new();
    for (pos, words) in groups {
        for word in *words {
            lexicon.insert(*word, *pos);
        }
    }
    lexicon
});

/// Subject pronouns after which an open-class word is read as a verb.
const SUBJECT_PRONOUNS: &[&str] = &["i", "you", "he", "she", "we", "they"];

/// Words after which `'s` contracts `is`/`has` rather than marking possession.
const COPULA_HOSTS: &[&str] = &[
    "it", "he", "she", "that", "there", "what", "who", "where", "here", "how", "let",
];

const ADJECTIVE_SUFFIXES: &[&str] = &[
    "ous", "ful", "able", "ible", "ive", "less", "ish", "ical", "ary", "ent", "ant",
];

const NOUN_SUFFIXES: &[&str] = &[
    "tion", "sion", "ness", "ment", "ity", "ship", "ance", "ence", "hood", "dom", "ism",
];

/// Tag every token in a sentence.
pub fn tag(tokens: &[RawToken]) -> Vec<PartOfSpeech> {
    let mut tags: Vec<PartOfSpeech> = Vec::with_capacity(tokens.len());

    for (index, token) in tokens.iter().enumerate() {
        let word = normalize_word(&token.text);
        let previous = index.checked_sub(1).map(|i| (&tokens[i], tags[i]));
        tags.push(tag_word(&token.text, &word, index, previous));
    }

    tags
}

fn tag_word(
    surface: &str,
    word: &str,
    index: usize,
    previous: Option<(&RawToken, PartOfSpeech)>,
) -> PartOfSpeech {
    if word.is_empty() {
        return PartOfSpeech::Other;
    }

    if !word.chars().any(char::is_alphanumeric) {
        return PartOfSpeech::Punctuation;
    }

    if word.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return PartOfSpeech::Numeral;
    }

    let previous_word = previous.map(|(token, _)| normalize_word(&token.text));
    let previous_pos = previous.map(|(_, pos)| pos);

    if word == "'s" {
        return match previous_word.as_deref() {
            Some(host) if COPULA_HOSTS.contains(&host) => PartOfSpeech::Auxiliary,
            _ => PartOfSpeech::Possessive,
        };
    }

    let sentence_initial = index == 0 || previous_pos == Some(PartOfSpeech::Punctuation);
    if !sentence_initial && word != "i" && surface.chars().next().is_some_and(char::is_uppercase)
    {
        return PartOfSpeech::ProperNoun;
    }

    if let Some(pos) = LEXICON.get(word) {
        return *pos;
    }

    // Open-class word right after an auxiliary, infinitival `to`, a negation
    // or a subject pronoun.
    let verb_context = match previous_pos {
        Some(PartOfSpeech::Auxiliary | PartOfSpeech::Particle) => true,
        Some(PartOfSpeech::Adverb) => matches!(previous_word.as_deref(), Some("not" | "n't")),
        Some(PartOfSpeech::Pronoun) => previous_word
            .as_deref()
            .is_some_and(|w| SUBJECT_PRONOUNS.contains(&w)),
        _ => false,
    };
    if verb_context && is_known_verb(word) {
        return PartOfSpeech::Verb;
    }

    if word.len() > 4 && word.ends_with("ing") && !word.ends_with("thing") {
        return PartOfSpeech::Verb;
    }
    if word.len() > 3 && word.ends_with("ed") {
        return PartOfSpeech::Verb;
    }
    if word.len() > 4 && word.ends_with("ly") {
        return PartOfSpeech::Adverb;
    }
    if NOUN_SUFFIXES.iter().any(|s| word.len() > s.len() + 2 && word.ends_with(s)) {
        return PartOfSpeech::Noun;
    }
    if ADJECTIVE_SUFFIXES.iter().any(|s| word.len() > s.len() + 2 && word.ends_with(s)) {
        return PartOfSpeech::Adjective;
    }
    if verb_context {
        return PartOfSpeech::Verb;
    }
    // A bare known verb that no determiner introduces.
    if is_known_verb(word)
        && !matches!(
            previous_pos,
            Some(
                PartOfSpeech::Determiner
                    | PartOfSpeech::PossessivePronoun
                    | PartOfSpeech::Possessive
                    | PartOfSpeech::Adjective
                    | PartOfSpeech::Preposition
            )
        )
        && !sentence_initial
    {
        return PartOfSpeech::Verb;
    }

    PartOfSpeech::Noun
}
