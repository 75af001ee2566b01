//! Sentence tokenization.
//!
//! Words keep their internal hyphens and apostrophes (`well-to-do`,
//! `o'clock`), every other non-space character is its own token, and English
//! clitics are split off the way Treebank tokenizers do: `didn't` becomes
//! `did` + `n't`, `I'll` becomes `I` + `'ll`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::linguistics::RawToken;

/// A word (letters/digits joined by single hyphens or apostrophes) or one
/// non-space symbol.
static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:[-'’][\p{L}\p{N}]+)*|[^\s\p{L}\p{N}]")
        .expect("Invalid regex pattern")
});

/// Clitic suffixes split off after an apostrophe.
const APOSTROPHE_CLITICS: &[&str] = &["s", "re", "ve", "ll", "d", "m"];

/// Tokenize text into surface tokens with character offsets.
///
/// # Examples
/// ```
/// # use idiomscan::linguistics::tokenize::tokenize;
/// let texts: Vec<String> = tokenize("I'll go.").into_iter().map(|t| t.text).collect();
/// assert_eq!(texts, vec!["I", "'ll", "go", "."]);
/// ```
pub fn tokenize(text: &str) -> Vec<RawToken> {
    let mut tokens = Vec::new();
    let mut char_offset = 0;
    let mut byte_cursor = 0;

    for found in WORD_PATTERN.find_iter(text) {
        char_offset += text[byte_cursor..found.start()].chars().count();
        byte_cursor = found.start();

        for (piece, piece_offset) in split_clitics(found.as_str()) {
            tokens.push(RawToken::new(piece, char_offset + piece_offset));
        }
    }

    tokens
}

/// Split dictionary text into the token texts a sentence containing it would
/// produce.
///
/// A chunk that is itself a clitic (`'s`, `n't`) stays whole so it lines up
/// with the clitic token split off a sentence word.
///
/// # Examples
/// ```
/// # use idiomscan::linguistics::tokenize::tokenize_phrase;
/// assert_eq!(tokenize_phrase("don't hold"), vec!["do", "n't", "hold"]);
/// assert_eq!(tokenize_phrase("'s"), vec!["'s"]);
/// ```
pub fn tokenize_phrase(text: &str) -> Vec<String> {
    text.split_whitespace()
        .flat_map(|chunk| {
            if is_clitic(chunk) {
                vec![chunk.to_string()]
            } else {
                tokenize(chunk).into_iter().map(|token| token.text).collect()
            }
        })
        .collect()
}

fn is_clitic(chunk: &str) -> bool {
    let mut chars = chunk.chars();
    match chars.next() {
        Some(first) if is_apostrophe(first) => {
            let rest = chars.as_str().to_lowercase();
            APOSTROPHE_CLITICS.contains(&rest.as_str())
        }
        Some(first) if first.eq_ignore_ascii_case(&'n') => {
            let rest: Vec<char> = chars.collect();
            rest.len() == 2 && is_apostrophe(rest[0]) && rest[1].eq_ignore_ascii_case(&'t')
        }
        _ => false,
    }
}

/// Split a word into its stem and clitic, returning char offsets relative to the word.
fn split_clitics(word: &str) -> Vec<(&str, usize)> {
    let chars: Vec<(usize, char)> = word.char_indices().collect();
    let len = chars.len();

    // n't
    if len > 3 {
        let (n_byte, n) = chars[len - 3];
        let (_, apostrophe) = chars[len - 2];
        let (_, t) = chars[len - 1];
        if n.eq_ignore_ascii_case(&'n') && is_apostrophe(apostrophe) && t.eq_ignore_ascii_case(&'t')
        {
            return vec![(&word[..n_byte], 0), (&word[n_byte..], len - 3)];
        }
    }

    if let Some(position) = chars.iter().rposition(|&(_, c)| is_apostrophe(c))
        && position > 0
    {
        let (apostrophe_byte, _) = chars[position];
        let suffix = &word[apostrophe_byte..];
        let clitic: String = suffix.chars().skip(1).collect::<String>().to_lowercase();
        if APOSTROPHE_CLITICS.contains(&clitic.as_str()) {
            return vec![(&word[..apostrophe_byte], 0), (suffix, position)];
        }
    }

    vec![(word, 0)]
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '’'
}
