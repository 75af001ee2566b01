//! Built-in adapter backed by the in-crate tokenizer, tagger and lemmatizer.

use anyhow::Result;

use crate::linguistics::{LinguisticAdapter, PartOfSpeech, RawToken, lemmatize, tagger, tokenize};

/// Self-contained English adapter that needs no external toolkit.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedAdapter;

impl RuleBasedAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl LinguisticAdapter for RuleBasedAdapter {
    fn tokenize(&self, text: &str) -> Result<Vec<RawToken>> {
        Ok(tokenize::tokenize(text))
    }

    fn tag(&self, tokens: &[RawToken]) -> Result<Vec<PartOfSpeech>> {
        Ok(tagger::tag(tokens))
    }

    fn lemmatize(&self, token: &str, pos: PartOfSpeech) -> Result<String> {
        Ok(lemmatize::lemmatize(token, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linguistics::{CancelToken, annotate_with};

    #[test]
    fn test_rule_based_adapter_annotates_sentence() {
        let tokens = annotate_with(
            &RuleBasedAdapter::new(),
            "We were accustomed to it.",
            &CancelToken::new(),
        )
        .unwrap();

        let lemmas: Vec<&str> = tokens.iter().map(|t| t.lemma.as_str()).collect();
        assert_eq!(lemmas, vec!["we", "be", "accustom", "to", "it", "."]);
        assert_eq!(tokens[1].pos, PartOfSpeech::Auxiliary);
        assert_eq!(tokens[2].pos, PartOfSpeech::Verb);
    }
}
