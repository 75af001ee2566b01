//! Linguistic annotation: tokenization, part-of-speech tagging, lemmatization.
//!
//! The matcher never talks to a tagger directly. It goes through the
//! [`LinguisticAdapter`] trait so the toolkit can be swapped (or stubbed in
//! tests) without touching the matching code. [`AnnotationWorkers`] runs an
//! adapter on a worker thread, enforces the caller's time budget and cancels
//! the worker when the budget runs out.

pub mod lemmatize;
pub mod rule_based;
pub mod tagger;
pub mod tokenize;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow, bail};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::IdiomError;

pub use rule_based::RuleBasedAdapter;

/// Coarse part-of-speech classes used by variable slots and lead-verb checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PartOfSpeech {
    Noun,
    ProperNoun,
    Pronoun,
    PossessivePronoun,
    /// The possessive marker `'s`.
    Possessive,
    Verb,
    Auxiliary,
    Adjective,
    Adverb,
    Determiner,
    Preposition,
    Conjunction,
    /// Infinitival `to` and verb particles.
    Particle,
    Numeral,
    Interjection,
    Punctuation,
    Other,
}

impl PartOfSpeech {
    /// Map a Penn Treebank tag onto the coarse classes.
    pub fn from_penn(tag: &str) -> Self {
        match tag {
            "NN" | "NNS" => Self::Noun,
            "NNP" | "NNPS" => Self::ProperNoun,
            "PRP" | "WP" | "EX" => Self::Pronoun,
            "PRP$" | "WP$" => Self::PossessivePronoun,
            "POS" => Self::Possessive,
            "VB" | "VBD" | "VBG" | "VBN" | "VBP" | "VBZ" => Self::Verb,
            "MD" => Self::Auxiliary,
            "JJ" | "JJR" | "JJS" => Self::Adjective,
            "RB" | "RBR" | "RBS" | "WRB" => Self::Adverb,
            "DT" | "PDT" | "WDT" => Self::Determiner,
            "IN" => Self::Preposition,
            "CC" => Self::Conjunction,
            "TO" | "RP" => Self::Particle,
            "CD" => Self::Numeral,
            "UH" => Self::Interjection,
            "." | "," | ":" | "``" | "''" | "-LRB-" | "-RRB-" | "(" | ")" | "#" | "$" => {
                Self::Punctuation
            }
            _ => Self::Other,
        }
    }

    pub fn is_punctuation(self) -> bool {
        self == Self::Punctuation
    }

    pub fn is_verbal(self) -> bool {
        matches!(self, Self::Verb | Self::Auxiliary)
    }
}

/// A token as produced by a tokenizer, with its character offset in the sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub text: String,
    /// Offset of the first character, counted in `char`s.
    pub offset: usize,
}

impl RawToken {
    pub fn new(text: impl Into<String>, offset: usize) -> Self {
        Self {
            text: text.into(),
            offset,
        }
    }
}

/// A fully annotated sentence token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedToken {
    /// Surface text as it appears in the sentence.
    pub text: String,
    /// Normalized surface form (see [`normalize_word`]).
    pub norm: String,
    /// Normalized lemma.
    pub lemma: String,
    pub pos: PartOfSpeech,
    /// Character range of the token in the sentence (end exclusive).
    pub start_char: usize,
    pub end_char: usize,
}

/// Tokenizer, tagger and lemmatizer behind one narrow interface.
///
/// Implementations must be shareable across threads; they are invoked from a
/// worker thread so a slow toolkit can be abandoned on timeout.
pub trait LinguisticAdapter: Send + Sync {
    /// Split text into tokens with character offsets.
    fn tokenize(&self, text: &str) -> Result<Vec<RawToken>>;

    /// Tag tokens; the output must have exactly one tag per input token.
    fn tag(&self, tokens: &[RawToken]) -> Result<Vec<PartOfSpeech>>;

    /// Reduce a token to its base form.
    fn lemmatize(&self, token: &str, pos: PartOfSpeech) -> Result<String>;

    /// Annotate a whole sentence.
    ///
    /// The default runs the three steps through [`annotate_with`], which stops
    /// between steps once `cancel` fires. Adapters backed by a remote service
    /// can override this to abort an in-flight request as well.
    fn annotate(&self, text: &str, cancel: &CancelToken) -> Result<Vec<AnnotatedToken>> {
        annotate_with(self, text, cancel)
    }
}

/// Cooperative cancellation flag shared by a caller and an annotation worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fail once the token has been cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            bail!("annotation cancelled");
        }
        Ok(())
    }
}

/// Normalize a word for comparison: ASCII folding and lowercasing.
///
/// Curly apostrophes and accented letters fold to their ASCII counterparts,
/// so `didn’t` and `didn't` compare equal.
pub fn normalize_word(word: &str) -> String {
    deunicode::deunicode(word.trim()).to_lowercase()
}

/// Run the adapter over a sentence and check its output.
///
/// `cancel` is checked after tokenizing, after tagging and before every
/// lemma, so an abandoned run stops at the next step boundary.
pub fn annotate_with<A: LinguisticAdapter + ?Sized>(
    adapter: &A,
    text: &str,
    cancel: &CancelToken,
) -> Result<Vec<AnnotatedToken>> {
    let raw_tokens = adapter.tokenize(text)?;
    cancel.check()?;
    let tags = adapter.tag(&raw_tokens)?;
    cancel.check()?;

    if tags.len() != raw_tokens.len() {
        return Err(anyhow!(
            "tagger returned {} tags for {} tokens",
            tags.len(),
            raw_tokens.len()
        ));
    }

    let mut tokens = Vec::with_capacity(raw_tokens.len());
    for (raw, pos) in raw_tokens.into_iter().zip(tags) {
        if raw.text.is_empty() {
            return Err(anyhow!("tokenizer produced an empty token at offset {}", raw.offset));
        }
        cancel.check()?;
        let lemma = adapter.lemmatize(&raw.text, pos)?;
        let end_char = raw.offset + raw.text.chars().count();
        tokens.push(AnnotatedToken {
            norm: normalize_word(&raw.text),
            lemma: normalize_word(&lemma),
            pos,
            start_char: raw.offset,
            end_char,
            text: raw.text,
        });
    }

    Ok(tokens)
}

const WORKER_RUNNING: u8 = 0;
const WORKER_ABANDONED: u8 = 1;
const WORKER_DONE: u8 = 2;

/// Runs annotations on worker threads and keeps count of the ones that
/// outlived their caller.
///
/// A worker that misses its deadline is cancelled and abandoned. It keeps its
/// thread until the adapter returns control, so while `max_stalled` abandoned
/// workers are still alive new annotations are refused instead of piling up
/// more threads behind a hung toolkit.
#[derive(Debug)]
pub struct AnnotationWorkers {
    stalled: AtomicUsize,
    max_stalled: usize,
}

/// Settles a worker's state when its thread ends, panics included.
struct WorkerGuard {
    state: Arc<AtomicU8>,
    workers: Arc<AnnotationWorkers>,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        if self.state.swap(WORKER_DONE, Ordering::SeqCst) == WORKER_ABANDONED {
            self.workers.stalled.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl AnnotationWorkers {
    pub fn new(max_stalled: usize) -> Self {
        Self {
            stalled: AtomicUsize::new(0),
            max_stalled,
        }
    }

    /// Abandoned workers whose adapter call has not returned yet.
    pub fn stalled(&self) -> usize {
        self.stalled.load(Ordering::SeqCst)
    }

    /// Annotate a sentence on a worker thread, giving up after `timeout`.
    ///
    /// On timeout the worker's token is cancelled and its result is dropped;
    /// nothing it computes can reach the caller afterwards.
    pub fn annotate(
        self: &Arc<Self>,
        adapter: Arc<dyn LinguisticAdapter>,
        text: &str,
        timeout: Duration,
    ) -> Result<Vec<AnnotatedToken>, IdiomError> {
        let stalled = self.stalled();
        if stalled >= self.max_stalled {
            warn!("Refusing annotation: {stalled} abandoned workers still running");
            return Err(IdiomError::LinguisticService(format!(
                "{stalled} abandoned annotation workers are still running"
            )));
        }

        let (sender, receiver) = mpsc::channel();
        let owned_text = text.to_string();
        let cancel = CancelToken::new();
        let state = Arc::new(AtomicU8::new(WORKER_RUNNING));
        let guard = WorkerGuard {
            state: Arc::clone(&state),
            workers: Arc::clone(self),
        };
        let worker_cancel = cancel.clone();
        let started = Instant::now();

        thread::Builder::new()
            .name("linguistic-adapter".to_string())
            .spawn(move || {
                let _guard = guard;
                let result = adapter.annotate(&owned_text, &worker_cancel);
                // The receiver is gone when the caller already timed out.
                let _ = sender.send(result);
            })
            .map_err(|e| {
                IdiomError::LinguisticService(format!("failed to start annotation worker: {e}"))
            })?;

        match receiver.recv_timeout(timeout) {
            Ok(Ok(tokens)) => {
                debug!(
                    "Annotated {} tokens in {:?}",
                    tokens.len(),
                    started.elapsed()
                );
                Ok(tokens)
            }
            Ok(Err(err)) => Err(IdiomError::linguistic(err)),
            Err(RecvTimeoutError::Timeout) => {
                cancel.cancel();
                self.abandon(&state);
                warn!("Linguistic adapter exceeded its {:?} budget", timeout);
                Err(IdiomError::LinguisticServiceTimeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(IdiomError::LinguisticService(
                "annotation worker stopped without a result".to_string(),
            )),
        }
    }

    fn abandon(&self, state: &AtomicU8) {
        // Count first so the worker's guard can never decrement below zero.
        self.stalled.fetch_add(1, Ordering::SeqCst);
        if state
            .compare_exchange(
                WORKER_RUNNING,
                WORKER_ABANDONED,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            self.stalled.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
