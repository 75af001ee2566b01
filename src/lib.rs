pub mod cli;
pub mod config;
pub mod error;
pub mod idiom_detection;
pub mod linguistics;

pub use config::{MatcherConfig, ScoringWeights};
pub use error::IdiomError;
pub use idiom_detection::{
    FindOptions, FindOptionsBuilder, IdiomFinder, IdiomResult, MatchSpan, PatternStore,
};
pub use linguistics::{
    AnnotatedToken, CancelToken, LinguisticAdapter, PartOfSpeech, RawToken, RuleBasedAdapter,
};
