//! Pluggable text sentiment scoring.
//!
//! # Responsibility
//! - Define the scorer capability used by content ingestion.
//! - Ship a default word-list scorer so the core runs without a remote model.
//!
//! # Invariants
//! - Scoring is a pure function of the text; the result is stored verbatim and
//!   never recomputed.

mod lexicon;

pub use lexicon::LexiconScorer;

/// Assigns a numeric tone to a piece of text.
///
/// Positive values are positive tone; `0.0` is neutral. No range is implied.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> f64;
}

impl<F> SentimentScorer for F
where
    F: Fn(&str) -> f64 + Send + Sync,
{
    fn score(&self, text: &str) -> f64 {
        self(text)
    }
}
