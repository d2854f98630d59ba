//! Word-list scorer with AFINN-style integer weights.
//!
//! Each known word contributes its weight (-5..=5); a weight is flipped when
//! the directly preceding token is a negator ("not happy" scores -3).

use super::SentimentScorer;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z][a-z']*").expect("valid word regex"));

const NEGATORS: &[&str] = &[
    "not", "no", "never", "don't", "dont", "doesn't", "didn't", "isn't", "wasn't", "aren't",
    "won't", "can't", "cannot", "shouldn't", "wouldn't",
];

const DEFAULT_LEXICON: &[(&str, i32)] = &[
    ("abandon", -2),
    ("afraid", -2),
    ("alone", -2),
    ("amazing", 4),
    ("angry", -3),
    ("anxious", -2),
    ("awesome", 4),
    ("awful", -3),
    ("bad", -3),
    ("beautiful", 3),
    ("best", 3),
    ("better", 2),
    ("bitter", -2),
    ("blessed", 2),
    ("bored", -2),
    ("brave", 2),
    ("broken", -1),
    ("calm", 2),
    ("care", 2),
    ("celebrate", 3),
    ("cheerful", 2),
    ("cry", -1),
    ("dead", -3),
    ("delight", 3),
    ("depressed", -2),
    ("disappointed", -2),
    ("disaster", -2),
    ("dream", 1),
    ("enjoy", 2),
    ("excellent", 3),
    ("excited", 3),
    ("fail", -2),
    ("fantastic", 4),
    ("fear", -2),
    ("fine", 2),
    ("fun", 4),
    ("glad", 3),
    ("good", 3),
    ("grateful", 3),
    ("great", 3),
    ("grief", -2),
    ("happy", 3),
    ("hate", -3),
    ("hope", 2),
    ("hopeful", 2),
    ("horrible", -3),
    ("hurt", -2),
    ("joy", 3),
    ("kind", 2),
    ("laugh", 1),
    ("lonely", -2),
    ("lose", -3),
    ("lost", -3),
    ("love", 3),
    ("loved", 3),
    ("lucky", 3),
    ("miss", -2),
    ("nice", 3),
    ("pain", -2),
    ("peace", 2),
    ("perfect", 3),
    ("pleased", 3),
    ("proud", 2),
    ("regret", -2),
    ("sad", -2),
    ("scared", -2),
    ("smile", 2),
    ("sorry", -1),
    ("stress", -1),
    ("success", 2),
    ("terrible", -3),
    ("thank", 2),
    ("thanks", 2),
    ("tired", -2),
    ("ugly", -3),
    ("upset", -2),
    ("warm", 1),
    ("win", 4),
    ("wonderful", 4),
    ("worried", -3),
    ("worse", -3),
    ("worst", -3),
    ("wow", 4),
    ("wrong", -2),
];

/// Lexicon-based scorer; sum of per-word weights.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    weights: HashMap<String, i32>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::with_lexicon(DEFAULT_LEXICON.iter().copied())
    }
}

impl LexiconScorer {
    /// Builds a scorer from `(word, weight)` pairs; words are lowercased.
    pub fn with_lexicon<'a>(entries: impl IntoIterator<Item = (&'a str, i32)>) -> Self {
        let weights = entries
            .into_iter()
            .map(|(word, weight)| (word.to_lowercase(), weight))
            .collect();
        Self { weights }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let mut total = 0i64;
        let mut previous: Option<&str> = None;
        for token in WORD_RE.find_iter(&lowered).map(|m| m.as_str()) {
            if let Some(weight) = self.weights.get(token) {
                let negated = previous.is_some_and(|prev| NEGATORS.contains(&prev));
                total += i64::from(if negated { -*weight } else { *weight });
            }
            previous = Some(token);
        }
        total as f64
    }
}
