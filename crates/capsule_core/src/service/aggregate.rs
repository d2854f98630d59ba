//! Sentiment aggregation over an unlocked capsule's contents.
//!
//! # Invariants
//! - Every content row counts, including binary rows scored `0.0`.
//! - An empty capsule averages `0.0` (no division by zero).
//! - Results are computed per read and never cached or persisted.

use crate::model::content::Content;
use serde::Serialize;

/// Discrete tone label derived from the average score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mood {
    #[serde(rename = "Very Positive")]
    VeryPositive,
    #[serde(rename = "Mostly Positive")]
    MostlyPositive,
    #[serde(rename = "Neutral/Mixed")]
    NeutralMixed,
    #[serde(rename = "Slightly Negative")]
    SlightlyNegative,
    #[serde(rename = "Quite Negative")]
    QuiteNegative,
}

impl Mood {
    /// Classifies an average score.
    ///
    /// Boundaries: `0.5` is Mostly Positive, `0` is Neutral/Mixed, `-0.5` is
    /// Slightly Negative. NaN falls through to Neutral/Mixed.
    pub fn classify(average: f64) -> Self {
        if average > 0.5 {
            Self::VeryPositive
        } else if average > 0.0 {
            Self::MostlyPositive
        } else if average < -0.5 {
            Self::QuiteNegative
        } else if average < 0.0 {
            Self::SlightlyNegative
        } else {
            Self::NeutralMixed
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::VeryPositive => "Very Positive",
            Self::MostlyPositive => "Mostly Positive",
            Self::NeutralMixed => "Neutral/Mixed",
            Self::SlightlyNegative => "Slightly Negative",
            Self::QuiteNegative => "Quite Negative",
        }
    }
}

/// Aggregate tone of a capsule's contents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentSummary {
    pub content_count: usize,
    pub total: f64,
    pub average: f64,
    pub mood: Mood,
}

impl SentimentSummary {
    /// Average rounded to two decimals, for display.
    pub fn average_rounded(&self) -> f64 {
        (self.average * 100.0).round() / 100.0
    }
}

/// Computes sentiment summaries; stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentAggregator;

impl ContentAggregator {
    pub fn summarize(&self, contents: &[Content]) -> SentimentSummary {
        summarize_scores(contents.iter().map(|content| content.sentiment_score))
    }
}

/// Aggregates a score sequence in order.
pub fn summarize_scores(scores: impl IntoIterator<Item = f64>) -> SentimentSummary {
    let (count, total) = scores
        .into_iter()
        .fold((0usize, 0.0f64), |(count, total), score| (count + 1, total + score));
    let average = if count > 0 { total / count as f64 } else { 0.0 };
    SentimentSummary {
        content_count: count,
        total,
        average,
        mood: Mood::classify(average),
    }
}

#[cfg(test)]
mod tests {
    use super::{summarize_scores, Mood};

    #[test]
    fn mood_boundaries_are_exact() {
        assert_eq!(Mood::classify(0.5), Mood::MostlyPositive);
        assert_eq!(Mood::classify(0.5000001), Mood::VeryPositive);
        assert_eq!(Mood::classify(0.0), Mood::NeutralMixed);
        assert_eq!(Mood::classify(-0.0), Mood::NeutralMixed);
        assert_eq!(Mood::classify(-0.5), Mood::SlightlyNegative);
        assert_eq!(Mood::classify(-0.5000001), Mood::QuiteNegative);
        assert_eq!(Mood::classify(1e-9), Mood::MostlyPositive);
        assert_eq!(Mood::classify(f64::NAN), Mood::NeutralMixed);
    }

    #[test]
    fn empty_sequence_is_neutral_without_division() {
        let summary = summarize_scores([]);
        assert_eq!(summary.content_count, 0);
        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.mood, Mood::NeutralMixed);
    }

    #[test]
    fn binary_zero_scores_pull_average_toward_neutral() {
        let summary = summarize_scores([3.0, 0.0, 0.0]);
        assert_eq!(summary.total, 3.0);
        assert_eq!(summary.average, 1.0);
        assert_eq!(summary.mood, Mood::VeryPositive);

        let diluted = summarize_scores([1.0, 0.0, 0.0, 0.0]);
        assert_eq!(diluted.average, 0.25);
        assert_eq!(diluted.mood, Mood::MostlyPositive);
    }

    #[test]
    fn rounding_is_display_only() {
        let summary = summarize_scores([1.0, 0.0, 0.0]);
        assert_eq!(summary.average_rounded(), 0.33);
        assert!(summary.average > 0.333);
    }

    #[test]
    fn mood_serializes_as_label() {
        let json = serde_json::to_string(&Mood::NeutralMixed).unwrap();
        assert_eq!(json, "\"Neutral/Mixed\"");
    }
}
