use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::super::reading::FeatureReading;
use super::config::{ScoringConfig, ScoringRule, Subsystem};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

impl ScoringRule {
    /// Risk score for one sensor value, clamped to `[0, 100]` and rounded to 2 decimals.
    pub fn score(&self, value: f64) -> f64 {
        let raw = match *self {
            ScoringRule::Deviation { ideal, weight } => (value - ideal).abs() * weight,
            ScoringRule::Linear {
                weight,
                denominator,
            } => value / denominator.unwrap_or(1.0) * weight,
        };

        // NaN only arises from 0 * inf on absurd inputs; treat it as the worst case.
        let bounded = if raw.is_nan() {
            MAX_SCORE
        } else {
            raw.clamp(MIN_SCORE, MAX_SCORE)
        };
        round2(bounded)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scores for all six subsystems of one reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsystemScores(BTreeMap<Subsystem, f64>);

impl SubsystemScores {
    pub fn get(&self, subsystem: Subsystem) -> f64 {
        self.0.get(&subsystem).copied().unwrap_or(MIN_SCORE)
    }

    /// Iterates in canonical subsystem order.
    pub fn iter(&self) -> impl Iterator<Item = (Subsystem, f64)> + '_ {
        Subsystem::ordered()
            .into_iter()
            .map(move |subsystem| (subsystem, self.get(subsystem)))
    }

    /// Arithmetic mean of the six scores, rounded to 2 decimals.
    pub fn composite(&self) -> f64 {
        let total: f64 = self.iter().map(|(_, score)| score).sum();
        round2(total / Subsystem::ordered().len() as f64)
    }

    /// Scores keyed by subsystem key, the shape history records persist.
    pub fn keyed(&self) -> BTreeMap<String, f64> {
        self.iter()
            .map(|(subsystem, score)| (subsystem.key().to_string(), score))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn from_scores(scores: [f64; 6]) -> Self {
        Self(Subsystem::ordered().into_iter().zip(scores).collect())
    }
}

pub(crate) fn score_reading(reading: &FeatureReading, config: &ScoringConfig) -> SubsystemScores {
    let scores = config
        .rules()
        .map(|(subsystem, rule)| (subsystem, rule.score(reading.value(subsystem.feature()))))
        .collect();
    SubsystemScores(scores)
}
