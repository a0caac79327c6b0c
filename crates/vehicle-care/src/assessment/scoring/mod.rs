mod config;
mod policy;
mod rules;

pub use config::{
    ConfigurationError, EngineConfig, ScoringConfig, ScoringPreset, ScoringRule, Subsystem,
    TierThresholds,
};
pub use policy::{DecisionBasis, MaintenanceTier};
pub use rules::{SubsystemScores, MAX_SCORE, MIN_SCORE};

use super::classifier::ClassifierLabel;
use super::reading::FeatureReading;
use policy::{decide_tier, reason, recommended_service};
use serde::{Deserialize, Serialize};

/// Stateless engine applying a scoring configuration and tier thresholds to readings.
///
/// This is the only place a maintenance tier is computed.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: EngineConfig,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, reading: &FeatureReading) -> SubsystemScores {
        rules::score_reading(reading, &self.config.scoring)
    }

    /// Fuses subsystem scores with the classifier verdict. `None` means the classifier was
    /// unavailable and the tier rests on the composite score alone.
    pub fn assess(
        &self,
        reading: &FeatureReading,
        classifier_label: Option<ClassifierLabel>,
        scores: &SubsystemScores,
    ) -> OverallAssessment {
        let composite_score = scores.composite();
        let tier = decide_tier(composite_score, classifier_label, &self.config.thresholds);
        let basis = match classifier_label {
            Some(_) => DecisionBasis::Fused,
            None => DecisionBasis::HeuristicOnly,
        };

        let subsystems = scores
            .iter()
            .map(|(subsystem, score)| SubsystemAssessment {
                subsystem,
                label: subsystem.label().to_string(),
                score,
                reason: reason(subsystem).to_string(),
                recommended_service: recommended_service(subsystem).to_string(),
                observation: self.observation(reading, subsystem),
            })
            .collect();

        OverallAssessment {
            composite_score,
            tier,
            headline: tier.headline().to_string(),
            classifier_label,
            basis,
            subsystems,
        }
    }

    /// Convenience wrapper: score and assess in one step.
    pub fn evaluate(
        &self,
        reading: &FeatureReading,
        classifier_label: Option<ClassifierLabel>,
    ) -> OverallAssessment {
        let scores = self.score(reading);
        self.assess(reading, classifier_label, &scores)
    }

    fn observation(&self, reading: &FeatureReading, subsystem: Subsystem) -> String {
        let field = subsystem.feature();
        let value = reading.value(field);
        match self.config.scoring.rule(subsystem) {
            ScoringRule::Deviation { ideal, .. } => format!(
                "{} reads {:.2} {} (ideal {:.2})",
                subsystem.label(),
                value,
                field.unit(),
                ideal
            ),
            ScoringRule::Linear { .. } => {
                format!("{} reads {:.2} {}", subsystem.label(), value, field.unit())
            }
        }
    }
}

/// Per-subsystem line of an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsystemAssessment {
    pub subsystem: Subsystem,
    pub label: String,
    pub score: f64,
    pub reason: String,
    pub recommended_service: String,
    pub observation: String,
}

/// Result of one prediction request. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallAssessment {
    pub composite_score: f64,
    pub tier: MaintenanceTier,
    pub headline: String,
    pub classifier_label: Option<ClassifierLabel>,
    pub basis: DecisionBasis,
    pub subsystems: Vec<SubsystemAssessment>,
}

impl OverallAssessment {
    pub fn subsystem(&self, subsystem: Subsystem) -> Option<&SubsystemAssessment> {
        self.subsystems
            .iter()
            .find(|entry| entry.subsystem == subsystem)
    }

    pub fn summary(&self) -> String {
        let signal = match self.basis {
            DecisionBasis::Fused => "classifier and heuristics",
            DecisionBasis::HeuristicOnly => "heuristics only, classifier unavailable",
        };
        format!(
            "{} (risk {:.2}, {})",
            self.headline, self.composite_score, signal
        )
    }
}
