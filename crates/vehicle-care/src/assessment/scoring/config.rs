use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::super::reading::FeatureField;

/// Monitored vehicle aspects. Each one is scored from exactly one sensor input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    Engine,
    OilPressure,
    Vibration,
    Battery,
    Mileage,
    FuelSystem,
}

impl Subsystem {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Engine,
            Self::OilPressure,
            Self::Vibration,
            Self::Battery,
            Self::Mileage,
            Self::FuelSystem,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Engine => "engine",
            Self::OilPressure => "oil_pressure",
            Self::Vibration => "vibration",
            Self::Battery => "battery",
            Self::Mileage => "mileage",
            Self::FuelSystem => "fuel_system",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Engine => "Engine",
            Self::OilPressure => "Oil Pressure",
            Self::Vibration => "Vibration",
            Self::Battery => "Battery",
            Self::Mileage => "Mileage",
            Self::FuelSystem => "Fuel System",
        }
    }

    pub const fn feature(self) -> FeatureField {
        match self {
            Self::Engine => FeatureField::EngineTemperature,
            Self::OilPressure => FeatureField::OilPressure,
            Self::Vibration => FeatureField::VibrationLevel,
            Self::Battery => FeatureField::BatteryVoltage,
            Self::Mileage => FeatureField::Mileage,
            Self::FuelSystem => FeatureField::FuelEfficiency,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ordered().into_iter().find(|subsystem| subsystem.key() == key)
    }
}

/// Heuristic formula applied to a single sensor value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "formula", rename_all = "snake_case")]
pub enum ScoringRule {
    /// `|value - ideal| * weight`
    Deviation { ideal: f64, weight: f64 },
    /// `value / denominator * weight`, denominator defaulting to 1.
    Linear {
        weight: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        denominator: Option<f64>,
    },
}

impl ScoringRule {
    fn validate(&self, subsystem: Subsystem) -> Result<(), ConfigurationError> {
        let weight = match self {
            ScoringRule::Deviation { ideal, weight } => {
                if !ideal.is_finite() {
                    return Err(ConfigurationError::InvalidIdeal {
                        subsystem: subsystem.key(),
                        ideal: *ideal,
                    });
                }
                *weight
            }
            ScoringRule::Linear {
                weight,
                denominator,
            } => {
                if let Some(denominator) = denominator {
                    if !(denominator.is_finite() && *denominator > 0.0) {
                        return Err(ConfigurationError::NonPositiveDenominator {
                            subsystem: subsystem.key(),
                            denominator: *denominator,
                        });
                    }
                }
                *weight
            }
        };

        if !(weight.is_finite() && weight >= 0.0) {
            return Err(ConfigurationError::InvalidWeight {
                subsystem: subsystem.key(),
                weight,
            });
        }

        Ok(())
    }
}

/// Validated rule set covering every subsystem exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringConfig {
    rules: BTreeMap<Subsystem, ScoringRule>,
}

impl ScoringConfig {
    pub fn new(rules: BTreeMap<Subsystem, ScoringRule>) -> Result<Self, ConfigurationError> {
        for subsystem in Subsystem::ordered() {
            let rule = rules
                .get(&subsystem)
                .ok_or(ConfigurationError::MissingSubsystem(subsystem.key()))?;
            rule.validate(subsystem)?;
        }
        Ok(Self { rules })
    }

    /// Accepts string keys as they appear in configuration files.
    pub fn from_keyed(rules: BTreeMap<String, ScoringRule>) -> Result<Self, ConfigurationError> {
        let mut typed = BTreeMap::new();
        for (key, rule) in rules {
            let subsystem =
                Subsystem::from_key(&key).ok_or(ConfigurationError::UnknownSubsystem(key))?;
            typed.insert(subsystem, rule);
        }
        Self::new(typed)
    }

    pub fn rule(&self, subsystem: Subsystem) -> &ScoringRule {
        // Construction guarantees every subsystem has a rule.
        &self.rules[&subsystem]
    }

    pub fn rules(&self) -> impl Iterator<Item = (Subsystem, &ScoringRule)> {
        self.rules.iter().map(|(subsystem, rule)| (*subsystem, rule))
    }
}

/// Composite score limits separating the maintenance tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub soon: f64,
    #[serde(default)]
    pub urgent: Option<f64>,
}

impl TierThresholds {
    pub fn new(soon: f64, urgent: Option<f64>) -> Result<Self, ConfigurationError> {
        let thresholds = Self { soon, urgent };
        thresholds.validate()?;
        Ok(thresholds)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.soon.is_finite() {
            return Err(ConfigurationError::InvalidThreshold {
                name: "soon",
                value: self.soon,
            });
        }
        if let Some(urgent) = self.urgent {
            if !urgent.is_finite() {
                return Err(ConfigurationError::InvalidThreshold {
                    name: "urgent",
                    value: urgent,
                });
            }
            if urgent <= self.soon {
                return Err(ConfigurationError::ThresholdOrder {
                    soon: self.soon,
                    urgent,
                });
            }
        }
        Ok(())
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            soon: 50.0,
            urgent: Some(75.0),
        }
    }
}

/// Rules plus thresholds: everything the decision engine needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub thresholds: TierThresholds,
}

#[derive(Debug, Deserialize)]
struct EngineConfigFile {
    rules: BTreeMap<String, ScoringRule>,
    #[serde(default)]
    thresholds: TierThresholds,
}

impl EngineConfig {
    pub fn new(
        scoring: ScoringConfig,
        thresholds: TierThresholds,
    ) -> Result<Self, ConfigurationError> {
        thresholds.validate()?;
        Ok(Self {
            scoring,
            thresholds,
        })
    }

    /// Current coefficients with the two-level escalation at 50 / 75.
    pub fn standard() -> Self {
        Self::from_preset_rules(
            [
                (Subsystem::Engine, deviation(90.0, 1.2)),
                (Subsystem::OilPressure, deviation(3.5, 30.0)),
                (Subsystem::Vibration, linear(20.0, None)),
                (Subsystem::Battery, deviation(12.6, 25.0)),
                (Subsystem::Mileage, linear(100.0, Some(200_000.0))),
                (Subsystem::FuelSystem, deviation(15.0, 8.0)),
            ],
            TierThresholds::default(),
        )
    }

    /// First-generation coefficients with a single escalation level at 60.
    pub fn legacy() -> Self {
        Self::from_preset_rules(
            [
                (Subsystem::Engine, deviation(90.0, 1.2)),
                (Subsystem::OilPressure, deviation(3.0, 15.0)),
                (Subsystem::Vibration, linear(2.0, None)),
                (Subsystem::Battery, deviation(12.5, 10.0)),
                (Subsystem::Mileage, linear(100.0, Some(200_000.0))),
                (Subsystem::FuelSystem, deviation(15.0, 5.0)),
            ],
            TierThresholds {
                soon: 60.0,
                urgent: None,
            },
        )
    }

    pub fn preset(preset: ScoringPreset) -> Self {
        match preset {
            ScoringPreset::Standard => Self::standard(),
            ScoringPreset::Legacy => Self::legacy(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigurationError> {
        let file: EngineConfigFile =
            serde_json::from_str(raw).map_err(|source| ConfigurationError::Malformed {
                detail: source.to_string(),
            })?;
        let scoring = ScoringConfig::from_keyed(file.rules)?;
        Self::new(scoring, file.thresholds)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let raw =
            std::fs::read_to_string(path).map_err(|source| ConfigurationError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json_str(&raw)
    }

    fn from_preset_rules(rules: [(Subsystem, ScoringRule); 6], thresholds: TierThresholds) -> Self {
        Self {
            scoring: ScoringConfig {
                rules: rules.into_iter().collect(),
            },
            thresholds,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Named coefficient sets shipped with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPreset {
    #[default]
    Standard,
    Legacy,
}

impl ScoringPreset {
    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" | "current" => Some(Self::Standard),
            "legacy" | "v1" => Some(Self::Legacy),
            _ => None,
        }
    }
}

const fn deviation(ideal: f64, weight: f64) -> ScoringRule {
    ScoringRule::Deviation { ideal, weight }
}

const fn linear(weight: f64, denominator: Option<f64>) -> ScoringRule {
    ScoringRule::Linear {
        weight,
        denominator,
    }
}

/// Malformed scoring configuration. Surfaces at startup only.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("unknown subsystem key '{0}'")]
    UnknownSubsystem(String),
    #[error("no scoring rule configured for subsystem '{0}'")]
    MissingSubsystem(&'static str),
    #[error("weight for '{subsystem}' must be finite and non-negative, got {weight}")]
    InvalidWeight { subsystem: &'static str, weight: f64 },
    #[error("ideal value for '{subsystem}' must be finite, got {ideal}")]
    InvalidIdeal { subsystem: &'static str, ideal: f64 },
    #[error("denominator for '{subsystem}' must be positive, got {denominator}")]
    NonPositiveDenominator {
        subsystem: &'static str,
        denominator: f64,
    },
    #[error("{name} threshold must be finite, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
    #[error("urgent threshold {urgent} must exceed soon threshold {soon}")]
    ThresholdOrder { soon: f64, urgent: f64 },
    #[error("malformed scoring configuration: {detail}")]
    Malformed { detail: String },
    #[error("cannot read scoring configuration {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_cover_every_subsystem() {
        for config in [EngineConfig::standard(), EngineConfig::legacy()] {
            let rebuilt = ScoringConfig::new(config.scoring.rules.clone()).expect("preset valid");
            assert_eq!(rebuilt.rules().count(), 6);
            config.thresholds.validate().expect("preset thresholds valid");
        }
    }

    #[test]
    fn json_config_round_trips_rules() {
        let raw = r#"{
            "rules": {
                "engine": { "formula": "deviation", "ideal": 90, "weight": 1.2 },
                "oil_pressure": { "formula": "deviation", "ideal": 3.0, "weight": 15 },
                "vibration": { "formula": "linear", "weight": 2 },
                "battery": { "formula": "deviation", "ideal": 12.5, "weight": 10 },
                "mileage": { "formula": "linear", "weight": 100, "denominator": 200000 },
                "fuel_system": { "formula": "deviation", "ideal": 15, "weight": 5 }
            },
            "thresholds": { "soon": 60 }
        }"#;

        let config = EngineConfig::from_json_str(raw).expect("config parses");

        assert_eq!(config, EngineConfig::legacy());
    }

    #[test]
    fn json_config_defaults_thresholds_when_omitted() {
        let mut rules = serde_json::Map::new();
        for (subsystem, rule) in EngineConfig::standard().scoring.rules() {
            rules.insert(
                subsystem.key().to_string(),
                serde_json::to_value(rule).expect("rule serializes"),
            );
        }
        let raw = serde_json::json!({ "rules": rules }).to_string();

        let config = EngineConfig::from_json_str(&raw).expect("config parses");

        assert_eq!(config.thresholds, TierThresholds::default());
    }

    #[test]
    fn rejects_unknown_subsystem_key() {
        let mut rules: BTreeMap<String, ScoringRule> = EngineConfig::standard()
            .scoring
            .rules()
            .map(|(subsystem, rule)| (subsystem.key().to_string(), *rule))
            .collect();
        rules.insert("transmission".to_string(), deviation(1.0, 1.0));

        match ScoringConfig::from_keyed(rules) {
            Err(ConfigurationError::UnknownSubsystem(key)) => assert_eq!(key, "transmission"),
            other => panic!("expected unknown subsystem error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_subsystem() {
        let mut rules = EngineConfig::standard().scoring.rules;
        rules.remove(&Subsystem::Battery);

        match ScoringConfig::new(rules) {
            Err(ConfigurationError::MissingSubsystem(key)) => assert_eq!(key, "battery"),
            other => panic!("expected missing subsystem error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_positive_denominator() {
        let mut rules = EngineConfig::standard().scoring.rules;
        rules.insert(Subsystem::Mileage, linear(100.0, Some(0.0)));

        assert!(matches!(
            ScoringConfig::new(rules),
            Err(ConfigurationError::NonPositiveDenominator { subsystem: "mileage", .. })
        ));
    }

    #[test]
    fn rejects_negative_weight() {
        let mut rules = EngineConfig::standard().scoring.rules;
        rules.insert(Subsystem::Engine, deviation(90.0, -1.0));

        assert!(matches!(
            ScoringConfig::new(rules),
            Err(ConfigurationError::InvalidWeight { subsystem: "engine", .. })
        ));
    }

    #[test]
    fn rejects_urgent_threshold_below_soon() {
        assert!(matches!(
            TierThresholds::new(70.0, Some(40.0)),
            Err(ConfigurationError::ThresholdOrder { .. })
        ));
        assert!(TierThresholds::new(60.0, None).is_ok());
    }

    #[test]
    fn preset_names_parse() {
        assert_eq!(ScoringPreset::from_name("Legacy"), Some(ScoringPreset::Legacy));
        assert_eq!(ScoringPreset::from_name(" standard "), Some(ScoringPreset::Standard));
        assert_eq!(ScoringPreset::from_name("experimental"), None);
    }
}
