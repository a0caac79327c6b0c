use serde::{Deserialize, Serialize};

use super::super::classifier::ClassifierLabel;
use super::config::{Subsystem, TierThresholds};

/// Maintenance urgency, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceTier {
    Ok,
    Soon,
    Urgent,
}

impl MaintenanceTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Soon => "soon",
            Self::Urgent => "urgent",
        }
    }

    pub const fn headline(self) -> &'static str {
        match self {
            Self::Ok => "No immediate maintenance required",
            Self::Soon => "Maintenance required soon",
            Self::Urgent => "Urgent maintenance required",
        }
    }
}

/// Which signals fed the tier decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionBasis {
    /// Classifier verdict combined with the heuristic composite.
    Fused,
    /// Classifier unavailable; composite score alone.
    HeuristicOnly,
}

/// Escalation order matters: `urgent` is checked last so it overrides `soon`.
pub(crate) fn decide_tier(
    composite_score: f64,
    label: Option<ClassifierLabel>,
    thresholds: &TierThresholds,
) -> MaintenanceTier {
    let mut tier = MaintenanceTier::Ok;

    if label == Some(ClassifierLabel::MaintenanceNeeded) || composite_score > thresholds.soon {
        tier = MaintenanceTier::Soon;
    }

    if let Some(urgent) = thresholds.urgent {
        if composite_score > urgent {
            tier = MaintenanceTier::Urgent;
        }
    }

    tier
}

pub(crate) const fn reason(subsystem: Subsystem) -> &'static str {
    match subsystem {
        Subsystem::Engine => "High temperature may cause wear and tear.",
        Subsystem::OilPressure => "Low oil pressure can damage moving parts.",
        Subsystem::Vibration => "Excess vibration suggests imbalance or engine issue.",
        Subsystem::Battery => "Voltage instability can affect electrical systems.",
        Subsystem::Mileage => "Higher mileage indicates natural wear of components.",
        Subsystem::FuelSystem => "Poor efficiency suggests fuel filter or injector issues.",
    }
}

pub(crate) const fn recommended_service(subsystem: Subsystem) -> &'static str {
    match subsystem {
        Subsystem::Engine => "Oil change, coolant check, spark plug inspection",
        Subsystem::OilPressure => "Oil filter replacement, pump inspection",
        Subsystem::Vibration => "Engine mount check, wheel alignment",
        Subsystem::Battery => "Terminal cleaning, voltage check",
        Subsystem::Mileage => "General inspection, replace worn-out parts",
        Subsystem::FuelSystem => "Injector cleaning, fuel filter check",
    }
}
