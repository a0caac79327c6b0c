use super::common::*;
use crate::assessment::classifier::ClassifierLabel;
use crate::assessment::scoring::{
    DecisionBasis, DecisionEngine, EngineConfig, MaintenanceTier, Subsystem,
};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[test]
fn ideal_reading_without_alarm_is_ok() {
    let engine = standard_engine();
    let reading = reading(IDEAL);

    let assessment = engine.evaluate(&reading, Some(ClassifierLabel::NoMaintenance));

    assert!(assessment.subsystems.iter().all(|entry| entry.score == 0.0));
    assert_eq!(assessment.composite_score, 0.0);
    assert_eq!(assessment.tier, MaintenanceTier::Ok);
    assert_eq!(assessment.basis, DecisionBasis::Fused);
    assert_eq!(
        assessment.classifier_label,
        Some(ClassifierLabel::NoMaintenance)
    );
}

#[test]
fn degraded_reading_is_urgent() {
    let engine = standard_engine();

    let assessment = engine.evaluate(&reading(DEGRADED), Some(ClassifierLabel::NoMaintenance));

    assert!(assessment.composite_score > 75.0);
    assert!((assessment.composite_score - 82.0).abs() < 1e-9);
    assert_eq!(assessment.tier, MaintenanceTier::Urgent);
    let vibration = assessment
        .subsystem(Subsystem::Vibration)
        .expect("vibration scored");
    assert_eq!(vibration.score, 100.0);
}

#[test]
fn classifier_alarm_lifts_ideal_reading_to_soon() {
    let engine = standard_engine();

    let assessment = engine.evaluate(&reading(IDEAL), Some(ClassifierLabel::MaintenanceNeeded));

    assert!(assessment.composite_score.abs() < 1e-9);
    assert_eq!(assessment.tier, MaintenanceTier::Soon);
}

#[test]
fn heuristic_only_assessment_is_marked() {
    let engine = standard_engine();

    let calm = engine.evaluate(&reading(IDEAL), None);
    let degraded = engine.evaluate(&reading(DEGRADED), None);

    assert_eq!(calm.basis, DecisionBasis::HeuristicOnly);
    assert_eq!(calm.classifier_label, None);
    assert_eq!(calm.tier, MaintenanceTier::Ok);
    assert_eq!(degraded.tier, MaintenanceTier::Urgent);
    assert!(degraded.summary().contains("classifier unavailable"));
}

#[test]
fn legacy_coefficients_reproduce_single_level_policy() {
    let engine = DecisionEngine::new(EngineConfig::legacy());

    let quiet = engine.evaluate(&reading(DEGRADED), Some(ClassifierLabel::NoMaintenance));
    let flagged = engine.evaluate(&reading(DEGRADED), Some(ClassifierLabel::MaintenanceNeeded));

    assert!((quiet.composite_score - 49.5).abs() < 1e-9);
    assert_eq!(quiet.tier, MaintenanceTier::Ok);
    assert_eq!(flagged.tier, MaintenanceTier::Soon);
    let vibration = quiet
        .subsystem(Subsystem::Vibration)
        .expect("vibration scored");
    assert_eq!(vibration.score, 20.0);
}

#[test]
fn scores_stay_within_bounds_for_extreme_readings() {
    let samples = [
        -1.0e12, -5_000.0, -1.0, 0.0, 0.5, 3.5, 12.6, 90.0, 250.0, 1.0e6, 1.0e300,
    ];
    for config in [EngineConfig::standard(), EngineConfig::legacy()] {
        let engine = DecisionEngine::new(config);
        for value in samples {
            for position in 0..6 {
                let mut values = IDEAL;
                values[position] = value;
                let scores = engine.score(&reading(values));
                for (subsystem, score) in scores.iter() {
                    assert!(
                        (0.0..=100.0).contains(&score),
                        "{subsystem:?} scored {score} for {values:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn composite_equals_rounded_mean_of_subsystems() {
    let engine = standard_engine();
    let readings = [
        IDEAL,
        DEGRADED,
        [97.3, 2.9, 1.7, 12.2, 73_450.0, 13.1],
        [88.1, 3.6, 0.3, 12.7, 1_250.0, 16.4],
        [120.0, 0.4, 4.4, 11.1, 310_000.0, 7.9],
    ];

    for values in readings {
        let reading = reading(values);
        let assessment = engine.evaluate(&reading, None);
        let sum: f64 = assessment.subsystems.iter().map(|entry| entry.score).sum();

        assert_eq!(assessment.subsystems.len(), 6);
        assert_eq!(assessment.composite_score, round2(sum / 6.0));
        assert_eq!(assessment.composite_score, engine.score(&reading).composite());
    }
}

#[test]
fn classifier_alarm_never_yields_ok() {
    let engine = standard_engine();
    for values in [IDEAL, DEGRADED, [91.0, 3.4, 0.2, 12.5, 500.0, 14.8]] {
        let assessment =
            engine.evaluate(&reading(values), Some(ClassifierLabel::MaintenanceNeeded));
        assert!(assessment.tier >= MaintenanceTier::Soon);
    }
}

#[test]
fn assessment_carries_advice_for_every_subsystem() {
    let engine = standard_engine();

    let assessment = engine.evaluate(&reading(DEGRADED), None);

    let subsystems: Vec<Subsystem> = assessment
        .subsystems
        .iter()
        .map(|entry| entry.subsystem)
        .collect();
    assert_eq!(subsystems, Subsystem::ordered().to_vec());
    for entry in &assessment.subsystems {
        assert!(!entry.reason.is_empty());
        assert!(!entry.recommended_service.is_empty());
        assert_eq!(entry.label, entry.subsystem.label());
    }
    let engine_line = assessment
        .subsystem(Subsystem::Engine)
        .expect("engine scored");
    assert_eq!(engine_line.observation, "Engine reads 150.00 °C (ideal 90.00)");
}

#[test]
fn assessment_serializes_field_names_verbatim() {
    let engine = standard_engine();
    let assessment = engine.evaluate(&reading(IDEAL), Some(ClassifierLabel::MaintenanceNeeded));

    let value = serde_json::to_value(&assessment).expect("serialize assessment");

    assert_eq!(value["tier"], "soon");
    assert_eq!(value["classifier_label"], 1);
    assert_eq!(value["basis"], "fused");
    assert_eq!(value["subsystems"][5]["subsystem"], "fuel_system");
    assert_eq!(value["headline"], "Maintenance required soon");
}
