use crate::infra::build_service;
use clap::Args;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use vehicle_care::assessment::{
    FeatureField, HistoryStore, ImportedReading, MaintenanceService, MaintenanceTier,
    OverallAssessment, OwnerId, ReadingCsvImporter, StorageOutcome, VehicleId,
};
use vehicle_care::config::AppConfig;
use vehicle_care::error::AppError;

const UNASSIGNED_OWNER: &str = "unassigned";

#[derive(Args, Debug, Default)]
pub(crate) struct AssessArgs {
    /// Engine temperature in °C
    #[arg(long)]
    pub(crate) engine_temperature: Option<String>,
    /// Oil pressure in bar
    #[arg(long)]
    pub(crate) oil_pressure: Option<String>,
    /// Vibration level in Hz
    #[arg(long)]
    pub(crate) vibration_level: Option<String>,
    /// Battery voltage in volts
    #[arg(long)]
    pub(crate) battery_voltage: Option<String>,
    /// Odometer reading in km
    #[arg(long)]
    pub(crate) mileage: Option<String>,
    /// Fuel efficiency in km/l
    #[arg(long)]
    pub(crate) fuel_efficiency: Option<String>,
    /// Record the assessment against this vehicle
    #[arg(long)]
    pub(crate) vehicle_id: Option<String>,
    /// Owner recorded alongside the vehicle
    #[arg(long)]
    pub(crate) owner_id: Option<String>,
}

impl AssessArgs {
    fn raw_fields(&self) -> HashMap<String, String> {
        [
            (FeatureField::EngineTemperature, &self.engine_temperature),
            (FeatureField::OilPressure, &self.oil_pressure),
            (FeatureField::VibrationLevel, &self.vibration_level),
            (FeatureField::BatteryVoltage, &self.battery_voltage),
            (FeatureField::Mileage, &self.mileage),
            (FeatureField::FuelEfficiency, &self.fuel_efficiency),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.clone().map(|value| (field.key().to_string(), value)))
        .collect()
    }
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV export with a vehicle_id column and one column per sensor field
    #[arg(long)]
    pub(crate) csv: PathBuf,
}

pub(crate) fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let (service, _) = build_service(&config)?;
    let raw = args.raw_fields();

    match args.vehicle_id {
        Some(vehicle_id) => {
            let owner = args
                .owner_id
                .unwrap_or_else(|| UNASSIGNED_OWNER.to_string());
            let recorded =
                service.evaluate_and_record(&raw, VehicleId(vehicle_id), OwnerId(owner))?;
            print!("{}", format_assessment(&recorded.assessment));
            println!("{}", recording_notice(&recorded.record.vehicle_id));
        }
        None => {
            let assessment = service.evaluate(&raw)?;
            print!("{}", format_assessment(&assessment));
        }
    }

    Ok(())
}

/// `assess` runs without a long-lived store, so nothing outlives the command.
fn recording_notice(vehicle_id: &VehicleId) -> String {
    format!(
        "History for {} is kept in memory only and is not persisted after this command",
        vehicle_id
    )
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let (service, _) = build_service(&config)?;
    let rows = ReadingCsvImporter::from_path(&args.csv)?;

    println!("Assessing {} readings from {}", rows.len(), args.csv.display());
    let summary = assess_rows(service.as_ref(), rows);
    print!("{}", summary.render());
    Ok(())
}

/// Tally of one batch run.
#[derive(Debug, Default)]
pub(crate) struct BatchSummary {
    pub(crate) tiers: BTreeMap<MaintenanceTier, usize>,
    pub(crate) rejected: Vec<(u64, String)>,
    pub(crate) unsaved: usize,
}

impl BatchSummary {
    fn render(&self) -> String {
        let mut out = String::from("\nBatch summary\n");
        for tier in [
            MaintenanceTier::Ok,
            MaintenanceTier::Soon,
            MaintenanceTier::Urgent,
        ] {
            let count = self.tiers.get(&tier).copied().unwrap_or(0);
            out.push_str(&format!("  {:<7}{}\n", tier.label(), count));
        }
        if self.unsaved > 0 {
            out.push_str(&format!("  {} assessments were not saved to history\n", self.unsaved));
        }
        for (line, reason) in &self.rejected {
            out.push_str(&format!("  row {} rejected: {}\n", line, reason));
        }
        out
    }
}

pub(crate) fn assess_rows<S>(
    service: &MaintenanceService<S>,
    rows: Vec<ImportedReading>,
) -> BatchSummary
where
    S: HistoryStore + 'static,
{
    let mut summary = BatchSummary::default();
    for row in rows {
        let owner = row
            .owner_id
            .unwrap_or_else(|| OwnerId(UNASSIGNED_OWNER.to_string()));
        match service.evaluate_and_record(&row.fields, row.vehicle_id.clone(), owner) {
            Ok(recorded) => {
                println!(
                    "{} (row {}): {}",
                    row.vehicle_id,
                    row.line,
                    recorded.assessment.summary()
                );
                *summary.tiers.entry(recorded.assessment.tier).or_default() += 1;
                if matches!(recorded.storage, StorageOutcome::Failed { .. }) {
                    summary.unsaved += 1;
                }
            }
            Err(err) => summary.rejected.push((row.line, err.to_string())),
        }
    }
    summary
}

pub(crate) fn format_assessment(assessment: &OverallAssessment) -> String {
    let mut out = format!("{}\n", assessment.summary());
    for entry in &assessment.subsystems {
        out.push_str(&format!(
            "  {:<14}{:>7.2}  {}\n",
            entry.label, entry.score, entry.observation
        ));
    }

    let attention: Vec<_> = assessment
        .subsystems
        .iter()
        .filter(|entry| entry.score > 0.0)
        .collect();
    if !attention.is_empty() {
        out.push_str("Recommended service:\n");
        for entry in attention {
            out.push_str(&format!(
                "  - {}: {} ({})\n",
                entry.label, entry.recommended_service, entry.reason
            ));
        }
    }
    out
}
