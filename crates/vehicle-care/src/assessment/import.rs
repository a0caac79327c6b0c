use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use super::history::{OwnerId, VehicleId};
use super::reading::FeatureField;

/// One CSV row: identifiers plus the raw, unvalidated sensor fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedReading {
    pub line: u64,
    pub vehicle_id: VehicleId,
    pub owner_id: Option<OwnerId>,
    pub fields: HashMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReadingImportError {
    #[error("failed to read reading export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid reading CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("reading CSV is missing the '{0}' column")]
    MissingColumn(&'static str),
    #[error("row {line} has an empty vehicle_id")]
    MissingVehicle { line: u64 },
}

/// Parses exported sensor logs into raw field maps for the maintenance service.
///
/// Validation of the sensor values is left to the service so every row yields its own
/// outcome. Empty cells are dropped and therefore surface as missing fields.
pub struct ReadingCsvImporter;

impl ReadingCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ImportedReading>, ReadingImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ImportedReading>, ReadingImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let vehicle_column = headers
            .iter()
            .position(|header| header == "vehicle_id")
            .ok_or(ReadingImportError::MissingColumn("vehicle_id"))?;
        let owner_column = headers.iter().position(|header| header == "owner_id");
        let feature_columns: Vec<(usize, FeatureField)> = headers
            .iter()
            .enumerate()
            .filter_map(|(index, header)| {
                FeatureField::from_key(header).map(|field| (index, field))
            })
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|pos| pos.line()).unwrap_or_default();

            let vehicle = record.get(vehicle_column).unwrap_or_default();
            if vehicle.is_empty() {
                return Err(ReadingImportError::MissingVehicle { line });
            }
            let owner_id = owner_column
                .and_then(|column| record.get(column))
                .filter(|value| !value.is_empty())
                .map(|value| OwnerId(value.to_string()));

            let fields = feature_columns
                .iter()
                .filter_map(|(index, field)| {
                    record
                        .get(*index)
                        .filter(|value| !value.is_empty())
                        .map(|value| (field.key().to_string(), value.to_string()))
                })
                .collect();

            rows.push(ImportedReading {
                line,
                vehicle_id: VehicleId(vehicle.to_string()),
                owner_id,
                fields,
            });
        }

        Ok(rows)
    }
}
