use std::collections::HashMap;
use std::hash::BuildHasher;

use serde::{Deserialize, Serialize};

/// Number of sensor inputs every reading carries.
pub const FEATURE_COUNT: usize = 6;

/// Canonical sensor inputs, in the order the classifier expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureField {
    EngineTemperature,
    OilPressure,
    VibrationLevel,
    BatteryVoltage,
    Mileage,
    FuelEfficiency,
}

impl FeatureField {
    pub const fn ordered() -> [Self; FEATURE_COUNT] {
        [
            Self::EngineTemperature,
            Self::OilPressure,
            Self::VibrationLevel,
            Self::BatteryVoltage,
            Self::Mileage,
            Self::FuelEfficiency,
        ]
    }

    /// Storage and wire key. The only spelling accepted on input.
    pub const fn key(self) -> &'static str {
        match self {
            Self::EngineTemperature => "engine_temperature",
            Self::OilPressure => "oil_pressure",
            Self::VibrationLevel => "vibration_level",
            Self::BatteryVoltage => "battery_voltage",
            Self::Mileage => "mileage",
            Self::FuelEfficiency => "fuel_efficiency",
        }
    }

    /// Presentation label; never parsed.
    pub const fn label(self) -> &'static str {
        match self {
            Self::EngineTemperature => "Engine Temperature (°C)",
            Self::OilPressure => "Oil Pressure (bar)",
            Self::VibrationLevel => "Vibration Level (Hz)",
            Self::BatteryVoltage => "Battery Voltage (V)",
            Self::Mileage => "Mileage (km)",
            Self::FuelEfficiency => "Fuel Efficiency (km/l)",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::EngineTemperature => "°C",
            Self::OilPressure => "bar",
            Self::VibrationLevel => "Hz",
            Self::BatteryVoltage => "V",
            Self::Mileage => "km",
            Self::FuelEfficiency => "km/l",
        }
    }

    /// Physically plausible bounds. Values outside are accepted but worth flagging.
    pub const fn plausible_range(self) -> (f64, f64) {
        match self {
            Self::EngineTemperature => (-40.0, 200.0),
            Self::OilPressure => (0.0, 10.0),
            Self::VibrationLevel => (0.0, 100.0),
            Self::BatteryVoltage => (0.0, 16.0),
            Self::Mileage => (0.0, 1_000_000.0),
            Self::FuelEfficiency => (0.0, 50.0),
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ordered().into_iter().find(|field| field.key() == key)
    }

    const fn index(self) -> usize {
        match self {
            Self::EngineTemperature => 0,
            Self::OilPressure => 1,
            Self::VibrationLevel => 2,
            Self::BatteryVoltage => 3,
            Self::Mileage => 4,
            Self::FuelEfficiency => 5,
        }
    }
}

/// Raised when raw input cannot become a [`FeatureReading`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field '{}'", .field.key())]
    MissingField { field: FeatureField },
    #[error("field '{}' is not a finite number: '{value}'", .field.key())]
    NonNumeric { field: FeatureField, value: String },
}

impl ValidationError {
    pub fn field(&self) -> FeatureField {
        match self {
            ValidationError::MissingField { field } | ValidationError::NonNumeric { field, .. } => {
                *field
            }
        }
    }
}

/// Validated, immutable snapshot of the six sensor inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureReading {
    engine_temperature: f64,
    oil_pressure: f64,
    vibration_level: f64,
    battery_voltage: f64,
    mileage: f64,
    fuel_efficiency: f64,
}

impl FeatureReading {
    /// Parses string-keyed raw input. Fields are checked in canonical order and the first
    /// failure wins; keys outside the canonical set are ignored.
    pub fn from_raw<S: BuildHasher>(
        raw: &HashMap<String, String, S>,
    ) -> Result<Self, ValidationError> {
        Self::parse_with(|key| raw.get(key).map(String::as_str))
    }

    /// Builds a reading from already-numeric values in canonical order.
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Result<Self, ValidationError> {
        for field in FeatureField::ordered() {
            let value = values[field.index()];
            if !value.is_finite() {
                return Err(ValidationError::NonNumeric {
                    field,
                    value: value.to_string(),
                });
            }
        }

        let [
            engine_temperature,
            oil_pressure,
            vibration_level,
            battery_voltage,
            mileage,
            fuel_efficiency,
        ] = values;
        Ok(Self {
            engine_temperature,
            oil_pressure,
            vibration_level,
            battery_voltage,
            mileage,
            fuel_efficiency,
        })
    }

    fn parse_with<'a, F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let mut values = [0.0; FEATURE_COUNT];
        for field in FeatureField::ordered() {
            let raw = lookup(field.key()).ok_or(ValidationError::MissingField { field })?;
            values[field.index()] = parse_finite(field, raw)?;
        }
        Self::from_values(values)
    }

    pub fn engine_temperature(&self) -> f64 {
        self.engine_temperature
    }

    pub fn oil_pressure(&self) -> f64 {
        self.oil_pressure
    }

    pub fn vibration_level(&self) -> f64 {
        self.vibration_level
    }

    pub fn battery_voltage(&self) -> f64 {
        self.battery_voltage
    }

    pub fn mileage(&self) -> f64 {
        self.mileage
    }

    pub fn fuel_efficiency(&self) -> f64 {
        self.fuel_efficiency
    }

    pub fn value(&self, field: FeatureField) -> f64 {
        self.values()[field.index()]
    }

    /// Values in canonical field order.
    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        [
            self.engine_temperature,
            self.oil_pressure,
            self.vibration_level,
            self.battery_voltage,
            self.mileage,
            self.fuel_efficiency,
        ]
    }

    /// Fields whose value falls outside [`FeatureField::plausible_range`].
    pub fn implausible_fields(&self) -> Vec<FeatureField> {
        FeatureField::ordered()
            .into_iter()
            .filter(|field| {
                let (low, high) = field.plausible_range();
                let value = self.value(*field);
                value < low || value > high
            })
            .collect()
    }
}

fn parse_finite(field: FeatureField, raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField { field });
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::NonNumeric {
            field,
            value: raw.to_string(),
        }),
    }
}
