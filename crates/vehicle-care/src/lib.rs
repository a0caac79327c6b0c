//! Vehicle maintenance risk assessment.
//!
//! Sensor readings are validated into a [`assessment::FeatureReading`], scored per subsystem,
//! fused with an optional pre-trained classifier verdict and turned into a tiered maintenance
//! recommendation by [`assessment::DecisionEngine`].

pub mod assessment;
pub mod config;
pub mod error;
pub mod telemetry;
