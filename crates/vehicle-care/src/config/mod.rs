use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::assessment::{
    ClassifierAdapter, ConfigurationError, EngineConfig, JsonArtifactLoader,
    ModelUnavailableError, ScoringPreset, TierThresholds,
};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scoring: ScoringSettings,
    pub model: ModelSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let preset = match env::var("SCORING_PRESET") {
            Ok(value) => {
                ScoringPreset::from_name(&value).ok_or(ConfigError::InvalidPreset { value })?
            }
            Err(_) => ScoringPreset::default(),
        };
        let soon_threshold = optional_number("SOON_THRESHOLD")?;
        let urgent_threshold = match env::var("URGENT_THRESHOLD") {
            Ok(value) if value.trim().eq_ignore_ascii_case("none") => Some(None),
            Ok(value) => Some(Some(parse_number("URGENT_THRESHOLD", &value)?)),
            Err(_) => None,
        };

        let scaler_path = optional_path("MODEL_SCALER_PATH");
        let classifier_path = optional_path("MODEL_CLASSIFIER_PATH");
        match (&scaler_path, &classifier_path) {
            (Some(_), None) => {
                return Err(ConfigError::IncompleteModel {
                    missing: "MODEL_CLASSIFIER_PATH",
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::IncompleteModel {
                    missing: "MODEL_SCALER_PATH",
                })
            }
            _ => {}
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scoring: ScoringSettings {
                preset,
                config_path: optional_path("SCORING_CONFIG_PATH"),
                soon_threshold,
                urgent_threshold,
            },
            model: ModelSettings {
                scaler_path,
                classifier_path,
                require_classifier: flag("REQUIRE_CLASSIFIER")?,
            },
        })
    }
}

fn optional_path(var: &str) -> Option<PathBuf> {
    env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

fn optional_number(var: &'static str) -> Result<Option<f64>, ConfigError> {
    env::var(var)
        .ok()
        .map(|value| parse_number(var, &value))
        .transpose()
}

fn parse_number(var: &'static str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or(ConfigError::InvalidNumber { var })
}

fn flag(var: &'static str) -> Result<bool, ConfigError> {
    match env::var(var) {
        Err(_) => Ok(false),
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "" | "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidFlag { var }),
        },
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the scoring coefficients and tier thresholds come from.
#[derive(Debug, Clone, Default)]
pub struct ScoringSettings {
    pub preset: ScoringPreset,
    /// JSON rule file; takes precedence over `preset`.
    pub config_path: Option<PathBuf>,
    pub soon_threshold: Option<f64>,
    /// `Some(None)` disables the urgent tier.
    pub urgent_threshold: Option<Option<f64>>,
}

impl ScoringSettings {
    /// Resolves the engine configuration. Called once at startup.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigurationError> {
        let base = match &self.config_path {
            Some(path) => EngineConfig::from_path(path)?,
            None => EngineConfig::preset(self.preset),
        };

        let thresholds = TierThresholds::new(
            self.soon_threshold.unwrap_or(base.thresholds.soon),
            self.urgent_threshold.unwrap_or(base.thresholds.urgent),
        )?;

        EngineConfig::new(base.scoring, thresholds)
    }
}

/// Locations of the exported scaler and classifier artifacts.
#[derive(Debug, Clone, Default)]
pub struct ModelSettings {
    pub scaler_path: Option<PathBuf>,
    pub classifier_path: Option<PathBuf>,
    pub require_classifier: bool,
}

impl ModelSettings {
    /// Builds the adapter without loading; call [`ClassifierAdapter::initialize`] at startup.
    pub fn classifier(&self) -> ClassifierAdapter {
        match (&self.scaler_path, &self.classifier_path) {
            (Some(scaler), Some(model)) => {
                ClassifierAdapter::new(JsonArtifactLoader::new(scaler, model))
            }
            _ => ClassifierAdapter::unavailable(ModelUnavailableError::NotConfigured),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPreset { value: String },
    InvalidNumber { var: &'static str },
    InvalidFlag { var: &'static str },
    IncompleteModel { missing: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPreset { value } => write!(
                f,
                "SCORING_PRESET must be 'standard' or 'legacy', got '{}'",
                value
            ),
            ConfigError::InvalidNumber { var } => write!(f, "{} must be a finite number", var),
            ConfigError::InvalidFlag { var } => write!(f, "{} must be true or false", var),
            ConfigError::IncompleteModel { missing } => write!(
                f,
                "MODEL_SCALER_PATH and MODEL_CLASSIFIER_PATH must be set together; {} is missing",
                missing
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidPreset { .. }
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidFlag { .. }
            | ConfigError::IncompleteModel { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "SCORING_PRESET",
            "SCORING_CONFIG_PATH",
            "SOON_THRESHOLD",
            "URGENT_THRESHOLD",
            "MODEL_SCALER_PATH",
            "MODEL_CLASSIFIER_PATH",
            "REQUIRE_CLASSIFIER",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.scoring.preset, ScoringPreset::Standard);
        assert!(!config.model.require_classifier);
        assert_eq!(
            config.scoring.engine_config().expect("engine config"),
            EngineConfig::standard()
        );
        assert!(!config.model.classifier().is_available());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn threshold_overrides_apply_to_preset() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCORING_PRESET", "legacy");
        env::set_var("SOON_THRESHOLD", "40");
        env::set_var("URGENT_THRESHOLD", "70");
        env::set_var("REQUIRE_CLASSIFIER", "yes");

        let config = AppConfig::load().expect("config loads");
        let engine = config.scoring.engine_config().expect("engine config");

        assert_eq!(engine.scoring, EngineConfig::legacy().scoring);
        assert_eq!(engine.thresholds.soon, 40.0);
        assert_eq!(engine.thresholds.urgent, Some(70.0));
        assert!(config.model.require_classifier);
        reset_env();
    }

    #[test]
    fn urgent_tier_can_be_disabled() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("URGENT_THRESHOLD", "none");

        let config = AppConfig::load().expect("config loads");
        let engine = config.scoring.engine_config().expect("engine config");

        assert_eq!(engine.thresholds.urgent, None);
        assert_eq!(engine.thresholds.soon, 50.0);
        reset_env();
    }

    #[test]
    fn inverted_thresholds_fail_at_startup() {
        let settings = ScoringSettings {
            soon_threshold: Some(80.0),
            ..ScoringSettings::default()
        };

        assert!(matches!(
            settings.engine_config(),
            Err(ConfigurationError::ThresholdOrder { .. })
        ));
    }

    #[test]
    fn rejects_unknown_preset_and_bad_numbers() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCORING_PRESET", "turbo");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidPreset { .. })
        ));

        reset_env();
        env::set_var("SOON_THRESHOLD", "fifty");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                var: "SOON_THRESHOLD"
            })
        ));
        reset_env();
    }

    #[test]
    fn model_paths_must_be_configured_together() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MODEL_SCALER_PATH", "/srv/models/scaler.json");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::IncompleteModel {
                missing: "MODEL_CLASSIFIER_PATH"
            })
        ));

        reset_env();
        env::set_var("MODEL_CLASSIFIER_PATH", "/srv/models/classifier.json");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::IncompleteModel {
                missing: "MODEL_SCALER_PATH"
            })
        ));

        env::set_var("MODEL_SCALER_PATH", "/srv/models/scaler.json");
        let config = AppConfig::load().expect("config loads with both paths");
        assert!(config.model.scaler_path.is_some());
        assert!(config.model.classifier_path.is_some());
        reset_env();
    }

    #[test]
    fn missing_scoring_file_is_reported() {
        let settings = ScoringSettings {
            config_path: Some(PathBuf::from("/nonexistent/vehicle-care/scoring.json")),
            ..ScoringSettings::default()
        };

        assert!(matches!(
            settings.engine_config(),
            Err(ConfigurationError::Unreadable { .. })
        ));
    }
}
