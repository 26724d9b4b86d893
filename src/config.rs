use serde::{Deserialize, Serialize};

use crate::errors::{Result, ScheduleError};
use crate::logging::LogFormat;

/// engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// periods materialized per generation pass when a service doesn't set its own
    pub default_service_periods: u32,
    /// promote past-due pending installments when a loan detail is read
    pub promote_overdue_on_read: bool,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// default `EnvFilter` directive when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_service_periods: 12,
            promote_overdue_on_read: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl EngineConfig {
    /// parse from json; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json).map_err(|e| {
            ScheduleError::invalid_configuration(format!("engine config: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_service_periods == 0 {
            return Err(ScheduleError::invalid_configuration(
                "default service periods must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.default_service_periods, 12);
        assert!(config.promote_overdue_on_read);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(r#"{ "default_service_periods": 24 }"#).unwrap();
        assert_eq!(config.default_service_periods, 24);
        assert!(config.promote_overdue_on_read);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_from_json_logging() {
        let config = EngineConfig::from_json(
            r#"{ "logging": { "level": "obligation_schedule_rs=debug", "format": "Json" } }"#,
        )
        .unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "obligation_schedule_rs=debug");
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(EngineConfig::from_json(r#"{ "default_service_periods": 0 }"#).is_err());
        assert!(EngineConfig::from_json("not json").is_err());
    }
}
