use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::logger::{
    error::LoggerResult,
    object::{LoggerFormat, LoggerLevel, LoggerTimeZone},
};

pub const ENV_LOG_FORMAT: &str = "MCTL_LOG_FORMAT";
pub const ENV_LOG_LEVEL: &str = "MCTL_LOG_LEVEL";
pub const ENV_LOG_TZ: &str = "MCTL_LOG_TZ";

/// Logger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// Filter expression, e.g. `info` or `mctl_core=debug,info`.
    pub level: LoggerLevel,
    pub tz: LoggerTimeZone,
    /// Include event targets (module paths).
    pub with_targets: bool,
    /// Color text output; only honored when stdout is a terminal.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            tz: LoggerTimeZone::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    /// Defaults overlaid with `MCTL_LOG_FORMAT`, `MCTL_LOG_LEVEL` and `MCTL_LOG_TZ`.
    pub fn from_env() -> LoggerResult<Self> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Override fields from variables returned by `lookup`; blank values are ignored.
    pub fn overlay<F>(mut self, lookup: F) -> LoggerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(format) = var(ENV_LOG_FORMAT) {
            self.format = format.parse()?;
        }
        if let Some(level) = var(ENV_LOG_LEVEL) {
            self.level = level.parse()?;
        }
        if let Some(tz) = var(ENV_LOG_TZ) {
            self.tz = tz.parse()?;
        }
        Ok(self)
    }

    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LoggerError;

    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: LoggerConfig = serde_json::from_str(r#"{"format": "json"}"#).unwrap();
        assert_eq!(config.format, LoggerFormat::Json);
        assert_eq!(config.level.as_str(), "info");
        assert_eq!(config.tz, LoggerTimeZone::Utc);
        assert!(config.with_targets);
    }

    #[test]
    fn environment_overrides_fields() {
        let config = LoggerConfig::default()
            .overlay(env(&[
                (ENV_LOG_FORMAT, "json"),
                (ENV_LOG_LEVEL, "mctl_core=debug,info"),
                (ENV_LOG_TZ, "local"),
            ]))
            .unwrap();

        assert_eq!(config.format, LoggerFormat::Json);
        assert_eq!(config.level.as_str(), "mctl_core=debug,info");
        assert_eq!(config.tz, LoggerTimeZone::Local);
    }

    #[test]
    fn blank_variables_are_ignored() {
        let config = LoggerConfig::default()
            .overlay(env(&[(ENV_LOG_LEVEL, "  ")]))
            .unwrap();
        assert_eq!(config, LoggerConfig::default());
    }

    #[test]
    fn invalid_variable_is_an_error() {
        let err = LoggerConfig::default()
            .overlay(env(&[(ENV_LOG_TZ, "mars")]))
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidTimeZone(_)));
    }
}
