use std::str::FromStr;

use crate::error::config::ConfigError;

pub const DEFAULT_ESI_URL: &str = "https://esi.evetech.net/latest";
pub const DEFAULT_HISTORY_URL: &str = "https://zkillboard.com/api/history";

pub struct Config {
    pub database_url: String,
    pub valkey_url: String,
    pub esi_url: String,
    pub user_agent: String,
    pub history_url: String,
    /// Publish notifications for killmails above the value threshold
    pub notifier_enabled: bool,
    /// Notification threshold in millions of ISK
    pub notifier_value_threshold: f64,
    /// Fetch attempts before a killmail reference is moved to the dead-letter set
    pub max_fetch_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            valkey_url: required("VALKEY_URL")?,
            esi_url: optional("ESI_URL", DEFAULT_ESI_URL.to_string())?,
            user_agent: required("ESI_USER_AGENT")?,
            history_url: optional("HISTORY_URL", DEFAULT_HISTORY_URL.to_string())?,
            notifier_enabled: optional("NOTIFIER_ENABLED", false)?,
            notifier_value_threshold: optional("NOTIFIER_VALUE_THRESHOLD", 10_000.0)?,
            max_fetch_attempts: optional("IMPORTER_MAX_FETCH_ATTEMPTS", 5)?,
        })
    }
}

fn required(var: &str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
}

fn optional<T>(var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(value) => value.parse().map_err(|e: T::Err| ConfigError::InvalidEnvValue {
            var: var.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_uses_default_when_unset() {
        let value: u32 = optional("WRECKAGE_TEST_UNSET_VARIABLE", 7).unwrap();

        assert_eq!(value, 7);
    }

    #[test]
    fn required_reports_missing_variable() {
        let result = required("WRECKAGE_TEST_UNSET_VARIABLE");

        assert!(matches!(result, Err(ConfigError::MissingEnvVar(var)) if var == "WRECKAGE_TEST_UNSET_VARIABLE"));
    }
}
