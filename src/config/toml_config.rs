use crate::core::reveal::{RevealSettings, DEFAULT_REVEAL_TICKS, DEFAULT_TICK_INTERVAL};
use crate::core::store::DEFAULT_SESSION_KEY;
use crate::utils::error::{RaffleError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_range, validate_storage_key, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_POOL_SIZE: u32 = 10;
pub const MAX_POOL_SIZE: u32 = 1_000_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RaffleConfig {
    pub pool: PoolConfig,
    pub reveal: RevealConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Offered at the pool size prompt.
    pub default_size: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_POOL_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub ticks: u32,
    pub tick_interval_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            ticks: DEFAULT_REVEAL_TICKS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: String,
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: "./.raffle".to_string(),
            key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "compact".to_string(),
        }
    }
}

impl RaffleConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RaffleError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RaffleError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value. Unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RaffleError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_positive_number("pool.default_size", u64::from(self.pool.default_size), 1)?;
        validate_range("pool.default_size", self.pool.default_size, 1, MAX_POOL_SIZE)?;
        validate_range("reveal.ticks", self.reveal.ticks, 1, 500)?;
        validate_range("reveal.tick_interval_ms", self.reveal.tick_interval_ms, 1, 5000)?;
        validate_path("storage.dir", &self.storage.dir)?;
        validate_storage_key("storage.key", &self.storage.key)?;
        self.log_format()?;
        Ok(())
    }

    pub fn reveal_settings(&self) -> RevealSettings {
        RevealSettings {
            ticks: self.reveal.ticks,
            tick_interval: Duration::from_millis(self.reveal.tick_interval_ms),
        }
    }

    pub fn log_format(&self) -> Result<LogFormat> {
        self.logging
            .format
            .parse()
            .map_err(|reason| RaffleError::InvalidConfigValueError {
                field: "logging.format".to_string(),
                value: self.logging.format.clone(),
                reason,
            })
    }
}

impl Validate for RaffleConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RaffleConfig::from_toml_str("").unwrap();
        assert_eq!(config.pool.default_size, 10);
        assert_eq!(config.reveal_settings(), RevealSettings::default());
        assert_eq!(config.storage.key, "raffle-session");
        assert_eq!(config.log_format().unwrap(), LogFormat::Compact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[pool]
default_size = 75

[reveal]
ticks = 15
tick_interval_ms = 40

[storage]
dir = "/var/lib/raffle"
key = "bingo-night"

[logging]
format = "json"
"#;

        let config = RaffleConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.pool.default_size, 75);
        assert_eq!(config.reveal_settings().ticks, 15);
        assert_eq!(
            config.reveal_settings().total_duration(),
            Duration::from_millis(600)
        );
        assert_eq!(config.storage.dir, "/var/lib/raffle");
        assert_eq!(config.log_format().unwrap(), LogFormat::Json);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("RAFFLE_TEST_STORAGE_DIR", "/tmp/raffle-env");

        let toml_content = r#"
[storage]
dir = "${RAFFLE_TEST_STORAGE_DIR}"
key = "${RAFFLE_TEST_UNSET_VARIABLE}"
"#;

        let config = RaffleConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.storage.dir, "/tmp/raffle-env");
        assert_eq!(config.storage.key, "${RAFFLE_TEST_UNSET_VARIABLE}");
        assert!(config.validate().is_err());

        std::env::remove_var("RAFFLE_TEST_STORAGE_DIR");
    }

    #[test]
    fn test_config_validation() {
        let config = RaffleConfig::from_toml_str("[reveal]\nticks = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = RaffleConfig::from_toml_str("[pool]\ndefault_size = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = RaffleConfig::from_toml_str("[logging]\nformat = \"pretty\"\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(RaffleError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            RaffleConfig::from_toml_str("[pool\ndefault_size = "),
            Err(RaffleError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[pool]\ndefault_size = 30\n")
            .unwrap();

        let config = RaffleConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.pool.default_size, 30);
    }
}
