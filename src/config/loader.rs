//! Configuration loading from disk and the environment.
//!
//! Precedence: environment variables, then the TOML file, then defaults.

use std::fs;
use std::path::Path;

use crate::config::schema::NanoConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
    Missing(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            ConfigError::Missing(key) => write!(f, "{} is required", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load a TOML file, apply environment overrides and validate.
pub fn load_config(path: &Path) -> Result<NanoConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config = parse_config(&content)?;
    finish(config, |key| std::env::var(key).ok())
}

/// Build configuration from defaults and environment variables only.
pub fn load_from_env() -> Result<NanoConfig, ConfigError> {
    finish(NanoConfig::default(), |key| std::env::var(key).ok())
}

pub fn parse_config(content: &str) -> Result<NanoConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}

/// Apply overrides, require the node URL, then validate.
pub fn finish<F>(mut config: NanoConfig, lookup: F) -> Result<NanoConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config, lookup);

    if config.node.rpc_url.is_empty() {
        return Err(ConfigError::Missing("NANO_RPC_URL"));
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay `NANO_*` variables onto `config`. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut NanoConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = get("NANO_RPC_URL") {
        config.node.rpc_url = url;
    }
    if let Some(url) = get("NANO_WORK_GENERATION_URL") {
        config.node.work_url = Some(url);
    }
    if let Some(threshold) = get("NANO_WORK_THRESHOLD") {
        config.node.work_threshold = threshold;
    }
    if let Some(key) = get("NANO_PRIVATE_KEY") {
        config.wallet.private_key = Some(key);
    }
    if let Some(amount) = get("NANO_MAX_SEND_AMOUNT") {
        config.wallet.max_send_amount = amount;
    }
    if let Some(addr) = get("NANO_BIND_ADDRESS") {
        config.server.bind_address = addr;
    }
}
