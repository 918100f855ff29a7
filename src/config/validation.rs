//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint URLs, timeouts and the work threshold
//! - Reject a malformed private key at startup rather than on first send
//!
//! Returns all validation errors, not just the first.

use std::fmt;
use std::net::SocketAddr;
use url::Url;

use crate::blockchain::amount::RawAmount;
use crate::blockchain::wallet::Wallet;
use crate::blockchain::work::parse_threshold;
use crate::config::schema::NanoConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &NanoConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.node.rpc_url.is_empty() {
        errors.push(ValidationError::new("node.rpc_url", "NANO_RPC_URL is required"));
    } else if let Err(e) = Url::parse(&config.node.rpc_url) {
        errors.push(ValidationError::new("node.rpc_url", format!("invalid URL: {}", e)));
    }

    if let Some(work_url) = config.node.work_url.as_deref().filter(|u| !u.is_empty()) {
        if let Err(e) = Url::parse(work_url) {
            errors.push(ValidationError::new("node.work_url", format!("invalid URL: {}", e)));
        }
    }

    if config.node.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("node.rpc_timeout_secs", "must be greater than 0"));
    }
    if config.node.work_timeout_secs == 0 {
        errors.push(ValidationError::new("node.work_timeout_secs", "must be greater than 0"));
    }

    if parse_threshold(&config.node.work_threshold).is_err() {
        errors.push(ValidationError::new(
            "node.work_threshold",
            format!("'{}' is not a 64-bit hex value", config.node.work_threshold),
        ));
    }

    if let Some(key) = config.wallet.private_key.as_deref() {
        if let Err(e) = Wallet::from_private_key(key) {
            errors.push(ValidationError::new("wallet.private_key", e.to_string()));
        }
    }

    match RawAmount::from_nano(&config.wallet.max_send_amount) {
        Ok(amount) if !amount.is_zero() => {}
        _ => errors.push(ValidationError::new(
            "wallet.max_send_amount",
            format!("'{}' is not a positive Nano amount", config.wallet.max_send_amount),
        )),
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("must be one of {}", LOG_LEVELS.join(", ")),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NanoConfig {
        let mut config = NanoConfig::default();
        config.node.rpc_url = "http://127.0.0.1:7076".to_string();
        config
    }

    #[test]
    fn test_defaults_with_rpc_url_are_valid() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn test_missing_rpc_url() {
        let errors = validate_config(&NanoConfig::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "node.rpc_url: NANO_RPC_URL is required");
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = valid();
        config.node.work_url = Some("not a url".to_string());
        config.node.rpc_timeout_secs = 0;
        config.node.work_threshold = "zz".to_string();
        config.wallet.private_key = Some("abc".to_string());
        config.wallet.max_send_amount = "0".to_string();

        let fields: Vec<_> = validate_config(&config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(
            fields,
            vec![
                "node.work_url",
                "node.rpc_timeout_secs",
                "node.work_threshold",
                "wallet.private_key",
                "wallet.max_send_amount",
            ]
        );
    }

    #[test]
    fn test_private_key_error_does_not_echo_key() {
        let mut config = valid();
        config.wallet.private_key = Some("deadbeef".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(!errors[0].message.contains("deadbeef"));
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = valid();
        config.observability.metrics_address = "nowhere".to_string();
        assert!(validate_config(&config).is_ok());
        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
