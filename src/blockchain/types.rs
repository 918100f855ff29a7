//! Ledger-specific types and error definitions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::blockchain::amount::RawAmount;

/// A 32-byte block hash, rendered as 64 uppercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHash(pub [u8; 32]);

impl BlockHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for BlockHash {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(LedgerError::InvalidInput(format!(
                "block hash must be 64 hex characters, got {}",
                s.len()
            )));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| LedgerError::InvalidInput(format!("invalid block hash: {}", e)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self)
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Classification attached to every failure surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Validation,
    InvalidKey,
    Conversion,
    InvalidInput,
    UnopenedAccount,
    InsufficientBalance,
    WorkGeneration,
    InvalidWork,
    Timeout,
    Transport,
    Rpc,
    Submission,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Validation => "validation",
            ErrorKind::InvalidKey => "invalid_key",
            ErrorKind::Conversion => "conversion",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::UnopenedAccount => "unopened_account",
            ErrorKind::InsufficientBalance => "insufficient_balance",
            ErrorKind::WorkGeneration => "work_generation",
            ErrorKind::InvalidWork => "invalid_work",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Transport => "transport",
            ErrorKind::Rpc => "rpc",
            ErrorKind::Submission => "submission",
        }
    }

    /// True for failures caused by the caller's input rather than the ledger or network.
    pub fn is_invalid_params(&self) -> bool {
        matches!(
            self,
            ErrorKind::Validation
                | ErrorKind::InvalidKey
                | ErrorKind::Conversion
                | ErrorKind::InvalidInput
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by a single RPC round trip.
///
/// `endpoint` is the configuration key naming the endpoint, never its URL.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Deadline elapsed; the in-flight request was dropped.
    #[error("[{endpoint}] RPC timeout after {timeout_ms} ms")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// Connection failure or non-success HTTP status.
    #[error("[{endpoint}] {}", transport_message(.status, .body))]
    Transport {
        endpoint: String,
        status: Option<u16>,
        body: String,
    },

    /// The node answered with an `error` field.
    #[error("[{endpoint}] RPC Error: {message}")]
    Rpc { endpoint: String, message: String },

    /// Success status but a body that is not the expected JSON shape.
    #[error("[{endpoint}] malformed response: {message}")]
    Malformed { endpoint: String, message: String },
}

fn transport_message(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(code) => format!("HTTP {}: {}", code, body),
        None => format!("transport error: {}", body),
    }
}

impl RpcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RpcError::Timeout { .. } => ErrorKind::Timeout,
            RpcError::Transport { .. } => ErrorKind::Transport,
            RpcError::Rpc { .. } => ErrorKind::Rpc,
            RpcError::Malformed { .. } => ErrorKind::Transport,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            RpcError::Timeout { endpoint, .. }
            | RpcError::Transport { endpoint, .. }
            | RpcError::Rpc { endpoint, .. }
            | RpcError::Malformed { endpoint, .. } => endpoint,
        }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Request rejected before any network access.
    #[error("{0}")]
    Validation(String),

    /// Private key missing, malformed, or not controlling the account.
    #[error("{0}")]
    InvalidKey(String),

    /// Malformed numeric input for amount conversion.
    #[error("Amount conversion failed: {0}")]
    Conversion(String),

    /// Malformed block-building input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Source account {address} has no frontier (unopened account)")]
    UnopenedAccount { address: String },

    #[error("Insufficient balance to perform Nano send transaction: balance {balance} raw, requested {requested} raw")]
    InsufficientBalance {
        balance: RawAmount,
        requested: RawAmount,
    },

    #[error("Work generation failed: {0}")]
    WorkGeneration(#[source] RpcError),

    #[error("Computed Proof-of-Work for Nano transaction is not valid: {reason}")]
    InvalidWork { reason: String },

    #[error("Block submission failed: {0}")]
    Submission(#[source] RpcError),

    /// RPC failure outside the work and submission stages.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// Required configuration absent at call time (e.g. no private key).
    #[error("{0}")]
    Configuration(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::InvalidKey(_) => ErrorKind::InvalidKey,
            LedgerError::Conversion(_) => ErrorKind::Conversion,
            LedgerError::InvalidInput(_) => ErrorKind::InvalidInput,
            LedgerError::UnopenedAccount { .. } => ErrorKind::UnopenedAccount,
            LedgerError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            LedgerError::WorkGeneration(_) => ErrorKind::WorkGeneration,
            LedgerError::InvalidWork { .. } => ErrorKind::InvalidWork,
            LedgerError::Submission(_) => ErrorKind::Submission,
            LedgerError::Rpc(e) => e.kind(),
            LedgerError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// The underlying RPC failure, if this error came from the network.
    pub fn rpc_cause(&self) -> Option<&RpcError> {
        match self {
            LedgerError::WorkGeneration(e) | LedgerError::Submission(e) | LedgerError::Rpc(e) => {
                Some(e)
            }
            _ => None,
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
