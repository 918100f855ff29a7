//! Proof-of-work acquisition and verification.
//!
//! Work is always fetched from a remote service and always re-checked here
//! before it is signed into a block: `difficulty = u64_le(Blake2b-64(work_le ‖ hash))`
//! must reach the threshold, and the proof must belong to the frontier being extended.

use blake2::digest::consts::U8;
use blake2::{Blake2b, Digest};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::client::{Endpoint, RpcClient};
use crate::blockchain::types::{BlockHash, LedgerError, LedgerResult, RpcError};

/// Threshold for send and change blocks since epoch v2.
pub const DEFAULT_WORK_THRESHOLD: u64 = 0xfffffff800000000;

/// An 8-byte work nonce, rendered as 16 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkValue(pub u64);

impl FromStr for WorkValue {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 16 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(LedgerError::InvalidInput(format!("work '{}' is not 16 hex characters", s)));
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|e| LedgerError::InvalidInput(format!("work '{}': {}", s, e)))
    }
}

impl fmt::Display for WorkValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for WorkValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkValue({})", self)
    }
}

/// A work value together with the hash it was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkProof {
    pub input_hash: BlockHash,
    pub value: WorkValue,
}

/// Parse a work threshold such as `"fffffff800000000"`.
pub fn parse_threshold(s: &str) -> Result<u64, std::num::ParseIntError> {
    u64::from_str_radix(s.trim_start_matches("0x"), 16)
}

/// Difficulty reached by `work` for `hash`.
pub fn work_difficulty(hash: &BlockHash, work: WorkValue) -> u64 {
    let mut hasher = Blake2b::<U8>::new();
    hasher.update(work.0.to_le_bytes());
    hasher.update(hash.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest);
    u64::from_le_bytes(bytes)
}

/// Check `proof` against `frontier` and `threshold`.
pub fn verify_work(proof: &WorkProof, frontier: &BlockHash, threshold: u64) -> LedgerResult<()> {
    if proof.input_hash != *frontier {
        return Err(LedgerError::InvalidWork {
            reason: format!(
                "work was computed for {} but the frontier is {}",
                proof.input_hash, frontier
            ),
        });
    }

    let difficulty = work_difficulty(frontier, proof.value);
    if difficulty < threshold {
        return Err(LedgerError::InvalidWork {
            reason: format!(
                "difficulty {:016x} is below threshold {:016x}",
                difficulty, threshold
            ),
        });
    }
    Ok(())
}

/// Brute-force work on the CPU. Only practical for low thresholds
/// (development networks, tests); returns `None` after `max_attempts`.
pub fn solve_work(hash: &BlockHash, threshold: u64, max_attempts: u64) -> Option<WorkValue> {
    (0..max_attempts)
        .map(WorkValue)
        .find(|candidate| work_difficulty(hash, *candidate) >= threshold)
}

/// Requests work from the work service and verifies what comes back.
#[derive(Clone, Debug)]
pub struct WorkCoordinator {
    rpc: RpcClient,
    endpoint: Endpoint,
    timeout_duration: Duration,
    threshold: u64,
}

impl WorkCoordinator {
    pub fn new(rpc: RpcClient, endpoint: Endpoint, timeout_duration: Duration, threshold: u64) -> Self {
        Self {
            rpc,
            endpoint,
            timeout_duration,
            threshold,
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// `work_generate` for `frontier`.
    ///
    /// When the service echoes a `hash`, the proof records that hash so a
    /// mismatch is caught by [`WorkCoordinator::verify_work`].
    pub async fn request_work(&self, frontier: &BlockHash) -> LedgerResult<WorkProof> {
        let response = self
            .rpc
            .call(
                &self.endpoint,
                "work_generate",
                json!({ "hash": frontier.to_string() }),
                self.timeout_duration,
            )
            .await
            .map_err(LedgerError::WorkGeneration)?;

        let malformed = |message: String| {
            LedgerError::WorkGeneration(RpcError::Malformed {
                endpoint: self.endpoint.name().to_string(),
                message,
            })
        };

        let value = response
            .get("work")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("work_generate response has no work".to_string()))?
            .parse::<WorkValue>()
            .map_err(|e| malformed(e.to_string()))?;

        let input_hash = match response.get("hash").and_then(Value::as_str) {
            Some(echoed) => echoed.parse::<BlockHash>().map_err(|e| malformed(e.to_string()))?,
            None => *frontier,
        };

        Ok(WorkProof { input_hash, value })
    }

    pub fn verify_work(&self, proof: &WorkProof, frontier: &BlockHash) -> LedgerResult<()> {
        verify_work(proof, frontier, self.threshold)
    }
}
