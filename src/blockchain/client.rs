//! Ledger node RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - POST one `{action, ...fields}` JSON body per call
//! - Enforce a deadline per call; on expiry the request future is dropped,
//!   which aborts the underlying connection
//! - Separate transport failures (status, body) from ledger-reported `error` fields
//! - Tag every failure with the endpoint's configuration key

use serde_json::{json, Map, Value};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use url::Url;

use crate::blockchain::address::NanoAddress;
use crate::blockchain::amount::RawAmount;
use crate::blockchain::block::JsonBlock;
use crate::blockchain::types::{BlockHash, RpcError};
use crate::observability::metrics;

/// Default deadline for ledger calls.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(60);

/// Default deadline for proof-of-work generation.
pub const DEFAULT_WORK_TIMEOUT: Duration = Duration::from_secs(300);

/// An RPC endpoint and the configuration key it was read from.
#[derive(Clone)]
pub struct Endpoint {
    name: String,
    url: Url,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
        }
    }

    pub fn parse(name: impl Into<String>, url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(name, url.parse()?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Debug for Endpoint {
    // The URL can carry an API key; only its host is shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("host", &self.url.host_str())
            .finish()
    }
}

/// Single request/response JSON RPC caller.
#[derive(Clone, Default)]
pub struct RpcClient {
    http: reqwest::Client,
}

impl RpcClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue `action` against `endpoint` with the given deadline.
    ///
    /// `payload` must be a JSON object (or null); its fields are merged next to `action`.
    pub async fn call(
        &self,
        endpoint: &Endpoint,
        action: &str,
        payload: Value,
        deadline: Duration,
    ) -> Result<Value, RpcError> {
        let mut body = Map::new();
        body.insert("action".to_string(), Value::String(action.to_string()));
        if let Value::Object(fields) = payload {
            body.extend(fields);
        }

        tracing::debug!(endpoint = %endpoint.name, action = action, "RPC call");
        let start = Instant::now();

        let result = match timeout(deadline, self.execute(endpoint, &body)).await {
            Ok(result) => result,
            Err(_) => Err(RpcError::Timeout {
                endpoint: endpoint.name.clone(),
                timeout_ms: deadline.as_millis() as u64,
            }),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => {
                tracing::warn!(endpoint = %endpoint.name, action = action, error = %e, "RPC call failed");
                e.kind().as_str()
            }
        };
        metrics::record_rpc_call(action, outcome, start);

        result
    }

    async fn execute(&self, endpoint: &Endpoint, body: &Map<String, Value>) -> Result<Value, RpcError> {
        let transport = |status: Option<u16>, body: String| RpcError::Transport {
            endpoint: endpoint.name.clone(),
            status,
            body,
        };

        let response = self
            .http
            .post(endpoint.url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| transport(None, e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(transport(Some(status.as_u16()), text));
        }

        let json: Value = serde_json::from_str(&text).map_err(|e| RpcError::Malformed {
            endpoint: endpoint.name.clone(),
            message: e.to_string(),
        })?;

        if let Some(error) = json.get("error") {
            let message = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(RpcError::Rpc {
                endpoint: endpoint.name.clone(),
                message,
            });
        }

        Ok(json)
    }
}

/// Snapshot of `account_info` with the fields the send pipeline uses.
#[derive(Debug, Clone)]
pub struct AccountInfo {
    pub balance: RawAmount,
    /// `None` for an account that has never received funds.
    pub frontier: Option<BlockHash>,
    pub representative: Option<NanoAddress>,
    /// The full node response.
    pub raw: Value,
}

impl AccountInfo {
    pub fn from_response(endpoint: &Endpoint, raw: Value) -> Result<Self, RpcError> {
        let malformed = |message: String| RpcError::Malformed {
            endpoint: endpoint.name.clone(),
            message,
        };

        let balance = raw
            .get("balance")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("account_info response has no balance".to_string()))?
            .parse::<RawAmount>()
            .map_err(|e| malformed(e.to_string()))?;

        let frontier = match raw.get("frontier").and_then(Value::as_str) {
            None | Some("") => None,
            Some(hash) => Some(hash.parse::<BlockHash>().map_err(|e| malformed(e.to_string()))?),
        };

        let representative = match raw.get("representative").and_then(Value::as_str) {
            None | Some("") => None,
            Some(address) => Some(
                address
                    .parse::<NanoAddress>()
                    .map_err(|e| malformed(e.to_string()))?,
            ),
        };

        Ok(Self {
            balance,
            frontier,
            representative,
            raw,
        })
    }
}

/// Client for the primary ledger node.
#[derive(Clone, Debug)]
pub struct NodeClient {
    rpc: RpcClient,
    endpoint: Endpoint,
    timeout_duration: Duration,
}

impl NodeClient {
    pub fn new(rpc: RpcClient, endpoint: Endpoint, timeout_duration: Duration) -> Self {
        Self {
            rpc,
            endpoint,
            timeout_duration,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// `account_info` with the representative flag set.
    pub async fn account_info(&self, account: &NanoAddress) -> Result<AccountInfo, RpcError> {
        let raw = self
            .rpc
            .call(
                &self.endpoint,
                "account_info",
                json!({ "account": account.to_string(), "representative": "true" }),
                self.timeout_duration,
            )
            .await?;
        AccountInfo::from_response(&self.endpoint, raw)
    }

    /// `block_info` in JSON block form; the response is passed through untouched.
    pub async fn block_info(&self, hash: &BlockHash) -> Result<Value, RpcError> {
        self.rpc
            .call(
                &self.endpoint,
                "block_info",
                json!({ "json_block": "true", "hash": hash.to_string() }),
                self.timeout_duration,
            )
            .await
    }

    /// Submit a signed send block via `process`.
    pub async fn process_send(&self, block: &JsonBlock) -> Result<Value, RpcError> {
        let block = serde_json::to_value(block).map_err(|e| RpcError::Malformed {
            endpoint: self.endpoint.name.clone(),
            message: format!("could not encode block: {}", e),
        })?;
        self.rpc
            .call(
                &self.endpoint,
                "process",
                json!({ "json_block": "true", "subtype": "send", "block": block }),
                self.timeout_duration,
            )
            .await
    }
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient").finish_non_exhaustive()
    }
}
