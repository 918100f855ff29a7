//! Wallet tools.
//!
//! # Tools
//! - `nano_send`: run the send pipeline from the configured account
//! - `nano_account_info`: account state for any address
//! - `nano_my_account_info`: account state for the configured account
//! - `block_info`: a block by hash
//!
//! Every tool returns a [`ToolResponse`]; failures never escape as errors.

pub mod response;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::blockchain::address::parse_address;
use crate::blockchain::amount::RawAmount;
use crate::blockchain::client::{Endpoint, NodeClient, RpcClient};
use crate::blockchain::send::{SendLimits, SendPipeline, SendRequest};
use crate::blockchain::types::{BlockHash, ErrorKind, LedgerError, LedgerResult};
use crate::blockchain::wallet::Wallet;
use crate::blockchain::work::{parse_threshold, WorkCoordinator};
use crate::config::schema::NanoConfig;
use crate::observability::metrics;

pub use response::{ToolContent, ToolMetadata, ToolResponse, INTERNAL_ERROR, INVALID_PARAMS};

pub const NANO_SEND: &str = "nano_send";
pub const NANO_ACCOUNT_INFO: &str = "nano_account_info";
pub const NANO_MY_ACCOUNT_INFO: &str = "nano_my_account_info";
pub const BLOCK_INFO: &str = "block_info";

/// Tool name, description and JSON input schema, as listed by `GET /tools`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: NANO_SEND,
            description: "Send Nano from the configured account to a destination address",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "destination_address": { "type": "string", "description": "Nano address to send to" },
                    "amount": { "type": "string", "description": "Amount in Nano (not raw)" }
                },
                "required": ["destination_address", "amount"]
            }),
        },
        ToolDefinition {
            name: NANO_ACCOUNT_INFO,
            description: "Balance (Nano and raw), representative and frontier of a Nano account",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "address": { "type": "string", "description": "Nano address to look up" }
                },
                "required": ["address"]
            }),
        },
        ToolDefinition {
            name: NANO_MY_ACCOUNT_INFO,
            description: "Balance (Nano and raw), representative and frontier of the account used for sending",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolDefinition {
            name: BLOCK_INFO,
            description: "Details of a block by hash, with amount and balance in Nano and raw",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "hash": { "type": "string", "description": "64-character block hash" }
                },
                "required": ["hash"]
            }),
        },
    ]
}

/// `amount` may arrive as a JSON string or number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AmountArg {
    Text(String),
    Number(serde_json::Number),
}

impl AmountArg {
    /// Decimal text for the pipeline. Numbers serde renders in exponent form are refused.
    fn into_decimal(self) -> LedgerResult<String> {
        match self {
            AmountArg::Text(text) => Ok(text),
            AmountArg::Number(number) => {
                let text = number.to_string();
                if text.contains(['e', 'E']) {
                    return Err(LedgerError::Validation(format!(
                        "Amount must be a decimal string, got {}",
                        text
                    )));
                }
                Ok(text)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendArgs {
    destination_address: String,
    amount: AmountArg,
}

#[derive(Debug, Deserialize)]
struct AccountInfoArgs {
    address: String,
}

#[derive(Debug, Deserialize)]
struct BlockInfoArgs {
    hash: String,
}

fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> LedgerResult<T> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| LedgerError::Validation(format!("Invalid arguments: {}", e)))
}

/// `"<nano> in nano units or <raw> in raw units"`, or the input unchanged if it is not a raw amount.
fn friendly_amount(raw: &Value) -> Value {
    match raw.as_str().map(RawAmount::from_raw_str) {
        Some(Ok(amount)) => Value::String(amount.friendly()),
        _ => raw.clone(),
    }
}

/// The four wallet tools over one node connection.
#[derive(Clone, Debug)]
pub struct NanoTools {
    node: NodeClient,
    pipeline: SendPipeline,
    wallet: Option<Wallet>,
}

impl NanoTools {
    pub fn new(node: NodeClient, pipeline: SendPipeline, wallet: Option<Wallet>) -> Self {
        Self {
            node,
            pipeline,
            wallet,
        }
    }

    /// Wire clients, pipeline and wallet from validated configuration.
    pub fn from_config(config: &NanoConfig) -> LedgerResult<Self> {
        let invalid = |key: &str, e: &dyn std::fmt::Display| {
            LedgerError::Configuration(format!("{} is not valid: {}", key, e))
        };

        let rpc = RpcClient::new();
        let node_endpoint = Endpoint::parse("NANO_RPC_URL", &config.node.rpc_url)
            .map_err(|e| invalid("NANO_RPC_URL", &e))?;
        let (work_key, work_url) = config.node.work_endpoint();
        let work_endpoint = Endpoint::parse(work_key, work_url).map_err(|e| invalid(work_key, &e))?;
        let threshold = parse_threshold(&config.node.work_threshold)
            .map_err(|e| invalid("NANO_WORK_THRESHOLD", &e))?;
        let limits = SendLimits::from_nano(&config.wallet.max_send_amount)
            .map_err(|e| invalid("NANO_MAX_SEND_AMOUNT", &e))?;
        let wallet = config
            .wallet
            .private_key
            .as_deref()
            .map(Wallet::from_private_key)
            .transpose()?;

        let node = NodeClient::new(
            rpc.clone(),
            node_endpoint,
            Duration::from_secs(config.node.rpc_timeout_secs),
        );
        let work = WorkCoordinator::new(
            rpc,
            work_endpoint,
            Duration::from_secs(config.node.work_timeout_secs),
            threshold,
        );

        match &wallet {
            Some(wallet) => tracing::info!(address = %wallet.address(), "Signing account loaded"),
            None => tracing::warn!("NANO_PRIVATE_KEY not set, send and my-account tools are disabled"),
        }

        Ok(Self::new(node.clone(), SendPipeline::new(node, work, limits), wallet))
    }

    pub fn pipeline(&self) -> &SendPipeline {
        &self.pipeline
    }

    pub fn wallet(&self) -> Option<&Wallet> {
        self.wallet.as_ref()
    }

    fn require_wallet(&self) -> LedgerResult<&Wallet> {
        self.wallet
            .as_ref()
            .ok_or_else(|| LedgerError::Configuration("NANO_PRIVATE_KEY is required".to_string()))
    }

    /// Dispatch a tool call by name.
    pub async fn call(&self, name: &str, args: Value) -> ToolResponse {
        let (tool, response) = match name {
            NANO_SEND => (NANO_SEND, self.nano_send(args).await),
            NANO_ACCOUNT_INFO => (NANO_ACCOUNT_INFO, self.nano_account_info(args).await),
            NANO_MY_ACCOUNT_INFO => (NANO_MY_ACCOUNT_INFO, self.nano_my_account_info().await),
            BLOCK_INFO => (BLOCK_INFO, self.block_info(args).await),
            other => {
                return ToolResponse::error(ErrorKind::Validation, format!("Unknown tool: {}", other));
            }
        };

        let outcome = response.error_kind.map(|kind| kind.as_str()).unwrap_or("ok");
        metrics::record_tool_call(tool, outcome);
        response
    }

    pub async fn nano_send(&self, args: Value) -> ToolResponse {
        let wallet = match self.require_wallet() {
            Ok(wallet) => wallet,
            Err(e) => return e.into(),
        };
        let args: SendArgs = match parse_args(args) {
            Ok(args) => args,
            Err(e) => return e.into(),
        };
        let amount = match args.amount.into_decimal() {
            Ok(amount) => amount,
            Err(e) => return e.into(),
        };
        let request = SendRequest {
            destination_address: args.destination_address,
            amount,
        };

        match self.pipeline.send(wallet, &request).await {
            Ok(receipt) => match serde_json::to_string(&receipt) {
                Ok(text) => ToolResponse::text(text),
                Err(e) => ToolResponse::error(ErrorKind::InvalidInput, e),
            },
            Err(failure) => {
                tracing::error!(tool = NANO_SEND, error = %failure, "Tool failed");
                failure.into()
            }
        }
    }

    pub async fn nano_account_info(&self, args: Value) -> ToolResponse {
        let result = async {
            let args: AccountInfoArgs = parse_args(args)?;
            let address = parse_address(&args.address, "Nano address is not valid")?;
            let info = self.node.account_info(&address).await?;
            Ok::<_, LedgerError>((args.address, info.raw))
        }
        .await;

        match result {
            Ok((address, raw)) => account_text(&address, raw),
            Err(e) => {
                tracing::error!(tool = NANO_ACCOUNT_INFO, error = %e, "Tool failed");
                e.into()
            }
        }
    }

    pub async fn nano_my_account_info(&self) -> ToolResponse {
        let result = async {
            let address = self.require_wallet()?.address();
            let info = self.node.account_info(&address).await?;
            Ok::<_, LedgerError>((address.to_string(), info.raw))
        }
        .await;

        match result {
            Ok((address, raw)) => account_text(&address, raw),
            Err(e) => {
                tracing::error!(tool = NANO_MY_ACCOUNT_INFO, error = %e, "Tool failed");
                e.into()
            }
        }
    }

    pub async fn block_info(&self, args: Value) -> ToolResponse {
        let result = async {
            let args: BlockInfoArgs = parse_args(args)?;
            let hash: BlockHash = args
                .hash
                .parse()
                .map_err(|_| LedgerError::Validation("Block hash is not valid".to_string()))?;
            let raw = self.node.block_info(&hash).await?;
            Ok::<_, LedgerError>((args.hash, raw))
        }
        .await;

        match result {
            Ok((hash, mut raw)) => {
                if let Value::Object(fields) = &mut raw {
                    for key in ["amount", "balance"] {
                        let rendered = match fields.get(key) {
                            Some(value) if !value.is_null() => friendly_amount(value),
                            _ => Value::String("N/A".to_string()),
                        };
                        fields.insert(key.to_string(), rendered);
                    }
                }
                ToolResponse::text(format!("The block information for hash {} is {}", hash, raw))
            }
            Err(e) => {
                tracing::error!(tool = BLOCK_INFO, error = %e, "Tool failed");
                e.into()
            }
        }
    }
}

fn account_text(address: &str, mut raw: Value) -> ToolResponse {
    if let Some(balance) = raw.get_mut("balance") {
        *balance = friendly_amount(balance);
    }
    ToolResponse::text(format!("The account information for {} is {}", address, raw))
}
