//! The send pipeline.
//!
//! ```text
//! Validating → FetchingAccount → ComputingAmounts → RequestingWork
//!     → VerifyingWork → BuildingBlock → Submitting → Completed
//! ```
//!
//! Every step depends on the previous one, so a run is strictly sequential.
//! Nothing is retried here; a failure reports the stage it happened in and
//! the caller decides whether to run the whole pipeline again.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::address::{parse_address, NanoAddress};
use crate::blockchain::amount::RawAmount;
use crate::blockchain::block::StateBlockBuilder;
use crate::blockchain::client::NodeClient;
use crate::blockchain::locks::AccountLocks;
use crate::blockchain::types::{BlockHash, ErrorKind, LedgerError, LedgerResult, RpcError};
use crate::blockchain::wallet::Wallet;
use crate::blockchain::work::WorkCoordinator;
use crate::observability::metrics;

/// Node error text for an account with no blocks.
const ACCOUNT_NOT_FOUND: &str = "Account not found";

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendStage {
    Validating,
    FetchingAccount,
    ComputingAmounts,
    RequestingWork,
    VerifyingWork,
    BuildingBlock,
    Submitting,
}

impl fmt::Display for SendStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SendStage::Validating => "validating",
            SendStage::FetchingAccount => "fetching_account",
            SendStage::ComputingAmounts => "computing_amounts",
            SendStage::RequestingWork => "requesting_work",
            SendStage::VerifyingWork => "verifying_work",
            SendStage::BuildingBlock => "building_block",
            SendStage::Submitting => "submitting",
        };
        f.write_str(name)
    }
}

/// Upper bound on a single send, in raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendLimits {
    pub max_send: RawAmount,
}

impl SendLimits {
    /// Build limits from a Nano amount such as `"0.01"`.
    pub fn from_nano(max_send: &str) -> LedgerResult<Self> {
        Ok(Self {
            max_send: RawAmount::from_nano(max_send)?,
        })
    }
}

/// A transfer request as received from a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    pub destination_address: String,
    /// Amount in Nano.
    pub amount: String,
}

/// A request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedSend {
    pub destination: NanoAddress,
    pub amount: RawAmount,
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct SendReceipt {
    pub hash: BlockHash,
    pub source: NanoAddress,
    pub destination: NanoAddress,
    pub amount_raw: RawAmount,
    pub balance_before_raw: RawAmount,
    pub balance_after_raw: RawAmount,
    pub previous: BlockHash,
    /// The node's `process` response.
    pub node_response: Value,
}

/// A terminal failure and the stage it occurred in.
#[derive(Debug, Error)]
#[error("{error} (stage: {stage})")]
pub struct SendFailure {
    pub stage: SendStage,
    #[source]
    pub error: LedgerError,
}

impl SendFailure {
    fn at(stage: SendStage) -> impl FnOnce(LedgerError) -> SendFailure {
        move |error| SendFailure { stage, error }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Orchestrates one send from validation to submission.
#[derive(Clone)]
pub struct SendPipeline {
    node: NodeClient,
    work: WorkCoordinator,
    limits: Arc<ArcSwap<SendLimits>>,
    locks: AccountLocks,
}

impl SendPipeline {
    pub fn new(node: NodeClient, work: WorkCoordinator, limits: SendLimits) -> Self {
        Self {
            node,
            work,
            limits: Arc::new(ArcSwap::from_pointee(limits)),
            locks: AccountLocks::new(),
        }
    }

    pub fn limits(&self) -> Arc<SendLimits> {
        self.limits.load_full()
    }

    /// Replace the send limit; runs already past validation keep the old one.
    pub fn set_limits(&self, limits: SendLimits) {
        tracing::info!(max_send_raw = %limits.max_send, "Send limit updated");
        self.limits.store(Arc::new(limits));
    }

    /// Check a request without touching the network.
    pub fn validate(&self, request: &SendRequest) -> LedgerResult<ValidatedSend> {
        let destination = parse_address(&request.destination_address, "Destination address is not valid")?;

        let amount = RawAmount::from_nano(request.amount.trim())
            .ok()
            .filter(|amount| !amount.is_zero())
            .ok_or_else(|| LedgerError::Validation("Amount must be a positive number".to_string()))?;

        if amount > self.limits.load().max_send {
            return Err(LedgerError::Validation("Maximum send amount exceeded".to_string()));
        }

        Ok(ValidatedSend { destination, amount })
    }

    /// Run the full pipeline for `request`, signing with `wallet`.
    pub async fn send(&self, wallet: &Wallet, request: &SendRequest) -> Result<SendReceipt, SendFailure> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("send", %run_id, source = %wallet.address());

        let result = self.run(wallet, request).instrument(span.clone()).await;

        let _entered = span.enter();
        match &result {
            Ok(receipt) => {
                tracing::info!(hash = %receipt.hash, amount_raw = %receipt.amount_raw, "Send completed");
                metrics::record_send("completed");
            }
            Err(failure) => {
                tracing::warn!(stage = %failure.stage, kind = %failure.kind(), error = %failure.error, "Send failed");
                metrics::record_send(failure.kind().as_str());
            }
        }
        result
    }

    async fn run(&self, wallet: &Wallet, request: &SendRequest) -> Result<SendReceipt, SendFailure> {
        let ValidatedSend { destination, amount } =
            self.validate(request).map_err(SendFailure::at(SendStage::Validating))?;

        let source = wallet.address();
        let _guard = self.locks.acquire(&source).await;

        tracing::debug!(stage = %SendStage::FetchingAccount, "Fetching account state");
        let info = match self.node.account_info(&source).await {
            Ok(info) => info,
            Err(RpcError::Rpc { message, .. }) if message == ACCOUNT_NOT_FOUND => {
                return Err(SendFailure {
                    stage: SendStage::FetchingAccount,
                    error: LedgerError::UnopenedAccount { address: source.to_string() },
                });
            }
            Err(e) => return Err(SendFailure::at(SendStage::FetchingAccount)(e.into())),
        };
        let frontier = info.frontier.ok_or_else(|| SendFailure {
            stage: SendStage::FetchingAccount,
            error: LedgerError::UnopenedAccount { address: source.to_string() },
        })?;

        tracing::debug!(stage = %SendStage::ComputingAmounts, balance_raw = %info.balance, amount_raw = %amount, "Computing balance");
        let balance_after = info.balance.checked_sub(amount).ok_or_else(|| SendFailure {
            stage: SendStage::ComputingAmounts,
            error: LedgerError::InsufficientBalance {
                balance: info.balance,
                requested: amount,
            },
        })?;

        tracing::debug!(stage = %SendStage::RequestingWork, frontier = %frontier, endpoint = %self.work.endpoint().name(), "Requesting work");
        let proof = self
            .work
            .request_work(&frontier)
            .await
            .map_err(SendFailure::at(SendStage::RequestingWork))?;

        tracing::debug!(stage = %SendStage::VerifyingWork, work = %proof.value, "Verifying work");
        self.work
            .verify_work(&proof, &frontier)
            .map_err(SendFailure::at(SendStage::VerifyingWork))?;

        tracing::debug!(stage = %SendStage::BuildingBlock, "Building block");
        let representative = info.representative.ok_or_else(|| SendFailure {
            stage: SendStage::BuildingBlock,
            error: LedgerError::InvalidInput("account_info returned no representative".to_string()),
        })?;
        let block = StateBlockBuilder::new()
            .with_account(source)
            .with_previous(frontier)
            .with_representative(representative)
            .with_balance(balance_after)
            .with_destination(destination)
            .with_work(proof.value)
            .sign(wallet)
            .map_err(SendFailure::at(SendStage::BuildingBlock))?;

        tracing::debug!(stage = %SendStage::Submitting, hash = %block.hash(), "Submitting block");
        let node_response = self
            .node
            .process_send(&block.to_json())
            .await
            .map_err(|e| SendFailure {
                stage: SendStage::Submitting,
                error: LedgerError::Submission(e),
            })?;

        if let Some(reported) = node_response.get("hash").and_then(Value::as_str) {
            if !reported.eq_ignore_ascii_case(&block.hash().to_string()) {
                tracing::warn!(local = %block.hash(), reported = reported, "Node reported a different block hash");
            }
        }

        Ok(SendReceipt {
            hash: block.hash(),
            source,
            destination,
            amount_raw: amount,
            balance_before_raw: info.balance,
            balance_after_raw: balance_after,
            previous: block.previous(),
            node_response,
        })
    }
}

impl fmt::Debug for SendPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendPipeline")
            .field("node", &self.node)
            .field("work", &self.work)
            .field("limits", &self.limits.load_full())
            .finish()
    }
}
