//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use nano_wallet::blockchain::address::{NanoAddress, PublicKey};
use nano_wallet::blockchain::block::state_block_hash;
use nano_wallet::blockchain::client::{Endpoint, NodeClient, RpcClient};
use nano_wallet::blockchain::send::{SendLimits, SendPipeline};
use nano_wallet::blockchain::types::BlockHash;
use nano_wallet::blockchain::work::{solve_work, WorkCoordinator, WorkValue};
use nano_wallet::blockchain::{RawAmount, Wallet};

pub const TEST_PRIVATE_KEY: &str = "9F0E444C69F77A49BD0BE89DB92C38FE713E0963165CCA12FAF5712D7657120F";
pub const TEST_ADDRESS: &str = "nano_3i1aq1cchnmbn9x5rsbap8b15akfh7wj7pwskuzi7ahz8oq6cobd99d4r3b7";
pub const FRONTIER: &str = "991CF190094C00F0B68E2E5F75F6BEE95A2E0BD93CEAA4A6734DB9F19B728948";
pub const FIVE_NANO_RAW: &str = "5000000000000000000000000000000";

/// Low enough that `solve_work` finds a value in a few dozen attempts.
pub const LOW_THRESHOLD: u64 = 0xf000000000000000;

pub fn wallet() -> Wallet {
    Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap()
}

pub fn destination() -> NanoAddress {
    NanoAddress::from_public_key(PublicKey([0x02; 32]))
}

pub fn representative() -> NanoAddress {
    NanoAddress::from_public_key(PublicKey([0x01; 32]))
}

/// A canned HTTP reply from the mock node.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl MockReply {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn rpc_error(message: &str) -> Self {
        Self::json(json!({ "error": message }))
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Responder = dyn Fn(&str, &Value) -> MockReply + Send + Sync;

#[derive(Clone)]
struct MockState {
    calls: Arc<Mutex<Vec<Value>>>,
    responder: Arc<Responder>,
}

/// A mock ledger node that records every request body it receives.
pub struct MockNode {
    pub addr: SocketAddr,
    calls: Arc<Mutex<Vec<Value>>>,
}

impl MockNode {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|call| call["action"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// The last request body with the given action.
    pub fn last(&self, action: &str) -> Option<Value> {
        self.calls().into_iter().rev().find(|call| call["action"] == action)
    }
}

/// Start a programmable mock node on an ephemeral port.
pub async fn start_mock_node<F>(responder: F) -> MockNode
where
    F: Fn(&str, &Value) -> MockReply + Send + Sync + 'static,
{
    let calls = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        calls: calls.clone(),
        responder: Arc::new(responder),
    };

    let app = Router::new().route("/", post(mock_handler)).with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockNode { addr, calls }
}

async fn mock_handler(State(state): State<MockState>, Json(body): Json<Value>) -> impl IntoResponse {
    state.calls.lock().unwrap().push(body.clone());
    let action = body["action"].as_str().unwrap_or_default().to_string();
    let reply = (state.responder)(&action, &body);
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    let status = StatusCode::from_u16(reply.status).unwrap();
    (status, [("content-type", "application/json")], reply.body)
}

/// `account_info` body for an opened account.
pub fn account_info_reply(balance: &str, frontier: &str) -> MockReply {
    MockReply::json(json!({
        "frontier": frontier,
        "open_block": FRONTIER,
        "representative_block": FRONTIER,
        "balance": balance,
        "modified_timestamp": "1700000000",
        "block_count": "7",
        "representative": representative().to_string(),
    }))
}

/// `work_generate` body with work that meets [`LOW_THRESHOLD`].
pub fn solved_work_reply(request: &Value) -> MockReply {
    let hash: BlockHash = request["hash"].as_str().unwrap().parse().unwrap();
    let work = solve_work(&hash, LOW_THRESHOLD, 1 << 24).unwrap();
    MockReply::json(json!({ "work": work.to_string(), "difficulty": "f000000000000000", "hash": hash.to_string() }))
}

/// Work that does not meet [`LOW_THRESHOLD`] for `hash`.
pub fn weak_work(hash: &BlockHash) -> WorkValue {
    (0..)
        .map(WorkValue)
        .find(|w| nano_wallet::blockchain::work::work_difficulty(hash, *w) < LOW_THRESHOLD)
        .unwrap()
}

/// Recompute the hash of a submitted JSON block.
pub fn hash_of_submitted(block: &Value) -> BlockHash {
    let account: NanoAddress = block["account"].as_str().unwrap().parse().unwrap();
    let previous: BlockHash = block["previous"].as_str().unwrap().parse().unwrap();
    let representative: NanoAddress = block["representative"].as_str().unwrap().parse().unwrap();
    let balance: RawAmount = block["balance"].as_str().unwrap().parse().unwrap();
    let mut link = [0u8; 32];
    hex::decode_to_slice(block["link"].as_str().unwrap(), &mut link).unwrap();
    state_block_hash(&account, &previous, &representative, &balance, &link).unwrap()
}

/// A pipeline whose node and work calls both go to `node`.
pub fn pipeline_for(node: &MockNode, max_send: &str) -> SendPipeline {
    pipeline_with(node, node, "NANO_RPC_URL", max_send, Duration::from_secs(10))
}

pub fn pipeline_with(
    node: &MockNode,
    work: &MockNode,
    work_key: &str,
    max_send: &str,
    work_timeout: Duration,
) -> SendPipeline {
    let rpc = RpcClient::new();
    let node_endpoint = Endpoint::parse("NANO_RPC_URL", &node.url()).unwrap();
    let work_endpoint = Endpoint::parse(work_key, &work.url()).unwrap();
    SendPipeline::new(
        NodeClient::new(rpc.clone(), node_endpoint, Duration::from_secs(10)),
        WorkCoordinator::new(rpc, work_endpoint, work_timeout, LOW_THRESHOLD),
        SendLimits::from_nano(max_send).unwrap(),
    )
}
