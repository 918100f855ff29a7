//! Tool server over HTTP, backed by a mock ledger node.

mod common;

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

use common::*;
use nano_wallet::config::NanoConfig;
use nano_wallet::http::HttpServer;
use nano_wallet::tools::{NanoTools, ToolResponse, INTERNAL_ERROR, INVALID_PARAMS};

const BLOCK_HASH: &str = "87434F8041869A01C8F6F263B87972D7BA443A72E0A97D7A3FD0CCC2358FD6F9";

async fn start_server(node: &MockNode, private_key: Option<&str>) -> String {
    let mut config = NanoConfig::default();
    config.node.rpc_url = node.url();
    config.node.work_threshold = format!("{:016x}", LOW_THRESHOLD);
    config.wallet.private_key = private_key.map(str::to_string);
    let tools = Arc::new(NanoTools::from_config(&config).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = HttpServer::new(tools).router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn call(base: &str, tool: &str, args: Value) -> (u16, ToolResponse) {
    let res = reqwest::Client::new()
        .post(format!("{}/tools/{}", base, tool))
        .json(&args)
        .send()
        .await
        .unwrap();
    let status = res.status().as_u16();
    (status, res.json().await.unwrap())
}

fn ledger(action: &str, body: &Value) -> MockReply {
    match action {
        "account_info" => account_info_reply(FIVE_NANO_RAW, FRONTIER),
        "work_generate" => solved_work_reply(body),
        "process" => MockReply::status(500, "process exploded"),
        "block_info" => MockReply::json(json!({
            "block_account": TEST_ADDRESS,
            "amount": "1000000000000000000000000000",
            "height": "58",
            "confirmed": "true",
            "contents": { "type": "state", "previous": FRONTIER },
            "subtype": "send"
        })),
        _ => MockReply::rpc_error("unexpected"),
    }
}

#[tokio::test]
async fn test_health_and_tool_listing() {
    let node = start_mock_node(ledger).await;
    let base = start_server(&node, None).await;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/health", base)).send().await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));
    let health: Value = res.json().await.unwrap();
    assert_eq!(health["status"], "ok");

    let tools: Value = client
        .get(format!("{}/tools", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<_> = tools["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["nano_send", "nano_account_info", "nano_my_account_info", "block_info"]);
    assert_eq!(tools["tools"][0]["inputSchema"]["required"], json!(["destination_address", "amount"]));
}

#[tokio::test]
async fn test_account_info_renders_friendly_balance() {
    let node = start_mock_node(ledger).await;
    let base = start_server(&node, None).await;

    let (status, response) = call(&base, "nano_account_info", json!({ "address": TEST_ADDRESS })).await;

    assert_eq!(status, 200);
    assert!(!response.is_error);
    let text = response.text_content().unwrap();
    let prefix = format!("The account information for {} is ", TEST_ADDRESS);
    assert!(text.starts_with(&prefix));
    let json: Value = serde_json::from_str(&text[prefix.len()..]).unwrap();
    assert_eq!(json["balance"], "5 in nano units or 5000000000000000000000000000000 in raw units");
    assert_eq!(json["block_count"], "7");
    assert_eq!(response.metadata.server, "nano_currency");
}

#[tokio::test]
async fn test_my_account_info_uses_wallet_address() {
    let node = start_mock_node(ledger).await;
    let base = start_server(&node, Some(TEST_PRIVATE_KEY)).await;

    let (_, response) = call(&base, "nano_my_account_info", json!({})).await;

    assert!(!response.is_error);
    assert!(response.text_content().unwrap().contains(TEST_ADDRESS));
    assert_eq!(node.last("account_info").unwrap()["account"], TEST_ADDRESS);
}

#[tokio::test]
async fn test_block_info_marks_missing_balance() {
    let node = start_mock_node(ledger).await;
    let base = start_server(&node, None).await;

    let (_, response) = call(&base, "block_info", json!({ "hash": BLOCK_HASH })).await;

    let text = response.text_content().unwrap();
    let prefix = format!("The block information for hash {} is ", BLOCK_HASH);
    assert!(text.starts_with(&prefix));
    let json: Value = serde_json::from_str(&text[prefix.len()..]).unwrap();
    assert_eq!(json["amount"], "0.001 in nano units or 1000000000000000000000000000 in raw units");
    assert_eq!(json["balance"], "N/A");
    assert_eq!(node.last("block_info").unwrap()["json_block"], "true");
}

#[tokio::test]
async fn test_send_over_limit_is_invalid_params_without_rpc() {
    let node = start_mock_node(ledger).await;
    let base = start_server(&node, Some(TEST_PRIVATE_KEY)).await;

    let (status, response) = call(
        &base,
        "nano_send",
        json!({ "destination_address": destination().to_string(), "amount": 0.02 }),
    )
    .await;

    assert_eq!(status, 200);
    assert!(response.is_error);
    assert_eq!(response.error_code, Some(INVALID_PARAMS));
    assert!(response.text_content().unwrap().starts_with("Error: Maximum send amount exceeded"));
    assert!(node.calls().is_empty());
}

#[tokio::test]
async fn test_send_process_failure_is_non_fatal() {
    let node = start_mock_node(ledger).await;
    let base = start_server(&node, Some(TEST_PRIVATE_KEY)).await;

    let (status, response) = call(
        &base,
        "nano_send",
        json!({ "destination_address": destination().to_string(), "amount": "0.001" }),
    )
    .await;

    assert_eq!(status, 200);
    assert!(response.is_error);
    assert_eq!(response.error_code, Some(INTERNAL_ERROR));
    assert_eq!(response.stage.as_deref(), Some("submitting"));
    let text = response.text_content().unwrap();
    assert!(text.contains("HTTP 500: process exploded"));
    assert!(!text.contains(&node.url()));

    // The server keeps serving after a failed send.
    let (status, _) = call(&base, "nano_account_info", json!({ "address": TEST_ADDRESS })).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_unknown_tool_and_bad_body() {
    let node = start_mock_node(ledger).await;
    let base = start_server(&node, None).await;

    let (status, response) = call(&base, "nano_receive", json!({})).await;
    assert_eq!(status, 404);
    assert!(response.is_error);

    let res = reqwest::Client::new()
        .post(format!("{}/tools/block_info", base))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
}

#[test]
fn test_missing_rpc_url_exits_non_zero() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_nano-wallet"))
        .env_remove("NANO_RPC_URL")
        .env("NANO_BIND_ADDRESS", "127.0.0.1:0")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("NANO_RPC_URL is required"), "stderr: {}", stderr);
}
