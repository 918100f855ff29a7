//! Uniform tool result envelope.
//!
//! Successful calls carry text content and server metadata. Failures carry an
//! `Error: ...` message, the error classification, and a JSON-RPC style code.

use serde::{Deserialize, Serialize};

use crate::blockchain::types::{ErrorKind, LedgerError};
use crate::blockchain::send::SendFailure;

pub const SERVER_NAME: &str = "nano_currency";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// JSON-RPC "invalid params".
pub const INVALID_PARAMS: i32 = -32602;
/// JSON-RPC "internal error".
pub const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub server: String,
    pub version: String,
}

impl Default for ToolMetadata {
    fn default() -> Self {
        Self {
            server: SERVER_NAME.to_string(),
            version: SERVER_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub content: Vec<ToolContent>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Classification of the underlying RPC failure, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause_kind: Option<ErrorKind>,
    /// Pipeline stage a send failed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
    pub metadata: ToolMetadata,
}

impl ToolResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
            error_kind: None,
            cause_kind: None,
            stage: None,
            error_code: None,
            metadata: ToolMetadata::default(),
        }
    }

    pub fn error(kind: ErrorKind, message: impl std::fmt::Display) -> Self {
        let code = if kind.is_invalid_params() {
            INVALID_PARAMS
        } else {
            INTERNAL_ERROR
        };
        Self {
            content: vec![ToolContent::Text {
                text: format!("Error: {}", message),
            }],
            is_error: true,
            error_kind: Some(kind),
            cause_kind: None,
            stage: None,
            error_code: Some(code),
            metadata: ToolMetadata::default(),
        }
    }

    /// The first text block, if any.
    pub fn text_content(&self) -> Option<&str> {
        self.content.iter().map(|ToolContent::Text { text }| text.as_str()).next()
    }
}

impl From<LedgerError> for ToolResponse {
    fn from(error: LedgerError) -> Self {
        let mut response = ToolResponse::error(error.kind(), &error);
        response.cause_kind = error.rpc_cause().map(|cause| cause.kind());
        response
    }
}

impl From<SendFailure> for ToolResponse {
    fn from(failure: SendFailure) -> Self {
        let mut response = ToolResponse::error(failure.kind(), &failure);
        response.cause_kind = failure.error.rpc_cause().map(|cause| cause.kind());
        response.stage = Some(failure.stage.to_string());
        response
    }
}
