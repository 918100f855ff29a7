//! Nano ledger integration.
//!
//! # Data Flow
//! ```text
//! SendRequest
//!     → send.rs (validation, per-account lock)
//!     → client.rs (account_info: frontier, balance, representative)
//!     → work.rs (work_generate, local difficulty check)
//!     → block.rs (state block hash, signature via wallet.rs)
//!     → client.rs (process)
//! ```
//!
//! # Security Constraints
//! - The private key is read once at startup and never logged
//! - Every RPC call has a deadline
//! - Remote work is verified before it is signed into a block

pub mod address;
pub mod amount;
pub mod block;
pub mod client;
pub mod locks;
pub mod send;
pub mod types;
pub mod wallet;
pub mod work;

pub use address::{NanoAddress, PublicKey};
pub use amount::{nano_to_raw, raw_to_nano, RawAmount};
pub use block::{StateBlock, StateBlockBuilder};
pub use client::{AccountInfo, Endpoint, NodeClient, RpcClient};
pub use send::{SendFailure, SendLimits, SendPipeline, SendReceipt, SendRequest, SendStage};
pub use types::{BlockHash, ErrorKind, LedgerError, LedgerResult, RpcError};
pub use wallet::Wallet;
pub use work::{WorkCoordinator, WorkProof, WorkValue};
