//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, request ID, trace span)
//!     → tools (NanoTools dispatch by name)
//!     → ToolResponse envelope as JSON
//! ```

pub mod server;

pub use server::{AppState, HttpServer};
