//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → HTTP server stops accepting, drains in-flight calls
//!               → config watcher task exits
//! ```
//!
//! A send already past validation runs to completion before the server exits.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::termination_signal;
