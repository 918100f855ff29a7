//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! nano-wallet.toml (optional) + NANO_* environment variables
//!     → loader.rs (parse, env overrides)
//!     → validation.rs (semantic checks)
//!     → NanoConfig (validated)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads and validates the new file
//!     → the send limit is swapped atomically; other changes need a restart
//! ```

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{LogFormat, NanoConfig, NodeConfig, ObservabilityConfig, ServerConfig, WalletConfig};
