//! Nano wallet tool service library.

pub mod blockchain;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod tools;

pub use config::schema::NanoConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use tools::NanoTools;
