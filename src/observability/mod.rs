//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stderr (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Private keys never appear in log fields
//! - Each send run carries a `run_id` so its stage events can be correlated
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
