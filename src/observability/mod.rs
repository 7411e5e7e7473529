//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! connector, config, lifecycle produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (human-readable or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request id, endpoint and method are fields, not message text
//! - Metric updates go through the `metrics` facade and are no-ops when
//!   no recorder is installed

pub mod logging;
pub mod metrics;
