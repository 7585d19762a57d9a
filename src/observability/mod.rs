//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! rpc + resource subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (callback and request counters)
//!
//! Consumers:
//!     → whatever subscriber / recorder the host application installs
//!     → xchain-cli installs a fmt subscriber at startup
//! ```
//!
//! # Design Decisions
//! - The library never installs a subscriber or recorder on its own
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
