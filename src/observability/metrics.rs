//! Metrics collection.
//!
//! # Metrics
//! - `xchain_callbacks_total` (counter): resolved calls by outcome
//!   (`success`, `failure`, `timeout`)
//! - `xchain_resource_requests_total` (counter): resource operations by
//!   `op` and `result` (`ok` or the error kind)

use metrics::counter;

/// Record how a timed callback was resolved.
pub fn record_callback_outcome(outcome: &'static str) {
    counter!("xchain_callbacks_total", "outcome" => outcome).increment(1);
}

/// Record the result of one resource operation.
pub fn record_resource_request(op: &'static str, result: &'static str) {
    counter!("xchain_resource_requests_total", "op" => op, "result" => result).increment(1);
}
