//! Tracing utilities for request timing and correlation.

use std::time::Instant;
use tracing::{Span, debug, info_span};

/// Install the default subscriber. Intended for binaries and integration
/// tests embedding the engine; respects `RUST_LOG`.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Guard for timing request processing.
///
/// Logs the latency when dropped.
pub struct RequestTimer {
    request: &'static str,
    start: Instant,
}

impl RequestTimer {
    /// Start timing a request.
    pub fn new(request: &'static str) -> Self {
        Self {
            request,
            start: Instant::now(),
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        debug!(
            request = self.request,
            elapsed_us = self.start.elapsed().as_micros() as u64,
            "request processed"
        );
    }
}

/// Standardized span constructors for protocol observability.
pub mod spans {
    use super::*;

    /// Span for one request dispatch.
    pub fn request(connection_id: &str, state: &str, request: &'static str) -> Span {
        info_span!("weft.request", connection_id = %connection_id, state = %state, request = %request)
    }

    /// Span for a connection's lifetime.
    pub fn connection(connection_id: &str) -> Span {
        info_span!("weft.connection", connection_id = %connection_id)
    }
}
