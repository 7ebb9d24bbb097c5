//! Response sink contract.
//!
//! The transport implements this to carry responses back to the client.
//! Exactly one terminal call (`on_success`, `on_failure` or `on_ignored`) is
//! made per processed request; records and metadata may precede it any
//! number of times. Sinks buffer or queue internally; delivery failures are
//! a transport concern and never surface into the state machine.

use async_trait::async_trait;
use weft_proto::{ErrorCode, Metadata, Record, Value};

/// Per-request response channel handed to the driver with each inbound unit.
#[async_trait]
pub trait ResponseSink: Send {
    /// Terminal: the request succeeded.
    async fn on_success(&mut self, metadata: Metadata);

    /// Terminal: the request failed.
    async fn on_failure(&mut self, code: ErrorCode, message: &str);

    /// Terminal: the request was not processed because the session is
    /// draining (interrupted or failed).
    async fn on_ignored(&mut self);

    /// One result record.
    async fn on_record(&mut self, record: Record);

    /// A single metadata entry, ahead of the terminal call.
    async fn on_metadata(&mut self, key: &str, value: Value);
}
