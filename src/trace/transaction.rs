use serde::Serialize;

use crate::metrics::measurements::Measurements;
use crate::metrics::timing::timestamp_in_seconds;
use crate::trace::span::{Span, SpanContext};

/// Operation tag of a page-load transaction.
pub const OP_PAGELOAD: &str = "pageload";
/// Operation tag of a client-side navigation transaction.
pub const OP_NAVIGATION: &str = "navigation";

/// The parent of all spans produced from the timeline.
pub trait TracedTransaction {
    fn op(&self) -> &str;
    fn start_timestamp(&self) -> f64;
    fn set_start_timestamp(&mut self, timestamp: f64);
    fn push_child(&mut self, span: Span);
    fn set_measurements(&mut self, measurements: Measurements);
}

/// Creates a child span on `transaction`.
///
/// A child never starts before its parent: when `context` starts earlier than the transaction,
/// the transaction's start is moved back to the child's start.
pub fn start_child(transaction: &mut dyn TracedTransaction, context: SpanContext) {
    if context.start_timestamp < transaction.start_timestamp() {
        transaction.set_start_timestamp(context.start_timestamp);
    }
    transaction.push_child(Span::from(context));
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Transaction {
    op: String,
    start_timestamp: f64,
    spans: Vec<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    measurements: Option<Measurements>,
}

impl Transaction {
    pub fn new(op: impl Into<String>, start_timestamp: f64) -> Self {
        Self {
            op: op.into(),
            start_timestamp,
            spans: Vec::new(),
            measurements: None,
        }
    }

    /// Starts a transaction at the current wall-clock time.
    pub fn started_now(op: impl Into<String>) -> Self {
        Self::new(op, timestamp_in_seconds())
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn measurements(&self) -> Option<&Measurements> {
        self.measurements.as_ref()
    }

    pub fn find_span(&self, description: &str) -> Option<&Span> {
        self.spans.iter().find(|span| span.description == description)
    }
}

impl TracedTransaction for Transaction {
    fn op(&self) -> &str {
        &self.op
    }

    fn start_timestamp(&self) -> f64 {
        self.start_timestamp
    }

    fn set_start_timestamp(&mut self, timestamp: f64) {
        self.start_timestamp = timestamp;
    }

    fn push_child(&mut self, span: Span) {
        self.spans.push(span);
    }

    fn set_measurements(&mut self, measurements: Measurements) {
        if self.measurements.is_some() {
            log::debug!("measurements already attached to {} transaction", self.op);
            return;
        }
        self.measurements = Some(measurements);
    }
}
