//! Minimal transaction and span model the timeline spans are attached to.

pub mod span;
pub mod transaction;

pub use span::{Span, SpanContext};
pub use transaction::{start_child, TracedTransaction, Transaction, OP_NAVIGATION, OP_PAGELOAD};
