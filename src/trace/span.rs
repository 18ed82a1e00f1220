use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Parameters for a child span.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpanContext {
    pub description: String,
    pub op: String,
    pub start_timestamp: f64,
    pub end_timestamp: f64,
    pub data: BTreeMap<String, Value>,
}

impl SpanContext {
    pub fn new(
        op: impl Into<String>,
        description: impl Into<String>,
        start_timestamp: f64,
        end_timestamp: f64,
    ) -> Self {
        Self {
            description: description.into(),
            op: op.into(),
            start_timestamp,
            end_timestamp,
            data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, data: BTreeMap<String, Value>) -> Self {
        self.data = data;
        self
    }
}

/// A finished child span. Timestamps are seconds since the Unix epoch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Span {
    pub description: String,
    pub op: String,
    pub start_timestamp: f64,
    pub end_timestamp: f64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
}

impl From<SpanContext> for Span {
    fn from(context: SpanContext) -> Self {
        Self {
            description: context.description,
            op: context.op,
            start_timestamp: context.start_timestamp,
            end_timestamp: context.end_timestamp,
            data: context.data,
        }
    }
}

