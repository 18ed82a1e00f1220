//! Conversions from individual timeline entries to child span contexts.
//!
//! `time_origin` is always in epoch seconds; entry fields stay in milliseconds until converted
//! here.

use std::collections::BTreeMap;

use serde_json::Value;
use url::{Position, Url};

use crate::metrics::constants::{
    DATA_DECODED_BODY_SIZE, DATA_ENCODED_BODY_SIZE, DATA_TRANSFER_SIZE, EVALUATION_DESCRIPTION,
    OP_BROWSER, OP_RESOURCE, OP_SCRIPT, REQUEST_DESCRIPTION, RESPONSE_DESCRIPTION,
    SKIPPED_INITIATOR_TYPES,
};
use crate::metrics::entry::{NavigationPhase, PerformanceEntry};
use crate::metrics::timing::origin_relative;
use crate::trace::SpanContext;

/// A phase that did not happen is reported as `0` (or not at all).
fn occurred(timestamp: Option<f64>) -> Option<f64> {
    timestamp.filter(|value| *value != 0.0 && !value.is_nan())
}

pub fn navigation_phase_span(
    entry: &PerformanceEntry,
    phase: NavigationPhase,
    time_origin: f64,
) -> Option<SpanContext> {
    let (start, end) = entry.navigation_phase(phase);
    let start = occurred(start)?;
    let end = occurred(end)?;
    Some(SpanContext::new(
        OP_BROWSER,
        phase.as_str(),
        origin_relative(time_origin, start),
        origin_relative(time_origin, end),
    ))
}

/// `request` covers requestStart..responseEnd, `response` responseStart..responseEnd.
pub fn request_spans(entry: &PerformanceEntry, time_origin: f64) -> Vec<SpanContext> {
    let Some(response_end) = entry.response_end else {
        return Vec::new();
    };
    let end = origin_relative(time_origin, response_end);
    [
        (REQUEST_DESCRIPTION, entry.request_start),
        (RESPONSE_DESCRIPTION, entry.response_start),
    ]
    .into_iter()
    .filter_map(|(description, start)| {
        start.map(|start| {
            SpanContext::new(OP_BROWSER, description, origin_relative(time_origin, start), end)
        })
    })
    .collect()
}

pub fn navigation_spans(entry: &PerformanceEntry, time_origin: f64) -> Vec<SpanContext> {
    let mut spans: Vec<SpanContext> = NavigationPhase::ALL
        .iter()
        .filter_map(|phase| navigation_phase_span(entry, *phase, time_origin))
        .collect();
    spans.extend(request_spans(entry, time_origin));
    spans
}

/// Span for a `mark`, `paint` or `measure` entry, named after the entry.
pub fn measure_span(entry: &PerformanceEntry, time_origin: f64) -> SpanContext {
    let start_timestamp = origin_relative(time_origin, entry.start_time);
    let end_timestamp = start_timestamp + entry.duration / 1000.0;
    SpanContext::new(
        entry.entry_type.clone(),
        entry.name.clone(),
        start_timestamp,
        end_timestamp,
    )
}

/// Strips the page origin from a resource URL.
pub fn resource_name(url: &str, location_origin: Option<&str>) -> String {
    let Some(origin) = location_origin.filter(|origin| !origin.is_empty()) else {
        return url.to_string();
    };
    if let Ok(parsed) = Url::parse(url) {
        if parsed.origin().ascii_serialization() == origin {
            return parsed[Position::BeforePath..].to_string();
        }
    }
    url.replacen(origin, "", 1)
}

/// Span for a resource load; `None` for XHR/fetch, which are traced elsewhere.
pub fn resource_span(
    entry: &PerformanceEntry,
    resource_name: &str,
    time_origin: f64,
) -> Option<SpanContext> {
    let initiator_type = entry.initiator_type.as_deref().filter(|kind| !kind.is_empty());
    if initiator_type.is_some_and(|kind| SKIPPED_INITIATOR_TYPES.contains(&kind)) {
        return None;
    }

    let mut data = BTreeMap::new();
    for (key, size) in [
        (DATA_TRANSFER_SIZE, entry.transfer_size),
        (DATA_ENCODED_BODY_SIZE, entry.encoded_body_size),
        (DATA_DECODED_BODY_SIZE, entry.decoded_body_size),
    ] {
        if let Some(size) = size {
            data.insert(key.to_string(), Value::from(size));
        }
    }

    let op = match initiator_type {
        Some(kind) => format!("{OP_RESOURCE}.{kind}"),
        None => OP_RESOURCE.to_string(),
    };
    let start_timestamp = origin_relative(time_origin, entry.start_time);
    let end_timestamp = start_timestamp + entry.duration / 1000.0;
    Some(SpanContext::new(op, resource_name, start_timestamp, end_timestamp).with_data(data))
}

/// Time between the entry script finishing its download and tracing starting up.
pub fn evaluation_span(entry_script_end: f64, tracing_init_start: f64) -> SpanContext {
    SpanContext::new(
        OP_SCRIPT,
        EVALUATION_DESCRIPTION,
        entry_script_end,
        tracing_init_start,
    )
}
