use serde_json::{json, Value};

use crate::metrics::entry::PerformanceEntry;

/// Builds a navigation entry from the timing fields a browser would report.
pub fn navigation_entry(timings: Value) -> PerformanceEntry {
    let mut value = json!({
        "name": "https://example.com/",
        "entryType": "navigation",
        "startTime": 0,
        "duration": 0,
    });
    if let (Some(target), Some(fields)) = (value.as_object_mut(), timings.as_object()) {
        for (key, field) in fields {
            target.insert(key.clone(), field.clone());
        }
    }
    serde_json::from_value(value).expect("navigation fixture")
}

pub fn resource_entry(name: &str, initiator_type: &str, start_time: f64, duration: f64) -> PerformanceEntry {
    serde_json::from_value(json!({
        "name": name,
        "entryType": "resource",
        "startTime": start_time,
        "duration": duration,
        "initiatorType": initiator_type,
    }))
    .expect("resource fixture")
}
