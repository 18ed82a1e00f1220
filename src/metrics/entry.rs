use serde::{Deserialize, Serialize};

use crate::metrics::constants::{
    ENTRY_TYPE_MARK, ENTRY_TYPE_MEASURE, ENTRY_TYPE_NAVIGATION, ENTRY_TYPE_PAINT,
    ENTRY_TYPE_RESOURCE,
};

/// Kind of a timeline entry, derived from its `entryType`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Navigation,
    Mark,
    Paint,
    Measure,
    Resource,
    Other(String),
}

impl EntryKind {
    pub fn parse(entry_type: &str) -> Self {
        match entry_type {
            ENTRY_TYPE_NAVIGATION => EntryKind::Navigation,
            ENTRY_TYPE_MARK => EntryKind::Mark,
            ENTRY_TYPE_PAINT => EntryKind::Paint,
            ENTRY_TYPE_MEASURE => EntryKind::Measure,
            ENTRY_TYPE_RESOURCE => EntryKind::Resource,
            other => EntryKind::Other(other.to_string()),
        }
    }
}

/// A read-only Performance Timeline record, in the shape produced by the browser's `toJSON()`.
///
/// Times are milliseconds relative to the time origin. Subtype fields are optional: a
/// navigation entry fills the phase timestamps, a resource entry the initiator and sizes, an
/// input entry `processing_start`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceEntry {
    pub name: String,
    pub entry_type: String,
    pub start_time: f64,
    pub duration: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unload_event_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unload_event_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dom_content_loaded_event_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dom_content_loaded_event_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_event_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_event_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_lookup_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_lookup_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_end: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiator_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_body_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded_body_size: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_start: Option<f64>,
}

impl PerformanceEntry {
    pub fn new(name: impl Into<String>, entry_type: impl Into<String>, start_time: f64, duration: f64) -> Self {
        Self {
            name: name.into(),
            entry_type: entry_type.into(),
            start_time,
            duration,
            ..Default::default()
        }
    }

    pub fn kind(&self) -> EntryKind {
        EntryKind::parse(&self.entry_type)
    }

    /// Start and end timestamps of a navigation phase, in milliseconds.
    pub fn navigation_phase(&self, phase: NavigationPhase) -> (Option<f64>, Option<f64>) {
        match phase {
            NavigationPhase::UnloadEvent => (self.unload_event_start, self.unload_event_end),
            NavigationPhase::DomContentLoadedEvent => (
                self.dom_content_loaded_event_start,
                self.dom_content_loaded_event_end,
            ),
            NavigationPhase::LoadEvent => (self.load_event_start, self.load_event_end),
            NavigationPhase::Connect => (self.connect_start, self.connect_end),
            NavigationPhase::DomainLookup => (self.domain_lookup_start, self.domain_lookup_end),
        }
    }
}

/// Phases of a navigation entry that become `browser` spans.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationPhase {
    UnloadEvent,
    DomContentLoadedEvent,
    LoadEvent,
    Connect,
    DomainLookup,
}

impl NavigationPhase {
    pub const ALL: [NavigationPhase; 5] = [
        NavigationPhase::UnloadEvent,
        NavigationPhase::DomContentLoadedEvent,
        NavigationPhase::LoadEvent,
        NavigationPhase::Connect,
        NavigationPhase::DomainLookup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationPhase::UnloadEvent => "unloadEvent",
            NavigationPhase::DomContentLoadedEvent => "domContentLoadedEvent",
            NavigationPhase::LoadEvent => "loadEvent",
            NavigationPhase::Connect => "connect",
            NavigationPhase::DomainLookup => "domainLookup",
        }
    }
}
