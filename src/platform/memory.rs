use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::metrics::constants::{
    ENTRY_TYPE_FIRST_INPUT, ENTRY_TYPE_LARGEST_CONTENTFUL_PAINT, ENTRY_TYPE_MARK,
};
use crate::metrics::entry::PerformanceEntry;
use crate::metrics::error::{environment_unavailable, unsupported_entry_type, MetricsResult};
use crate::platform::performance::{
    EntryCallback, EntryObservation, ListenerId, PerformanceEnvironment, ScriptElement,
    VisibilityCallback, VisibilityEvent, VisibilityState,
};

/// A scripted, single-threaded stand-in for the browser.
///
/// The timeline, visibility and observer deliveries only change when the owner says so, which
/// makes the asynchronous parts of the instrumentation reproducible. Hosts without a DOM can
/// also use it to replay a recorded timeline.
#[derive(Default)]
pub struct InMemoryEnvironment {
    state: RefCell<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    time_origin: Option<f64>,
    timeline: Option<Vec<PerformanceEntry>>,
    now: f64,
    location_origin: Option<String>,
    scripts: Vec<ScriptElement>,
    visibility: Option<VisibilityState>,
    supported_entry_types: Vec<String>,
    buffered: Vec<PerformanceEntry>,
    listeners: Vec<(ListenerId, Rc<VisibilityCallback>)>,
    next_listener: u64,
    observations: Vec<Rc<MemoryObservation>>,
}

struct MemoryObservation {
    entry_type: String,
    callback: EntryCallback,
    pending: RefCell<Vec<PerformanceEntry>>,
    connected: Cell<bool>,
}

impl EntryObservation for MemoryObservation {
    fn take_records(&self) -> Vec<PerformanceEntry> {
        self.pending.take()
    }

    fn disconnect(&self) {
        self.connected.set(false);
        self.pending.borrow_mut().clear();
    }
}

impl InMemoryEnvironment {
    /// An environment with a performance API whose time origin is `time_origin_ms`.
    pub fn new(time_origin_ms: f64) -> Self {
        let env = Self::default();
        {
            let mut state = env.state.borrow_mut();
            state.time_origin = Some(time_origin_ms);
            state.timeline = Some(Vec::new());
            state.supported_entry_types = vec![
                ENTRY_TYPE_LARGEST_CONTENTFUL_PAINT.to_string(),
                ENTRY_TYPE_FIRST_INPUT.to_string(),
            ];
        }
        env
    }

    /// An environment without any performance API.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_location_origin(self, origin: impl Into<String>) -> Self {
        self.state.borrow_mut().location_origin = Some(origin.into());
        self
    }

    pub fn with_scripts(self, scripts: Vec<ScriptElement>) -> Self {
        self.state.borrow_mut().scripts = scripts;
        self
    }

    pub fn with_supported_entry_types(self, types: &[&str]) -> Self {
        self.state.borrow_mut().supported_entry_types =
            types.iter().map(|entry_type| entry_type.to_string()).collect();
        self
    }

    /// Starts out with the page already hidden.
    pub fn hidden(self) -> Self {
        self.state.borrow_mut().visibility = Some(VisibilityState::Hidden);
        self
    }

    /// Sets the clock used for marks, in milliseconds relative to the time origin.
    pub fn advance_to(&self, now_ms: f64) {
        self.state.borrow_mut().now = now_ms;
    }

    /// Appends an entry to the queryable timeline.
    pub fn push_entry(&self, entry: PerformanceEntry) {
        if let Some(timeline) = self.state.borrow_mut().timeline.as_mut() {
            timeline.push(entry);
        }
    }

    pub fn push_entries(&self, entries: impl IntoIterator<Item = PerformanceEntry>) {
        for entry in entries {
            self.push_entry(entry);
        }
    }

    /// Buffers an entry for observers of its type without delivering it yet.
    pub fn queue_observed(&self, entry: PerformanceEntry) {
        let mut state = self.state.borrow_mut();
        for observation in &state.observations {
            if observation.connected.get() && observation.entry_type == entry.entry_type {
                observation.pending.borrow_mut().push(entry.clone());
            }
        }
        state.buffered.push(entry);
    }

    /// Delivers every buffered record to its observer callback.
    pub fn deliver(&self) {
        let observations = self.state.borrow().observations.clone();
        for observation in observations {
            let records = observation.pending.take();
            for record in records {
                if !observation.connected.get() {
                    break;
                }
                (observation.callback)(&record);
            }
        }
    }

    /// Buffers and immediately delivers an observed entry.
    pub fn emit_observed(&self, entry: PerformanceEntry) {
        self.queue_observed(entry);
        self.deliver();
    }

    /// Changes visibility and notifies the registered listeners.
    pub fn set_visibility(&self, visibility: VisibilityState, timestamp_ms: f64) {
        let listeners: Vec<_> = {
            let mut state = self.state.borrow_mut();
            state.visibility = Some(visibility);
            state
                .listeners
                .iter()
                .map(|(_, callback)| Rc::clone(callback))
                .collect()
        };
        let event = VisibilityEvent {
            state: visibility,
            timestamp: timestamp_ms,
        };
        for listener in listeners {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn connected_observer_count(&self) -> usize {
        self.state
            .borrow()
            .observations
            .iter()
            .filter(|observation| observation.connected.get())
            .count()
    }
}

impl PerformanceEnvironment for InMemoryEnvironment {
    fn time_origin(&self) -> Option<f64> {
        self.state.borrow().time_origin
    }

    fn entries(&self) -> Option<Vec<PerformanceEntry>> {
        self.state.borrow().timeline.clone()
    }

    fn entry_count(&self) -> Option<usize> {
        self.state.borrow().timeline.as_ref().map(Vec::len)
    }

    fn mark(&self, name: &str) {
        let now = self.state.borrow().now;
        self.push_entry(PerformanceEntry::new(name, ENTRY_TYPE_MARK, now, 0.0));
    }

    fn location_origin(&self) -> Option<String> {
        self.state.borrow().location_origin.clone()
    }

    fn scripts(&self) -> Vec<ScriptElement> {
        self.state.borrow().scripts.clone()
    }

    fn visibility_state(&self) -> VisibilityState {
        self.state
            .borrow()
            .visibility
            .unwrap_or(VisibilityState::Visible)
    }

    fn add_visibility_listener(&self, callback: VisibilityCallback) -> MetricsResult<ListenerId> {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.push((id, Rc::new(callback)));
        Ok(id)
    }

    fn remove_visibility_listener(&self, id: ListenerId) {
        self.state
            .borrow_mut()
            .listeners
            .retain(|(listener, _)| *listener != id);
    }

    fn observe(
        &self,
        entry_type: &str,
        callback: EntryCallback,
    ) -> MetricsResult<Rc<dyn EntryObservation>> {
        let mut state = self.state.borrow_mut();
        if state.time_origin.is_none() {
            return Err(environment_unavailable("PerformanceObserver unavailable"));
        }
        if !state.supported_entry_types.iter().any(|supported| supported == entry_type) {
            return Err(unsupported_entry_type(entry_type));
        }
        let buffered = state
            .buffered
            .iter()
            .filter(|entry| entry.entry_type == entry_type)
            .cloned()
            .collect();
        let observation = Rc::new(MemoryObservation {
            entry_type: entry_type.to_string(),
            callback,
            pending: RefCell::new(buffered),
            connected: Cell::new(true),
        });
        state.observations.push(Rc::clone(&observation));
        Ok(observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observers_receive_buffered_entries() {
        let env = InMemoryEnvironment::new(0.0);
        env.queue_observed(PerformanceEntry::new("", ENTRY_TYPE_FIRST_INPUT, 5.0, 0.0));

        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        env.observe(
            ENTRY_TYPE_FIRST_INPUT,
            Box::new(move |_: &PerformanceEntry| counter.set(counter.get() + 1)),
        )
        .unwrap();
        env.deliver();
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn take_records_drains_undelivered_entries() {
        let env = InMemoryEnvironment::new(0.0);
        let observation = env
            .observe(ENTRY_TYPE_LARGEST_CONTENTFUL_PAINT, Box::new(|_: &PerformanceEntry| {}))
            .unwrap();
        env.queue_observed(PerformanceEntry::new(
            "",
            ENTRY_TYPE_LARGEST_CONTENTFUL_PAINT,
            5.0,
            0.0,
        ));
        assert_eq!(observation.take_records().len(), 1);
        assert!(observation.take_records().is_empty());
    }

    #[test]
    fn unsupported_types_are_rejected() {
        let env = InMemoryEnvironment::new(0.0).with_supported_entry_types(&[]);
        let err = env
            .observe(ENTRY_TYPE_FIRST_INPUT, Box::new(|_: &PerformanceEntry| {}))
            .err()
            .unwrap();
        assert_eq!(err.code_str(), "metrics/unsupported-entry-type");
    }

    #[test]
    fn marks_land_on_the_timeline() {
        let env = InMemoryEnvironment::new(0.0);
        env.advance_to(42.0);
        env.mark("ready");
        let entries = env.entries().unwrap();
        assert_eq!(entries[0].name, "ready");
        assert_eq!(entries[0].start_time, 42.0);
    }
}
