//! The host capabilities the instrumentation depends on.
//!
//! Everything the core reads from the browser goes through [`PerformanceEnvironment`], so the
//! same code runs against `web-sys` in the browser and against
//! [`InMemoryEnvironment`](crate::platform::memory::InMemoryEnvironment) elsewhere.

use std::rc::Rc;

use crate::metrics::entry::PerformanceEntry;
use crate::metrics::error::MetricsResult;

pub type EntryCallback = Box<dyn Fn(&PerformanceEntry)>;
pub type VisibilityCallback = Box<dyn Fn(&VisibilityEvent)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibilityState {
    Visible,
    Hidden,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityEvent {
    pub state: VisibilityState,
    /// Milliseconds relative to the time origin.
    pub timestamp: f64,
}

/// A `<script>` element currently in the document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptElement {
    pub src: Option<String>,
    /// Set for the script flagged with `data-entry="true"`.
    pub entry: bool,
}

impl ScriptElement {
    pub fn new(src: impl Into<String>, entry: bool) -> Self {
        Self {
            src: Some(src.into()),
            entry,
        }
    }
}

/// A live registration for one asynchronously delivered entry type.
pub trait EntryObservation {
    /// Removes and returns records buffered for this observation but not yet delivered.
    fn take_records(&self) -> Vec<PerformanceEntry>;
    fn disconnect(&self);
}

pub trait PerformanceEnvironment {
    /// Navigation start in milliseconds since the Unix epoch, `None` without a performance API.
    fn time_origin(&self) -> Option<f64>;

    /// Every timeline entry recorded so far, in recording order.
    fn entries(&self) -> Option<Vec<PerformanceEntry>>;

    /// Length of the timeline without decoding it.
    fn entry_count(&self) -> Option<usize>;

    fn mark(&self, name: &str);

    fn location_origin(&self) -> Option<String>;

    fn scripts(&self) -> Vec<ScriptElement>;

    fn visibility_state(&self) -> VisibilityState;

    fn add_visibility_listener(&self, callback: VisibilityCallback) -> MetricsResult<ListenerId>;

    fn remove_visibility_listener(&self, id: ListenerId);

    /// Registers `callback` for `entry_type`, including entries buffered before the call.
    fn observe(
        &self,
        entry_type: &str,
        callback: EntryCallback,
    ) -> MetricsResult<Rc<dyn EntryObservation>>;
}
