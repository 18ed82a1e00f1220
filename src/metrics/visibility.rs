use std::cell::Cell;
use std::rc::Rc;

use crate::platform::performance::{
    ListenerId, PerformanceEnvironment, VisibilityEvent, VisibilityState,
};

/// Tracks when the page was first hidden.
///
/// Starts at `0` when the page is already hidden at construction, otherwise at infinity. The
/// first visibility change lowers it to the event time; later changes are ignored.
#[derive(Clone, Debug)]
pub struct FirstHidden {
    inner: Rc<FirstHiddenInner>,
}

#[derive(Debug)]
struct FirstHiddenInner {
    timestamp: Cell<f64>,
    updated: Cell<bool>,
}

impl FirstHidden {
    pub fn new(initial_state: VisibilityState) -> Self {
        let timestamp = match initial_state {
            VisibilityState::Hidden => 0.0,
            VisibilityState::Visible => f64::INFINITY,
        };
        Self {
            inner: Rc::new(FirstHiddenInner {
                timestamp: Cell::new(timestamp),
                updated: Cell::new(false),
            }),
        }
    }

    /// Milliseconds relative to the time origin.
    pub fn timestamp(&self) -> f64 {
        self.inner.timestamp.get()
    }

    /// Whether an entry starting at `start_time` happened while the page was still visible.
    pub fn precedes(&self, start_time: f64) -> bool {
        start_time < self.timestamp()
    }

    pub fn record_change(&self, timestamp: f64) {
        if self.inner.updated.replace(true) {
            return;
        }
        self.inner
            .timestamp
            .set(self.inner.timestamp.get().min(timestamp));
    }

    /// Creates the tracker and subscribes it to the first visibility change.
    pub fn install(env: &dyn PerformanceEnvironment) -> (Self, Option<ListenerId>) {
        let tracker = Self::new(env.visibility_state());
        let handle = tracker.clone();
        let listener = env
            .add_visibility_listener(Box::new(move |event: &VisibilityEvent| {
                handle.record_change(event.timestamp)
            }));
        match listener {
            Ok(id) => (tracker, Some(id)),
            Err(err) => {
                log::debug!("first-hidden tracking unavailable: {err}");
                (tracker, None)
            }
        }
    }
}
