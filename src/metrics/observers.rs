//! Long-lived watchers for the web vitals that can only be observed asynchronously.
//!
//! Both observers validate candidates against [`FirstHidden`]: a paint or input that happened
//! after the page was first hidden does not describe what the user saw and is dropped.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::metrics::constants::{
    ENTRY_TYPE_FIRST_INPUT, ENTRY_TYPE_LARGEST_CONTENTFUL_PAINT, MEASUREMENT_FID,
    MEASUREMENT_LCP, MEASUREMENT_MARK_FID, MEASUREMENT_MARK_LCP,
};
use crate::metrics::entry::PerformanceEntry;
use crate::metrics::measurements::MeasurementSender;
use crate::metrics::timing::origin_relative;
use crate::metrics::visibility::FirstHidden;
use crate::platform::performance::{
    EntryObservation, ListenerId, PerformanceEnvironment, VisibilityEvent, VisibilityState,
};

/// Records the largest contentful paint.
///
/// Candidates grow over the life of the page, so every accepted candidate replaces the previous
/// `lcp`/`mark.lcp` pair. Once a candidate shows up after the page was hidden, or the page is
/// hidden and buffered records have been flushed, the value is final and the observer stops
/// updating.
pub struct LcpObserver {
    state: Rc<LcpState>,
    observation: Option<Rc<dyn EntryObservation>>,
    listener: Option<ListenerId>,
}

struct LcpState {
    first_hidden: FirstHidden,
    measurements: MeasurementSender,
    time_origin: f64,
    is_final: Cell<bool>,
}

impl LcpState {
    fn handle(&self, entry: &PerformanceEntry) {
        if self.is_final.get() {
            return;
        }
        if self.first_hidden.precedes(entry.start_time) {
            log::debug!("[Measurements] Adding LCP");
            self.measurements.record(MEASUREMENT_LCP, entry.start_time);
            self.measurements.record(
                MEASUREMENT_MARK_LCP,
                origin_relative(self.time_origin, entry.start_time),
            );
        } else {
            self.is_final.set(true);
        }
    }

    fn flush(&self, observation: &dyn EntryObservation) {
        for entry in observation.take_records() {
            self.handle(&entry);
        }
    }
}

impl LcpObserver {
    pub fn install(
        env: &dyn PerformanceEnvironment,
        time_origin: f64,
        first_hidden: FirstHidden,
        measurements: MeasurementSender,
    ) -> Self {
        let state = Rc::new(LcpState {
            first_hidden,
            measurements,
            time_origin,
            is_final: Cell::new(false),
        });

        let handler = Rc::clone(&state);
        let observation = match env.observe(
            ENTRY_TYPE_LARGEST_CONTENTFUL_PAINT,
            Box::new(move |entry: &PerformanceEntry| handler.handle(entry)),
        ) {
            Ok(observation) => observation,
            Err(err) => {
                log::debug!("LCP observer disabled: {err}");
                return Self {
                    state,
                    observation: None,
                    listener: None,
                };
            }
        };

        let on_hidden_state = Rc::clone(&state);
        let on_hidden_observation = Rc::clone(&observation);
        let listener = env
            .add_visibility_listener(Box::new(move |event: &VisibilityEvent| {
                if event.state != VisibilityState::Hidden || on_hidden_state.is_final.get() {
                    return;
                }
                on_hidden_state.flush(on_hidden_observation.as_ref());
                on_hidden_state.is_final.set(true);
            }))
            .map_err(|err| log::debug!("LCP visibility listener unavailable: {err}"))
            .ok();

        Self {
            state,
            observation: Some(observation),
            listener,
        }
    }

    /// Runs buffered-but-undelivered candidates through the acceptance rules now.
    pub fn force_flush(&self) {
        if self.state.is_final.get() {
            return;
        }
        if let Some(observation) = &self.observation {
            self.state.flush(observation.as_ref());
        }
    }

    pub fn is_final(&self) -> bool {
        self.state.is_final.get()
    }

    pub fn is_enabled(&self) -> bool {
        self.observation.is_some()
    }

    pub(crate) fn teardown(&mut self, env: &dyn PerformanceEnvironment) {
        if let Some(listener) = self.listener.take() {
            env.remove_visibility_listener(listener);
        }
        if let Some(observation) = self.observation.take() {
            observation.disconnect();
        }
    }
}

/// Records the delay of the first user input, then disconnects.
pub struct FidObserver {
    state: Rc<FidState>,
}

struct FidState {
    first_hidden: FirstHidden,
    measurements: MeasurementSender,
    time_origin: f64,
    recorded: Cell<bool>,
    observation: RefCell<Option<Rc<dyn EntryObservation>>>,
}

impl FidState {
    fn handle(&self, entry: &PerformanceEntry) {
        if self.recorded.get() || !self.first_hidden.precedes(entry.start_time) {
            return;
        }
        let Some(processing_start) = entry.processing_start else {
            log::debug!("first-input entry without processingStart, ignoring");
            return;
        };
        log::debug!("[Measurements] Adding FID");
        self.measurements
            .record(MEASUREMENT_FID, processing_start - entry.start_time);
        self.measurements.record(
            MEASUREMENT_MARK_FID,
            origin_relative(self.time_origin, entry.start_time),
        );
        self.recorded.set(true);
        self.disconnect();
    }

    fn disconnect(&self) {
        let observation = self.observation.borrow_mut().take();
        if let Some(observation) = observation {
            observation.disconnect();
        }
    }
}

impl FidObserver {
    pub fn install(
        env: &dyn PerformanceEnvironment,
        time_origin: f64,
        first_hidden: FirstHidden,
        measurements: MeasurementSender,
    ) -> Self {
        let state = Rc::new(FidState {
            first_hidden,
            measurements,
            time_origin,
            recorded: Cell::new(false),
            observation: RefCell::new(None),
        });

        let handler = Rc::clone(&state);
        match env.observe(
            ENTRY_TYPE_FIRST_INPUT,
            Box::new(move |entry: &PerformanceEntry| handler.handle(entry)),
        ) {
            Ok(observation) => *state.observation.borrow_mut() = Some(observation),
            Err(err) => log::debug!("FID observer disabled: {err}"),
        }

        Self { state }
    }

    pub fn is_recorded(&self) -> bool {
        self.state.recorded.get()
    }

    pub fn is_connected(&self) -> bool {
        self.state.observation.borrow().is_some()
    }

    pub(crate) fn teardown(&mut self) {
        self.state.disconnect();
    }
}
