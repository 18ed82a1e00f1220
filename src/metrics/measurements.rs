use std::collections::BTreeMap;

use async_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::metrics::constants::OVERWRITABLE_MEASUREMENTS;

/// A single web-vital value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
}

impl Measurement {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

/// Metric name to value, serialized as `{"fcp":{"value":250.0}}`.
pub type Measurements = BTreeMap<String, Measurement>;

#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementUpdate {
    pub name: &'static str,
    pub value: f64,
}

/// Write handle given to the asynchronous observers.
#[derive(Clone, Debug)]
pub struct MeasurementSender {
    sender: Sender<MeasurementUpdate>,
}

impl MeasurementSender {
    pub fn record(&self, name: &'static str, value: f64) {
        if let Err(err) = self.sender.try_send(MeasurementUpdate { name, value }) {
            log::debug!("dropping measurement {name}: {err}");
        }
    }
}

/// Accumulates measurements for the lifetime of the instrumentation.
///
/// Observers push updates through a [`MeasurementSender`]; the store is the only owner of the
/// values and folds pending updates in arrival order before any read, so everything sent before
/// a read is visible to it. Each key is written once, except the LCP pair which later, larger
/// candidates replace.
#[derive(Debug)]
pub struct MeasurementStore {
    values: Measurements,
    sender: Sender<MeasurementUpdate>,
    receiver: Receiver<MeasurementUpdate>,
}

impl MeasurementStore {
    pub fn new() -> Self {
        let (sender, receiver) = async_channel::unbounded();
        Self {
            values: Measurements::new(),
            sender,
            receiver,
        }
    }

    pub fn sender(&self) -> MeasurementSender {
        MeasurementSender {
            sender: self.sender.clone(),
        }
    }

    pub fn record(&mut self, name: &'static str, value: f64) {
        self.drain_pending();
        self.apply(MeasurementUpdate { name, value });
    }

    pub fn get(&mut self, name: &str) -> Option<Measurement> {
        self.drain_pending();
        self.values.get(name).copied()
    }

    pub fn snapshot(&mut self) -> Measurements {
        self.drain_pending();
        self.values.clone()
    }

    fn drain_pending(&mut self) {
        while let Ok(update) = self.receiver.try_recv() {
            self.apply(update);
        }
    }

    fn apply(&mut self, update: MeasurementUpdate) {
        if self.values.contains_key(update.name) && !OVERWRITABLE_MEASUREMENTS.contains(&update.name) {
            log::debug!("[Measurements] {} already recorded, ignoring", update.name);
            return;
        }
        self.values
            .insert(update.name.to_string(), Measurement::new(update.value));
    }
}

impl Default for MeasurementStore {
    fn default() -> Self {
        Self::new()
    }
}
