use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::platform::environment::instrumentation_defaults;

/// Switches for the browser metrics instrumentation. Everything is on by default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsSettings {
    pub instrumentation_enabled: bool,
    pub track_lcp: bool,
    pub track_fid: bool,
    /// Insert the tracing-init mark into the timeline at construction.
    pub record_init_mark: bool,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            instrumentation_enabled: true,
            track_lcp: true,
            track_fid: true,
            record_init_mark: true,
        }
    }
}

impl MetricsSettings {
    /// Settings from `__WEB_VITALS_DEFAULTS__`, or the defaults when none are provided.
    pub fn from_defaults() -> Self {
        instrumentation_defaults()
            .map(Self::from_value)
            .unwrap_or_default()
    }

    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|err| {
            log::debug!("invalid instrumentation settings, using defaults: {err}");
            Self::default()
        })
    }
}
