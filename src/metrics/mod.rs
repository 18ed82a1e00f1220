#![doc = include_str!("README.md")]
mod api;
pub mod constants;
pub mod entry;
pub mod error;
pub mod measurements;
pub mod observers;
mod settings;
pub mod spans;
pub mod timing;
pub mod visibility;

#[doc(inline)]
pub use api::{is_supported, MetricsInstrumentation};

#[doc(inline)]
pub use entry::{EntryKind, NavigationPhase, PerformanceEntry};

#[doc(inline)]
pub use error::{
    environment_unavailable, internal_error, unsupported_entry_type, MetricsError,
    MetricsErrorCode, MetricsResult,
};

#[doc(inline)]
pub use measurements::{Measurement, MeasurementSender, MeasurementStore, Measurements};

#[doc(inline)]
pub use observers::{FidObserver, LcpObserver};

#[doc(inline)]
pub use settings::MetricsSettings;

#[doc(inline)]
pub use visibility::FirstHidden;
