pub mod browser;
pub mod environment;
pub mod memory;
pub mod performance;

pub use memory::InMemoryEnvironment;
pub use performance::{
    EntryCallback, EntryObservation, ListenerId, PerformanceEnvironment, ScriptElement,
    VisibilityCallback, VisibilityEvent, VisibilityState,
};
