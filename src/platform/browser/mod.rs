//! Browser-backed platform services.

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub mod performance;

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub use performance::WebPerformanceEnvironment;
