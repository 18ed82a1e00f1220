#![doc = include_str!("RUSTDOC.md")]

pub mod metrics;
pub mod platform;
pub mod trace;

#[cfg(test)]
pub mod test_support;
