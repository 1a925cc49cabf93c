//! Shared utilities for seedvault
//!
//! Helpers that are not specific to secret provisioning itself: logging setup,
//! caller-side retries, durable file writes, and masking of secret values in
//! human-facing output.

pub mod atomic_file;
pub mod output_filter;
pub mod retry;
pub mod tracing;

pub use atomic_file::*;
pub use output_filter::*;
pub use retry::*;
