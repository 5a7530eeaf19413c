//! Utility functions and helper modules.
//!
//! Currently holds the injectable clock used by caches and the forecast service.

pub mod clock;

pub use clock::*;
