//! Configuration structures and loading utilities.
//!
//! This module contains all configuration structures used by the application,
//! including environment variable loading and default values.

pub mod provider;
pub mod resilient_client;
pub mod weather_codes;

pub use provider::*;
pub use weather_codes::*;

/// Serializes tests that modify environment variables
#[cfg(test)]
pub(crate) static ENV_MUTEX: parking_lot::Mutex<()> = parking_lot::const_mutex(());
