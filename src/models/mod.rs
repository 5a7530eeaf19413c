//! Data models for the weather integration layer.
//!
//! This module contains the domain values (locations, forecasts, conditions),
//! the error taxonomy, provider identity and the upstream wire shapes.

pub mod condition;
pub mod error;
pub mod forecast;
pub mod location;
pub mod open_meteo;
pub mod provider;

pub use condition::*;
pub use error::*;
pub use forecast::*;
pub use location::*;
pub use provider::*;
