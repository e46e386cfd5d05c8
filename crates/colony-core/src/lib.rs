//! Core types and utilities for the ant clustering simulation.

pub mod types;
pub mod config;
pub mod error;
pub mod entropy;

pub use error::{Error, Result};
pub use types::*;
pub use config::*;
