//! # CTD Common Library
//!
//! Shared code for the CTD (Clinical Trajectory Dashboard) services including:
//! - Assessment tool registry (Tool enum, severity bands, sheet mapping)
//! - Field coercion helpers for spreadsheet cells
//! - Database schema, row models, and queries
//! - Configuration loading

pub mod coerce;
pub mod config;
pub mod db;
pub mod error;
pub mod tools;

pub use error::{Error, Result};
pub use tools::{SeverityBand, Tool};
