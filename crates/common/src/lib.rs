//! Shared configuration, error taxonomy, and core types for herald.

pub mod config;
pub mod error;
pub mod types;
