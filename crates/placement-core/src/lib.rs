//! Placement office core: drive eligibility, drive lifecycle and placement statistics.

pub mod config;
pub mod error;
pub mod placement;
pub mod telemetry;
