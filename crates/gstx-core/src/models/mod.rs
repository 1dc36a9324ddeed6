//! Record, report and configuration models.

pub mod config;
pub mod record;
pub mod report;
