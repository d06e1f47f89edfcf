//! Candidate screening for recruiting: spreadsheet import, rule-based
//! scoring, status resolution and invitation outreach.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
