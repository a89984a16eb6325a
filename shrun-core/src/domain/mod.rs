//! Core domain types
//!
//! These types describe stored scripts and the jobs built from them. They are
//! shared between the script repository (which owns records) and the runner
//! (which turns records into jobs and reports on them).

pub mod batch;
pub mod job;
pub mod script;
