//! Data Transfer Objects
//!
//! Request shapes accepted at the boundary of the runner: script creation,
//! batch submission and paging through stored scripts.

pub mod batch;
pub mod page;
pub mod script;
