//! Shrun Core
//!
//! Core types shared by the shrun batch runner.
//!
//! This crate contains:
//! - Domain types: stored scripts, job descriptors, job states and batch reports
//! - DTOs: request shapes accepted at the boundary (script creation, batch submission, paging)

pub mod domain;
pub mod dto;
