//! Settlement-cluster energy access planning engine.
//!
//! Scores clusters on a weighted multi-criteria index, recommends an
//! electrification solution, projects demand to a horizon year, and compares
//! intervention scenarios against a shared baseline.

pub mod cluster;
pub mod config;
pub mod demand;
pub mod error;
pub mod io;
pub mod job;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod scenario;
pub mod scoring;

pub use error::{Error, Result};
