//! tick-collateral: exports the collateral backing the active loans at a
//! lending pool tick to a CSV report.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod cli;
pub mod config;
pub mod types;
pub mod subgraph;
pub mod export;
