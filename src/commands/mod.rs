//! Command implementations for the CLI
//!
//! - start: Start the prediction server
//! - test: Test configuration validity
//! - schema: Print table DDL
//! - inspect: Show pending telemetry in the snapshot
//! - flush: Push pending telemetry to the store

pub mod flush;
pub mod inspect;
pub mod schema;
pub mod start;
pub mod test;
