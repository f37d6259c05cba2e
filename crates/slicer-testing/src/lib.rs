//! Testing infrastructure for slicer integration tests.
//!
//! - `fixtures`: query results for the common dashboard shapes
//! - `assertions`: structural checks on nested tables and series
//! - `logging`: one-time tracing setup that writes to captured test output

pub mod assertions;
pub mod fixtures;
pub mod logging;

pub use logging::init_tracing;
