//! Test infrastructure for the table persistence layer.
//!
//! This module provides fixtures and a scripted executor shared by the
//! integration tests.

#![allow(dead_code)]

pub mod executor;
pub mod fixtures;

// Re-export commonly used items
pub use executor::*;
pub use fixtures::*;
