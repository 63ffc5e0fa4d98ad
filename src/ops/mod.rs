//! High-level operations.
//!
//! This module contains the implementation of jbindgen commands.

pub mod generate;

pub use generate::{generate, GenerateOptions, GenerateReport, UnitFailure};
