//! Command-line front end for the field table model.
//!
//! The binary loads a field table YAML file, runs one query or edit from
//! the `field_table` crate and, for edits, writes the table back.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
