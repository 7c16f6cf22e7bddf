//! Subcommand implementations.

pub mod backend;
pub mod migrate;
