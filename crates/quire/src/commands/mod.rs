//! Subcommand implementations.

pub mod build;
pub mod serve;
