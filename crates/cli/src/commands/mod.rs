//! Subcommand implementations

pub mod market;
pub mod predict;
pub mod status;
