//! CLI commands

pub mod config;
pub mod probe;
pub mod replay;
