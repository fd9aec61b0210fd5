//! Subcommand implementations

pub mod deploy;
pub mod status;
pub mod verify;
