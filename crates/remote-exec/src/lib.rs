//! Remote command and file-transfer channel
//!
//! This crate provides the single seam between the deploy orchestrator and a
//! remote host: run a shell command, copy files in either direction, and
//! mirror a directory tree. The [`RemoteChannel`] trait is the injectable
//! capability; [`SshChannel`] is the production implementation backed by the
//! `ssh`, `scp` and `rsync` CLIs.

#![warn(missing_docs)]

pub mod channel;
pub mod command;
pub mod error;
pub mod output;
pub mod ssh;

pub use channel::RemoteChannel;
pub use command::Command;
pub use error::{Error, Result};
pub use output::{ExecOutput, ExitStatus};
pub use ssh::{SshChannel, SshConfig};
