//! # Deploy orchestration
//!
//! Staged deployment of a small fleet of interdependent services — an
//! intrusion-detection sensor, a log-shipping agent and a monitoring
//! dashboard — onto a single remote host reachable over SSH.
//!
//! The [`Sequencer`] drives a fixed, totally ordered list of [`Stage`]s:
//! connectivity, package installation, configuration publishing, capture-mode
//! setup, code sync, environment provisioning, unit generation, activation
//! and verification. Every stage probes remote state before acting, so a run
//! interrupted at any point can simply be re-invoked.
//!
//! ## Example
//!
//! ```no_run
//! use deploy_orchestration::{DeployConfig, Fleet, Sequencer, Target};
//! use remote_exec::SshChannel;
//!
//! # async fn example() -> deploy_orchestration::Result<()> {
//! let target = Target::new("10.0.0.17", "pi", "/opt/ids");
//! let config = DeployConfig::new(target, "eth0", "assets", ".");
//! let fleet = Fleet::standard(&config);
//!
//! let sequencer = Sequencer::standard(&config, &fleet)?;
//! let channel = SshChannel::new(config.target.ssh_config());
//! let outcome = sequencer.run(&channel).await;
//! assert!(outcome.succeeded());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod fleet;
mod remote;
pub mod sequencer;
pub mod stage;
pub mod stages;
pub mod survey;
pub mod target;
pub mod unit;

pub use fleet::{ConfigArtifact, Fleet, RestartPolicy, ServiceDescriptor};
pub use sequencer::Sequencer;
pub use stage::{RunOutcome, RunState, Stage, StageReport, StageStatus};
pub use survey::{StatusReport, survey};
pub use target::{DeployConfig, Target};

use remote_exec::ExecOutput;

/// Error types for orchestration operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The remote channel itself failed (connection, transfer, mirror)
    #[error("channel error: {0}")]
    Channel(#[from] remote_exec::Error),

    /// A remote command exited non-zero in a context where that is fatal
    #[error("remote command `{command}` exited with status {code:?}: {stderr}")]
    Remote {
        /// The command that failed
        command: String,
        /// The remote exit code, if the command exited normally
        code: Option<i32>,
        /// Captured standard error from the remote command
        stderr: String,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Service ordering relations are inconsistent with the required chain
    #[error("ordering error: {0}")]
    Ordering(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a [`Error::Remote`] from a failed command's captured output
    pub fn remote(command: impl Into<String>, out: &ExecOutput) -> Self {
        Self::Remote {
            command: command.into(),
            code: out.status.code,
            stderr: out.stderr.trim().to_string(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
