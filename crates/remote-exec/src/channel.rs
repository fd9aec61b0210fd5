//! The injectable remote-host capability

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::output::ExecOutput;

/// Capability to act on a single remote host
///
/// Every remote side effect of the orchestrator goes through this trait, so
/// the whole deployment can be exercised against a simulated host. Each
/// invocation of [`run`](RemoteChannel::run) carries exactly one shell
/// command string; the implementation returns the exit status and captured
/// output regardless of whether the command succeeded.
#[async_trait]
pub trait RemoteChannel: Send + Sync {
    /// Run a shell command on the remote host and capture its result
    async fn run(&self, command: &str) -> Result<ExecOutput>;

    /// Copy a local file to a remote path, preserving permission bits
    async fn copy_to(&self, local: &Path, remote: &str) -> Result<()>;

    /// Copy a remote file to a local path
    async fn copy_from(&self, remote: &str, local: &Path) -> Result<()>;

    /// Mirror a local directory tree onto the remote host
    ///
    /// The mirror is one-directional and deletion-aware: remote files absent
    /// locally (and not excluded) are removed. This is the only channel
    /// operation allowed to delete remote files.
    async fn mirror(&self, local: &Path, remote: &str, excludes: &[String]) -> Result<()>;
}
