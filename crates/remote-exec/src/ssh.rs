//! SSH channel implementation using the CLI

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::channel::RemoteChannel;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::output::ExecOutput;

/// Default connection timeout applied to every channel operation, in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// ssh(1) reserves exit status 255 for its own failures, as opposed to the
// exit status of the remote command.
const SSH_FAILURE_EXIT: i32 = 255;

/// SSH connection configuration
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Target host (hostname or IP)
    host: String,
    /// SSH user (optional, uses system default if not specified)
    user: Option<String>,
    /// SSH port (optional, defaults to 22)
    port: Option<u16>,
    /// Path to identity file (private key)
    identity_file: Option<PathBuf>,
    /// Connection timeout in seconds
    connect_timeout: u64,
}

impl SshConfig {
    /// Create a new SSH configuration for the given host
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
            port: None,
            identity_file: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    /// Set the SSH user
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the SSH port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the identity file (private key)
    pub fn with_identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// Set the connection timeout in seconds
    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout = secs;
        self
    }

    /// Get the host string (user@host if user is specified)
    fn host_string(&self) -> String {
        if let Some(user) = &self.user {
            format!("{}@{}", user, self.host)
        } else {
            self.host.clone()
        }
    }

    /// Common `-o` options shared by ssh, scp and the rsync transport
    ///
    /// Host keys follow trust-on-first-use: new keys are accepted and
    /// recorded in the local known-hosts store, changed keys are rejected.
    fn common_options(&self) -> Vec<String> {
        vec![
            "-o".into(),
            "BatchMode=yes".into(),
            "-o".into(),
            "StrictHostKeyChecking=accept-new".into(),
            "-o".into(),
            format!("ConnectTimeout={}", self.connect_timeout),
        ]
    }

    /// The ssh invocation rsync should use as its transport
    fn rsync_transport(&self) -> String {
        let mut parts = vec!["ssh".to_string()];
        parts.extend(self.common_options());
        if let Some(port) = self.port {
            parts.push("-p".into());
            parts.push(port.to_string());
        }
        if let Some(identity) = &self.identity_file {
            parts.push("-i".into());
            parts.push(identity.to_string_lossy().into_owned());
        }
        parts.join(" ")
    }
}

/// Remote channel backed by the `ssh`, `scp` and `rsync` CLIs
#[derive(Debug, Clone)]
pub struct SshChannel {
    config: SshConfig,
}

impl SshChannel {
    /// Create a channel for the given connection configuration
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    fn ssh_command(&self) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args(self.config.common_options());
        if let Some(port) = self.config.port {
            cmd.arg("-p").arg(port.to_string());
        }
        if let Some(identity) = &self.config.identity_file {
            cmd.arg("-i").arg(identity);
        }
        cmd.arg(self.config.host_string());
        cmd
    }

    fn scp_command(&self) -> Command {
        let mut cmd = Command::new("scp");
        cmd.args(self.config.common_options());
        // scp preserves modification times and modes with -p, which keeps
        // executable bits on transferred service files intact
        cmd.arg("-p").arg("-q");
        if let Some(port) = self.config.port {
            cmd.arg("-P").arg(port.to_string());
        }
        if let Some(identity) = &self.config.identity_file {
            cmd.arg("-i").arg(identity);
        }
        cmd
    }

    fn remote_spec(&self, remote: &str) -> String {
        format!("{}:{}", self.config.host_string(), remote)
    }
}

#[async_trait]
impl RemoteChannel for SshChannel {
    async fn run(&self, command: &str) -> Result<ExecOutput> {
        let mut cmd = self.ssh_command();
        cmd.arg(command);

        trace!(host = %self.config.host, command, "running remote command");
        let out = cmd.output().await?;

        if out.status.code == Some(SSH_FAILURE_EXIT) {
            return Err(Error::connection_failed(
                &self.config.host,
                out.stderr.trim().to_string(),
            ));
        }

        debug!(
            host = %self.config.host,
            command,
            code = ?out.status.code,
            "remote command finished"
        );
        Ok(out)
    }

    async fn copy_to(&self, local: &Path, remote: &str) -> Result<()> {
        let mut cmd = self.scp_command();
        cmd.arg(local).arg(self.remote_spec(remote));

        debug!(local = %local.display(), remote, "copying to remote");
        let out = cmd.output().await?;
        if !out.success() {
            return Err(Error::transfer_failed(
                local.display().to_string(),
                out.stderr.trim().to_string(),
            ));
        }
        Ok(())
    }

    async fn copy_from(&self, remote: &str, local: &Path) -> Result<()> {
        let mut cmd = self.scp_command();
        cmd.arg(self.remote_spec(remote)).arg(local);

        debug!(remote, local = %local.display(), "copying from remote");
        let out = cmd.output().await?;
        if !out.success() {
            return Err(Error::transfer_failed(
                remote.to_string(),
                out.stderr.trim().to_string(),
            ));
        }
        Ok(())
    }

    async fn mirror(&self, local: &Path, remote: &str, excludes: &[String]) -> Result<()> {
        let mut cmd = Command::new("rsync");
        cmd.arg("-az").arg("--delete");
        for pattern in excludes {
            cmd.arg(format!("--exclude={}", pattern));
        }
        cmd.arg("-e").arg(self.config.rsync_transport());
        // Trailing slash mirrors the directory's contents rather than the
        // directory itself
        let mut source = local.to_string_lossy().into_owned();
        if !source.ends_with('/') {
            source.push('/');
        }
        cmd.arg(source).arg(self.remote_spec(remote));

        debug!(local = %local.display(), remote, "mirroring tree to remote");
        let out = cmd.output().await?;
        if !out.success() {
            return Err(Error::MirrorFailed {
                reason: out.stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Escape a string for safe inclusion in a remote shell command
pub fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s.contains(|c: char| c.is_whitespace() || "\"'\\$`!*?<>|&;()[]{}".contains(c)) {
        // Use single quotes and escape any single quotes in the string
        format!("'{}'", s.replace('\'', "'\"'\"'"))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_escape() {
        assert_eq!(shell_escape("simple"), "simple");
        assert_eq!(shell_escape("with space"), "'with space'");
        assert_eq!(shell_escape("with'quote"), "'with'\"'\"'quote'");
        assert_eq!(shell_escape("$variable"), "'$variable'");
        assert_eq!(shell_escape("path/to/file"), "path/to/file");
        assert_eq!(shell_escape(""), "''");
    }

    #[test]
    fn test_ssh_config() {
        let config = SshConfig::new("example.com")
            .with_user("alice")
            .with_port(2222)
            .with_identity_file("/home/alice/.ssh/id_ed25519");

        assert_eq!(config.host_string(), "alice@example.com");
        assert_eq!(config.port, Some(2222));
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT_SECS);
    }

    #[test]
    fn test_ssh_command_shape() {
        let config = SshConfig::new("10.0.0.5").with_user("pi").with_port(22);
        let channel = SshChannel::new(config);
        let mut cmd = channel.ssh_command();
        cmd.arg("uname -n");

        assert_eq!(cmd.get_program(), "ssh");
        let args: Vec<String> = cmd
            .get_args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.contains(&"StrictHostKeyChecking=accept-new".to_string()));
        assert!(args.contains(&"ConnectTimeout=10".to_string()));
        assert!(args.contains(&"pi@10.0.0.5".to_string()));
        assert_eq!(args.last().unwrap(), "uname -n");
    }

    #[test]
    fn test_rsync_transport_includes_identity() {
        let config = SshConfig::new("host").with_identity_file("/keys/deploy");
        let transport = config.rsync_transport();
        assert!(transport.starts_with("ssh "));
        assert!(transport.contains("-i /keys/deploy"));
    }
}
