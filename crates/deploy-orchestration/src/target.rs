//! Remote target identity and per-run configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};
use remote_exec::SshConfig;

/// The remote host a run deploys to
///
/// Constructed once at entry from arguments and environment fallbacks, then
/// passed by reference into every component; immutable for the run's
/// duration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Target {
    /// Network address of the host
    pub host: String,
    /// Login principal
    pub user: String,
    /// SSH port
    pub port: u16,
    /// Optional private-key reference
    pub identity_file: Option<PathBuf>,
    /// Remote base directory for everything this tool manages
    pub base_dir: String,
}

impl Target {
    /// Create a target with the default SSH port
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        base_dir: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            port: 22,
            identity_file: None,
            base_dir: base_dir.into(),
        }
    }

    /// Set a non-default SSH port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the private-key file
    pub fn with_identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// Reject targets that are missing required fields
    ///
    /// Must pass before any remote action is attempted.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("target host must not be empty".into()));
        }
        if self.user.trim().is_empty() {
            return Err(Error::Config("target user must not be empty".into()));
        }
        if self.base_dir.trim().is_empty() || !self.base_dir.starts_with('/') {
            return Err(Error::Config(format!(
                "remote base directory must be an absolute path, got {:?}",
                self.base_dir
            )));
        }
        Ok(())
    }

    /// Convert into the SSH channel configuration
    pub fn ssh_config(&self) -> SshConfig {
        let mut config = SshConfig::new(&self.host).with_user(&self.user);
        if self.port != 22 {
            config = config.with_port(self.port);
        }
        if let Some(identity) = &self.identity_file {
            config = config.with_identity_file(identity.clone());
        }
        config
    }
}

/// Everything a single deployment run needs to know
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// The remote host
    pub target: Target,
    /// Capture interface for the sensor
    pub interface: String,
    /// Local directory holding the configuration payloads
    pub assets_dir: PathBuf,
    /// Local code tree mirrored to the remote host
    pub source_dir: PathBuf,
    /// Settling delay between starting a dependency and its dependent, seconds
    pub settle_secs: u64,
}

impl DeployConfig {
    /// Build a run configuration with the default settling delay
    pub fn new(
        target: Target,
        interface: impl Into<String>,
        assets_dir: impl Into<PathBuf>,
        source_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            target,
            interface: interface.into(),
            assets_dir: assets_dir.into(),
            source_dir: source_dir.into(),
            settle_secs: 5,
        }
    }

    /// Override the settling delay (tests set this to zero)
    pub fn with_settle_secs(mut self, secs: u64) -> Self {
        self.settle_secs = secs;
        self
    }

    /// The settling delay as a [`Duration`]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    /// Remote directory the code tree is mirrored into
    pub fn app_dir(&self) -> String {
        format!("{}/app", self.target.base_dir)
    }

    /// Remote virtualenv directory
    pub fn venv_dir(&self) -> String {
        format!("{}/venv", self.target.base_dir)
    }

    /// Remote staging directory for uploads awaiting installation
    pub fn staging_dir(&self) -> String {
        format!("{}/.staging", self.target.base_dir)
    }

    /// Remote path of the dependency specification inside the mirrored tree
    pub fn requirements_path(&self) -> String {
        format!("{}/requirements.txt", self.app_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_fields() {
        assert!(Target::new("", "pi", "/opt/ids").validate().is_err());
        assert!(Target::new("10.0.0.1", "", "/opt/ids").validate().is_err());
        assert!(Target::new("10.0.0.1", "pi", "").validate().is_err());
        assert!(
            Target::new("10.0.0.1", "pi", "relative/dir")
                .validate()
                .is_err()
        );
        assert!(Target::new("10.0.0.1", "pi", "/opt/ids").validate().is_ok());
    }

    #[test]
    fn test_remote_paths_derive_from_base_dir() {
        let target = Target::new("10.0.0.1", "pi", "/opt/ids");
        let config = DeployConfig::new(target, "eth0", "assets", ".");

        assert_eq!(config.app_dir(), "/opt/ids/app");
        assert_eq!(config.venv_dir(), "/opt/ids/venv");
        assert_eq!(config.requirements_path(), "/opt/ids/app/requirements.txt");
    }

    #[test]
    fn test_settle_delay_override() {
        let target = Target::new("10.0.0.1", "pi", "/opt/ids");
        let config = DeployConfig::new(target, "eth0", "assets", ".").with_settle_secs(0);
        assert_eq!(config.settle_delay(), Duration::ZERO);
    }
}
