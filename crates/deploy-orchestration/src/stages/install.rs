//! Idempotent tool installation

use async_trait::async_trait;
use tracing::info;

use crate::stage::Stage;
use crate::{Result, remote};
use remote_exec::RemoteChannel;

/// Installs a named tool only if a presence probe says it is absent
///
/// Tool installation is deliberately run-once: presence does not drift
/// between runs, unlike the Python dependencies handled by the environment
/// stage. Package installation is assumed atomic at the package-manager
/// level; a non-zero install exit aborts the run.
pub struct ToolInstall {
    name: &'static str,
    tool: String,
    probe_cmd: String,
    install_cmd: String,
}

impl ToolInstall {
    /// Generic constructor
    pub fn new(
        name: &'static str,
        tool: impl Into<String>,
        probe_cmd: impl Into<String>,
        install_cmd: impl Into<String>,
    ) -> Self {
        Self {
            name,
            tool: tool.into(),
            probe_cmd: probe_cmd.into(),
            install_cmd: install_cmd.into(),
        }
    }

    /// Base system packages every later stage relies on
    pub fn base_packages() -> Self {
        Self::new(
            "base-packages",
            "base packages",
            "command -v rsync >/dev/null 2>&1 && \
             command -v curl >/dev/null 2>&1 && \
             command -v python3 >/dev/null 2>&1",
            "sudo DEBIAN_FRONTEND=noninteractive apt-get update -qq && \
             sudo DEBIAN_FRONTEND=noninteractive apt-get install -y -qq \
             rsync curl python3-venv python3-pip",
        )
    }

    /// The Suricata sensor package
    pub fn suricata() -> Self {
        Self::new(
            "sensor-install",
            "suricata",
            remote::tool_present("suricata"),
            "sudo DEBIAN_FRONTEND=noninteractive apt-get install -y -qq suricata",
        )
    }

    /// The Vector log shipper, via the vendor repository setup script
    pub fn vector() -> Self {
        Self::new(
            "shipper-install",
            "vector",
            remote::tool_present("vector"),
            "curl -fsSL https://setup.vector.dev | sudo bash && \
             sudo DEBIAN_FRONTEND=noninteractive apt-get install -y -qq vector",
        )
    }
}

#[async_trait]
impl Stage for ToolInstall {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn is_satisfied(&self, host: &dyn RemoteChannel) -> Result<bool> {
        remote::probe(host, &self.probe_cmd).await
    }

    async fn apply(&self, host: &dyn RemoteChannel) -> Result<Vec<String>> {
        info!(tool = %self.tool, "installing");
        remote::run_fatal(host, &self.install_cmd).await?;
        // Postcondition: the tool must now resolve
        remote::run_fatal(host, &self.probe_cmd).await?;
        Ok(vec![])
    }
}
