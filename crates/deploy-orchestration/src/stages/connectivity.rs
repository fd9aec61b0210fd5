//! Connectivity stage

use async_trait::async_trait;
use tracing::info;

use crate::stage::Stage;
use crate::{Result, remote};
use remote_exec::RemoteChannel;

/// Establishes that the command channel works before anything mutates the host
pub struct Connectivity {
    host_label: String,
}

impl Connectivity {
    /// Create the connectivity stage for a host (label used in logs only)
    pub fn new(host_label: impl Into<String>) -> Self {
        Self {
            host_label: host_label.into(),
        }
    }
}

#[async_trait]
impl Stage for Connectivity {
    fn name(&self) -> &'static str {
        "connectivity"
    }

    async fn is_satisfied(&self, _host: &dyn RemoteChannel) -> Result<bool> {
        // Always probed live; a stale "reachable" answer is worthless
        Ok(false)
    }

    async fn apply(&self, host: &dyn RemoteChannel) -> Result<Vec<String>> {
        let out = remote::run_fatal(host, &remote::hostname()).await?;
        info!(
            target_host = %self.host_label,
            remote_name = %out.stdout.trim(),
            "target reachable"
        );
        Ok(vec![])
    }
}
