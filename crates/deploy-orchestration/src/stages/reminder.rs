//! Infra-config reminder stage

use async_trait::async_trait;
use tracing::info;

use crate::Result;
use crate::stage::Stage;
use remote_exec::RemoteChannel;

/// Reminds the operator about externally provisioned configuration
///
/// Credentials and the ingestion endpoints referenced by the shipper payload
/// are provisioned by separate tooling; this stage only surfaces that fact
/// in the run log and never touches the host.
pub struct InfraReminder;

impl InfraReminder {
    /// Create the reminder stage
    pub fn new() -> Self {
        Self
    }
}

impl Default for InfraReminder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Stage for InfraReminder {
    fn name(&self) -> &'static str {
        "infra-config-reminder"
    }

    async fn is_satisfied(&self, _host: &dyn RemoteChannel) -> Result<bool> {
        Ok(false)
    }

    async fn apply(&self, _host: &dyn RemoteChannel) -> Result<Vec<String>> {
        info!(
            "reminder: ingestion credentials and endpoint configuration are \
             provisioned by external tooling and must already be in place"
        );
        Ok(vec![])
    }
}
