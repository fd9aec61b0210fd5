//! Post-deployment verification

use async_trait::async_trait;
use tracing::{info, warn};

use crate::fleet::Fleet;
use crate::stage::Stage;
use crate::{Result, remote};
use remote_exec::RemoteChannel;

/// Probes liveness of every managed service and the dashboard health endpoint
///
/// Verification is diagnostic, not authoritative: it runs after the stateful
/// part of the deployment has completed, and unhealthy results are surfaced
/// as warnings so the operator gets the full picture instead of a truncated
/// log. Only channel failures abort.
pub struct Verification {
    services: Vec<(String, String)>,
    health_url: String,
}

impl Verification {
    /// Create the verification stage for a fleet
    pub fn new(fleet: &Fleet) -> Self {
        Self {
            services: fleet
                .services
                .iter()
                .map(|s| (s.name.clone(), s.unit.clone()))
                .collect(),
            health_url: fleet.health_url.clone(),
        }
    }
}

#[async_trait]
impl Stage for Verification {
    fn name(&self) -> &'static str {
        "verification"
    }

    async fn is_satisfied(&self, _host: &dyn RemoteChannel) -> Result<bool> {
        Ok(false)
    }

    async fn apply(&self, host: &dyn RemoteChannel) -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        for (name, unit) in &self.services {
            if remote::probe(host, &remote::unit_active(unit)).await? {
                info!(service = %name, unit = %unit, "service is active");
            } else {
                let message = format!("service {} ({}) is not active", name, unit);
                warn!("{}", message);
                warnings.push(message);
            }
        }

        let out = host.run(&remote::http_health(&self.health_url)).await?;
        if out.success() {
            info!(url = %self.health_url, "dashboard health check passed");
        } else {
            let message = format!(
                "dashboard health check failed ({}): {}",
                self.health_url,
                out.stderr.trim()
            );
            warn!("{}", message);
            warnings.push(message);
        }

        Ok(warnings)
    }
}
