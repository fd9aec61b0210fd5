//! Dependency-ordered service activation

use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

use crate::stage::Stage;
use crate::{Result, remote};
use remote_exec::RemoteChannel;

/// Enables and starts every unit in validated chain order
///
/// A fixed settling delay separates starting a dependency from starting its
/// dependent: the service manager's own "active" signal does not guarantee
/// the dependency has finished its internal warm-up. Any unit that fails to
/// reach active state aborts the run; startup cannot safely continue past a
/// broken link in the chain.
pub struct Activation {
    order: Vec<String>,
    settle: Duration,
}

impl Activation {
    /// Create the activation stage from a validated activation order
    pub fn new(order: Vec<String>, settle: Duration) -> Self {
        Self { order, settle }
    }
}

#[async_trait]
impl Stage for Activation {
    fn name(&self) -> &'static str {
        "activation"
    }

    async fn is_satisfied(&self, host: &dyn RemoteChannel) -> Result<bool> {
        for unit in &self.order {
            if !remote::probe(host, &remote::unit_enabled(unit)).await? {
                return Ok(false);
            }
            if !remote::probe(host, &remote::unit_active(unit)).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn apply(&self, host: &dyn RemoteChannel) -> Result<Vec<String>> {
        for unit in &self.order {
            remote::run_fatal(host, &remote::enable_unit(unit)).await?;
            remote::run_fatal(host, &remote::start_unit(unit)).await?;
            if !self.settle.is_zero() {
                async_io::Timer::after(self.settle).await;
            }
            remote::run_fatal(host, &remote::unit_active(unit)).await?;
            info!(unit = %unit, "service active");
        }
        Ok(vec![])
    }
}
