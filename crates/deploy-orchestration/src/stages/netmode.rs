//! Capture-mode interface configuration

use async_trait::async_trait;
use tracing::info;

use crate::stage::Stage;
use crate::{Result, remote, stages, unit};
use remote_exec::RemoteChannel;

/// Puts the capture interface into promiscuous mode, now and across reboots
///
/// The immediate `ip link` change takes effect for the current boot; the
/// generated oneshot unit re-applies it on every subsequent boot. Both
/// effects are no-ops when already in place.
pub struct CaptureMode {
    interface: String,
    unit_text: String,
    unit_path: String,
    staging_dir: String,
    staging_path: String,
}

impl CaptureMode {
    /// Create the capture-mode stage for an interface
    pub fn new(interface: impl Into<String>, staging_dir: String) -> Self {
        let interface = interface.into();
        let unit_text = unit::render_capture_unit(&interface);
        let unit_path = unit::unit_path(crate::fleet::CAPTURE_UNIT);
        let staging_path = format!("{}/{}", staging_dir, crate::fleet::CAPTURE_UNIT);
        Self {
            interface,
            unit_text,
            unit_path,
            staging_dir,
            staging_path,
        }
    }
}

#[async_trait]
impl Stage for CaptureMode {
    fn name(&self) -> &'static str {
        "capture-mode"
    }

    async fn is_satisfied(&self, host: &dyn RemoteChannel) -> Result<bool> {
        if !remote::probe(host, &remote::promisc_enabled(&self.interface)).await? {
            return Ok(false);
        }
        if !remote::probe(host, &remote::file_exists(&self.unit_path)).await? {
            return Ok(false);
        }
        stages::stage_text(host, &self.unit_text, &self.staging_dir, &self.staging_path).await?;
        remote::probe(
            host,
            &remote::files_identical(&self.staging_path, &self.unit_path),
        )
        .await
    }

    async fn apply(&self, host: &dyn RemoteChannel) -> Result<Vec<String>> {
        remote::run_fatal(host, &remote::enable_promisc(&self.interface)).await?;
        info!(interface = %self.interface, "promiscuous mode enabled");

        stages::stage_text(host, &self.unit_text, &self.staging_dir, &self.staging_path).await?;
        remote::run_fatal(
            host,
            &remote::install_file(&self.staging_path, &self.unit_path, "root", "root", "0644"),
        )
        .await?;
        info!(unit = %self.unit_path, "boot-time capture unit written");
        Ok(vec![])
    }
}
