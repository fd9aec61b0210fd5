//! Unit descriptor generation

use async_trait::async_trait;
use tracing::info;

use crate::fleet::Fleet;
use crate::stage::Stage;
use crate::{Result, remote, stages, unit};
use remote_exec::RemoteChannel;

/// Materializes one persistent-service unit per managed service
///
/// All units are staged and installed first; a single reload then makes the
/// service manager aware of them together. A failed reload is fatal with no
/// rollback.
pub struct UnitDescriptors {
    entries: Vec<UnitEntry>,
    staging_dir: String,
}

struct UnitEntry {
    unit: String,
    text: String,
    unit_path: String,
    staging_path: String,
}

impl UnitDescriptors {
    /// Render the fleet's unit files and create the stage
    pub fn new(fleet: &Fleet, staging_dir: String) -> Self {
        let entries = fleet
            .services
            .iter()
            .map(|service| UnitEntry {
                unit: service.unit.clone(),
                text: unit::render_service_unit(service),
                unit_path: unit::unit_path(&service.unit),
                staging_path: format!("{}/{}", staging_dir, service.unit),
            })
            .collect();
        Self {
            entries,
            staging_dir,
        }
    }
}

#[async_trait]
impl Stage for UnitDescriptors {
    fn name(&self) -> &'static str {
        "unit-descriptors"
    }

    async fn is_satisfied(&self, host: &dyn RemoteChannel) -> Result<bool> {
        for entry in &self.entries {
            if !remote::probe(host, &remote::file_exists(&entry.unit_path)).await? {
                return Ok(false);
            }
            stages::stage_text(host, &entry.text, &self.staging_dir, &entry.staging_path).await?;
            if !remote::probe(
                host,
                &remote::files_identical(&entry.staging_path, &entry.unit_path),
            )
            .await?
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn apply(&self, host: &dyn RemoteChannel) -> Result<Vec<String>> {
        for entry in &self.entries {
            stages::stage_text(host, &entry.text, &self.staging_dir, &entry.staging_path).await?;
            remote::run_fatal(
                host,
                &remote::install_file(&entry.staging_path, &entry.unit_path, "root", "root", "0644"),
            )
            .await?;
            info!(unit = %entry.unit, "unit descriptor written");
        }
        remote::run_fatal(host, &remote::daemon_reload()).await?;
        Ok(vec![])
    }
}
