//! Configuration publishing with sentinel backups

use async_trait::async_trait;
use tracing::info;

use crate::fleet::ConfigArtifact;
use crate::stage::Stage;
use crate::{Result, remote, stages};
use remote_exec::RemoteChannel;

/// Publishes one configuration payload to its canonical remote path
///
/// If the destination pre-exists and has never been backed up by this
/// orchestrator, the live file is copied to the sentinel backup path before
/// the first overwrite. The payload is staged, compared byte-wise against
/// the live file, and installed with explicit ownership and mode.
pub struct PublishConfig {
    name: &'static str,
    artifact: ConfigArtifact,
    staging_dir: String,
    staging_path: String,
}

impl PublishConfig {
    /// Create a publish stage for one artifact
    pub fn new(name: &'static str, artifact: ConfigArtifact, staging_dir: String) -> Self {
        let file_name = artifact
            .local
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| artifact.service.clone());
        let staging_path = format!("{}/{}", staging_dir, file_name);
        Self {
            name,
            artifact,
            staging_dir,
            staging_path,
        }
    }

    async fn upload_to_staging(&self, host: &dyn RemoteChannel) -> Result<()> {
        stages::stage_file(host, &self.artifact.local, &self.staging_dir, &self.staging_path).await
    }
}

#[async_trait]
impl Stage for PublishConfig {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn is_satisfied(&self, host: &dyn RemoteChannel) -> Result<bool> {
        if !remote::probe(host, &remote::file_exists(&self.artifact.remote)).await? {
            return Ok(false);
        }
        self.upload_to_staging(host).await?;
        remote::probe(
            host,
            &remote::files_identical(&self.staging_path, &self.artifact.remote),
        )
        .await
    }

    async fn apply(&self, host: &dyn RemoteChannel) -> Result<Vec<String>> {
        self.upload_to_staging(host).await?;

        let dest = &self.artifact.remote;
        let backup = self.artifact.backup_path();
        let dest_exists = remote::probe(host, &remote::file_exists(dest)).await?;
        if dest_exists && !remote::probe(host, &remote::file_exists(&backup)).await? {
            remote::run_fatal(host, &remote::copy_preserving(dest, &backup)).await?;
            info!(service = %self.artifact.service, backup = %backup, "preserved pre-existing configuration");
        }

        remote::run_fatal(
            host,
            &remote::install_file(
                &self.staging_path,
                dest,
                &self.artifact.owner,
                &self.artifact.group,
                &self.artifact.mode,
            ),
        )
        .await?;
        info!(service = %self.artifact.service, path = %dest, "configuration published");
        Ok(vec![])
    }
}
