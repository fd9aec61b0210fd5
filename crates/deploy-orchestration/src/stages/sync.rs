//! Code tree mirroring

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use crate::stage::Stage;
use crate::{Error, Result, remote};
use remote_exec::RemoteChannel;

/// Patterns excluded from the mirror: build caches, virtualenvs, VCS metadata
pub const DEFAULT_EXCLUDES: &[&str] = &[".git", "__pycache__", "*.pyc", "venv", ".venv"];

/// Deletion-aware one-directional mirror of the managed code tree
///
/// The only stage permitted to delete remote files, and only within the
/// mirrored subtree.
pub struct CodeSync {
    source: PathBuf,
    dest: String,
    excludes: Vec<String>,
}

impl CodeSync {
    /// Create the sync stage
    pub fn new(source: PathBuf, dest: String, excludes: Vec<String>) -> Self {
        Self {
            source,
            dest,
            excludes,
        }
    }
}

#[async_trait]
impl Stage for CodeSync {
    fn name(&self) -> &'static str {
        "code-sync"
    }

    async fn is_satisfied(&self, _host: &dyn RemoteChannel) -> Result<bool> {
        // The mirror itself is differential; unchanged files are left alone
        Ok(false)
    }

    async fn apply(&self, host: &dyn RemoteChannel) -> Result<Vec<String>> {
        if !self.source.is_dir() {
            return Err(Error::Config(format!(
                "source tree not found: {}",
                self.source.display()
            )));
        }
        remote::run_fatal(host, &remote::make_dir(&self.dest)).await?;
        host.mirror(&self.source, &self.dest, &self.excludes).await?;
        info!(source = %self.source.display(), dest = %self.dest, "code tree mirrored");
        Ok(vec![])
    }
}
