//! Remote runtime environment provisioning

use async_trait::async_trait;
use tracing::info;

use crate::stage::Stage;
use crate::{Result, remote};
use remote_exec::RemoteChannel;

/// Ensures the isolated runtime environment and its dependencies
///
/// The virtualenv is created only when absent, but dependency installation
/// from the declared specification runs every time: dependency versions
/// drift between runs, tool presence does not.
pub struct Environment {
    venv: String,
    requirements: String,
}

impl Environment {
    /// Create the environment stage
    pub fn new(venv: String, requirements: String) -> Self {
        Self { venv, requirements }
    }
}

#[async_trait]
impl Stage for Environment {
    fn name(&self) -> &'static str {
        "environment"
    }

    async fn is_satisfied(&self, _host: &dyn RemoteChannel) -> Result<bool> {
        Ok(false)
    }

    async fn apply(&self, host: &dyn RemoteChannel) -> Result<Vec<String>> {
        if !remote::probe(host, &remote::venv_present(&self.venv)).await? {
            remote::run_fatal(host, &remote::create_venv(&self.venv)).await?;
            info!(venv = %self.venv, "virtualenv created");
        }
        remote::run_fatal(host, &remote::pip_install(&self.venv, &self.requirements)).await?;
        info!(spec = %self.requirements, "dependencies installed");
        Ok(vec![])
    }
}
