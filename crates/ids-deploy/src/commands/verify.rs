//! Standalone verification of an already-deployed target

use anyhow::Result;

use deploy_orchestration::stages::Verification;
use deploy_orchestration::{DeployConfig, Fleet, Stage};
use remote_exec::SshChannel;

/// Probe liveness and the dashboard health endpoint, reporting warnings only
pub async fn run(config: &DeployConfig) -> Result<()> {
    config.target.validate()?;
    let fleet = Fleet::standard(config);
    let channel = SshChannel::new(config.target.ssh_config());

    let warnings = Verification::new(&fleet).apply(&channel).await?;

    if warnings.is_empty() {
        println!("All services healthy.");
    } else {
        for warning in &warnings {
            println!("warning: {}", warning);
        }
        println!("{} warning(s); see log above for details.", warnings.len());
    }
    Ok(())
}
