//! Remote state survey

use anyhow::Result;

use deploy_orchestration::{DeployConfig, Fleet, survey};
use remote_exec::SshChannel;

/// Print a YAML snapshot of deployment-relevant remote state
pub async fn run(config: &DeployConfig) -> Result<()> {
    let fleet = Fleet::standard(config);
    let channel = SshChannel::new(config.target.ssh_config());

    let report = survey(&channel, config, &fleet).await?;
    print!("{}", serde_yaml::to_string(&report)?);
    Ok(())
}
