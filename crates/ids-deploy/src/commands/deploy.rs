//! Full deployment run

use anyhow::Result;

use deploy_orchestration::{DeployConfig, Fleet, Sequencer};
use remote_exec::SshChannel;

/// Execute the full stage sequence against the configured target
pub async fn run(config: &DeployConfig) -> Result<()> {
    let fleet = Fleet::standard(config);
    let sequencer = Sequencer::standard(config, &fleet)?;
    let channel = SshChannel::new(config.target.ssh_config());

    println!(
        "Deploying to {}@{} ({} stages)...",
        config.target.user,
        config.target.host,
        sequencer.stage_names().len()
    );

    let outcome = sequencer.run(&channel).await;

    println!();
    for report in &outcome.stages {
        println!("  {:<24} {}", report.stage, report.status);
    }
    let warnings: Vec<_> = outcome.warnings().collect();
    if !warnings.is_empty() {
        println!();
        for (stage, warning) in warnings {
            println!("  warning [{}]: {}", stage, warning);
        }
    }
    println!();

    match outcome.failed_stage() {
        Some(failed) => anyhow::bail!(
            "deployment failed at stage '{}': {}",
            failed.stage,
            failed.detail.as_deref().unwrap_or("unknown error")
        ),
        None => {
            println!("Deployment complete.");
            Ok(())
        }
    }
}
