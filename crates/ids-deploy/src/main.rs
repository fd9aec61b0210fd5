//! `ids-deploy` — deploys the IDS sensor fleet to a remote host

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use deploy_orchestration::{DeployConfig, Target};

mod commands;

#[derive(Parser)]
#[command(name = "ids-deploy")]
#[command(about = "Deploys and verifies the IDS sensor fleet on a remote host")]
#[command(version)]
struct Cli {
    /// Target host address (default: $IDS_TARGET_HOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Login user on the target (default: $IDS_TARGET_USER)
    #[arg(long, global = true)]
    user: Option<String>,

    /// SSH port
    #[arg(long, global = true, default_value_t = 22)]
    port: u16,

    /// Private key file
    #[arg(short, long, global = true)]
    identity: Option<PathBuf>,

    /// Remote base directory (default: $IDS_REMOTE_DIR, then /opt/ids)
    #[arg(long, global = true)]
    remote_dir: Option<String>,

    /// Capture interface on the target
    #[arg(long, global = true, default_value = "eth0")]
    interface: String,

    /// Local directory holding the configuration payloads
    #[arg(long, global = true, default_value = "assets")]
    assets_dir: PathBuf,

    /// Local code tree mirrored to the target
    #[arg(long, global = true, default_value = ".")]
    source_dir: PathBuf,

    /// Settling delay between dependent service starts, in seconds
    #[arg(long, global = true, default_value_t = 5)]
    settle_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full deployment stage sequence
    Deploy,

    /// Probe service liveness and the dashboard health endpoint
    Verify,

    /// Survey remote state without changing anything
    Status,
}

impl Cli {
    /// Resolve the run configuration once, at entry
    ///
    /// Environment fallbacks are read here and nowhere else; every component
    /// downstream receives the immutable configuration object.
    fn deploy_config(&self) -> Result<DeployConfig> {
        let host = resolve(self.host.clone(), "IDS_TARGET_HOST")
            .context("target host required (--host or IDS_TARGET_HOST)")?;
        let user = resolve(self.user.clone(), "IDS_TARGET_USER")
            .context("target user required (--user or IDS_TARGET_USER)")?;
        let base_dir =
            resolve(self.remote_dir.clone(), "IDS_REMOTE_DIR").unwrap_or_else(|| "/opt/ids".into());

        let mut target = Target::new(host, user, base_dir).with_port(self.port);
        if let Some(identity) = &self.identity {
            target = target.with_identity_file(identity.clone());
        }
        target.validate()?;

        Ok(DeployConfig::new(
            target,
            self.interface.as_str(),
            self.assets_dir.clone(),
            self.source_dir.clone(),
        )
        .with_settle_secs(self.settle_secs))
    }
}

fn resolve(flag: Option<String>, var: &str) -> Option<String> {
    flag.or_else(|| std::env::var(var).ok())
        .filter(|v| !v.trim().is_empty())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.deploy_config()?;

    smol::block_on(async {
        match cli.command {
            Commands::Deploy => commands::deploy::run(&config).await,
            Commands::Verify => commands::verify::run(&config).await,
            Commands::Status => commands::status::run(&config).await,
        }
    })
}
