//! Non-mutating remote state survey
//!
//! Backs the `status` subcommand: answers "what is already on this host"
//! without changing anything.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fleet::Fleet;
use crate::target::DeployConfig;
use crate::{Result, remote, unit};
use remote_exec::RemoteChannel;

/// Presence of a configuration destination and its sentinel backup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigStatus {
    /// Canonical remote path
    pub path: String,
    /// Whether the destination file exists
    pub present: bool,
    /// Whether the sentinel backup exists
    pub backup_present: bool,
}

/// Enablement and liveness of one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitStatus {
    /// Unit file name
    pub unit: String,
    /// Unit file installed on the host
    pub installed: bool,
    /// Enabled for boot-time start
    pub enabled: bool,
    /// Currently active
    pub active: bool,
}

/// Snapshot of the deployment-relevant state of a host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    /// Tool presence by name
    pub tools: BTreeMap<String, bool>,
    /// Configuration destinations
    pub configs: Vec<ConfigStatus>,
    /// Managed units, capture unit first
    pub units: Vec<UnitStatus>,
}

/// Collect a status report from the host
pub async fn survey(
    host: &dyn RemoteChannel,
    config: &DeployConfig,
    fleet: &Fleet,
) -> Result<StatusReport> {
    config.target.validate()?;

    let mut tools = BTreeMap::new();
    for tool in ["rsync", "python3", "suricata", "vector"] {
        let present = remote::probe(host, &remote::tool_present(tool)).await?;
        tools.insert(tool.to_string(), present);
    }

    let mut configs = Vec::new();
    for artifact in &fleet.artifacts {
        configs.push(ConfigStatus {
            path: artifact.remote.clone(),
            present: remote::probe(host, &remote::file_exists(&artifact.remote)).await?,
            backup_present: remote::probe(host, &remote::file_exists(&artifact.backup_path()))
                .await?,
        });
    }

    let mut units = Vec::new();
    let mut unit_names = vec![crate::fleet::CAPTURE_UNIT.to_string()];
    unit_names.extend(fleet.services.iter().map(|s| s.unit.clone()));
    for name in unit_names {
        units.push(UnitStatus {
            installed: remote::probe(host, &remote::file_exists(&unit::unit_path(&name))).await?,
            enabled: remote::probe(host, &remote::unit_enabled(&name)).await?,
            active: remote::probe(host, &remote::unit_active(&name)).await?,
            unit: name,
        });
    }

    Ok(StatusReport {
        tools,
        configs,
        units,
    })
}
