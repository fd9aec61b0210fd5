//! The managed service fleet
//!
//! Declarative descriptions of the three managed services and their
//! configuration payloads. Descriptors are constructed fresh each run and
//! reconciled against remote state; they carry ordering relations as data so
//! the startup order can be validated without touching the host.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::target::DeployConfig;

/// Unit name of the boot-time capture-mode unit, the root of the ordering chain
pub const CAPTURE_UNIT: &str = "ids-capture.service";

/// Health endpoint the dashboard is expected to serve on the target
pub const DASHBOARD_HEALTH_URL: &str = "http://127.0.0.1:8000/health";

/// Restart behaviour of a managed service: always restart, fixed backoff
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestartPolicy {
    /// Delay before a restart attempt, in seconds
    pub delay_secs: u64,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self { delay_secs: 5 }
    }
}

/// Declarative description of one persistent service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceDescriptor {
    /// Short name ("sensor", "shipper", "dashboard")
    pub name: String,
    /// Unit file name on the remote host
    pub unit: String,
    /// Human-readable description
    pub description: String,
    /// Start command
    pub exec_start: String,
    /// Run-as principal
    pub user: String,
    /// Working directory, if any
    pub working_dir: Option<String>,
    /// Environment bindings
    pub environment: BTreeMap<String, String>,
    /// Units this service must start after
    pub after: Vec<String>,
    /// Units this service hard-requires
    pub requires: Vec<String>,
    /// Units this service wants (soft dependency)
    pub wants: Vec<String>,
    /// Restart policy
    pub restart: RestartPolicy,
}

/// A configuration payload mapped to its canonical remote path
///
/// The payload is an opaque blob; it is copied verbatim and never parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigArtifact {
    /// Service the payload belongs to
    pub service: String,
    /// Local file
    pub local: PathBuf,
    /// Canonical destination on the remote host
    pub remote: String,
    /// Owning principal of the installed file
    pub owner: String,
    /// Owning group of the installed file
    pub group: String,
    /// Octal mode of the installed file
    pub mode: String,
}

impl ConfigArtifact {
    /// The sentinel backup path for this destination
    ///
    /// At most one backup is ever created per destination per host lifetime.
    pub fn backup_path(&self) -> String {
        format!("{}.orig", self.remote)
    }
}

/// The full managed fleet: ordered service descriptors plus their payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fleet {
    /// Services in chain order: sensor, shipper, dashboard
    pub services: Vec<ServiceDescriptor>,
    /// Configuration payloads published before activation
    pub artifacts: Vec<ConfigArtifact>,
    /// Dashboard health endpoint probed during verification
    pub health_url: String,
}

impl Fleet {
    /// The standard three-service fleet for a run configuration
    pub fn standard(config: &DeployConfig) -> Self {
        let sensor = ServiceDescriptor {
            name: "sensor".into(),
            unit: "ids-sensor.service".into(),
            description: "Suricata intrusion detection sensor".into(),
            exec_start: format!(
                "/usr/bin/suricata -c /etc/suricata/suricata.yaml -i {}",
                config.interface
            ),
            user: "root".into(),
            working_dir: None,
            environment: BTreeMap::new(),
            after: vec![CAPTURE_UNIT.into()],
            requires: vec![CAPTURE_UNIT.into()],
            wants: vec![],
            restart: RestartPolicy::default(),
        };

        let shipper = ServiceDescriptor {
            name: "shipper".into(),
            unit: "ids-shipper.service".into(),
            description: "Vector log shipper".into(),
            exec_start: "/usr/bin/vector --config /etc/vector/vector.toml".into(),
            user: "root".into(),
            working_dir: None,
            environment: BTreeMap::from([("VECTOR_LOG".into(), "info".into())]),
            after: vec![sensor.unit.clone()],
            requires: vec![],
            wants: vec![sensor.unit.clone()],
            restart: RestartPolicy::default(),
        };

        let dashboard = ServiceDescriptor {
            name: "dashboard".into(),
            unit: "ids-dashboard.service".into(),
            description: "IDS monitoring dashboard".into(),
            exec_start: format!("{}/bin/python -m ids.dashboard", config.venv_dir()),
            user: config.target.user.clone(),
            working_dir: Some(config.app_dir()),
            environment: BTreeMap::from([
                ("PYTHONUNBUFFERED".into(), "1".into()),
                ("IDS_DASHBOARD_PORT".into(), "8000".into()),
            ]),
            after: vec![shipper.unit.clone()],
            requires: vec![],
            wants: vec![shipper.unit.clone()],
            restart: RestartPolicy::default(),
        };

        let artifacts = vec![
            ConfigArtifact {
                service: "sensor".into(),
                local: config.assets_dir.join("suricata.yaml"),
                remote: "/etc/suricata/suricata.yaml".into(),
                owner: "root".into(),
                group: "root".into(),
                mode: "0644".into(),
            },
            ConfigArtifact {
                service: "shipper".into(),
                local: config.assets_dir.join("vector.toml"),
                remote: "/etc/vector/vector.toml".into(),
                owner: "root".into(),
                group: "root".into(),
                mode: "0644".into(),
            },
        ];

        Self {
            services: vec![sensor, shipper, dashboard],
            artifacts,
            health_url: DASHBOARD_HEALTH_URL.into(),
        }
    }

    /// Look up an artifact by service name
    pub fn artifact(&self, service: &str) -> Option<&ConfigArtifact> {
        self.artifacts.iter().find(|a| a.service == service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Target;

    fn test_config() -> DeployConfig {
        let target = Target::new("10.0.0.17", "pi", "/opt/ids");
        DeployConfig::new(target, "eth0", "assets", ".")
    }

    #[test]
    fn test_standard_fleet_is_a_chain() {
        let fleet = Fleet::standard(&test_config());
        assert_eq!(fleet.services.len(), 3);

        let sensor = &fleet.services[0];
        let shipper = &fleet.services[1];
        let dashboard = &fleet.services[2];

        assert_eq!(sensor.after, vec![CAPTURE_UNIT.to_string()]);
        assert_eq!(sensor.requires, vec![CAPTURE_UNIT.to_string()]);
        assert_eq!(shipper.after, vec![sensor.unit.clone()]);
        assert_eq!(dashboard.after, vec![shipper.unit.clone()]);
    }

    #[test]
    fn test_dashboard_runs_as_login_principal_in_app_dir() {
        let config = test_config();
        let fleet = Fleet::standard(&config);
        let dashboard = &fleet.services[2];

        assert_eq!(dashboard.user, "pi");
        assert_eq!(dashboard.working_dir.as_deref(), Some("/opt/ids/app"));
        assert!(dashboard.exec_start.starts_with("/opt/ids/venv/bin/python"));
    }

    #[test]
    fn test_backup_path_is_destination_plus_orig() {
        let fleet = Fleet::standard(&test_config());
        let sensor = fleet.artifact("sensor").unwrap();
        assert_eq!(sensor.backup_path(), "/etc/suricata/suricata.yaml.orig");
    }
}
