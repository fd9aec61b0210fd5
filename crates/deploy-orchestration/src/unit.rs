//! Systemd unit rendering and ordering validation

use std::collections::{BTreeMap, BTreeSet};

use crate::fleet::{CAPTURE_UNIT, Fleet, ServiceDescriptor};
use crate::{Error, Result};

/// Remote directory unit files are installed into
pub const UNIT_DIR: &str = "/etc/systemd/system";

/// Remote path of a unit file
pub fn unit_path(unit: &str) -> String {
    format!("{}/{}", UNIT_DIR, unit)
}

/// Render the persistent-service unit for a descriptor
pub fn render_service_unit(service: &ServiceDescriptor) -> String {
    let mut text = String::new();
    text.push_str("[Unit]\n");
    text.push_str(&format!("Description={}\n", service.description));
    if !service.after.is_empty() {
        text.push_str(&format!("After={}\n", service.after.join(" ")));
    }
    if !service.requires.is_empty() {
        text.push_str(&format!("Requires={}\n", service.requires.join(" ")));
    }
    if !service.wants.is_empty() {
        text.push_str(&format!("Wants={}\n", service.wants.join(" ")));
    }

    text.push_str("\n[Service]\n");
    text.push_str("Type=simple\n");
    text.push_str(&format!("ExecStart={}\n", service.exec_start));
    text.push_str(&format!("User={}\n", service.user));
    if let Some(dir) = &service.working_dir {
        text.push_str(&format!("WorkingDirectory={}\n", dir));
    }
    for (key, value) in &service.environment {
        text.push_str(&format!("Environment=\"{}={}\"\n", key, value));
    }
    text.push_str("Restart=always\n");
    text.push_str(&format!("RestartSec={}\n", service.restart.delay_secs));

    text.push_str("\n[Install]\nWantedBy=multi-user.target\n");
    text
}

/// Render the boot-time capture-mode unit
///
/// Ordered after core networking initialization and before the
/// network-ready milestone, so the interface is already capturing when the
/// sensor comes up on every boot.
pub fn render_capture_unit(interface: &str) -> String {
    format!(
        "[Unit]\n\
         Description=Enable promiscuous capture mode on {iface}\n\
         After=network.target\n\
         Before=network-online.target\n\
         \n\
         [Service]\n\
         Type=oneshot\n\
         ExecStart=/usr/sbin/ip link set dev {iface} promisc on\n\
         RemainAfterExit=yes\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        iface = interface
    )
}

/// Validate the fleet's ordering relations and return the activation order
///
/// The dependency relation among the managed services must form a simple
/// chain rooted at the capture-mode unit. Descriptor sets containing cycles,
/// references to unknown units, or any branching are refused before a single
/// unit file is written.
pub fn validate_chain(fleet: &Fleet) -> Result<Vec<String>> {
    let mut nodes: BTreeSet<String> = BTreeSet::new();
    nodes.insert(CAPTURE_UNIT.to_string());
    for service in &fleet.services {
        nodes.insert(service.unit.clone());
    }

    // dependency -> dependents
    let mut edges: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut in_degree: BTreeMap<String, usize> = nodes.iter().map(|n| (n.clone(), 0)).collect();

    for service in &fleet.services {
        let mut deps: BTreeSet<&String> = BTreeSet::new();
        deps.extend(&service.after);
        deps.extend(&service.requires);
        deps.extend(&service.wants);

        for dep in deps {
            if !nodes.contains(dep) {
                return Err(Error::Ordering(format!(
                    "service {} depends on unknown unit {}",
                    service.unit, dep
                )));
            }
            edges.entry(dep.clone()).or_default().push(service.unit.clone());
            *in_degree.get_mut(&service.unit).expect("node exists") += 1;
        }
    }

    // Kahn-style elimination; a simple chain admits exactly one ready node
    // at every step.
    let mut order = Vec::with_capacity(nodes.len());
    let mut remaining = nodes.len();
    while remaining > 0 {
        let ready: Vec<String> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| node.clone())
            .collect();

        match ready.as_slice() {
            [node] => {
                let node = node.clone();
                in_degree.remove(&node);
                if let Some(dependents) = edges.get(&node) {
                    for dependent in dependents {
                        if let Some(degree) = in_degree.get_mut(dependent) {
                            *degree -= 1;
                        }
                    }
                }
                order.push(node);
                remaining -= 1;
            }
            [] => {
                return Err(Error::Ordering(format!(
                    "cycle detected among units: {}",
                    in_degree.keys().cloned().collect::<Vec<_>>().join(", ")
                )));
            }
            many => {
                return Err(Error::Ordering(format!(
                    "ordering relations do not form a simple chain; \
                     independent units: {}",
                    many.join(", ")
                )));
            }
        }
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::Fleet;
    use crate::target::{DeployConfig, Target};

    fn standard_fleet() -> Fleet {
        let target = Target::new("10.0.0.17", "pi", "/opt/ids");
        Fleet::standard(&DeployConfig::new(target, "eth0", "assets", "."))
    }

    #[test]
    fn test_validate_chain_standard_fleet() {
        let fleet = standard_fleet();
        let order = validate_chain(&fleet).unwrap();
        assert_eq!(
            order,
            vec![
                CAPTURE_UNIT.to_string(),
                "ids-sensor.service".to_string(),
                "ids-shipper.service".to_string(),
                "ids-dashboard.service".to_string(),
            ]
        );
    }

    #[test]
    fn test_validate_chain_rejects_cycle() {
        let mut fleet = standard_fleet();
        // sensor <-> shipper cycle
        fleet.services[0].after.push("ids-shipper.service".into());
        let err = validate_chain(&fleet).unwrap_err();
        assert!(matches!(err, Error::Ordering(_)));
    }

    #[test]
    fn test_validate_chain_rejects_branching() {
        let mut fleet = standard_fleet();
        // dashboard hangs off the sensor instead of the shipper: two units
        // become startable at once, which is not the required chain
        fleet.services[2].after = vec!["ids-sensor.service".into()];
        fleet.services[2].wants = vec!["ids-sensor.service".into()];
        let err = validate_chain(&fleet).unwrap_err();
        assert!(matches!(err, Error::Ordering(_)));
    }

    #[test]
    fn test_validate_chain_rejects_unknown_unit() {
        let mut fleet = standard_fleet();
        fleet.services[1].after = vec!["nonexistent.service".into()];
        let err = validate_chain(&fleet).unwrap_err();
        assert!(err.to_string().contains("unknown unit"));
    }

    #[test]
    fn test_render_service_unit() {
        let fleet = standard_fleet();
        let text = render_service_unit(&fleet.services[0]);

        assert!(text.contains("Description=Suricata intrusion detection sensor"));
        assert!(text.contains("After=ids-capture.service"));
        assert!(text.contains("Requires=ids-capture.service"));
        assert!(text.contains("ExecStart=/usr/bin/suricata"));
        assert!(text.contains("Restart=always"));
        assert!(text.contains("RestartSec=5"));
        assert!(text.contains("WantedBy=multi-user.target"));
        // no empty ordering lines for relations the sensor does not carry
        assert!(!text.contains("Wants="));
    }

    #[test]
    fn test_render_service_unit_environment_lines() {
        let fleet = standard_fleet();
        let text = render_service_unit(&fleet.services[2]);

        assert!(text.contains("Environment=\"IDS_DASHBOARD_PORT=8000\""));
        assert!(text.contains("Environment=\"PYTHONUNBUFFERED=1\""));
        assert!(text.contains("WorkingDirectory=/opt/ids/app"));
        assert!(text.contains("User=pi"));
    }

    #[test]
    fn test_render_capture_unit() {
        let text = render_capture_unit("eth0");
        assert!(text.contains("After=network.target"));
        assert!(text.contains("Before=network-online.target"));
        assert!(text.contains("ExecStart=/usr/sbin/ip link set dev eth0 promisc on"));
        assert!(text.contains("RemainAfterExit=yes"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let fleet = standard_fleet();
        let first = render_service_unit(&fleet.services[2]);
        let second = render_service_unit(&fleet.services[2]);
        assert_eq!(first, second);
    }
}
