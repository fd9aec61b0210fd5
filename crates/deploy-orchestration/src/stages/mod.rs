//! Concrete deployment stages
//!
//! The canonical stage order is fixed: connectivity, base packages, sensor
//! install + config, shipper install + config, capture mode, code sync,
//! environment, unit descriptors, infra-config reminder, activation,
//! verification. [`standard_stages`] builds that list for a run
//! configuration, refusing fleets whose ordering relations are inconsistent
//! with the required chain before anything touches the host.

mod activate;
mod configure;
mod connectivity;
mod descriptors;
mod install;
mod netmode;
mod provision;
mod reminder;
mod sync;
mod verify;

pub use activate::Activation;
pub use configure::PublishConfig;
pub use connectivity::Connectivity;
pub use descriptors::UnitDescriptors;
pub use install::ToolInstall;
pub use netmode::CaptureMode;
pub use provision::Environment;
pub use reminder::InfraReminder;
pub use sync::{CodeSync, DEFAULT_EXCLUDES};
pub use verify::Verification;

use std::io::Write;
use std::path::Path;

use crate::fleet::Fleet;
use crate::stage::Stage;
use crate::target::DeployConfig;
use crate::{Error, Result, remote, unit};
use remote_exec::RemoteChannel;

/// Build the full ordered stage list for one run
pub fn standard_stages(config: &DeployConfig, fleet: &Fleet) -> Result<Vec<Box<dyn Stage>>> {
    config.target.validate()?;
    let activation_order = unit::validate_chain(fleet)?;

    let sensor_artifact = fleet
        .artifact("sensor")
        .ok_or_else(|| Error::Config("fleet has no sensor artifact".into()))?;
    let shipper_artifact = fleet
        .artifact("shipper")
        .ok_or_else(|| Error::Config("fleet has no shipper artifact".into()))?;

    let stages: Vec<Box<dyn Stage>> = vec![
        Box::new(Connectivity::new(config.target.host.as_str())),
        Box::new(ToolInstall::base_packages()),
        Box::new(ToolInstall::suricata()),
        Box::new(PublishConfig::new(
            "sensor-config",
            sensor_artifact.clone(),
            config.staging_dir(),
        )),
        Box::new(ToolInstall::vector()),
        Box::new(PublishConfig::new(
            "shipper-config",
            shipper_artifact.clone(),
            config.staging_dir(),
        )),
        Box::new(CaptureMode::new(config.interface.as_str(), config.staging_dir())),
        Box::new(CodeSync::new(
            config.source_dir.clone(),
            config.app_dir(),
            DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        )),
        Box::new(Environment::new(
            config.venv_dir(),
            config.requirements_path(),
        )),
        Box::new(UnitDescriptors::new(fleet, config.staging_dir())),
        Box::new(InfraReminder::new()),
        Box::new(Activation::new(activation_order, config.settle_delay())),
        Box::new(Verification::new(fleet)),
    ];

    Ok(stages)
}

/// Upload a local file into the remote staging directory
pub(crate) async fn stage_file(
    host: &dyn RemoteChannel,
    local: &Path,
    staging_dir: &str,
    staging_path: &str,
) -> Result<()> {
    if !local.is_file() {
        return Err(Error::Config(format!(
            "local artifact not found: {}",
            local.display()
        )));
    }
    remote::run_fatal(host, &remote::make_dir(staging_dir)).await?;
    host.copy_to(local, staging_path).await?;
    Ok(())
}

/// Upload rendered text into the remote staging directory
pub(crate) async fn stage_text(
    host: &dyn RemoteChannel,
    text: &str,
    staging_dir: &str,
    staging_path: &str,
) -> Result<()> {
    let mut tmp = tempfile::NamedTempFile::new()?;
    tmp.write_all(text.as_bytes())?;
    tmp.flush()?;

    remote::run_fatal(host, &remote::make_dir(staging_dir)).await?;
    host.copy_to(tmp.path(), staging_path).await?;
    Ok(())
}
