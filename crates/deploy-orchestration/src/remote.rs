//! Canonical remote command construction
//!
//! Every shell command the stages send over the channel is built here, with
//! consistent quoting. Centralizing the strings keeps the simulated-host
//! test channel honest about what the orchestrator actually runs.

use remote_exec::{ExecOutput, RemoteChannel, ssh::shell_escape};

use crate::{Error, Result};

/// Probe used by the connectivity stage
pub(crate) fn hostname() -> String {
    "uname -n".to_string()
}

/// True if a regular file exists at the path
pub(crate) fn file_exists(path: &str) -> String {
    format!("test -f {}", shell_escape(path))
}

/// True if a tool resolves on PATH
pub(crate) fn tool_present(tool: &str) -> String {
    format!("command -v {} >/dev/null 2>&1", shell_escape(tool))
}

/// Create a directory and its parents
pub(crate) fn make_dir(path: &str) -> String {
    format!("mkdir -p {}", shell_escape(path))
}

/// Copy a file preserving mode and timestamps (used for the sentinel backup)
pub(crate) fn copy_preserving(src: &str, dst: &str) -> String {
    format!("sudo cp -p {} {}", shell_escape(src), shell_escape(dst))
}

/// Install a staged file into place with explicit ownership and mode
pub(crate) fn install_file(src: &str, dst: &str, owner: &str, group: &str, mode: &str) -> String {
    format!(
        "sudo install -D -o {} -g {} -m {} {} {}",
        shell_escape(owner),
        shell_escape(group),
        shell_escape(mode),
        shell_escape(src),
        shell_escape(dst)
    )
}

/// Byte-wise comparison of two remote files
pub(crate) fn files_identical(a: &str, b: &str) -> String {
    format!("cmp -s {} {}", shell_escape(a), shell_escape(b))
}

/// True if the interface is already in promiscuous mode
pub(crate) fn promisc_enabled(interface: &str) -> String {
    format!(
        "ip link show {} | grep -q PROMISC",
        shell_escape(interface)
    )
}

/// Put the interface into promiscuous mode now
pub(crate) fn enable_promisc(interface: &str) -> String {
    format!(
        "sudo ip link set dev {} promisc on",
        shell_escape(interface)
    )
}

/// True if the virtualenv already exists
pub(crate) fn venv_present(venv: &str) -> String {
    format!("test -x {}", shell_escape(&format!("{}/bin/python", venv)))
}

/// Create the virtualenv
pub(crate) fn create_venv(venv: &str) -> String {
    format!("python3 -m venv {}", shell_escape(venv))
}

/// Install dependencies from the declared specification into the virtualenv
pub(crate) fn pip_install(venv: &str, requirements: &str) -> String {
    format!(
        "{} install -q -r {}",
        shell_escape(&format!("{}/bin/pip", venv)),
        shell_escape(requirements)
    )
}

/// Make the service manager re-read unit files
pub(crate) fn daemon_reload() -> String {
    "sudo systemctl daemon-reload".to_string()
}

/// Enable a unit for boot-time start
pub(crate) fn enable_unit(unit: &str) -> String {
    format!("sudo systemctl enable {}", shell_escape(unit))
}

/// Start a unit now
pub(crate) fn start_unit(unit: &str) -> String {
    format!("sudo systemctl start {}", shell_escape(unit))
}

/// True if the unit is currently active
pub(crate) fn unit_active(unit: &str) -> String {
    format!("systemctl is-active --quiet {}", shell_escape(unit))
}

/// True if the unit is enabled for boot-time start
pub(crate) fn unit_enabled(unit: &str) -> String {
    format!("systemctl is-enabled --quiet {}", shell_escape(unit))
}

/// HTTP health probe executed on the target itself
pub(crate) fn http_health(url: &str) -> String {
    format!("curl -fsS --max-time 5 {}", shell_escape(url))
}

/// Run a command whose failure is fatal to the calling stage
pub(crate) async fn run_fatal(host: &dyn RemoteChannel, command: &str) -> Result<ExecOutput> {
    let out = host.run(command).await?;
    if !out.success() {
        return Err(Error::remote(command, &out));
    }
    Ok(out)
}

/// Run a probe command; non-zero exit means "no", only channel errors propagate
pub(crate) async fn probe(host: &dyn RemoteChannel, command: &str) -> Result<bool> {
    let out = host.run(command).await?;
    Ok(out.success())
}
