//! Shared test harness: an in-memory simulated remote host
//!
//! `SimHost` implements `RemoteChannel` against a small model of the target:
//! a file tree, installed tools, unit states and the capture flag. It
//! interprets exactly the command shapes the orchestrator emits, records
//! every command for assertions, and supports injected failures.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;

use remote_exec::{ExecOutput, RemoteChannel, Result as ChannelResult};

const UNIT_DIR: &str = "/etc/systemd/system";

/// Mutable model of the remote host
#[derive(Debug, Default)]
pub struct HostState {
    pub files: BTreeMap<String, Vec<u8>>,
    pub dirs: BTreeSet<String>,
    pub tools: BTreeSet<String>,
    pub enabled_units: BTreeSet<String>,
    pub active_units: BTreeSet<String>,
    pub promisc: BTreeSet<String>,
    pub reload_count: usize,
    pub pip_install_count: usize,
    pub commands: Vec<String>,
    pub fail_contains: Vec<(String, i32, String)>,
    pub dashboard_healthy: bool,
}

pub struct SimHost {
    state: Mutex<HostState>,
}

impl SimHost {
    pub fn new() -> Self {
        let state = HostState {
            dashboard_healthy: true,
            ..HostState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// Mutate the simulated state (seeding scenarios)
    pub fn with<F: FnOnce(&mut HostState)>(&self, f: F) {
        f(&mut self.state.lock().unwrap());
    }

    /// Inspect the simulated state
    pub fn state<R>(&self, f: impl FnOnce(&HostState) -> R) -> R {
        f(&self.state.lock().unwrap())
    }

    /// Every command the orchestrator has run, in order
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    /// Make any command containing `needle` fail with the given exit code
    pub fn fail_when(&self, needle: &str, code: i32, stderr: &str) {
        self.with(|s| {
            s.fail_contains
                .push((needle.to_string(), code, stderr.to_string()))
        });
    }
}

fn ok() -> ExecOutput {
    ExecOutput::synthetic(0, "", "")
}

fn fail(code: i32, stderr: &str) -> ExecOutput {
    ExecOutput::synthetic(code, "", stderr)
}

/// Strip the single-quote escaping the orchestrator applies to arguments
fn unq(token: &str) -> String {
    let t = token.trim();
    if t.len() >= 2 && t.starts_with('\'') && t.ends_with('\'') {
        t[1..t.len() - 1].replace("'\"'\"'", "'")
    } else {
        t.to_string()
    }
}

fn interpret(state: &mut HostState, cmd: &str) -> ExecOutput {
    let tokens: Vec<String> = cmd.split_whitespace().map(|t| unq(t)).collect();

    if cmd == "uname -n" {
        return ExecOutput::synthetic(0, "simhost\n", "");
    }

    if cmd == "sudo systemctl daemon-reload" {
        state.reload_count += 1;
        return ok();
    }

    if let Some(rest) = cmd.strip_prefix("sudo systemctl enable ") {
        let unit = unq(rest);
        return if state.files.contains_key(&format!("{}/{}", UNIT_DIR, unit)) {
            state.enabled_units.insert(unit);
            ok()
        } else {
            fail(1, &format!("Failed to enable unit: Unit file {} does not exist.", unit))
        };
    }

    if let Some(rest) = cmd.strip_prefix("sudo systemctl start ") {
        let unit = unq(rest);
        return if state.files.contains_key(&format!("{}/{}", UNIT_DIR, unit)) {
            state.active_units.insert(unit);
            ok()
        } else {
            fail(5, &format!("Failed to start {}: Unit not found.", unit))
        };
    }

    if let Some(rest) = cmd.strip_prefix("systemctl is-active --quiet ") {
        let unit = unq(rest);
        return if state.active_units.contains(&unit) {
            ok()
        } else {
            fail(3, "")
        };
    }

    if let Some(rest) = cmd.strip_prefix("systemctl is-enabled --quiet ") {
        let unit = unq(rest);
        return if state.enabled_units.contains(&unit) {
            ok()
        } else {
            fail(1, "")
        };
    }

    if cmd.contains("command -v ") {
        // possibly a chain of `command -v X && command -v Y`
        for part in cmd.split("&&") {
            let part = part.trim();
            if let Some(rest) = part.strip_prefix("command -v ") {
                let tool = unq(rest.split_whitespace().next().unwrap_or(""));
                if !state.tools.contains(&tool) {
                    return fail(1, "");
                }
            }
        }
        return ok();
    }

    if cmd.contains("apt-get install") {
        let after_install = cmd
            .split("apt-get install")
            .nth(1)
            .unwrap_or("")
            .split("&&")
            .next()
            .unwrap_or("");
        for pkg in after_install.split_whitespace() {
            if pkg.starts_with('-') {
                continue;
            }
            let pkg = unq(pkg);
            if pkg.starts_with("python3") {
                state.tools.insert("python3".to_string());
            }
            state.tools.insert(pkg);
        }
        return ok();
    }

    if cmd.contains("apt-get update") {
        return ok();
    }

    if tokens.len() == 3 && tokens[0] == "test" {
        let path = &tokens[2];
        return match tokens[1].as_str() {
            "-f" | "-x" | "-e" => {
                if state.files.contains_key(path) {
                    ok()
                } else {
                    fail(1, "")
                }
            }
            "-d" => {
                if state.dirs.contains(path) {
                    ok()
                } else {
                    fail(1, "")
                }
            }
            _ => fail(2, "unsupported test"),
        };
    }

    if tokens.len() == 3 && tokens[0] == "mkdir" && tokens[1] == "-p" {
        state.dirs.insert(tokens[2].clone());
        return ok();
    }

    if cmd.starts_with("sudo cp -p ") {
        let src = &tokens[3];
        let dst = &tokens[4];
        return match state.files.get(src).cloned() {
            Some(content) => {
                state.files.insert(dst.clone(), content);
                ok()
            }
            None => fail(1, &format!("cp: cannot stat '{}': No such file", src)),
        };
    }

    if cmd.starts_with("sudo install -D ") {
        let src = &tokens[tokens.len() - 2];
        let dst = &tokens[tokens.len() - 1];
        return match state.files.get(src).cloned() {
            Some(content) => {
                state.files.insert(dst.clone(), content);
                ok()
            }
            None => fail(1, &format!("install: cannot stat '{}': No such file", src)),
        };
    }

    if cmd.starts_with("cmp -s ") {
        let a = state.files.get(&tokens[2]);
        let b = state.files.get(&tokens[3]);
        return match (a, b) {
            (Some(a), Some(b)) if a == b => ok(),
            (Some(_), Some(_)) => fail(1, ""),
            _ => fail(2, "cmp: No such file or directory"),
        };
    }

    if cmd.starts_with("ip link show ") {
        let iface = &tokens[3];
        return if state.promisc.contains(iface) {
            ok()
        } else {
            fail(1, "")
        };
    }

    if cmd.starts_with("sudo ip link set dev ") {
        let iface = &tokens[5];
        state.promisc.insert(iface.clone());
        return ok();
    }

    if cmd.starts_with("python3 -m venv ") {
        let venv = &tokens[3];
        state.dirs.insert(venv.clone());
        state.files.insert(format!("{}/bin/python", venv), vec![]);
        state.files.insert(format!("{}/bin/pip", venv), vec![]);
        return ok();
    }

    if cmd.contains("/bin/pip install") {
        let requirements = tokens.last().cloned().unwrap_or_default();
        return if state.files.contains_key(&requirements) {
            state.pip_install_count += 1;
            ok()
        } else {
            fail(1, &format!("Could not open requirements file: {}", requirements))
        };
    }

    if cmd.starts_with("curl -fsS --max-time") {
        return if state.dashboard_healthy {
            ExecOutput::synthetic(0, "{\"status\":\"ok\"}\n", "")
        } else {
            fail(22, "curl: (22) The requested URL returned error: 500")
        };
    }

    // anything unmodelled succeeds silently
    ok()
}

#[async_trait]
impl RemoteChannel for SimHost {
    async fn run(&self, command: &str) -> ChannelResult<ExecOutput> {
        let mut state = self.state.lock().unwrap();
        state.commands.push(command.to_string());

        for (needle, code, stderr) in state.fail_contains.clone() {
            if command.contains(&needle) {
                return Ok(fail(code, &stderr));
            }
        }

        Ok(interpret(&mut state, command))
    }

    async fn copy_to(&self, local: &Path, remote: &str) -> ChannelResult<()> {
        let content = std::fs::read(local)?;
        let mut state = self.state.lock().unwrap();
        state.commands.push(format!("<copy-to {}>", remote));
        state.files.insert(remote.to_string(), content);
        Ok(())
    }

    async fn copy_from(&self, remote: &str, local: &Path) -> ChannelResult<()> {
        let state = self.state.lock().unwrap();
        match state.files.get(remote) {
            Some(content) => {
                std::fs::write(local, content)?;
                Ok(())
            }
            None => Err(remote_exec::Error::transfer_failed(
                remote.to_string(),
                "no such file",
            )),
        }
    }

    async fn mirror(&self, local: &Path, remote: &str, excludes: &[String]) -> ChannelResult<()> {
        let mut incoming: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        collect_tree(local, local, excludes, &mut incoming)?;

        let mut state = self.state.lock().unwrap();
        state.commands.push(format!("<mirror {}>", remote));

        let prefix = format!("{}/", remote);
        let stale: Vec<String> = state
            .files
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .filter(|path| {
                let rel = &path[prefix.len()..];
                !incoming.contains_key(rel) && !is_excluded(rel, excludes)
            })
            .cloned()
            .collect();
        for path in stale {
            state.files.remove(&path);
        }

        for (rel, content) in incoming {
            state.files.insert(format!("{}{}", prefix, rel), content);
        }
        Ok(())
    }
}

fn is_excluded(rel: &str, excludes: &[String]) -> bool {
    rel.split('/').any(|component| {
        excludes.iter().any(|pattern| {
            if let Some(suffix) = pattern.strip_prefix('*') {
                component.ends_with(suffix)
            } else {
                component == pattern
            }
        })
    })
}

fn collect_tree(
    root: &Path,
    dir: &Path,
    excludes: &[String],
    out: &mut BTreeMap<String, Vec<u8>>,
) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let rel = path
            .strip_prefix(root)
            .expect("entry under root")
            .to_string_lossy()
            .replace('\\', "/");
        if is_excluded(&rel, excludes) {
            continue;
        }
        if path.is_dir() {
            collect_tree(root, &path, excludes, out)?;
        } else {
            out.insert(rel, std::fs::read(&path)?);
        }
    }
    Ok(())
}
