//! Command type for building local process invocations

use async_process::{Command as AsyncCommand, Stdio};
use std::ffi::{OsStr, OsString};

use crate::error::{Error, Result};
use crate::output::ExecOutput;

/// A local command to be executed
///
/// This is a builder for creating commands that can be converted to
/// `async_process::Command` when needed. Unlike `AsyncCommand`, this type is
/// `Clone` and can be inspected after construction, which the SSH channel
/// uses to assemble `ssh`/`scp`/`rsync` invocations.
#[derive(Debug, Clone)]
pub struct Command {
    /// The program to execute
    program: OsString,
    /// The arguments to pass to the program
    args: Vec<OsString>,
}

impl Command {
    /// Create a new command for the given program
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            args: Vec::new(),
        }
    }

    /// Add an argument to the command
    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Add multiple arguments to the command
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    /// Get the program name
    pub fn get_program(&self) -> &OsStr {
        &self.program
    }

    /// Get the arguments
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Prepare this command for execution by converting to an `async_process::Command`
    pub fn prepare(&self) -> AsyncCommand {
        let mut cmd = AsyncCommand::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Run the command to completion, capturing stdout and stderr
    pub async fn output(&self) -> Result<ExecOutput> {
        let out = self
            .prepare()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                Error::spawn_failed(format!(
                    "failed to spawn {}: {}",
                    self.program.to_string_lossy(),
                    e
                ))
            })?;

        Ok(ExecOutput::from_std(out))
    }
}
