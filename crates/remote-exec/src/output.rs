//! Captured process results

/// Process exit status
#[derive(Debug, Clone)]
pub struct ExitStatus {
    /// Exit code if the process exited normally
    pub code: Option<i32>,
    /// Signal that terminated the process (Unix only)
    #[cfg(unix)]
    pub signal: Option<i32>,
}

impl ExitStatus {
    /// Returns true if the process exited successfully (code 0)
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Convert from a standard-library exit status
    pub fn from_std(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            Self {
                code: status.code(),
                signal: status.signal(),
            }
        }
        #[cfg(not(unix))]
        {
            Self {
                code: status.code(),
            }
        }
    }
}

/// The full result of a completed command: exit status plus captured output
#[derive(Debug, Clone)]
pub struct ExecOutput {
    /// How the process exited
    pub status: ExitStatus,
    /// Captured standard output, lossily decoded
    pub stdout: String,
    /// Captured standard error, lossily decoded
    pub stderr: String,
}

impl ExecOutput {
    /// Build from a captured `std::process::Output`
    pub fn from_std(out: std::process::Output) -> Self {
        Self {
            status: ExitStatus::from_std(out.status),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        }
    }

    /// Returns true if the command exited with code 0
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Construct a synthetic result, mainly useful for simulated channels in tests
    pub fn synthetic(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status: ExitStatus {
                code: Some(code),
                #[cfg(unix)]
                signal: None,
            },
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}
