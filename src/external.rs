use crate::command::{CommandRunner, ExitCode};
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::process::{ExitStatus, Stdio};
use tracing::debug;

/// Runs command text through the system command interpreter, like C's `system()`.
///
/// The child inherits the shell's standard streams and the shell blocks until it finishes.
pub struct SystemShell {
    program: OsString,
}

impl SystemShell {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemShell {
    fn default() -> Self {
        Self::new("/bin/sh")
    }
}

impl CommandRunner for SystemShell {
    fn run(&mut self, text: &str) -> Result<ExitCode> {
        debug!(program = ?self.program, text, "delegating to system shell");
        let mut child = std::process::Command::new(&self.program)
            .arg("-c")
            .arg(text)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("can't spawn {}", self.program.to_string_lossy()))?;
        let exit_status = child.wait()?;
        match exit_status.code() {
            Some(x) => Ok(x),
            None => Ok(terminated_by_signal(exit_status)),
        }
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}
