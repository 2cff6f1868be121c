use crate::command::{CommandRunner, ExitCode};
use anyhow::{Result, anyhow};

/// Runner that remembers every delegated text instead of spawning anything.
#[derive(Debug, Default)]
pub(crate) struct RecordingRunner {
    pub calls: Vec<String>,
    pub code: ExitCode,
    pub fail: bool,
}

impl RecordingRunner {
    pub fn returning(code: ExitCode) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, text: &str) -> Result<ExitCode> {
        self.calls.push(text.to_owned());
        if self.fail {
            Err(anyhow!("spawn refused"))
        } else {
            Ok(self.code)
        }
    }
}
