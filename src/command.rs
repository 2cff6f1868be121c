use crate::parser;
use anyhow::Result;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Maximum number of arguments kept for a single command line.
///
/// Tokens past this cap are dropped silently by the parser.
pub const MAX_ARGS: usize = 64;

/// Size of the input buffer, in bytes, including the trailing newline slot.
pub const LINE_MAX: usize = 256;

/// One parsed input line.
///
/// `base` is the first space-delimited token and `arguments` are the tokens that follow it,
/// both with any newline removed. `raw` is the line exactly as it was read and is what gets
/// echoed, stored in history and delegated to the system shell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    base: String,
    arguments: Vec<String>,
    raw: String,
}

impl Command {
    pub(crate) fn new(base: String, mut arguments: Vec<String>, raw: String) -> Self {
        arguments.truncate(MAX_ARGS);
        Self {
            base,
            arguments,
            raw,
        }
    }

    /// Shorthand for [`parser::parse`].
    pub fn parse(line: &str) -> Self {
        parser::parse(line)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Executes a command string with the platform's command interpreter.
///
/// The call is synchronous and the child shares the shell's standard streams. The returned
/// value is the child's own exit code; an `Err` means the interpreter could not be run at all.
pub trait CommandRunner {
    fn run(&mut self, text: &str) -> Result<ExitCode>;
}
