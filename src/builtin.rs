use crate::command::{CommandRunner, ExitCode};
use crate::error::ShellError;
use crate::parser::leading_int;
use crate::session::Session;
use std::fs;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Everything a builtin may touch while it runs.
pub(crate) struct Context<'a> {
    pub session: &'a mut Session,
    pub runner: &'a mut dyn CommandRunner,
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

/// Built-in commands known to the shell at compile time.
///
/// A builtin is built from the parsed argument list and then executed in-process, without
/// spawning a child.
pub(crate) trait BuiltinCommand: Sized {
    /// Build the command from the arguments that followed its name.
    fn from_args(args: &[String]) -> Result<Self, ShellError>;

    /// Executes the command.
    ///
    /// Return value follows shell conventions: 0 for success, non-zero for failure.
    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode, ShellError>;
}

/// Build `B` from `args` and run it.
pub(crate) fn run<B: BuiltinCommand>(
    args: &[String],
    ctx: &mut Context<'_>,
) -> Result<ExitCode, ShellError> {
    B::from_args(args)?.execute(ctx)
}

fn first(args: &[String]) -> String {
    args.first().cloned().unwrap_or_default()
}

/// Every argument followed by a single space, e.g. `["echo", "hi"]` gives `"echo hi "`.
fn command_text(args: &[String]) -> String {
    args.iter().fold(String::new(), |mut text, arg| {
        text.push_str(arg);
        text.push(' ');
        text
    })
}

/// Ask the session to end.
pub(crate) struct Exit;

impl BuiltinCommand for Exit {
    fn from_args(_args: &[String]) -> Result<Self, ShellError> {
        Ok(Exit)
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode, ShellError> {
        ctx.session.should_exit = true;
        Ok(0)
    }
}

/// Toggle echo: `+v` turns it off, `-v` turns it back on.
pub(crate) struct Set {
    flag: String,
}

impl BuiltinCommand for Set {
    fn from_args(args: &[String]) -> Result<Self, ShellError> {
        Ok(Set { flag: first(args) })
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode, ShellError> {
        match self.flag.as_str() {
            "+v" => ctx.session.echo = false,
            "-v" => ctx.session.echo = true,
            other => {
                debug!(flag = other, "set: unknown flag");
                return Err(ShellError::ExecutionFailed);
            }
        }
        Ok(0)
    }
}

/// Print the size of a file in bytes.
pub(crate) struct Size {
    path: String,
}

impl BuiltinCommand for Size {
    fn from_args(args: &[String]) -> Result<Self, ShellError> {
        Ok(Size { path: first(args) })
    }

    /// Failures are reported on stderr and the OS error number becomes the result code.
    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode, ShellError> {
        writeln!(ctx.stdout, "\"{}\"", self.path)?;
        match fs::metadata(&self.path) {
            Ok(meta) => {
                writeln!(ctx.stdout, "{} bytes", meta.len())?;
                Ok(0)
            }
            Err(e) => {
                writeln!(ctx.stderr, "{}: {}", self.path, e)?;
                Ok(e.raw_os_error().unwrap_or(1))
            }
        }
    }
}

/// List every line read so far.
pub(crate) struct History;

impl BuiltinCommand for History {
    fn from_args(_args: &[String]) -> Result<Self, ShellError> {
        Ok(History)
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode, ShellError> {
        for (index, line) in ctx.session.history.iter() {
            write!(ctx.stdout, "\t{}\t{}", index, line)?;
        }
        Ok(0)
    }
}

/// Run a command through the system shell and report how long it took.
pub(crate) struct Time {
    text: String,
}

/// Microsecond field of the current wall-clock time.
fn wall_clock_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::from(d.subsec_micros()))
        .unwrap_or(0)
}

impl BuiltinCommand for Time {
    fn from_args(args: &[String]) -> Result<Self, ShellError> {
        Ok(Time {
            text: command_text(args),
        })
    }

    /// Only the microsecond fields of the two readings are compared, so the figure is off
    /// whenever the command crosses a second boundary.
    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode, ShellError> {
        let start = wall_clock_micros();
        let result = ctx.runner.run(&self.text);
        let finish = wall_clock_micros();

        writeln!(ctx.stdout, "\nELAPSED: {}us", finish - start)?;
        match result {
            Ok(code) => {
                debug!(code, "time: command finished");
                Ok(0)
            }
            Err(e) => {
                warn!(error = %e, "time: could not run command");
                Err(ShellError::ExecutionFailed)
            }
        }
    }
}

/// Report how long the session has been running.
pub(crate) struct Times;

impl BuiltinCommand for Times {
    fn from_args(_args: &[String]) -> Result<Self, ShellError> {
        Ok(Times)
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode, ShellError> {
        let elapsed = ctx.session.elapsed();
        write!(
            ctx.stdout,
            "\nELAPSED: {}.{:06}s",
            elapsed.as_secs(),
            elapsed.subsec_micros()
        )?;
        Ok(0)
    }
}

/// Run a command through the system shell a fixed number of times.
pub(crate) struct Repeat {
    count: i64,
    text: String,
}

impl BuiltinCommand for Repeat {
    fn from_args(args: &[String]) -> Result<Self, ShellError> {
        let count = args.first().and_then(|n| leading_int(n)).unwrap_or(0);
        let text = command_text(args.get(1..).unwrap_or_default());
        Ok(Repeat { count, text })
    }

    /// Every run happens regardless of how the previous one went.
    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode, ShellError> {
        for round in 0..self.count.max(0) {
            match ctx.runner.run(&self.text) {
                Ok(code) => debug!(round, code, "repeat: command finished"),
                Err(e) => warn!(round, error = %e, "repeat: could not run command"),
            }
        }
        Ok(0)
    }
}
