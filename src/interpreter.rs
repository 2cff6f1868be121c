use crate::builtin::{self, BuiltinCommand, Context, Exit, History, Repeat, Set, Size, Time, Times};
use crate::command::{Command, CommandRunner, ExitCode};
use crate::config::ShellConfig;
use crate::error::ShellError;
use crate::external::SystemShell;
use crate::io_adapters::{Input, LineSource};
use crate::parser::{self, leading_int};
use crate::session::Session;
use std::io::{self, Write};
use tracing::{debug, info, warn};

/// A minimal interactive shell: a handful of builtins, everything else goes to the system shell.
///
/// The interpreter owns the [`Session`] and the [`CommandRunner`] used for delegation. Output
/// streams are passed per call so callers decide where text ends up.
///
/// Example
/// ```
/// use tinysh::{Command, Interpreter, ShellConfig};
/// let mut sh = Interpreter::new(ShellConfig::default());
/// let mut out: Vec<u8> = Vec::new();
/// sh.dispatch(&Command::parse("set +v\n"), &mut out, &mut std::io::sink()).unwrap();
/// assert!(!sh.session().echo);
/// ```
pub struct Interpreter<R = SystemShell> {
    session: Session,
    runner: R,
    config: ShellConfig,
}

impl Interpreter<SystemShell> {
    /// Create an interpreter that delegates to `/bin/sh`.
    pub fn new(config: ShellConfig) -> Self {
        Self::with_runner(config, SystemShell::default())
    }
}

impl<R: CommandRunner> Interpreter<R> {
    /// Create an interpreter with a custom runner for delegated commands.
    pub fn with_runner(config: ShellConfig, runner: R) -> Self {
        Self::with_session(config, Session::new(), runner)
    }

    /// Create an interpreter around an existing session.
    ///
    /// The session's echo flag is overridden by `config.echo`.
    pub fn with_session(config: ShellConfig, mut session: Session, runner: R) -> Self {
        session.echo = config.echo;
        Self {
            session,
            runner,
            config,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Read and run lines until `exit`.
    ///
    /// Only a failure to write to `stdout` or `stderr` ends the loop early.
    pub fn repl(
        &mut self,
        input: &mut dyn LineSource,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> anyhow::Result<()> {
        info!(user = ?self.session.user, config = ?self.config, "session started");
        while !self.session.should_exit {
            self.step(input, stdout, stderr)?;
        }
        info!(lines = self.session.history.len(), "session finished");
        Ok(())
    }

    /// One pass of the loop: prompt, read, echo, record, dispatch, report.
    pub fn step(
        &mut self,
        input: &mut dyn LineSource,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> anyhow::Result<()> {
        writeln!(stdout)?;
        stdout.flush()?;

        let prompt = self.session.prompt();
        let line = match input.read_line(&prompt, stdout) {
            Ok(Input::Line(line)) => line,
            Ok(Input::Eof) if self.config.exit_on_eof => {
                debug!("end of input, leaving");
                self.session.should_exit = true;
                return Ok(());
            }
            Ok(Input::Eof) => {
                debug!("end of input");
                report(stderr, &ShellError::GetCommandFailed)?;
                return Ok(());
            }
            Err(e) => {
                warn!(error = %e, "failed to read command");
                report(stderr, &ShellError::GetCommandFailed)?;
                return Ok(());
            }
        };

        let cmd = parser::parse(&line);
        debug!(base = cmd.base(), args = ?cmd.arguments(), "parsed command");

        if self.session.echo {
            write!(stdout, "COMMAND: {}", cmd.raw())?;
        }
        stdout.flush()?;
        self.session.history.append(cmd.raw());

        if let Err(e) = self.dispatch(&cmd, stdout, stderr) {
            debug!(error = ?e, "command failed");
            report(stderr, &e)?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Run one parsed command.
    ///
    /// Builtins are matched on the exact base name, in a fixed order; anything else is passed to
    /// the runner verbatim and its exit code returned as is.
    pub fn dispatch(
        &mut self,
        cmd: &Command,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<ExitCode, ShellError> {
        self.dispatch_nested(cmd, 0, stdout, stderr)
    }

    fn dispatch_nested(
        &mut self,
        cmd: &Command,
        depth: usize,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<ExitCode, ShellError> {
        match cmd.base() {
            "" => Err(ShellError::EmptyBase),
            "exit" => self.builtin::<Exit>(cmd, stdout, stderr),
            "set" => self.builtin::<Set>(cmd, stdout, stderr),
            "size" => self.builtin::<Size>(cmd, stdout, stderr),
            base if base.starts_with('!') => self.recall(&base[1..], depth, stdout, stderr),
            "history" => self.builtin::<History>(cmd, stdout, stderr),
            "time" => self.builtin::<Time>(cmd, stdout, stderr),
            "times" => self.builtin::<Times>(cmd, stdout, stderr),
            "repeat" => self.builtin::<Repeat>(cmd, stdout, stderr),
            _ => self.delegate(cmd.raw()),
        }
    }

    fn builtin<B: BuiltinCommand>(
        &mut self,
        cmd: &Command,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<ExitCode, ShellError> {
        debug!(builtin = cmd.base(), "running builtin");
        let mut ctx = Context {
            session: &mut self.session,
            runner: &mut self.runner,
            stdout,
            stderr,
        };
        builtin::run::<B>(cmd.arguments(), &mut ctx)
    }

    /// Re-run history entry `index` (the text after `!`), counting from the first line read.
    ///
    /// The recalled line is echoed with its own newline dropped, so it takes exactly one output
    /// line rather than being followed by a blank one.
    fn recall(
        &mut self,
        index: &str,
        depth: usize,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<ExitCode, ShellError> {
        let n = leading_int(index).ok_or(ShellError::InvalidCommand)?;
        if depth >= self.config.recall_depth {
            return Err(ShellError::RecallTooDeep(self.config.recall_depth));
        }
        let line = self
            .session
            .history
            .get(n)
            .ok_or(ShellError::HistoryUnavailable(n))?
            .to_owned();
        debug!(n, depth, line = line.trim_end(), "recalling history entry");

        writeln!(stdout, "{}", line.trim_end_matches('\n'))?;
        stdout.flush()?;

        let recalled = parser::parse(&line);
        self.dispatch_nested(&recalled, depth + 1, stdout, stderr)
    }

    fn delegate(&mut self, text: &str) -> Result<ExitCode, ShellError> {
        match self.runner.run(text) {
            Ok(code) => {
                debug!(code, "delegated command finished");
                Ok(code)
            }
            Err(e) => {
                warn!(error = %e, "could not run command");
                Err(ShellError::ExecutionFailed)
            }
        }
    }
}

fn report(stderr: &mut dyn Write, err: &ShellError) -> io::Result<()> {
    writeln!(stderr, "Error: {}", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::PlainInput;
    use crate::testing::RecordingRunner;
    use anyhow::anyhow;
    use std::io::Cursor;

    fn shell(runner: RecordingRunner) -> Interpreter<RecordingRunner> {
        shell_with(ShellConfig::default(), runner)
    }

    fn shell_with(config: ShellConfig, runner: RecordingRunner) -> Interpreter<RecordingRunner> {
        Interpreter::with_session(config, Session::with_user(Some("tester".into())), runner)
    }

    struct Transcript {
        out: String,
        err: String,
    }

    /// Feed `lines` to the loop, one `step` per line.
    fn feed(sh: &mut Interpreter<RecordingRunner>, lines: &str) -> Transcript {
        let steps = lines.matches('\n').count();
        let mut input = PlainInput::new(Cursor::new(lines.to_owned()));
        let mut out = Vec::new();
        let mut err = Vec::new();
        for _ in 0..steps {
            if sh.session.should_exit {
                break;
            }
            sh.step(&mut input, &mut out, &mut err).unwrap();
        }
        Transcript {
            out: String::from_utf8(out).unwrap(),
            err: String::from_utf8(err).unwrap(),
        }
    }

    fn dispatch(sh: &mut Interpreter<RecordingRunner>, line: &str) -> Result<ExitCode, ShellError> {
        let mut out: Vec<u8> = Vec::new();
        let mut err: Vec<u8> = Vec::new();
        sh.dispatch(&parser::parse(line), &mut out, &mut err)
    }

    struct BrokenInput;

    impl LineSource for BrokenInput {
        fn read_line(&mut self, _prompt: &str, _out: &mut dyn Write) -> anyhow::Result<Input> {
            Err(anyhow!("terminal went away"))
        }
    }

    #[test]
    fn test_empty_base_is_an_error() {
        let mut sh = shell(RecordingRunner::default());
        assert!(matches!(dispatch(&mut sh, "\n"), Err(ShellError::EmptyBase)));
        assert!(matches!(dispatch(&mut sh, "    \n"), Err(ShellError::EmptyBase)));
        assert!(sh.runner().calls.is_empty());
    }

    #[test]
    fn test_unknown_commands_are_delegated_verbatim() {
        let mut sh = shell(RecordingRunner::returning(2));
        assert_eq!(dispatch(&mut sh, "ls  -l\n").unwrap(), 2);
        assert_eq!(sh.runner().calls, vec!["ls  -l\n"]);
    }

    #[test]
    fn test_builtin_names_are_case_sensitive() {
        let mut sh = shell(RecordingRunner::default());
        dispatch(&mut sh, "EXIT\n").unwrap();
        dispatch(&mut sh, "History\n").unwrap();
        assert!(!sh.session().should_exit);
        assert_eq!(sh.runner().calls, vec!["EXIT\n", "History\n"]);
    }

    #[test]
    fn test_runner_failure_is_execution_failed() {
        let mut sh = shell(RecordingRunner::failing());
        let t = feed(&mut sh, "frobnicate\n");
        assert_eq!(t.err, "Error: could not execute command\n");
    }

    #[test]
    fn test_nonzero_exit_is_not_a_shell_error() {
        let mut sh = shell(RecordingRunner::returning(1));
        let t = feed(&mut sh, "false\n");
        assert!(t.err.is_empty());
    }

    #[test]
    fn test_prompt_and_echo() {
        let mut sh = shell(RecordingRunner::default());
        let t = feed(&mut sh, "echo hi\n");
        assert_eq!(t.out, "\n[tester] $ COMMAND: echo hi\n");
    }

    #[test]
    fn test_set_controls_echo() {
        let mut sh = shell(RecordingRunner::default());
        let t = feed(&mut sh, "set +v\necho a\nset -v\necho b\n");
        assert!(t.out.contains("COMMAND: set +v\n"));
        assert!(!t.out.contains("COMMAND: echo a\n"));
        assert!(!t.out.contains("COMMAND: set -v\n"));
        assert!(t.out.contains("COMMAND: echo b\n"));
        assert!(sh.session().echo);
    }

    #[test]
    fn test_bad_set_reports_and_keeps_echo() {
        let mut sh = shell(RecordingRunner::default());
        let t = feed(&mut sh, "set x\n");
        assert_eq!(t.err, "Error: could not execute command\n");
        assert!(sh.session().echo);
    }

    #[test]
    fn test_quiet_config_starts_without_echo() {
        let config = ShellConfig {
            echo: false,
            ..ShellConfig::default()
        };
        let mut sh = shell_with(config, RecordingRunner::default());
        let t = feed(&mut sh, "ls\n");
        assert!(!t.out.contains("COMMAND:"));
    }

    #[test]
    fn test_every_line_goes_into_history() {
        let mut sh = shell(RecordingRunner::failing());
        feed(&mut sh, "ls\n\nset bogus\n!9\n");
        let lines: Vec<_> = sh.session().history.iter().map(|(_, l)| l).collect();
        assert_eq!(lines, vec!["ls\n", "\n", "set bogus\n", "!9\n"]);
    }

    #[test]
    fn test_history_lists_the_history_command_too() {
        let mut sh = shell(RecordingRunner::default());
        let t = feed(&mut sh, "set +v\nls\nhistory\n");
        assert!(t.out.ends_with("\t1\tset +v\n\t2\tls\n\t3\thistory\n"));
    }

    #[test]
    fn test_recall_reruns_an_earlier_line() {
        let mut sh = shell(RecordingRunner::default());
        let t = feed(&mut sh, "echo hi\n!1\n");
        assert_eq!(sh.runner().calls, vec!["echo hi\n", "echo hi\n"]);
        assert!(t.out.contains("COMMAND: !1\necho hi\n"));
        assert!(t.err.is_empty());
    }

    #[test]
    fn test_recall_runs_builtins_too() {
        let mut sh = shell(RecordingRunner::default());
        feed(&mut sh, "set +v\nset -v\n!1\n");
        assert!(!sh.session().echo);
    }

    #[test]
    fn test_recall_counts_from_the_first_line() {
        let mut sh = shell(RecordingRunner::default());
        feed(&mut sh, "a\nb\nc\n!2\n!1\n");
        assert_eq!(sh.runner().calls, vec!["a\n", "b\n", "c\n", "b\n", "a\n"]);
    }

    #[test]
    fn test_recall_past_the_end_is_reported() {
        let mut sh = shell(RecordingRunner::default());
        let t = feed(&mut sh, "ls\n!5\nls\n");
        assert_eq!(t.err, "Error: line 5 of history not available\n");
        assert_eq!(sh.runner().calls.len(), 2);
        assert_eq!(t.out.matches("[tester] $ ").count(), 3);
    }

    #[test]
    fn test_recall_of_zero_or_negative_is_unavailable() {
        let mut sh = shell(RecordingRunner::default());
        assert!(matches!(
            dispatch(&mut sh, "!0\n"),
            Err(ShellError::HistoryUnavailable(0))
        ));
        assert!(matches!(
            dispatch(&mut sh, "!-1\n"),
            Err(ShellError::HistoryUnavailable(-1))
        ));
    }

    #[test]
    fn test_recall_without_number_is_invalid() {
        let mut sh = shell(RecordingRunner::default());
        assert!(matches!(dispatch(&mut sh, "!\n"), Err(ShellError::InvalidCommand)));
        assert!(matches!(dispatch(&mut sh, "!abc\n"), Err(ShellError::InvalidCommand)));
    }

    #[test]
    fn test_recall_cycle_hits_the_depth_limit() {
        let config = ShellConfig {
            recall_depth: 4,
            ..ShellConfig::default()
        };
        let mut sh = shell_with(config, RecordingRunner::default());
        let t = feed(&mut sh, "!1\n");
        assert_eq!(t.err, "Error: history recall nested more than 4 levels deep\n");
        assert!(sh.runner().calls.is_empty());
        assert_eq!(t.out.matches("!1\n").count(), 1 + 4);
    }

    #[test]
    fn test_recall_can_exit() {
        let mut sh = shell(RecordingRunner::default());
        feed(&mut sh, "exit\n");
        assert!(sh.session().should_exit);

        let mut sh = shell(RecordingRunner::default());
        sh.session.history.append("exit\n");
        dispatch(&mut sh, "!1\n").unwrap();
        assert!(sh.session().should_exit);
    }

    #[test]
    fn test_size_failure_does_not_stop_the_loop() {
        let mut sh = shell(RecordingRunner::default());
        let t = feed(&mut sh, "size /no/such/path\nls\n");
        assert!(t.err.starts_with("/no/such/path: "));
        assert!(!t.err.contains("Error:"));
        assert_eq!(sh.runner().calls, vec!["ls\n"]);
    }

    #[test]
    fn test_repeat_delegates_n_times() {
        let mut sh = shell(RecordingRunner::default());
        dispatch(&mut sh, "repeat 3 echo hi\n").unwrap();
        assert_eq!(sh.runner().calls, vec!["echo hi "; 3]);
    }

    #[test]
    fn test_time_delegates_arguments() {
        let mut sh = shell(RecordingRunner::default());
        dispatch(&mut sh, "time ls -a\n").unwrap();
        assert_eq!(sh.runner().calls, vec!["ls -a "]);
    }

    #[test]
    fn test_repl_stops_at_exit() {
        let mut sh = shell(RecordingRunner::default());
        let mut input = PlainInput::new(Cursor::new("ls\nexit\npwd\n"));
        let mut out = Vec::new();
        let mut err = Vec::new();
        sh.repl(&mut input, &mut out, &mut err).unwrap();
        assert_eq!(sh.runner().calls, vec!["ls\n"]);
        assert!(err.is_empty());
    }

    #[test]
    fn test_eof_is_a_read_failure_by_default() {
        let mut sh = shell(RecordingRunner::default());
        let mut input = PlainInput::new(Cursor::new(""));
        let mut out = Vec::new();
        let mut err = Vec::new();
        sh.step(&mut input, &mut out, &mut err).unwrap();
        sh.step(&mut input, &mut out, &mut err).unwrap();

        assert!(!sh.session().should_exit);
        assert!(sh.session().history.is_empty());
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "Error: could not get command\n".repeat(2)
        );
    }

    #[test]
    fn test_eof_can_end_the_session() {
        let config = ShellConfig {
            exit_on_eof: true,
            ..ShellConfig::default()
        };
        let mut sh = shell_with(config, RecordingRunner::default());
        let mut input = PlainInput::new(Cursor::new("ls\n"));
        sh.repl(&mut input, &mut io::sink(), &mut io::sink()).unwrap();
        assert_eq!(sh.runner().calls, vec!["ls\n"]);
        assert!(sh.session().should_exit);
    }

    #[test]
    fn test_read_failure_is_reported_and_skipped() {
        let mut sh = shell(RecordingRunner::default());
        let mut out = Vec::new();
        let mut err = Vec::new();
        sh.step(&mut BrokenInput, &mut out, &mut err).unwrap();

        assert_eq!(String::from_utf8(err).unwrap(), "Error: could not get command\n");
        assert!(sh.session().history.is_empty());
        assert!(sh.runner().calls.is_empty());
    }

    #[test]
    fn test_non_utf8_line_is_recorded_and_run() {
        let mut sh = shell(RecordingRunner::default());
        let mut input = PlainInput::new(Cursor::new(b"ls caf\xe9.txt\nls\n".to_vec()));
        let mut out = Vec::new();
        let mut err = Vec::new();
        sh.step(&mut input, &mut out, &mut err).unwrap();
        sh.step(&mut input, &mut out, &mut err).unwrap();

        let lines: Vec<_> = sh.session().history.iter().map(|(_, l)| l).collect();
        assert_eq!(lines, vec!["ls caf\u{fffd}.txt\n", "ls\n"]);
        assert_eq!(sh.runner().calls, vec!["ls caf\u{fffd}.txt\n", "ls\n"]);
        assert!(err.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn test_system_shell_exit_codes_pass_through() {
        let mut sh = Interpreter::new(ShellConfig::default());
        let mut out = Vec::new();
        let mut err = Vec::new();
        assert_eq!(sh.dispatch(&Command::parse("true\n"), &mut out, &mut err).unwrap(), 0);
        assert_eq!(sh.dispatch(&Command::parse("false\n"), &mut out, &mut err).unwrap(), 1);
    }
}
