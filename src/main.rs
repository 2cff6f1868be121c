use anyhow::Result;
use argh::FromArgs;
use std::io::{self, IsTerminal};
use tinysh::config::DEFAULT_RECALL_DEPTH;
use tinysh::io_adapters::{EditorInput, PlainInput};
use tinysh::{Interpreter, LineSource, ShellConfig};
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A tiny interactive shell with history recall.
struct Args {
    #[argh(switch, short = 'q')]
    /// start with command echo turned off, as after `set +v`.
    quiet: bool,

    #[argh(switch)]
    /// read plain lines from standard input instead of using the line editor.
    plain: bool,

    #[argh(switch)]
    /// leave the shell when standard input is exhausted.
    exit_on_eof: bool,

    #[argh(option, default = "DEFAULT_RECALL_DEPTH")]
    /// how deep `!N` recalls may nest before giving up.
    recall_depth: usize,
}

impl From<&Args> for ShellConfig {
    fn from(args: &Args) -> Self {
        Self {
            echo: !args.quiet,
            exit_on_eof: args.exit_on_eof,
            recall_depth: args.recall_depth,
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("TINYSH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    init_logging();

    let mut input: Box<dyn LineSource> = if args.plain || !io::stdin().is_terminal() {
        Box::new(PlainInput::new(io::stdin().lock()))
    } else {
        Box::new(EditorInput::new()?)
    };

    let mut sh = Interpreter::new(ShellConfig::from(&args));
    sh.repl(input.as_mut(), &mut io::stdout(), &mut io::stderr())?;
    Ok(())
}
