use std::io;
use thiserror::Error;

/// Errors the shell reports to the user.
///
/// None of these end the session; the loop prints `Error: <message>` on standard error and
/// asks for the next line.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("could not get command")]
    GetCommandFailed,

    #[error("base command empty")]
    EmptyBase,

    #[error("invalid command")]
    InvalidCommand,

    #[error("could not execute command")]
    ExecutionFailed,

    #[error("line {0} of history not available")]
    HistoryUnavailable(i64),

    #[error("history recall nested more than {0} levels deep")]
    RecallTooDeep(usize),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
