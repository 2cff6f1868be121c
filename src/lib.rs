//! A tiny interactive shell.
//!
//! Each input line is split on spaces into a base command and its arguments. A few builtins are
//! handled in-process (`exit`, `set`, `size`, `history`, `time`, `times`, `repeat` and `!N`
//! history recall); every other line is handed to the system shell unchanged.
//!
//! The main entry point is [`Interpreter`], which owns the [`Session`] state and runs the
//! read-dispatch loop over any [`LineSource`]. External execution goes through the
//! [`CommandRunner`] trait, implemented for the real system by [`SystemShell`].

mod builtin;
pub mod command;
pub mod config;
pub mod error;
mod external;
pub mod history;
mod interpreter;
pub mod io_adapters;
pub mod parser;
pub mod session;
#[cfg(test)]
mod testing;

pub use command::{Command, CommandRunner, ExitCode};
pub use config::ShellConfig;
pub use error::ShellError;
pub use external::SystemShell;
pub use interpreter::Interpreter;
pub use io_adapters::LineSource;
pub use session::Session;
