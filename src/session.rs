use crate::history::HistoryStore;
use std::env as stdenv;
use std::time::{Duration, Instant};

/// Process-wide state of one interactive session.
///
/// The session contains:
/// - `echo`: whether each line read is printed back as `COMMAND: <line>`.
/// - `history`: every line read so far.
/// - `user`: the identity shown in the prompt, taken from `USER` at startup.
/// - `should_exit`: set by `exit`; the loop checks it after every dispatch.
///
/// Note: fields are public so builtins can flip them directly.
#[derive(Debug, Clone)]
pub struct Session {
    pub echo: bool,
    pub history: HistoryStore,
    pub user: Option<String>,
    pub should_exit: bool,
    started: Instant,
}

impl Session {
    /// Start a session now, reading the user name from the process environment.
    pub fn new() -> Self {
        Self::with_user(stdenv::var("USER").ok())
    }

    pub fn with_user(user: Option<String>) -> Self {
        Self {
            echo: true,
            history: HistoryStore::new(),
            user,
            should_exit: false,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Prompt text shown before each read, e.g. `[alice] $ `.
    ///
    /// An unset user renders as `[] $ `.
    pub fn prompt(&self) -> String {
        format!("[{}] $ ", self.user.as_deref().unwrap_or(""))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
