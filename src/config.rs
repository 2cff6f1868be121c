/// How deep `!N` recalls may nest unless configured otherwise.
pub const DEFAULT_RECALL_DEPTH: usize = 32;

/// Run-time options of a shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Echo each line back as `COMMAND: <line>` from the start.
    pub echo: bool,
    /// End the session with status 0 at end of input instead of reporting a read failure.
    pub exit_on_eof: bool,
    /// Maximum nesting of history recalls.
    pub recall_depth: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            echo: true,
            exit_on_eof: false,
            recall_depth: DEFAULT_RECALL_DEPTH,
        }
    }
}
