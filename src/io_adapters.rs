use crate::command::LINE_MAX;
use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, Write};

/// Outcome of one successful read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A line, trailing newline included when the source had one.
    Line(String),
    Eof,
}

/// Where the session loop gets its lines from.
pub trait LineSource {
    /// Show `prompt` and read one line.
    ///
    /// `out` is the stream the shell writes its own output to; sources that draw the prompt
    /// themselves may ignore it. Any `Err` is a failed read.
    fn read_line(&mut self, prompt: &str, out: &mut dyn Write) -> Result<Input>;
}

/// Interactive reader backed by a line editor.
pub struct EditorInput {
    editor: DefaultEditor,
}

impl EditorInput {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for EditorInput {
    fn read_line(&mut self, prompt: &str, _out: &mut dyn Write) -> Result<Input> {
        match self.editor.readline(prompt) {
            Ok(mut line) => {
                self.editor.add_history_entry(line.as_str())?;
                // the editor strips the newline, but history and echo want it
                line.push('\n');
                Ok(Input::Line(clamp_line(line)))
            }
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(err) => Err(err.into()),
        }
    }
}

/// Reader for any buffered source, used when standard input is not a terminal.
pub struct PlainInput<R> {
    reader: R,
}

impl<R: BufRead> PlainInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for PlainInput<R> {
    fn read_line(&mut self, prompt: &str, out: &mut dyn Write) -> Result<Input> {
        write!(out, "{}", prompt)?;
        out.flush()?;

        let mut bytes = Vec::new();
        if self.reader.read_until(b'\n', &mut bytes)? == 0 {
            return Ok(Input::Eof);
        }
        // bytes that are not UTF-8 become U+FFFD; the line itself is never dropped
        let line = String::from_utf8_lossy(&bytes).into_owned();
        Ok(Input::Line(clamp_line(line)))
    }
}

/// Fit a line into the input buffer: at most `LINE_MAX - 1` bytes, newline included.
///
/// Longer lines keep their first `LINE_MAX - 2` bytes (or fewer, to stay on a char boundary)
/// followed by a newline.
pub fn clamp_line(mut line: String) -> String {
    if line.len() < LINE_MAX {
        return line;
    }
    let mut cut = LINE_MAX - 2;
    while !line.is_char_boundary(cut) {
        cut -= 1;
    }
    line.truncate(cut);
    line.push('\n');
    line
}
