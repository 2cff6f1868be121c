use crate::command::{Command, MAX_ARGS};
use regex::Regex;
use std::sync::LazyLock;

static LEADING_INT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?[0-9]+)").expect("leading integer pattern is valid")
});

/// Split a raw input line into its base command and arguments.
///
/// Tokens are separated by runs of the space character only; tabs and other whitespace are
/// part of a token. Everything from the first newline on is removed from each token, but `raw`
/// keeps the line untouched. Arguments past [`MAX_ARGS`] are dropped.
///
/// A line without tokens yields an empty base. That is still a valid [`Command`]; rejecting
/// it is up to the dispatcher.
pub fn parse(line: &str) -> Command {
    let mut tokens = line
        .split(' ')
        .filter(|token| !token.is_empty())
        .map(strip_newline);

    let base = tokens.next().unwrap_or_default();
    let arguments = tokens.take(MAX_ARGS).collect();

    Command::new(base, arguments, line.to_owned())
}

fn strip_newline(token: &str) -> String {
    match token.find('\n') {
        Some(end) => token[..end].to_owned(),
        None => token.to_owned(),
    }
}

/// Read the integer at the start of `text` the way C's `atoi` does.
///
/// Leading whitespace and a sign are accepted and anything after the digits is ignored.
/// Values outside the `i64` range saturate. Returns `None` when `text` does not start with a
/// number at all.
pub fn leading_int(text: &str) -> Option<i64> {
    let digits = LEADING_INT.captures(text)?.get(1)?.as_str();
    Some(match digits.parse::<i64>() {
        Ok(n) => n,
        Err(_) if digits.starts_with('-') => i64::MIN,
        Err(_) => i64::MAX,
    })
}
