/// Every line the shell has read, in the order it was read.
///
/// Entries are addressed from 1. Lines are stored verbatim, trailing newline included, and
/// nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    lines: Vec<String>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, raw: impl Into<String>) {
        self.lines.push(raw.into());
    }

    /// The `n`-th line, counting from the first one ever appended.
    pub fn get(&self, n: i64) -> Option<&str> {
        let index = usize::try_from(n).ok()?.checked_sub(1)?;
        self.lines.get(index).map(String::as_str)
    }

    /// Numbered entries, `(1, first line)` onwards.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| (i + 1, line.as_str()))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
