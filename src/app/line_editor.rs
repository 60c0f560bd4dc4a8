/// Append-only single-line buffer used for the search query and the title
/// prompt. Edits happen at the end; there is no cursor movement.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LineEditor {
    text: String,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Appends a printable character. Control characters are dropped so the
    /// buffer always stays on one line.
    pub fn push(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.text.push(ch);
        true
    }

    /// Removes the last character; returns whether anything was removed.
    pub fn backspace(&mut self) -> bool {
        self.text.pop().is_some()
    }
}
