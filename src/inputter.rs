use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::trace;

/// Single line text input of a form field.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    cursor_pos: usize, // In characters, not bytes
    masked: bool,
}

/// Result of feeding one key to an `Inputter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResult {
    Edited,
    Unchanged,
    Ignored, // Key is not handled by the input, the form may use it
}

impl Inputter {
    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, KeyModifiers::NONE) => self.left(),
            (KeyCode::Right, KeyModifiers::NONE) => self.right(),
            (KeyCode::Home, _) => self.home(),
            (KeyCode::End, _) => self.end(),
            (KeyCode::Char(chr), KeyModifiers::NONE | KeyModifiers::SHIFT) => self.insert(chr),
            (kc, km) => {
                trace!("Input ignores {kc:?} {km:?}");
                InputResult::Ignored
            }
        }
    }

    pub fn value(&self) -> &str {
        &self.current_input
    }

    pub fn is_blank(&self) -> bool {
        self.current_input.trim().is_empty()
    }

    /// Text to render. Masked inputs show one `*` per character.
    pub fn display(&self) -> String {
        if self.masked {
            "*".repeat(self.current_input.chars().count())
        } else {
            self.current_input.clone()
        }
    }

    pub fn cursor_pos(&self) -> usize {
        self.cursor_pos
    }

    fn insert(&mut self, chr: char) -> InputResult {
        self.current_input.insert(self.byte_pos(), chr);
        self.cursor_pos += 1;
        InputResult::Edited
    }

    fn backspace(&mut self) -> InputResult {
        if self.cursor_pos == 0 {
            return InputResult::Unchanged;
        }
        self.cursor_pos -= 1;
        self.current_input.remove(self.byte_pos());
        InputResult::Edited
    }

    fn delete(&mut self) -> InputResult {
        if self.cursor_pos >= self.current_input.chars().count() {
            return InputResult::Unchanged;
        }
        self.current_input.remove(self.byte_pos());
        InputResult::Edited
    }

    fn left(&mut self) -> InputResult {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
        InputResult::Unchanged
    }

    fn right(&mut self) -> InputResult {
        if self.cursor_pos < self.current_input.chars().count() {
            self.cursor_pos += 1;
        }
        InputResult::Unchanged
    }

    fn home(&mut self) -> InputResult {
        self.cursor_pos = 0;
        InputResult::Unchanged
    }

    fn end(&mut self) -> InputResult {
        self.cursor_pos = self.current_input.chars().count();
        InputResult::Unchanged
    }

    fn byte_pos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.cursor_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
pub(crate) fn key(code: KeyCode) -> event::KeyEvent {
    event::KeyEvent::new(code, KeyModifiers::NONE)
}

#[cfg(test)]
pub(crate) fn type_text(input: &mut Inputter, text: &str) {
    for chr in text.chars() {
        input.read(key(KeyCode::Char(chr)));
    }
}
