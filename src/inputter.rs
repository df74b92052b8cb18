use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

/// Line-editing state for the search input at the bottom of the screen.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    cursor_pos: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Default, Clone, Debug)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub cursor_pos: usize,
}

impl Inputter {
    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) => self.enter(),
            (KeyCode::Esc, KeyModifiers::NONE) => self.escape(),
            (KeyCode::Backspace, KeyModifiers::NONE) => self.backspace(),
            (KeyCode::Left, KeyModifiers::NONE) => self.left(),
            (KeyCode::Right, KeyModifiers::NONE) => self.right(),
            (kc, km) => self.key(kc, km),
        }
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            cursor_pos: self.cursor_pos,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.cursor_pos = 0;
    }

    fn enter(&mut self) -> InputResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> InputResult {
        self.clear();
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    fn backspace(&mut self) -> InputResult {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let byte_idx = self.byte_pos();
            self.current_input.remove(byte_idx);
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.cursor_pos < self.current_input.chars().count() {
            self.cursor_pos += 1;
        }
        self.get()
    }

    fn key(&mut self, code: KeyCode, _modifier: KeyModifiers) -> InputResult {
        if let Some(chr) = code.as_char() {
            let byte_idx = self.byte_pos();
            self.current_input.insert(byte_idx, chr);
            self.cursor_pos += 1;
        }
        self.get()
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
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn press(inputter: &mut Inputter, code: KeyCode) -> InputResult {
        inputter.read(KeyEvent::from(code))
    }

    #[test]
    fn typing_and_backspace() {
        let mut inputter = Inputter::default();
        press(&mut inputter, KeyCode::Char('а'));
        press(&mut inputter, KeyCode::Char('б'));
        press(&mut inputter, KeyCode::Char('в'));
        press(&mut inputter, KeyCode::Backspace);
        let result = press(&mut inputter, KeyCode::Enter);
        assert_eq!(result.input, "аб");
        assert!(result.finished);
        assert!(!result.canceled);
    }

    #[test]
    fn backspace_removes_before_cursor() {
        let mut inputter = Inputter::default();
        for c in "abc".chars() {
            press(&mut inputter, KeyCode::Char(c));
        }
        press(&mut inputter, KeyCode::Left);
        let result = press(&mut inputter, KeyCode::Backspace);
        assert_eq!(result.input, "ac");
        assert_eq!(result.cursor_pos, 1);
    }

    #[test]
    fn escape_cancels_and_clears() {
        let mut inputter = Inputter::default();
        press(&mut inputter, KeyCode::Char('x'));
        let result = press(&mut inputter, KeyCode::Esc);
        assert!(result.canceled);
        assert!(result.finished);
        assert_eq!(result.input, "");
    }
}
