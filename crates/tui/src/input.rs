/// Single-line text entry used for pasting the redirect URI.
pub struct InputState {
    pub buffer: String,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if !c.is_control() {
            self.buffer.push(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        self.buffer.pop();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer).trim().to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::InputState;

    #[test]
    fn take_trims_and_clears() {
        let mut input = InputState::new();
        for c in " hooked://x ".chars() {
            input.handle_char(c);
        }
        input.handle_char('\u{7}');
        assert_eq!(input.take(), "hooked://x");
        assert!(input.is_empty());
    }
}
