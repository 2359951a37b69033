use super::*;

impl App {
    pub fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Key(key) => self.handle_key_event(key),
            Event::Paste(text) => {
                self.handle_paste(&text);
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    fn is_typing_redirect(&self) -> bool {
        self.onboarding
            .as_ref()
            .is_some_and(|o| o.current_screen == OnboardingScreen::LinkAccount)
    }

    fn handle_paste(&mut self, text: &str) {
        if !self.is_typing_redirect() {
            return;
        }
        if let Some(ref mut onboarding) = self.onboarding {
            for c in text.chars() {
                onboarding.redirect_input.handle_char(c);
            }
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<bool> {
        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }

        if self.show_help {
            if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
                self.show_help = false;
            }
            return Ok(false);
        }

        if self.show_error_details {
            match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('E') => {
                    self.show_error_details = false;
                }
                _ => {}
            }
            return Ok(false);
        }

        if !self.is_typing_redirect() {
            match key.code {
                KeyCode::Char('?') => {
                    self.show_help = true;
                    return Ok(false);
                }
                KeyCode::Char('E') if self.last_error.is_some() => {
                    self.show_error_details = true;
                    return Ok(false);
                }
                _ => {}
            }
        }

        if let Some(screen) = self.onboarding.as_ref().map(|o| o.current_screen) {
            match screen {
                OnboardingScreen::Welcome => match key.code {
                    KeyCode::Enter => self.begin_linking(),
                    KeyCode::Esc => return Ok(true),
                    _ => {}
                },
                OnboardingScreen::LinkAccount => match key.code {
                    KeyCode::Enter => self.submit_redirect(),
                    KeyCode::Esc => self.cancel_linking(),
                    KeyCode::Backspace => {
                        if let Some(ref mut onboarding) = self.onboarding {
                            onboarding.redirect_input.handle_backspace();
                        }
                    }
                    KeyCode::Char(c) => {
                        if let Some(ref mut onboarding) = self.onboarding {
                            onboarding.redirect_input.handle_char(c);
                        }
                    }
                    _ => {}
                },
                OnboardingScreen::Exchanging => {}
            }
            return Ok(false);
        }

        match key.code {
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.sign_out();
            }
            KeyCode::Char('r') => self.load_favorites(),
            _ => {}
        }

        Ok(false)
    }
}
