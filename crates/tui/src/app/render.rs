use super::*;
use ratatui::layout::{Constraint, Layout};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

impl App {
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        if self.is_loading {
            self.render_loading(frame, area);
            return;
        }

        if self.show_help {
            self.render_help(frame, area);
            return;
        }

        if let Some(ref onboarding) = self.onboarding {
            self.render_onboarding(frame, area, onboarding);
        } else {
            self.render_favorites(frame, area);
        }

        if self.show_error_details {
            self.render_error_details(frame, area);
        }
    }

    fn render_loading(&self, frame: &mut Frame, area: Rect) {
        let text = format!("\n\n  {}  \n\n", self.loading_message);
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(" hooked "))
            .centered();
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let paragraph = Paragraph::new(self.keybinds.help_text())
            .block(Block::default().borders(Borders::ALL).title(" Help "));
        frame.render_widget(paragraph, area);
    }

    fn render_onboarding(&self, frame: &mut Frame, area: Rect, state: &OnboardingState) {
        let mut content = match state.current_screen {
            OnboardingScreen::Welcome => "\n\n  Hooked\n\n    Update your current projects\n    Find new inspiration\n    Connect with the community\n\n  But first, we need you to loop us in! Connect to Ravelry to get started.\n\n  Press [Enter] to link your account, [Esc] to quit\n\n  Linking to Ravelry does not give Hooked access to any of your private\n  information, like passwords or payment details.\n".to_owned(),
            OnboardingScreen::LinkAccount => {
                let url = state.auth_url.as_deref().unwrap_or("[building link...]");
                let pasted = if state.redirect_input.buffer.is_empty() {
                    "[paste here]"
                } else {
                    state.redirect_input.buffer.as_str()
                };
                format!(
                    "\n\n  Link your Ravelry account:\n\n  1. Visit: {}\n\n  2. Approve access for Hooked\n\n  3. Paste the address your browser lands on:\n\n  Redirect: {}\n\n  Press [Enter] to finish linking, [Esc] to cancel\n",
                    url, pasted
                )
            }
            OnboardingScreen::Exchanging => {
                "\n\n  Finishing up with Ravelry...\n".to_owned()
            }
        };

        if let Some(ref message) = state.error_message {
            content.push_str(&format!("\n  ! {}\n", message));
        }

        let paragraph = Paragraph::new(content)
            .block(Block::default().borders(Borders::ALL).title(" Welcome to Hooked "))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_favorites(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).split(area);

        let body = match &*self.favorites.borrow() {
            ResourceState::Loading => Paragraph::new("\n\n  Loading favorites...").centered(),
            ResourceState::Error(message) => {
                Paragraph::new(format!("\n\n  {}\n\n  Press [r] to try again", message))
            }
            ResourceState::Success(view) => {
                let mut text = format!("\n  Welcome, {}!\n\n", view.username);
                if view.items.is_empty() {
                    text.push_str("  No favorites yet.\n");
                }
                for favorite in &view.items {
                    text.push_str(&format!("  * {}\n", favorite.display_name()));
                }
                Paragraph::new(text)
            }
        };
        frame.render_widget(
            body.block(Block::default().borders(Borders::ALL).title(" Favorites "))
                .wrap(Wrap { trim: false }),
            chunks[0],
        );

        let status = match &self.last_error {
            Some(error) => format!(" {} ([E] details)", error),
            None => " [r] reload  [Ctrl+L] sign out  [?] help  [Ctrl+Q] quit".to_string(),
        };
        frame.render_widget(Paragraph::new(status), chunks[1]);
    }

    fn render_error_details(&self, frame: &mut Frame, area: Rect) {
        let popup = Rect {
            x: area.x + area.width / 8,
            y: area.y + area.height / 3,
            width: area.width - area.width / 4,
            height: (area.height / 3).max(5),
        }
        .intersection(area);
        let text = self
            .last_error
            .clone()
            .unwrap_or_else(|| "No errors".to_string());
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(text)
                .block(Block::default().borders(Borders::ALL).title(" Error "))
                .wrap(Wrap { trim: false }),
            popup,
        );
    }
}
