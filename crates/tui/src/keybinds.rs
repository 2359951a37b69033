pub struct Keybinds;

impl Default for Keybinds {
    fn default() -> Self {
        Self
    }
}

impl Keybinds {
    pub fn help_text(&self) -> String {
        r#"Keyboard Shortcuts:

Onboarding:
  Enter         Continue / submit the pasted redirect
  Esc           Cancel linking and go back
  Paste         Paste the redirect URI from your browser

Favorites:
  r             Reload favorites
  Ctrl + L      Sign out of Ravelry

General:
  ?             Toggle this help
  Shift + E     Show latest error details
  Ctrl + Q      Quit
"#
        .to_string()
    }
}
