use crate::favorites::{load_favorites, FavoritesResource};
use crate::keybinds::Keybinds;
use crate::onboarding::{OnboardingScreen, OnboardingState};
use crate::resource::ResourceState;
use crate::Config;
use anyhow::Result;
use hooked_ravelry::api::RavelryApi;
use hooked_ravelry::{
    completion_channel, AuthStatus, AuthenticationManager, AuthorizationResult, FlowId,
    SessionState, TokenStore,
};
use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::Frame;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

mod effects;
mod input;
mod render;
mod state;
mod types;

pub use state::App;
pub use types::AppAsyncEvent;

impl App {
    pub(super) fn report_error(&mut self, context: &str, error: impl std::fmt::Display) {
        let message = format!("{context}: {}", Self::redact_sensitive(&error.to_string()));
        self.last_error = Some(message.clone());
        tracing::warn!("{message}");
    }

    pub(super) fn clear_error(&mut self) {
        self.last_error = None;
        self.show_error_details = false;
    }

    fn redact_sensitive(input: &str) -> String {
        let mut redacted = input.replace("Bearer ", "Bearer [REDACTED] ");
        for key in ["code=", "state=", "access_token", "refresh_token"] {
            if let Some(pos) = redacted.find(key) {
                redacted.truncate(pos + key.len());
                redacted.push_str("[REDACTED]");
            }
        }
        redacted
    }

    pub(super) fn spawn_app_task<F>(&self, future: F)
    where
        F: Future<Output = AppAsyncEvent> + Send + 'static,
    {
        if let Some(tx) = self.app_async_tx.clone() {
            tokio::spawn(async move {
                let event = future.await;
                let _ = tx.send(event);
            });
        }
    }
}
