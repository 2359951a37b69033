use super::*;

impl App {
    pub async fn init(&mut self) -> Result<()> {
        if self.config.auth.refresh_on_startup {
            if let Err(e) = self.auth.ensure_fresh_session().await {
                self.report_error("Failed to refresh session", e);
            }
        }

        self.status = self.session_state.current();
        match self.status {
            AuthStatus::Authenticated => {
                tracing::info!("Existing session found, opening favorites");
                self.load_favorites();
            }
            AuthStatus::Unauthenticated => {
                tracing::info!("No session, starting onboarding");
                self.onboarding = Some(OnboardingState::new());
            }
        }

        self.watch_session();
        self.is_loading = false;
        Ok(())
    }

    /// Forwards SessionState transitions into the app event queue until
    /// `shutdown` aborts the task.
    fn watch_session(&mut self) {
        let Some(tx) = self.app_async_tx.clone() else {
            return;
        };
        let mut session_state = self.session_state.clone();
        self.session_watch = Some(tokio::spawn(async move {
            while let Some(status) = session_state.next_transition().await {
                if tx.send(AppAsyncEvent::SessionChanged(status)).is_err() {
                    break;
                }
            }
        }));
    }

    pub fn shutdown(&mut self) {
        if let Some(handle) = self.session_watch.take() {
            handle.abort();
        }
    }

    pub(super) fn begin_linking(&mut self) {
        let (flow, request) = self.auth.begin_flow();
        match self.auth.authorization_url(&request) {
            Ok(url) => self.await_redirect(url.to_string(), flow),
            Err(e) => {
                self.report_error("Invalid authorization endpoint", e);
                if let Some(ref mut onboarding) = self.onboarding {
                    onboarding.error_message =
                        Some("The Ravelry sign-in address is misconfigured.".to_string());
                }
            }
        }
    }

    /// Waits for one redirect to be pasted for the pending flow and completes
    /// the authorization with it.
    fn await_redirect(&mut self, auth_url: String, flow: FlowId) {
        let Some(ref mut onboarding) = self.onboarding else {
            return;
        };
        let (tx, rx) = completion_channel();
        onboarding.begin_link(auth_url, flow, tx);

        let auth = Arc::clone(&self.auth);
        self.spawn_app_task(async move {
            let result = rx.wait().await;
            AppAsyncEvent::AuthorizationFinished {
                flow,
                result: auth.complete_flow(flow, result).await,
            }
        });
    }

    pub(super) fn submit_redirect(&mut self) {
        let Some(ref mut onboarding) = self.onboarding else {
            return;
        };
        if onboarding.redirect_input.is_empty() {
            return;
        }
        let raw = onboarding.redirect_input.take();
        match AuthorizationResult::from_redirect(&raw) {
            Ok(result) => {
                if let Some(completion) = onboarding.take_completion() {
                    onboarding.current_screen = OnboardingScreen::Exchanging;
                    onboarding.error_message = None;
                    completion.complete(result);
                }
            }
            Err(_) => {
                onboarding.error_message = Some(
                    "That doesn't look like the address Ravelry sent you to. Paste the full URL."
                        .to_string(),
                );
            }
        }
    }

    pub(super) fn cancel_linking(&mut self) {
        if let Some(ref mut onboarding) = self.onboarding {
            if let Some(completion) = onboarding.take_completion() {
                completion.complete(AuthorizationResult::Cancelled);
            }
            onboarding.reset();
        }
    }

    /// Restarts the favorites load from the stored session.
    pub(super) fn load_favorites(&mut self) {
        match self.auth.store().load() {
            Ok(Some(session)) => {
                let api = self.api.clone();
                self.favorites.start(load_favorites(api, session));
            }
            Ok(None) => self.report_error("Failed to load favorites", "not signed in"),
            Err(e) => self.report_error("Failed to read session", e),
        }
    }

    pub(super) fn sign_out(&mut self) {
        match self.auth.sign_out() {
            Ok(_) => {
                tracing::info!("Signed out");
                self.status = AuthStatus::Unauthenticated;
                self.onboarding = Some(OnboardingState::new());
                self.clear_error();
            }
            Err(e) => self.report_error("Failed to sign out", e),
        }
    }

    pub fn process_async_events(&mut self) {
        let mut async_events = Vec::new();
        if let Some(ref mut rx) = self.app_async_rx {
            while let Ok(event) = rx.try_recv() {
                async_events.push(event);
            }
        }

        for event in async_events {
            match event {
                AppAsyncEvent::AuthorizationFinished { flow, result } => match result {
                    Ok(session) => {
                        self.onboarding = None;
                        self.status = AuthStatus::Authenticated;
                        self.clear_error();
                        let api = self.api.clone();
                        self.favorites.start(load_favorites(api, session));
                    }
                    Err(e) => {
                        if self.onboarding.as_ref().and_then(|o| o.flow()) != Some(flow) {
                            tracing::debug!("Ignoring result of a replaced link attempt: {}", e);
                            continue;
                        }
                        let Some(message) = e.user_message() else {
                            if let Some(ref mut onboarding) = self.onboarding {
                                onboarding.reset();
                            }
                            continue;
                        };
                        self.report_error("Linking failed", &e);
                        let retry_url = if e.is_retryable() && self.auth.has_pending_flow() {
                            self.onboarding.as_ref().and_then(|o| o.auth_url.clone())
                        } else {
                            None
                        };
                        match retry_url {
                            Some(url) => self.await_redirect(url, flow),
                            None => {
                                if let Some(ref mut onboarding) = self.onboarding {
                                    onboarding.reset();
                                }
                            }
                        }
                        if let Some(ref mut onboarding) = self.onboarding {
                            onboarding.error_message = Some(message.to_string());
                        }
                    }
                },
                AppAsyncEvent::SessionChanged(status) => {
                    self.status = status;
                    if status == AuthStatus::Unauthenticated && self.onboarding.is_none() {
                        let mut onboarding = OnboardingState::new();
                        onboarding.error_message = Some(
                            "You've been signed out of Ravelry. Link your account to continue."
                                .to_string(),
                        );
                        self.onboarding = Some(onboarding);
                    }
                }
            }
        }
    }
}
