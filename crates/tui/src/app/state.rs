use super::*;

pub struct App {
    pub should_quit: bool,
    pub config: Config,
    pub auth: Arc<AuthenticationManager>,
    pub api: RavelryApi,
    pub session_state: SessionState,
    pub status: AuthStatus,
    pub onboarding: Option<OnboardingState>,
    pub favorites: FavoritesResource,
    pub keybinds: Keybinds,
    pub show_help: bool,
    pub is_loading: bool,
    pub loading_message: String,
    pub last_error: Option<String>,
    pub show_error_details: bool,
    pub app_async_tx: Option<mpsc::UnboundedSender<AppAsyncEvent>>,
    pub app_async_rx: Option<mpsc::UnboundedReceiver<AppAsyncEvent>>,
    pub(super) session_watch: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(config: Config, store: Arc<TokenStore>) -> Self {
        let (app_async_tx, app_async_rx) = mpsc::unbounded_channel();
        let auth = AuthenticationManager::new(config.ravelry.clone(), store)
            .with_exchange_timeout(config.auth.exchange_timeout());
        let session_state = auth.session_state();
        let status = session_state.current();

        Self {
            should_quit: false,
            api: RavelryApi::new(config.ravelry.api_base.clone()),
            config,
            auth: Arc::new(auth),
            session_state,
            status,
            onboarding: None,
            favorites: FavoritesResource::new(),
            keybinds: Keybinds,
            show_help: false,
            is_loading: true,
            loading_message: "Checking your Ravelry session...".to_string(),
            last_error: None,
            show_error_details: false,
            app_async_tx: Some(app_async_tx),
            app_async_rx: Some(app_async_rx),
            session_watch: None,
        }
    }
}
