//! The account-linking flow: build an authorization request, verify what
//! comes back, exchange the code and persist the resulting session.

use crate::config::OAuthConfig;
use crate::error::{AuthError, AuthResult, ExchangeError, StoreError};
use crate::exchange::{HttpTokenExchanger, TokenExchanger, TokenGrant};
use crate::pkce::{challenge_for, constant_time_eq, random_token, Pkce};
use crate::request::{AuthorizationRequest, AuthorizationResult};
use crate::session::Session;
use crate::session_state::SessionState;
use crate::token_store::TokenStore;
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

/// In-memory state of the one flow in flight. Never persisted.
struct PendingFlow {
    id: u64,
    state: String,
    pkce: Pkce,
    /// SHA-256 digests of codes already sent to the token endpoint.
    submitted_codes: HashSet<String>,
}

/// Identifies one flow started by `AuthenticationManager::begin_flow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowId(u64);

pub struct AuthenticationManager {
    config: OAuthConfig,
    exchanger: Arc<dyn TokenExchanger>,
    store: Arc<TokenStore>,
    pending: Mutex<Option<PendingFlow>>,
    next_flow_id: AtomicU64,
    exchange_timeout: Duration,
}

impl AuthenticationManager {
    pub fn new(config: OAuthConfig, store: Arc<TokenStore>) -> Self {
        let exchanger = Arc::new(HttpTokenExchanger::new(config.clone()));
        Self::with_exchanger(config, store, exchanger)
    }

    pub fn with_exchanger(
        config: OAuthConfig,
        store: Arc<TokenStore>,
        exchanger: Arc<dyn TokenExchanger>,
    ) -> Self {
        Self {
            config,
            exchanger,
            store,
            pending: Mutex::new(None),
            next_flow_id: AtomicU64::new(1),
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }

    pub fn with_exchange_timeout(mut self, exchange_timeout: Duration) -> Self {
        self.exchange_timeout = exchange_timeout;
        self
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    pub fn session_state(&self) -> SessionState {
        SessionState::attach(&self.store)
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<PendingFlow>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn has_pending_flow(&self) -> bool {
        self.lock_pending().is_some()
    }

    /// Starts a new flow, replacing any flow already pending.
    pub fn build_authorization_request(&self) -> AuthorizationRequest {
        self.begin_flow().1
    }

    /// Like `build_authorization_request`, also returning the id that
    /// `complete_flow` scopes its completion to.
    pub fn begin_flow(&self) -> (FlowId, AuthorizationRequest) {
        self.begin_flow_with(random_token(), Pkce::generate())
    }

    #[cfg(test)]
    fn build_authorization_request_with(&self, state: String, pkce: Pkce) -> AuthorizationRequest {
        self.begin_flow_with(state, pkce).1
    }

    fn begin_flow_with(&self, state: String, pkce: Pkce) -> (FlowId, AuthorizationRequest) {
        let request = AuthorizationRequest {
            client_id: self.config.client_id.clone(),
            redirect_uri: self.config.redirect_uri.clone(),
            scope: self.config.scope.clone(),
            state: state.clone(),
            code_challenge: pkce.challenge.clone(),
        };

        let id = self.next_flow_id.fetch_add(1, Ordering::Relaxed);
        let replaced = self.lock_pending().replace(PendingFlow {
            id,
            state,
            pkce,
            submitted_codes: HashSet::new(),
        });
        if replaced.is_some() {
            debug!("Replaced pending authorization flow");
        }
        info!("Started authorization flow {}", id);
        (FlowId(id), request)
    }

    pub fn authorization_url(&self, request: &AuthorizationRequest) -> Result<Url, url::ParseError> {
        request.to_url(&self.config.authorize_url)
    }

    pub async fn complete_authorization(&self, result: AuthorizationResult) -> AuthResult<Session> {
        self.complete_authorization_within(result, self.exchange_timeout)
            .await
    }

    pub async fn complete_authorization_within(
        &self,
        result: AuthorizationResult,
        limit: Duration,
    ) -> AuthResult<Session> {
        self.complete(None, result, limit).await
    }

    /// Completes the flow `flow` only. A result for a flow that has since been
    /// replaced leaves the newer flow pending.
    pub async fn complete_flow(
        &self,
        flow: FlowId,
        result: AuthorizationResult,
    ) -> AuthResult<Session> {
        self.complete(Some(flow), result, self.exchange_timeout)
            .await
    }

    async fn complete(
        &self,
        scope: Option<FlowId>,
        result: AuthorizationResult,
        limit: Duration,
    ) -> AuthResult<Session> {
        let (code, returned_state) = match result {
            AuthorizationResult::Cancelled => {
                self.discard_pending(scope);
                info!("Authorization cancelled by user");
                return Err(AuthError::UserCancelled);
            }
            AuthorizationResult::Error(code) => {
                self.discard_pending(scope);
                warn!("Authorization denied by provider: {}", code);
                return Err(AuthError::ProviderDenied(code));
            }
            AuthorizationResult::Code { code, state } => (code, state),
        };

        let (flow_id, code_verifier) = {
            let mut pending = self.lock_pending();
            let Some(flow) = pending.as_mut() else {
                warn!("Authorization code received with no pending flow");
                return Err(AuthError::StateMismatch);
            };
            if scope.is_some_and(|FlowId(id)| id != flow.id) {
                warn!("Authorization code received for a replaced flow");
                return Err(AuthError::StateMismatch);
            }
            if !constant_time_eq(&flow.state, &returned_state) {
                warn!("Authorization state mismatch, aborting flow {}", flow.id);
                *pending = None;
                return Err(AuthError::StateMismatch);
            }
            if !flow.submitted_codes.insert(challenge_for(&code)) {
                warn!("Authorization code resubmitted for flow {}", flow.id);
                return Err(ExchangeError::CodeAlreadyUsed.into());
            }
            (flow.id, flow.pkce.verifier.clone())
        };

        let grant = TokenGrant::AuthorizationCode {
            code,
            code_verifier,
        };
        let session = self.exchange_bounded(grant, limit).await?;

        self.store.save(&session)?;
        {
            let mut pending = self.lock_pending();
            if pending.as_ref().is_some_and(|flow| flow.id == flow_id) {
                *pending = None;
            }
        }

        info!("Linked Ravelry account {}", session.account);
        Ok(session)
    }

    fn discard_pending(&self, scope: Option<FlowId>) {
        let mut pending = self.lock_pending();
        let owned = match (scope, pending.as_ref()) {
            (Some(FlowId(id)), Some(flow)) => flow.id == id,
            _ => true,
        };
        if owned {
            *pending = None;
        }
    }

    async fn exchange_bounded(&self, grant: TokenGrant, limit: Duration) -> AuthResult<Session> {
        bounded(limit, self.exchanger.exchange(grant))
            .await
            .map_err(|e| {
                warn!("Token exchange failed: {}", e);
                AuthError::ExchangeFailed(e)
            })
    }

    /// Trades the stored refresh token for a new session. A rejected refresh
    /// token signs the user out.
    pub async fn refresh_session(&self) -> AuthResult<Session> {
        let current = self.store.load()?.ok_or(AuthError::NotRefreshable)?;
        let refresh_token = current
            .refresh_token
            .clone()
            .ok_or(AuthError::NotRefreshable)?;

        let grant = TokenGrant::RefreshToken(refresh_token);
        let mut session = match bounded(self.exchange_timeout, self.exchanger.exchange(grant)).await
        {
            Ok(session) => session,
            Err(e) if e.is_rejection() => {
                warn!("Refresh token rejected, signing out");
                self.store.clear()?;
                return Err(e.into());
            }
            Err(e) => {
                warn!("Session refresh failed: {}", e);
                return Err(e.into());
            }
        };

        if session.refresh_token.is_none() {
            session.refresh_token = current.refresh_token;
        }
        self.store.save(&session)?;
        info!("Refreshed session for {}", session.account);
        Ok(session)
    }

    /// Returns the stored session, refreshing it first if it has expired.
    pub async fn ensure_fresh_session(&self) -> AuthResult<Option<Session>> {
        match self.store.load()? {
            Some(session) if session.is_expired() && session.refresh_token.is_some() => {
                self.refresh_session().await.map(Some)
            }
            other => Ok(other),
        }
    }

    pub fn sign_out(&self) -> Result<bool, StoreError> {
        self.lock_pending().take();
        self.store.clear()
    }
}

async fn bounded<F>(limit: Duration, exchange: F) -> Result<Session, ExchangeError>
where
    F: Future<Output = Result<Session, ExchangeError>>,
{
    match timeout(limit, exchange).await {
        Ok(result) => result,
        Err(_) => Err(ExchangeError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct CountingExchanger {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenExchanger for CountingExchanger {
        async fn exchange(&self, _grant: TokenGrant) -> Result<Session, ExchangeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Session {
                access_token: "t1".to_string(),
                refresh_token: None,
                expires_at: None,
                account: "knitter".to_string(),
            })
        }
    }

    fn manager() -> (AuthenticationManager, Arc<CountingExchanger>) {
        let exchanger = Arc::new(CountingExchanger {
            calls: AtomicUsize::new(0),
        });
        let manager = AuthenticationManager::with_exchanger(
            OAuthConfig {
                client_id: "client-1".to_string(),
                ..OAuthConfig::default()
            },
            Arc::new(TokenStore::in_memory()),
            exchanger.clone(),
        );
        (manager, exchanger)
    }

    #[tokio::test]
    async fn mismatched_state_never_reaches_the_exchanger() {
        let (manager, exchanger) = manager();
        manager.build_authorization_request_with("abc".to_string(), Pkce::generate());

        let err = manager
            .complete_authorization(AuthorizationResult::Code {
                code: "code-1".to_string(),
                state: "xyz".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::StateMismatch));
        assert_eq!(exchanger.calls.load(Ordering::SeqCst), 0);
        assert!(!manager.has_pending_flow());
        assert_eq!(manager.store().load().expect("load"), None);
    }

    #[tokio::test]
    async fn new_request_invalidates_the_previous_state() {
        let (manager, exchanger) = manager();
        let first = manager.build_authorization_request();
        let second = manager.build_authorization_request();
        assert_ne!(first.state, second.state);
        assert_ne!(first.code_challenge, second.code_challenge);

        let err = manager
            .complete_authorization(AuthorizationResult::Code {
                code: "code-1".to_string(),
                state: first.state,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StateMismatch));
        assert_eq!(exchanger.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn code_without_pending_flow_is_rejected() {
        let (manager, exchanger) = manager();
        let err = manager
            .complete_authorization(AuthorizationResult::Code {
                code: "code-1".to_string(),
                state: "abc".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StateMismatch));
        assert_eq!(exchanger.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn late_cancel_of_a_replaced_flow_keeps_the_new_flow() {
        let (manager, exchanger) = manager();
        let (first, _) = manager.begin_flow();
        let (_, second) = manager.begin_flow();

        let err = manager
            .complete_flow(first, AuthorizationResult::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserCancelled));
        assert!(manager.has_pending_flow());

        let session = manager
            .complete_authorization(AuthorizationResult::Code {
                code: "code-1".to_string(),
                state: second.state,
            })
            .await
            .expect("second flow still completes");
        assert_eq!(session.access_token, "t1");
        assert_eq!(exchanger.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn code_for_a_replaced_flow_leaves_the_new_flow_pending() {
        let (manager, exchanger) = manager();
        let (first, request) = manager.begin_flow();
        manager.begin_flow();

        let err = manager
            .complete_flow(
                first,
                AuthorizationResult::Code {
                    code: "code-1".to_string(),
                    state: request.state,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StateMismatch));
        assert!(manager.has_pending_flow());
        assert_eq!(exchanger.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn request_url_uses_configured_endpoint() {
        let (manager, _) = manager();
        let request = manager.build_authorization_request();
        let url = manager.authorization_url(&request).expect("url");
        assert!(url
            .as_str()
            .starts_with("https://www.ravelry.com/oauth2/auth?"));
        assert!(url.as_str().contains("code_challenge_method=S256"));
    }
}
