pub mod api;
pub mod callback;
pub mod config;
pub mod error;
pub mod exchange;
pub mod manager;
pub mod pkce;
pub mod request;
pub mod session;
pub mod session_state;
pub mod token_store;
pub mod types;

pub use callback::{completion_channel, CompletionReceiver, CompletionSender};
pub use config::OAuthConfig;
pub use error::{ApiError, AuthError, AuthResult, ExchangeError, StoreError};
pub use manager::{AuthenticationManager, FlowId};
pub use request::{AuthorizationRequest, AuthorizationResult};
pub use session::Session;
pub use session_state::{AuthStatus, SessionState};
pub use token_store::{CredentialBackend, EncryptedFileBackend, MemoryBackend, TokenStore};
