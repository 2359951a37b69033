use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization cancelled by user")]
    UserCancelled,

    #[error("Authorization denied by provider: {0}")]
    ProviderDenied(String),

    #[error("Authorization state did not match the pending request")]
    StateMismatch,

    #[error("Token exchange failed: {0}")]
    ExchangeFailed(#[from] ExchangeError),

    #[error("Failed to persist session: {0}")]
    Storage(#[from] StoreError),

    #[error("No stored session with a refresh token")]
    NotRefreshable,
}

impl AuthError {
    /// Message shown to the user, `None` when the outcome should stay silent.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            AuthError::UserCancelled => None,
            AuthError::ProviderDenied(_) => {
                Some("Ravelry declined the request. Please try linking again.")
            }
            AuthError::StateMismatch => {
                Some("That sign-in response did not match this request. Please start over.")
            }
            AuthError::ExchangeFailed(ExchangeError::Timeout) => {
                Some("Ravelry took too long to respond. Please try again.")
            }
            AuthError::ExchangeFailed(ExchangeError::CodeAlreadyUsed) => {
                Some("That sign-in code was already used. Please authorize again.")
            }
            AuthError::ExchangeFailed(_) => {
                Some("Could not finish linking your account. Check your connection.")
            }
            AuthError::Storage(_) => Some("Could not save your session on this device."),
            AuthError::NotRefreshable => Some("Please link your Ravelry account again."),
        }
    }

    /// Whether the caller may retry the exchange without restarting the flow.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::ExchangeFailed(e) if !matches!(e, ExchangeError::CodeAlreadyUsed))
    }
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Token endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("Timed out waiting for the token endpoint")]
    Timeout,

    #[error("Authorization code was already submitted")]
    CodeAlreadyUsed,
}

impl ExchangeError {
    /// The provider rejected the grant itself rather than failing to answer.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ExchangeError::Http { status: 400 | 401, .. })
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ExchangeError::Timeout
        } else if e.is_decode() {
            ExchangeError::Parse(e.to_string())
        } else {
            ExchangeError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Crypto error: {0}")]
    Crypto(&'static str),

    #[error("Could not determine project directories")]
    NoDataDir,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed API response: {0}")]
    Parse(String),

    #[error("Invalid API base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::Auth(_) => "Your Ravelry session expired. Please link your account again.",
            ApiError::Network(_) => "Network error. Check your connection.",
            ApiError::Status { .. } | ApiError::Parse(_) => {
                "Ravelry returned an error. Please try again later."
            }
            ApiError::InvalidUrl(_) => "The Ravelry API address is misconfigured.",
        }
    }
}

impl From<ApiError> for ExchangeError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Auth(body) => ExchangeError::Http { status: 401, body },
            ApiError::Network(e) => e.into(),
            ApiError::Status { status, body } => ExchangeError::Http { status, body },
            ApiError::Parse(msg) => ExchangeError::Parse(msg),
            ApiError::InvalidUrl(msg) => ExchangeError::Network(msg),
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
