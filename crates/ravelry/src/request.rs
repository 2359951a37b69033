use std::fmt;
use url::Url;

/// One authorization attempt as handed to the browser. Built fresh per
/// attempt by `AuthenticationManager::build_authorization_request`.
#[derive(Clone)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub state: String,
    pub code_challenge: String,
}

impl AuthorizationRequest {
    pub fn to_url(&self, authorize_url: &str) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", self.scope.as_str()),
                ("state", self.state.as_str()),
                ("code_challenge", self.code_challenge.as_str()),
                ("code_challenge_method", "S256"),
            ],
        )
    }
}

impl fmt::Debug for AuthorizationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationRequest")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .field("state", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}

/// What the authorization surface handed back. Consumed by
/// `AuthenticationManager::complete_authorization`.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthorizationResult {
    Code { code: String, state: String },
    Cancelled,
    Error(String),
}

impl AuthorizationResult {
    /// Reads the outcome from the URI the provider redirected to.
    pub fn from_redirect(uri: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(uri.trim())?;
        let mut code = None;
        let mut state = None;
        let mut error = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                _ => {}
            }
        }

        Ok(match (error, code, state) {
            (Some(error), _, _) => AuthorizationResult::Error(error),
            (None, Some(code), Some(state)) => AuthorizationResult::Code { code, state },
            _ => AuthorizationResult::Error("invalid_request".to_string()),
        })
    }
}

impl fmt::Debug for AuthorizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorizationResult::Code { .. } => f.write_str("Code { .. }"),
            AuthorizationResult::Cancelled => f.write_str("Cancelled"),
            AuthorizationResult::Error(code) => f.debug_tuple("Error").field(code).finish(),
        }
    }
}
