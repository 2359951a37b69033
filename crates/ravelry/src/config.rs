use serde::{Deserialize, Serialize};

pub const DEFAULT_AUTHORIZE_URL: &str = "https://www.ravelry.com/oauth2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://www.ravelry.com/oauth2/token";
pub const DEFAULT_API_BASE: &str = "https://api.ravelry.com";
pub const DEFAULT_REDIRECT_URI: &str = "hooked://oauth/callback";
pub const DEFAULT_SCOPE: &str = "offline profile-only";

/// Client registration and endpoints for the Ravelry OAuth2 provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scope: String,
    pub authorize_url: String,
    pub token_url: String,
    pub api_base: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}
