use hooked_ravelry::OAuthConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ravelry: OAuthConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub exchange_timeout_seconds: u64,
    pub refresh_on_startup: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            exchange_timeout_seconds: 30,
            refresh_on_startup: true,
        }
    }
}

impl AuthConfig {
    pub fn exchange_timeout(&self) -> Duration {
        Duration::from_secs(self.exchange_timeout_seconds)
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::info!("Using default config ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Applies `HOOKED_CLIENT_ID` / `HOOKED_CLIENT_SECRET` over the file values.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(client_id) = lookup("HOOKED_CLIENT_ID").filter(|v| !v.is_empty()) {
            self.ravelry.client_id = client_id;
        }
        if let Some(secret) = lookup("HOOKED_CLIENT_SECRET").filter(|v| !v.is_empty()) {
            self.ravelry.client_secret = Some(secret);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [ravelry]
            client_id = "abc"

            [auth]
            exchange_timeout_seconds = 5
            "#,
        )
        .expect("parse");

        assert_eq!(config.ravelry.client_id, "abc");
        assert_eq!(config.ravelry.token_url, "https://www.ravelry.com/oauth2/token");
        assert_eq!(config.ravelry.redirect_uri, "hooked://oauth/callback");
        assert_eq!(config.auth.exchange_timeout(), Duration::from_secs(5));
        assert!(config.auth.refresh_on_startup);
    }

    #[test]
    fn env_overrides_client_credentials() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "HOOKED_CLIENT_ID" => Some("from-env".to_string()),
            "HOOKED_CLIENT_SECRET" => Some("shh".to_string()),
            _ => None,
        });
        assert_eq!(config.ravelry.client_id, "from-env");
        assert_eq!(config.ravelry.client_secret.as_deref(), Some("shh"));
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let config = Config::load_or_default(Path::new("/nonexistent/hooked/config.toml"));
        assert_eq!(config.auth.exchange_timeout_seconds, 30);
    }
}
