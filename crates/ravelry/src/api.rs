use crate::error::ApiError;
use crate::types::{CurrentUserResponse, Favorite, FavoritesResponse, User};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Read-only Ravelry API client authenticated with a bearer token.
#[derive(Clone)]
pub struct RavelryApi {
    client: Client,
    base_url: String,
}

pub(crate) fn http_client() -> Client {
    Client::builder()
        .user_agent(concat!("hooked/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(20))
        .build()
        .unwrap_or_else(|_| Client::new())
}

impl RavelryApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        segments: &[&str],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Auth(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }

    pub async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        let response: CurrentUserResponse = self.get_json(token, &["current_user.json"]).await?;
        Ok(response.user)
    }

    pub async fn favorites(&self, token: &str, username: &str) -> Result<Vec<Favorite>, ApiError> {
        let response: FavoritesResponse = self
            .get_json(token, &["people", username, "favorites", "list.json"])
            .await?;
        Ok(response.favorites)
    }
}
