use crate::resource::AsyncResource;
use hooked_ravelry::api::RavelryApi;
use hooked_ravelry::types::Favorite;
use hooked_ravelry::Session;

#[derive(Debug, Clone)]
pub struct FavoritesView {
    pub username: String,
    pub items: Vec<Favorite>,
}

pub type FavoritesResource = AsyncResource<FavoritesView, String>;

pub async fn load_favorites(api: RavelryApi, session: Session) -> Result<FavoritesView, String> {
    match api.favorites(&session.access_token, &session.account).await {
        Ok(items) => Ok(FavoritesView {
            username: session.account,
            items,
        }),
        Err(e) => {
            tracing::warn!("Failed to load favorites: {}", e);
            Err(e.user_message().to_string())
        }
    }
}
