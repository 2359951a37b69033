use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub small_photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CurrentUserResponse {
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub favorited: Option<FavoritedItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritedItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
}

impl Favorite {
    pub fn display_name(&self) -> String {
        match self.favorited.as_ref().and_then(|f| f.name.as_deref()) {
            Some(name) => format!("{} ({})", name, self.kind),
            None => format!("{} #{}", self.kind, self.id),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FavoritesResponse {
    pub favorites: Vec<Favorite>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn favorite_display_name_falls_back_to_kind_and_id() {
        let named: Favorite = serde_json::from_value(serde_json::json!({
            "id": 7,
            "type": "pattern",
            "favorited": { "name": "Hitchhiker" }
        }))
        .expect("parse named");
        let bare: Favorite =
            serde_json::from_value(serde_json::json!({ "id": 9, "type": "yarn" }))
                .expect("parse bare");

        assert_eq!(named.display_name(), "Hitchhiker (pattern)");
        assert_eq!(bare.display_name(), "yarn #9");
    }
}
