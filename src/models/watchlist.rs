use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RatedMovie;

/// Name of the list every viewer gets by default
pub const DEFAULT_LIST: &str = "watch-list";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WatchList {
    pub id: i64,
    pub owner_id: Uuid,
    pub name: String,
    pub added: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Membership of one movie in one list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WatchListItem {
    pub uid: Uuid,
    pub list_id: i64,
    pub imdb_id: String,
    pub watched: bool,
    pub added: DateTime<Utc>,
}

/// List summary embedded in item responses
#[derive(Debug, Clone, Serialize)]
pub struct ListSummary {
    pub id: i64,
    pub name: String,
}

impl From<&WatchList> for ListSummary {
    fn from(list: &WatchList) -> Self {
        Self {
            id: list.id,
            name: list.name.clone(),
        }
    }
}

/// Item as returned to the client, with its movie resolved
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub uid: Uuid,
    #[serde(rename = "_list")]
    pub list: ListSummary,
    pub movie: RatedMovie,
    pub watched: bool,
    pub added: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub movie_slug: Option<String>,
}
