//! Catalog rows and request payloads

use auth::SessionRecord;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Track row joined with its album, artist and genre
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub track_id: i64,
    pub track_name: String,
    pub album_id: i64,
    pub album_title: String,
    pub artist_id: i64,
    pub artist_name: String,
    pub genre: String,
}

/// Album header
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub album_id: i64,
    pub album_title: String,
    pub artist_id: i64,
    pub artist_name: String,
}

/// Track listed on an album page
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AlbumTrack {
    pub track_id: i64,
    pub track_name: String,
    pub track_ms: i64,
}

/// Query string of the track search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    #[serde(rename = "searchTerm")]
    pub search_term: Option<String>,
}

/// Album title edit form
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumTitleForm {
    #[serde(rename = "albumTitle")]
    pub album_title: Option<String>,
}

/// Login and registration form
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CredentialsForm {
    /// Both fields, if both are present and non-empty
    pub fn filled(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some((username, password))
            }
            _ => None,
        }
    }
}

/// The user behind the request's session cookie
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub username: String,
    pub roles: Vec<String>,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role == auth::models::ADMIN_ROLE)
    }
}

impl From<SessionRecord> for CurrentUser {
    fn from(session: SessionRecord) -> Self {
        Self {
            username: session.username,
            roles: session.roles,
        }
    }
}
