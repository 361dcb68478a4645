//! Catalog queries over the Chinook schema

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use crate::models::{Album, AlbumTrack, Track};

const TRACK_COLUMNS: &str = r#"
    SELECT t.TrackId AS track_id
         , t.Name AS track_name
         , a.AlbumId AS album_id
         , a.Title AS album_title
         , at.ArtistId AS artist_id
         , at.Name AS artist_name
         , g.Name AS genre
    FROM tracks t
    JOIN albums a ON t.AlbumId = a.AlbumId
    JOIN artists at ON a.ArtistId = at.ArtistId
    JOIN genres g ON t.GenreId = g.GenreId
"#;

/// Catalog repository for database operations
#[derive(Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Create a new catalog repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// First tracks of the catalog, shown before any search
    pub async fn initial_tracks(&self, limit: i64) -> Result<Vec<Track>> {
        let sql = format!("{TRACK_COLUMNS} ORDER BY t.TrackId LIMIT ?1");
        let tracks = sqlx::query_as::<_, Track>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(tracks)
    }

    /// Tracks whose name contains `term`, ignoring case
    pub async fn search_tracks(&self, term: &str, limit: i64) -> Result<Vec<Track>> {
        let sql = format!(
            "{TRACK_COLUMNS} WHERE lower(t.Name) LIKE lower('%' || ?1 || '%') ORDER BY t.TrackId LIMIT ?2"
        );
        let tracks = sqlx::query_as::<_, Track>(&sql)
            .bind(term)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(tracks)
    }

    /// Album header with its artist
    pub async fn album_by_id(&self, album_id: i64) -> Result<Option<Album>> {
        let album = sqlx::query_as::<_, Album>(
            r#"
            SELECT a.AlbumId AS album_id
                 , a.Title AS album_title
                 , at.ArtistId AS artist_id
                 , at.Name AS artist_name
            FROM albums a
            JOIN artists at ON a.ArtistId = at.ArtistId
            WHERE a.AlbumId = ?1
            "#,
        )
        .bind(album_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(album)
    }

    /// Tracks of an album in catalog order
    pub async fn album_tracks(&self, album_id: i64) -> Result<Vec<AlbumTrack>> {
        let tracks = sqlx::query_as::<_, AlbumTrack>(
            r#"
            SELECT t.TrackId AS track_id
                 , t.Name AS track_name
                 , t.Milliseconds AS track_ms
            FROM tracks t
            WHERE t.AlbumId = ?1
            ORDER BY t.TrackId
            "#,
        )
        .bind(album_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tracks)
    }

    /// Rename an album. Returns false if no such album exists.
    pub async fn update_album_title(&self, album_id: i64, album_title: &str) -> Result<bool> {
        info!("Renaming album {} to {:?}", album_id, album_title);

        let result = sqlx::query("UPDATE albums SET Title = ?1 WHERE AlbumId = ?2")
            .bind(album_title)
            .bind(album_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
