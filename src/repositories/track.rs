use std::sync::Arc;

use color_eyre::eyre::Context;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use super::Repository;
use crate::catalog::TrackKey;
use crate::database::Database;
use crate::entities;

pub struct TrackRepository {
    db: Arc<Database>,
}

impl Repository for TrackRepository {
    type Key = TrackKey;

    fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

impl TrackRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Tracks of one album, by track number.
    pub async fn find_by_album(
        &self,
        album_id: i64,
    ) -> color_eyre::Result<Vec<entities::track::Model>> {
        entities::track::Entity::find()
            .filter(entities::track::Column::AlbumId.eq(album_id))
            .order_by_asc(entities::track::Column::TrackNumber)
            .all(&self.db.conn)
            .await
            .wrap_err_with(|| format!("Failed to fetch tracks of album {album_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogError, CatalogSession, Track};
    use crate::repositories::AlbumRepository;
    use crate::test_utils::{insert_album, insert_artist, test_db};
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_move_track_between_albums() {
        let db = test_db().await;
        let artist = insert_artist(&db.conn, "Slowdive").await;
        let souvlaki = insert_album(&db.conn, artist.id, None, "Souvlaki", 1993).await;
        let pygmalion = insert_album(&db.conn, artist.id, None, "Pygmalion", 1995).await;

        let albums = AlbumRepository::new(db.clone());
        let tracks = TrackRepository::new(db.clone());
        let mut session = CatalogSession::new();
        let first = albums.load(&mut session, souvlaki.id).await.unwrap().unwrap();
        let second = albums.load(&mut session, pygmalion.id).await.unwrap().unwrap();

        let track = session.register_track(Track::new("Alison", "3:51", 1));
        session.add_track(first, track).unwrap();
        tracks.add(&mut session, track, true).await.unwrap();

        session.add_track(second, track).unwrap();
        assert!(session.album_tracks(first).is_empty());
        tracks.add(&mut session, track, true).await.unwrap();

        assert!(tracks.find_by_album(souvlaki.id).await.unwrap().is_empty());
        let moved = tracks.find_by_album(pygmalion.id).await.unwrap();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].title, "Alison");
    }

    #[tokio::test]
    async fn test_track_without_album_is_not_saved() {
        let db = test_db().await;
        let tracks = TrackRepository::new(db.clone());
        let mut session = CatalogSession::new();

        let track = session.register_track(Track::new("Loose", "2:10", 1));
        let err = tracks.add(&mut session, track, true).await.unwrap_err();

        assert!(matches!(err, CatalogError::UnassignedTrack { .. }));
        assert_eq!(
            entities::track::Entity::find().count(&db.conn).await.unwrap(),
            0
        );
    }
}
