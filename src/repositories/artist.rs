use std::collections::HashMap;
use std::sync::Arc;

use color_eyre::eyre::Context;
use sea_orm::{ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder};
use serde::Serialize;

use super::Repository;
use crate::catalog::ArtistKey;
use crate::database::Database;
use crate::entities;
use crate::query::{CatalogJoin, QuerySpec, SortKey};

/// One entry of the full artist listing.
#[derive(Debug, Clone, Serialize)]
pub struct ArtistWithAlbums {
    pub artist: entities::artist::Model,
    /// Ordered by name
    pub albums: Vec<entities::album::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtistDetail {
    pub artist: entities::artist::Model,
    /// Ordered by release year, then name
    pub albums: Vec<entities::album::Model>,
}

pub struct ArtistRepository {
    db: Arc<Database>,
}

impl Repository for ArtistRepository {
    type Key = ArtistKey;

    fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

impl ArtistRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn find(&self, id: i64) -> color_eyre::Result<Option<entities::artist::Model>> {
        entities::artist::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await
            .wrap_err_with(|| format!("Failed to fetch artist {id}"))
    }

    /// Artists joined to their albums, ordered by album name. One row per
    /// album, so an artist with several albums shows up several times.
    pub fn complete_spec() -> QuerySpec<entities::artist::Entity> {
        QuerySpec::new()
            .join(CatalogJoin::ArtistAlbums)
            .order_by(SortKey::AlbumName, Order::Asc)
    }

    /// Artists having at least one album, one row each, by artist name.
    #[allow(dead_code)]
    pub fn paginated_spec() -> QuerySpec<entities::artist::Entity> {
        QuerySpec::new()
            .join(CatalogJoin::ArtistAlbums)
            .order_by(SortKey::ArtistName, Order::Asc)
            .distinct()
    }

    /// Every artist with at least one album.
    ///
    /// Artists come in the order of their alphabetically first album and
    /// appear once, carrying all their albums.
    #[tracing::instrument(skip(self))]
    pub async fn list_complete(&self) -> color_eyre::Result<Vec<ArtistWithAlbums>> {
        let rows = Self::complete_spec()
            .select()
            .select_also(entities::album::Entity)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch artists")?;

        let mut position: HashMap<i64, usize> = HashMap::new();
        let mut listing: Vec<ArtistWithAlbums> = Vec::new();

        for (artist, album) in rows {
            let Some(album) = album else { continue };
            let index = *position.entry(artist.id).or_insert_with(|| {
                listing.push(ArtistWithAlbums {
                    artist,
                    albums: Vec::new(),
                });
                listing.len() - 1
            });
            listing[index].albums.push(album);
        }

        tracing::debug!(count = listing.len(), "Artists listed");
        Ok(listing)
    }

    #[tracing::instrument(skip(self))]
    pub async fn detail(&self, id: i64) -> color_eyre::Result<Option<ArtistDetail>> {
        let Some(artist) = self.find(id).await? else {
            return Ok(None);
        };

        let albums = entities::album::Entity::find()
            .filter(entities::album::Column::ArtistId.eq(id))
            .order_by_asc(entities::album::Column::ReleaseYear)
            .order_by_asc(entities::album::Column::Name)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch artist albums")?;

        Ok(Some(ArtistDetail { artist, albums }))
    }
}
