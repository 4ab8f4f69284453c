use std::collections::HashMap;
use std::sync::Arc;

use color_eyre::eyre::{Context, eyre};
use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, Order, QueryFilter, QueryOrder};
use serde::Serialize;

use super::{Repository, TrackRepository};
use crate::catalog::{AlbumKey, CatalogError, CatalogSession, CommitSummary};
use crate::database::Database;
use crate::entities;
use crate::pagination::{Page, PageRequest, paginate};
use crate::query::{CatalogJoin, QuerySpec, SortKey};

/// An album as the paginated listing shows it.
#[derive(Debug, Clone, Serialize)]
pub struct AlbumListItem {
    pub album: entities::album::Model,
    pub artist: entities::artist::Model,
    pub styles: Vec<entities::style::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlbumDetail {
    pub album: entities::album::Model,
    pub artist: entities::artist::Model,
    pub label: Option<entities::label::Model>,
    /// Ordered by track number
    pub tracks: Vec<entities::track::Model>,
    pub styles: Vec<entities::style::Model>,
}

pub struct AlbumRepository {
    db: Arc<Database>,
}

impl Repository for AlbumRepository {
    type Key = AlbumKey;

    fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

impl AlbumRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn find(&self, id: i64) -> color_eyre::Result<Option<entities::album::Model>> {
        entities::album::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await
            .wrap_err_with(|| format!("Failed to fetch album {id}"))
    }

    /// Albums joined to their styles and artist, by name.
    ///
    /// The style join is an inner join, so albums without any style are not
    /// listed. Rows are distinct per album.
    pub fn listing_spec() -> QuerySpec<entities::album::Entity> {
        QuerySpec::new()
            .join(CatalogJoin::AlbumStyles)
            .join(CatalogJoin::AlbumArtist)
            .order_by(SortKey::AlbumName, Order::Asc)
            .distinct()
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_page(&self, request: PageRequest) -> color_eyre::Result<Page<AlbumListItem>> {
        let page = paginate(&self.db.conn, &Self::listing_spec(), request)
            .await
            .wrap_err("Failed to fetch album page")?;

        let album_ids: Vec<i64> = page.items.iter().map(|album| album.id).collect();
        let mut artist_ids: Vec<i64> = page.items.iter().map(|album| album.artist_id).collect();
        artist_ids.sort_unstable();
        artist_ids.dedup();

        let artists: HashMap<i64, entities::artist::Model> = entities::artist::Entity::find()
            .filter(entities::artist::Column::Id.is_in(artist_ids))
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch album artists")?
            .into_iter()
            .map(|artist| (artist.id, artist))
            .collect();

        let mut styles = self.styles_by_album(&album_ids).await?;

        let mut items = Vec::with_capacity(page.items.len());
        for album in page.items {
            let artist = artists.get(&album.artist_id).cloned().ok_or_else(|| {
                eyre!(
                    "Album {} references missing artist {}",
                    album.id,
                    album.artist_id
                )
            })?;
            items.push(AlbumListItem {
                styles: styles.remove(&album.id).unwrap_or_default(),
                artist,
                album,
            });
        }

        tracing::debug!(count = items.len(), "Album page hydrated");
        Ok(Page {
            items,
            pagination: page.pagination,
        })
    }

    async fn styles_by_album(
        &self,
        album_ids: &[i64],
    ) -> color_eyre::Result<HashMap<i64, Vec<entities::style::Model>>> {
        let mut styles: HashMap<i64, Vec<entities::style::Model>> = HashMap::new();
        if album_ids.is_empty() {
            return Ok(styles);
        }

        let links = entities::album_style::Entity::find()
            .filter(entities::album_style::Column::AlbumId.is_in(album_ids.iter().copied()))
            .find_also_related(entities::style::Entity)
            .order_by_asc(entities::style::Column::Name)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch album styles")?;

        for (link, style) in links {
            if let Some(style) = style {
                styles.entry(link.album_id).or_default().push(style);
            }
        }
        Ok(styles)
    }

    #[tracing::instrument(skip(self))]
    pub async fn detail(&self, id: i64) -> color_eyre::Result<Option<AlbumDetail>> {
        let Some(album) = self.find(id).await? else {
            return Ok(None);
        };
        let artist = album
            .find_related(entities::artist::Entity)
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to fetch album artist")?
            .ok_or_else(|| eyre!("Album {id} has no artist"))?;

        let label = match album.label_id {
            Some(label_id) => entities::label::Entity::find_by_id(label_id)
                .one(&self.db.conn)
                .await
                .wrap_err("Failed to fetch album label")?,
            None => None,
        };

        let tracks = TrackRepository::new(self.db.clone())
            .find_by_album(id)
            .await?;

        let styles = album
            .find_related(entities::style::Entity)
            .order_by_asc(entities::style::Column::Name)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch album styles")?;

        Ok(Some(AlbumDetail {
            album,
            artist,
            label,
            tracks,
            styles,
        }))
    }

    /// Attaches a stored album to `session` together with its artist, label,
    /// tracks and style links.
    #[tracing::instrument(skip(self, session))]
    pub async fn load(
        &self,
        session: &mut CatalogSession,
        id: i64,
    ) -> color_eyre::Result<Option<AlbumKey>> {
        let Some(detail) = self.detail(id).await? else {
            return Ok(None);
        };

        let artist = session.attach_artist(detail.artist)?;
        let album = session.attach_album(detail.album);
        session.set_album_artist(album, Some(artist))?;

        let label = detail.label.map(|label| session.attach_label(label));
        session.set_album_label(album, label)?;

        for track in detail.tracks {
            let track = session.attach_track(track);
            session.add_track(album, track)?;
        }
        for style in detail.styles {
            let style = session.attach_style(style);
            session.restore_album_style(album, style)?;
        }

        Ok(Some(album))
    }

    /// Stages the delete of `album` and of every track it holds.
    pub async fn remove_with_tracks(
        &self,
        session: &mut CatalogSession,
        album: AlbumKey,
        commit_now: bool,
    ) -> Result<Option<CommitSummary>, CatalogError> {
        let tracks = session.album_tracks(album).to_vec();
        for track in tracks {
            session.stage_delete(track)?;
        }
        self.remove(session, album, commit_now).await
    }
}
