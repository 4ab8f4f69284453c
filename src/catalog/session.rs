use std::collections::HashMap;
use std::hash::Hash;

use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, TransactionTrait,
};

use super::CatalogError;
use super::keys::{AlbumKey, ArtistKey, EntityKey, LabelKey, StyleKey, TrackKey};
use super::records::{Album, Artist, Label, StoredRecord, Style, Track};
use super::relations::Relations;
use crate::entities;

#[derive(Debug)]
struct Arena<K, R> {
    records: HashMap<K, R>,
    by_id: HashMap<i64, K>,
}

impl<K, R> Default for Arena<K, R> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            by_id: HashMap::new(),
        }
    }
}

impl<K, R> Arena<K, R>
where
    K: Copy + Eq + Hash,
    R: StoredRecord,
{
    fn insert(&mut self, key: K, record: R) {
        if let Some(id) = record.stored_id() {
            self.by_id.insert(id, key);
        }
        self.records.insert(key, record);
    }

    fn key_for_id(&self, id: i64) -> Option<K> {
        self.by_id.get(&id).copied()
    }

    fn get(&self, key: K) -> Option<&R> {
        self.records.get(&key)
    }

    fn get_mut(&mut self, key: K) -> Option<&mut R> {
        self.records.get_mut(&key)
    }

    fn contains(&self, key: K) -> bool {
        self.records.contains_key(&key)
    }

    fn stored_id(&self, key: K) -> Option<i64> {
        self.records.get(&key).and_then(StoredRecord::stored_id)
    }

    fn assign_id(&mut self, key: K, id: i64) {
        if let Some(record) = self.records.get_mut(&key) {
            record.assign_id(id);
            self.by_id.insert(id, key);
        }
    }

    fn remove(&mut self, key: K) -> Option<R> {
        let record = self.records.remove(&key)?;
        if let Some(id) = record.stored_id() {
            self.by_id.remove(&id);
        }
        Some(record)
    }
}

/// What a successful commit wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub links: usize,
}

/// In-memory unit of work over the catalog graph.
///
/// Entities are registered (new) or attached (loaded from the store), wired
/// together through the relationship operations, staged for save or delete,
/// and written in one transaction by [`CatalogSession::commit`]. Staging is
/// purely in memory.
///
/// Forward references (album → artist, album → label, track → album) are
/// columns of the child row and are written when the child is saved.
/// Album ↔ style links are written at the next commit once both ends exist
/// in the store.
#[derive(Debug, Default)]
pub struct CatalogSession {
    next_key: u32,
    artists: Arena<ArtistKey, Artist>,
    albums: Arena<AlbumKey, Album>,
    tracks: Arena<TrackKey, Track>,
    labels: Arena<LabelKey, Label>,
    styles: Arena<StyleKey, Style>,
    relations: Relations,
    staged_saves: Vec<EntityKey>,
    staged_deletes: Vec<EntityKey>,
    /// Latest intent per album/style pair: `true` linked, `false` unlinked.
    link_changes: HashMap<(AlbumKey, StyleKey), bool>,
}

impl CatalogSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_raw(&mut self) -> u32 {
        self.next_key += 1;
        self.next_key
    }

    // ========== Registration ==========

    pub fn register_artist(&mut self, artist: Artist) -> ArtistKey {
        if let Some(key) = artist.id().and_then(|id| self.artists.key_for_id(id)) {
            return key;
        }
        let key = ArtistKey::new(self.next_raw());
        self.artists.insert(key, artist);
        key
    }

    pub fn register_album(&mut self, album: Album) -> AlbumKey {
        if let Some(key) = album.id().and_then(|id| self.albums.key_for_id(id)) {
            return key;
        }
        let key = AlbumKey::new(self.next_raw());
        self.albums.insert(key, album);
        key
    }

    pub fn register_track(&mut self, track: Track) -> TrackKey {
        if let Some(key) = track.id().and_then(|id| self.tracks.key_for_id(id)) {
            return key;
        }
        let key = TrackKey::new(self.next_raw());
        self.tracks.insert(key, track);
        key
    }

    pub fn register_label(&mut self, label: Label) -> LabelKey {
        if let Some(key) = label.id().and_then(|id| self.labels.key_for_id(id)) {
            return key;
        }
        let key = LabelKey::new(self.next_raw());
        self.labels.insert(key, label);
        key
    }

    pub fn register_style(&mut self, style: Style) -> StyleKey {
        if let Some(key) = style.id().and_then(|id| self.styles.key_for_id(id)) {
            return key;
        }
        let key = StyleKey::new(self.next_raw());
        self.styles.insert(key, style);
        key
    }

    /// Attaches a stored artist. Attaching the same row twice yields the same
    /// key and keeps the in-memory state.
    pub fn attach_artist(
        &mut self,
        model: entities::artist::Model,
    ) -> Result<ArtistKey, CatalogError> {
        if let Some(key) = self.artists.key_for_id(model.id) {
            return Ok(key);
        }
        Ok(self.register_artist(Artist::try_from(model)?))
    }

    pub fn attach_album(&mut self, model: entities::album::Model) -> AlbumKey {
        self.register_album(model.into())
    }

    pub fn attach_track(&mut self, model: entities::track::Model) -> TrackKey {
        self.register_track(model.into())
    }

    pub fn attach_label(&mut self, model: entities::label::Model) -> LabelKey {
        self.register_label(model.into())
    }

    pub fn attach_style(&mut self, model: entities::style::Model) -> StyleKey {
        self.register_style(model.into())
    }

    /// Restores a stored album/style link without scheduling a write.
    pub(crate) fn restore_album_style(
        &mut self,
        album: AlbumKey,
        style: StyleKey,
    ) -> Result<(), CatalogError> {
        self.ensure(album)?;
        self.ensure(style)?;
        self.relations.album_styles.link(album, style);
        Ok(())
    }

    #[allow(dead_code)]
    pub fn artist_key(&self, id: i64) -> Option<ArtistKey> {
        self.artists.key_for_id(id)
    }

    #[allow(dead_code)]
    pub fn album_key(&self, id: i64) -> Option<AlbumKey> {
        self.albums.key_for_id(id)
    }

    #[allow(dead_code)]
    pub fn label_key(&self, id: i64) -> Option<LabelKey> {
        self.labels.key_for_id(id)
    }

    #[allow(dead_code)]
    pub fn style_key(&self, id: i64) -> Option<StyleKey> {
        self.styles.key_for_id(id)
    }

    // ========== Records ==========

    #[allow(dead_code)]
    pub fn artist(&self, key: ArtistKey) -> Option<&Artist> {
        self.artists.get(key)
    }

    #[allow(dead_code)]
    pub fn artist_mut(&mut self, key: ArtistKey) -> Option<&mut Artist> {
        self.artists.get_mut(key)
    }

    #[allow(dead_code)]
    pub fn album(&self, key: AlbumKey) -> Option<&Album> {
        self.albums.get(key)
    }

    #[allow(dead_code)]
    pub fn album_mut(&mut self, key: AlbumKey) -> Option<&mut Album> {
        self.albums.get_mut(key)
    }

    #[allow(dead_code)]
    pub fn track(&self, key: TrackKey) -> Option<&Track> {
        self.tracks.get(key)
    }

    #[allow(dead_code)]
    pub fn track_mut(&mut self, key: TrackKey) -> Option<&mut Track> {
        self.tracks.get_mut(key)
    }

    #[allow(dead_code)]
    pub fn label(&self, key: LabelKey) -> Option<&Label> {
        self.labels.get(key)
    }

    pub fn label_mut(&mut self, key: LabelKey) -> Option<&mut Label> {
        self.labels.get_mut(key)
    }

    #[allow(dead_code)]
    pub fn style(&self, key: StyleKey) -> Option<&Style> {
        self.styles.get(key)
    }

    pub fn style_mut(&mut self, key: StyleKey) -> Option<&mut Style> {
        self.styles.get_mut(key)
    }

    fn contains(&self, key: EntityKey) -> bool {
        match key {
            EntityKey::Artist(k) => self.artists.contains(k),
            EntityKey::Album(k) => self.albums.contains(k),
            EntityKey::Track(k) => self.tracks.contains(k),
            EntityKey::Label(k) => self.labels.contains(k),
            EntityKey::Style(k) => self.styles.contains(k),
        }
    }

    fn ensure(&self, key: impl Into<EntityKey>) -> Result<(), CatalogError> {
        let key = key.into();
        if self.contains(key) {
            Ok(())
        } else {
            Err(CatalogError::UnknownKey(key))
        }
    }

    fn stored_id(&self, key: EntityKey) -> Option<i64> {
        match key {
            EntityKey::Artist(k) => self.artists.stored_id(k),
            EntityKey::Album(k) => self.albums.stored_id(k),
            EntityKey::Track(k) => self.tracks.stored_id(k),
            EntityKey::Label(k) => self.labels.stored_id(k),
            EntityKey::Style(k) => self.styles.stored_id(k),
        }
    }

    // ========== Relationships ==========

    pub fn add_album_to_artist(
        &mut self,
        artist: ArtistKey,
        album: AlbumKey,
    ) -> Result<(), CatalogError> {
        self.ensure(artist)?;
        self.ensure(album)?;
        self.relations.artist_albums.add(artist, album);
        Ok(())
    }

    /// Leaves the album unassigned when its artist was `artist`. An album
    /// cannot be saved in that state.
    #[allow(dead_code)]
    pub fn remove_album_from_artist(
        &mut self,
        artist: ArtistKey,
        album: AlbumKey,
    ) -> Result<bool, CatalogError> {
        self.ensure(artist)?;
        self.ensure(album)?;
        Ok(self.relations.artist_albums.remove(artist, album))
    }

    pub fn set_album_artist(
        &mut self,
        album: AlbumKey,
        artist: Option<ArtistKey>,
    ) -> Result<(), CatalogError> {
        self.ensure(album)?;
        if let Some(artist) = artist {
            self.ensure(artist)?;
        }
        self.relations.artist_albums.set_parent(album, artist);
        Ok(())
    }

    pub fn add_album_to_label(
        &mut self,
        label: LabelKey,
        album: AlbumKey,
    ) -> Result<(), CatalogError> {
        self.ensure(label)?;
        self.ensure(album)?;
        self.relations.label_albums.add(label, album);
        Ok(())
    }

    /// Clears the album's label only when it was `label`.
    #[allow(dead_code)]
    pub fn remove_album_from_label(
        &mut self,
        label: LabelKey,
        album: AlbumKey,
    ) -> Result<bool, CatalogError> {
        self.ensure(label)?;
        self.ensure(album)?;
        Ok(self.relations.label_albums.remove(label, album))
    }

    pub fn set_album_label(
        &mut self,
        album: AlbumKey,
        label: Option<LabelKey>,
    ) -> Result<(), CatalogError> {
        self.ensure(album)?;
        if let Some(label) = label {
            self.ensure(label)?;
        }
        self.relations.label_albums.set_parent(album, label);
        Ok(())
    }

    pub fn add_track(&mut self, album: AlbumKey, track: TrackKey) -> Result<(), CatalogError> {
        self.ensure(album)?;
        self.ensure(track)?;
        self.relations.album_tracks.add(album, track);
        Ok(())
    }

    /// Leaves the track unassigned when it belonged to `album`. It has to be
    /// moved to another album or deleted before the next commit.
    #[allow(dead_code)]
    pub fn remove_track(&mut self, album: AlbumKey, track: TrackKey) -> Result<bool, CatalogError> {
        self.ensure(album)?;
        self.ensure(track)?;
        Ok(self.relations.album_tracks.remove(album, track))
    }

    #[allow(dead_code)]
    pub fn set_track_album(
        &mut self,
        track: TrackKey,
        album: Option<AlbumKey>,
    ) -> Result<(), CatalogError> {
        self.ensure(track)?;
        if let Some(album) = album {
            self.ensure(album)?;
        }
        self.relations.album_tracks.set_parent(track, album);
        Ok(())
    }

    pub fn add_style(&mut self, album: AlbumKey, style: StyleKey) -> Result<(), CatalogError> {
        self.ensure(album)?;
        self.ensure(style)?;
        if self.relations.album_styles.link(album, style) {
            self.link_changes.insert((album, style), true);
        }
        Ok(())
    }

    pub fn remove_style(&mut self, album: AlbumKey, style: StyleKey) -> Result<bool, CatalogError> {
        self.ensure(album)?;
        self.ensure(style)?;
        let removed = self.relations.album_styles.unlink(album, style);
        if removed {
            self.link_changes.insert((album, style), false);
        }
        Ok(removed)
    }

    #[allow(dead_code)]
    pub fn add_album_to_style(
        &mut self,
        style: StyleKey,
        album: AlbumKey,
    ) -> Result<(), CatalogError> {
        self.add_style(album, style)
    }

    #[allow(dead_code)]
    pub fn remove_album_from_style(
        &mut self,
        style: StyleKey,
        album: AlbumKey,
    ) -> Result<bool, CatalogError> {
        self.remove_style(album, style)
    }

    pub fn album_artist(&self, album: AlbumKey) -> Option<ArtistKey> {
        self.relations.artist_albums.parent(album)
    }

    pub fn album_label(&self, album: AlbumKey) -> Option<LabelKey> {
        self.relations.label_albums.parent(album)
    }

    pub fn track_album(&self, track: TrackKey) -> Option<AlbumKey> {
        self.relations.album_tracks.parent(track)
    }

    pub fn artist_albums(&self, artist: ArtistKey) -> &[AlbumKey] {
        self.relations.artist_albums.children(artist)
    }

    pub fn label_albums(&self, label: LabelKey) -> &[AlbumKey] {
        self.relations.label_albums.children(label)
    }

    pub fn album_tracks(&self, album: AlbumKey) -> &[TrackKey] {
        self.relations.album_tracks.children(album)
    }

    #[allow(dead_code)]
    pub fn album_styles(&self, album: AlbumKey) -> &[StyleKey] {
        self.relations.album_styles.rights(album)
    }

    #[allow(dead_code)]
    pub fn style_albums(&self, style: StyleKey) -> &[AlbumKey] {
        self.relations.album_styles.lefts(style)
    }

    // ========== Staging ==========

    /// Stages an insert (new record) or update (stored record). Cancels a
    /// pending delete of the same entity.
    pub fn stage_save(&mut self, key: impl Into<EntityKey>) -> Result<(), CatalogError> {
        let key = key.into();
        self.ensure(key)?;
        self.staged_deletes.retain(|k| *k != key);
        if !self.staged_saves.contains(&key) {
            self.staged_saves.push(key);
        }
        Ok(())
    }

    /// Stages a delete. Cancels a pending save of the same entity.
    pub fn stage_delete(&mut self, key: impl Into<EntityKey>) -> Result<(), CatalogError> {
        let key = key.into();
        self.ensure(key)?;
        self.staged_saves.retain(|k| *k != key);
        if !self.staged_deletes.contains(&key) {
            self.staged_deletes.push(key);
        }
        Ok(())
    }

    #[allow(dead_code)]
    pub fn is_staged_for_save(&self, key: impl Into<EntityKey>) -> bool {
        self.staged_saves.contains(&key.into())
    }

    pub fn is_staged_for_delete(&self, key: impl Into<EntityKey>) -> bool {
        self.staged_deletes.contains(&key.into())
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.staged_saves.is_empty()
            || !self.staged_deletes.is_empty()
            || !self.link_changes.is_empty()
    }

    // ========== Commit ==========

    fn check_reference(&self, from: EntityKey, to: EntityKey) -> Result<(), CatalogError> {
        if self.staged_deletes.contains(&to) {
            return Err(CatalogError::DeletedReference { from, to });
        }
        if self.stored_id(to).is_some() || self.staged_saves.contains(&to) {
            return Ok(());
        }
        Err(CatalogError::UnsavedReference { from, to })
    }

    fn check_dependents(&self, key: EntityKey) -> Result<(), CatalogError> {
        let dependents: Vec<EntityKey> = match key {
            EntityKey::Artist(artist) => self
                .artist_albums(artist)
                .iter()
                .map(|a| EntityKey::from(*a))
                .collect(),
            EntityKey::Label(label) => self
                .label_albums(label)
                .iter()
                .map(|a| EntityKey::from(*a))
                .collect(),
            EntityKey::Album(album) => self
                .album_tracks(album)
                .iter()
                .map(|t| EntityKey::from(*t))
                .collect(),
            EntityKey::Track(_) | EntityKey::Style(_) => Vec::new(),
        };

        for dependent in dependents {
            if self.stored_id(dependent).is_some() && !self.staged_deletes.contains(&dependent) {
                return Err(CatalogError::DependentRows { key, dependent });
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for key in &self.staged_saves {
            match *key {
                EntityKey::Album(album) => {
                    let artist = self
                        .album_artist(album)
                        .ok_or(CatalogError::MissingArtist { album })?;
                    self.check_reference(album.into(), artist.into())?;
                    if let Some(label) = self.album_label(album) {
                        self.check_reference(album.into(), label.into())?;
                    }
                }
                EntityKey::Track(track) => {
                    let album = self
                        .track_album(track)
                        .ok_or(CatalogError::UnassignedTrack { track })?;
                    self.check_reference(track.into(), album.into())?;
                }
                EntityKey::Artist(_) | EntityKey::Label(_) | EntityKey::Style(_) => {}
            }
        }

        for key in &self.staged_deletes {
            self.check_dependents(*key)?;
        }

        for &(album, style) in self.link_changes.keys() {
            if self.is_staged_for_delete(album) || self.is_staged_for_delete(style) {
                continue;
            }
            self.check_reference(style.into(), album.into())?;
            self.check_reference(album.into(), style.into())?;
        }

        Ok(())
    }

    /// Writes every staged change in one transaction.
    ///
    /// Saves go parent-first (labels, artists, styles, albums, tracks), then
    /// pending album/style links, then deletes child-first. Nothing in the
    /// session changes unless the transaction commits.
    #[tracing::instrument(skip_all)]
    pub async fn commit(&mut self, conn: &DatabaseConnection) -> Result<CommitSummary, CatalogError> {
        if !self.has_pending_changes() {
            return Ok(CommitSummary::default());
        }
        self.validate()?;

        let txn = conn.begin().await?;
        let mut summary = CommitSummary::default();
        let mut assigned: HashMap<EntityKey, i64> = HashMap::new();

        self.write_saves(&txn, &mut assigned, &mut summary).await?;
        self.write_links(&txn, &assigned, &mut summary).await?;
        self.write_deletes(&txn, &mut summary).await?;

        txn.commit().await?;

        for (key, id) in assigned {
            match key {
                EntityKey::Artist(k) => self.artists.assign_id(k, id),
                EntityKey::Album(k) => self.albums.assign_id(k, id),
                EntityKey::Track(k) => self.tracks.assign_id(k, id),
                EntityKey::Label(k) => self.labels.assign_id(k, id),
                EntityKey::Style(k) => self.styles.assign_id(k, id),
            }
        }
        for key in std::mem::take(&mut self.staged_deletes) {
            self.detach(key);
        }
        self.staged_saves.clear();
        self.link_changes.clear();

        tracing::info!(
            inserted = summary.inserted,
            updated = summary.updated,
            deleted = summary.deleted,
            links = summary.links,
            "Catalog changes committed"
        );
        Ok(summary)
    }

    fn resolve(&self, key: EntityKey, assigned: &HashMap<EntityKey, i64>) -> Result<i64, CatalogError> {
        self.stored_id(key)
            .or_else(|| assigned.get(&key).copied())
            .ok_or(CatalogError::UnknownKey(key))
    }

    async fn write_saves(
        &self,
        txn: &DatabaseTransaction,
        assigned: &mut HashMap<EntityKey, i64>,
        summary: &mut CommitSummary,
    ) -> Result<(), CatalogError> {
        macro_rules! write_row {
            ($row:expr, $stored:expr) => {
                if $stored {
                    summary.updated += 1;
                    $row.update(txn).await?
                } else {
                    summary.inserted += 1;
                    $row.insert(txn).await?
                }
            };
        }

        for key in self.staged_in_order(&self.staged_saves) {
            match key {
                EntityKey::Label(k) => {
                    let Some(label) = self.labels.get(k) else { continue };
                    let model = write_row!(label_row(label), label.id().is_some());
                    assigned.insert(key, model.id);
                }
                EntityKey::Artist(k) => {
                    let Some(artist) = self.artists.get(k) else { continue };
                    let model = write_row!(artist_row(artist), artist.id().is_some());
                    assigned.insert(key, model.id);
                }
                EntityKey::Style(k) => {
                    let Some(style) = self.styles.get(k) else { continue };
                    let model = write_row!(style_row(style), style.id().is_some());
                    assigned.insert(key, model.id);
                }
                EntityKey::Album(k) => {
                    let Some(album) = self.albums.get(k) else { continue };
                    let artist = self
                        .album_artist(k)
                        .ok_or(CatalogError::MissingArtist { album: k })?;
                    let artist_id = self.resolve(artist.into(), assigned)?;
                    let label_id = match self.album_label(k) {
                        Some(label) => Some(self.resolve(label.into(), assigned)?),
                        None => None,
                    };
                    let row = album_row(album, artist_id, label_id);
                    let model = write_row!(row, album.id().is_some());
                    assigned.insert(key, model.id);
                }
                EntityKey::Track(k) => {
                    let Some(track) = self.tracks.get(k) else { continue };
                    let album = self
                        .track_album(k)
                        .ok_or(CatalogError::UnassignedTrack { track: k })?;
                    let album_id = self.resolve(album.into(), assigned)?;
                    let model = write_row!(track_row(track, album_id), track.id().is_some());
                    assigned.insert(key, model.id);
                }
            }
        }
        Ok(())
    }

    async fn write_links(
        &self,
        txn: &DatabaseTransaction,
        assigned: &HashMap<EntityKey, i64>,
        summary: &mut CommitSummary,
    ) -> Result<(), CatalogError> {
        for (&(album, style), &linked) in &self.link_changes {
            if self.is_staged_for_delete(album) || self.is_staged_for_delete(style) {
                continue;
            }
            let album_id = self.resolve(album.into(), assigned)?;
            let style_id = self.resolve(style.into(), assigned)?;

            let existing = entities::album_style::Entity::find()
                .filter(entities::album_style::Column::AlbumId.eq(album_id))
                .filter(entities::album_style::Column::StyleId.eq(style_id))
                .one(txn)
                .await?;

            match (linked, existing) {
                (true, None) => {
                    let row = entities::album_style::ActiveModel {
                        album_id: Set(album_id),
                        style_id: Set(style_id),
                    };
                    entities::album_style::Entity::insert(row).exec(txn).await?;
                    summary.links += 1;
                }
                (false, Some(_)) => {
                    entities::album_style::Entity::delete_many()
                        .filter(entities::album_style::Column::AlbumId.eq(album_id))
                        .filter(entities::album_style::Column::StyleId.eq(style_id))
                        .exec(txn)
                        .await?;
                    summary.links += 1;
                }
                _ => {}
            }
        }
        Ok(())
    }

    async fn write_deletes(
        &self,
        txn: &DatabaseTransaction,
        summary: &mut CommitSummary,
    ) -> Result<(), CatalogError> {
        let mut ordered = self.staged_in_order(&self.staged_deletes);
        ordered.reverse();

        for key in ordered {
            let Some(id) = self.stored_id(key) else {
                continue;
            };
            match key {
                EntityKey::Track(_) => {
                    entities::track::Entity::delete_by_id(id).exec(txn).await?;
                }
                EntityKey::Album(_) => {
                    entities::album_style::Entity::delete_many()
                        .filter(entities::album_style::Column::AlbumId.eq(id))
                        .exec(txn)
                        .await?;
                    entities::album::Entity::delete_by_id(id).exec(txn).await?;
                }
                EntityKey::Style(_) => {
                    entities::album_style::Entity::delete_many()
                        .filter(entities::album_style::Column::StyleId.eq(id))
                        .exec(txn)
                        .await?;
                    entities::style::Entity::delete_by_id(id).exec(txn).await?;
                }
                EntityKey::Artist(_) => {
                    entities::artist::Entity::delete_by_id(id).exec(txn).await?;
                }
                EntityKey::Label(_) => {
                    entities::label::Entity::delete_by_id(id).exec(txn).await?;
                }
            }
            summary.deleted += 1;
        }
        Ok(())
    }

    /// Staged keys sorted parent-first, keeping staging order within a kind.
    fn staged_in_order(&self, staged: &[EntityKey]) -> Vec<EntityKey> {
        fn rank(key: &EntityKey) -> u8 {
            match key {
                EntityKey::Label(_) => 0,
                EntityKey::Artist(_) => 1,
                EntityKey::Style(_) => 2,
                EntityKey::Album(_) => 3,
                EntityKey::Track(_) => 4,
            }
        }
        let mut ordered = staged.to_vec();
        ordered.sort_by_key(rank);
        ordered
    }

    /// Forgets a deleted entity. Relationships pointing at it are cleared.
    fn detach(&mut self, key: EntityKey) {
        match key {
            EntityKey::Artist(artist) => {
                self.relations.artist_albums.forget_parent(artist);
                self.artists.remove(artist);
            }
            EntityKey::Label(label) => {
                self.relations.label_albums.forget_parent(label);
                self.labels.remove(label);
            }
            EntityKey::Album(album) => {
                self.relations.artist_albums.forget_child(album);
                self.relations.label_albums.forget_child(album);
                self.relations.album_tracks.forget_parent(album);
                self.relations.album_styles.forget_left(album);
                self.albums.remove(album);
            }
            EntityKey::Track(track) => {
                self.relations.album_tracks.forget_child(track);
                self.tracks.remove(track);
            }
            EntityKey::Style(style) => {
                self.relations.album_styles.forget_right(style);
                self.styles.remove(style);
            }
        }
    }
}

fn artist_row(artist: &Artist) -> entities::artist::ActiveModel {
    let mut row = entities::artist::ActiveModel {
        name: Set(artist.name().to_string()),
        description: Set(artist.description().to_string()),
        website: Set(artist.website().map(str::to_string)),
        image: Set(artist.image().map(str::to_string)),
        kind: Set(artist.kind().as_str().to_string()),
        ..Default::default()
    };
    if let Some(id) = artist.id() {
        row.id = Unchanged(id);
    }
    row
}

fn album_row(album: &Album, artist_id: i64, label_id: Option<i64>) -> entities::album::ActiveModel {
    let mut row = entities::album::ActiveModel {
        artist_id: Set(artist_id),
        label_id: Set(label_id),
        name: Set(album.name().to_string()),
        release_year: Set(album.release_year()),
        cover_image: Set(album.cover_image().to_string()),
        ..Default::default()
    };
    if let Some(id) = album.id() {
        row.id = Unchanged(id);
    }
    row
}

fn track_row(track: &Track, album_id: i64) -> entities::track::ActiveModel {
    let mut row = entities::track::ActiveModel {
        album_id: Set(album_id),
        title: Set(track.title().to_string()),
        duration: Set(track.duration().to_string()),
        track_number: Set(track.track_number()),
        ..Default::default()
    };
    if let Some(id) = track.id() {
        row.id = Unchanged(id);
    }
    row
}

fn label_row(label: &Label) -> entities::label::ActiveModel {
    let mut row = entities::label::ActiveModel {
        name: Set(label.name().to_string()),
        description: Set(label.description().map(str::to_string)),
        founded_year: Set(label.founded_year()),
        kind: Set(label.kind().map(str::to_string)),
        logo: Set(label.logo().map(str::to_string)),
        ..Default::default()
    };
    if let Some(id) = label.id() {
        row.id = Unchanged(id);
    }
    row
}

fn style_row(style: &Style) -> entities::style::ActiveModel {
    let mut row = entities::style::ActiveModel {
        name: Set(style.name().to_string()),
        color: Set(style.color().map(str::to_string)),
        ..Default::default()
    };
    if let Some(id) = style.id() {
        row.id = Unchanged(id);
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ArtistKind;
    use crate::test_utils::{insert_album, insert_artist, insert_track, test_db};
    use sea_orm::PaginatorTrait;

    fn album_with_artist(session: &mut CatalogSession) -> (ArtistKey, AlbumKey) {
        let artist = session.register_artist(Artist::new("Air", ArtistKind::Group));
        let album = session.register_album(Album::new("Moon Safari", 1998, "moon.jpg"));
        session.add_album_to_artist(artist, album).unwrap();
        (artist, album)
    }

    #[tokio::test]
    async fn test_commit_assigns_ids_parent_first() {
        let db = test_db().await;
        let mut session = CatalogSession::new();

        let (artist, album) = album_with_artist(&mut session);
        let track = session.register_track(Track::new("La femme d'argent", "7:11", 1));
        session.add_track(album, track).unwrap();

        // Staged child-first on purpose
        session.stage_save(track).unwrap();
        session.stage_save(album).unwrap();
        session.stage_save(artist).unwrap();

        let summary = session.commit(&db.conn).await.unwrap();

        assert_eq!(summary.inserted, 3);
        assert!(!session.has_pending_changes());

        let album_id = session.album(album).unwrap().id().unwrap();
        let stored = entities::album::Entity::find_by_id(album_id)
            .one(&db.conn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.artist_id, session.artist(artist).unwrap().id().unwrap());

        let stored_track = entities::track::Entity::find()
            .one(&db.conn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_track.album_id, album_id);
        assert_eq!(session.album_key(album_id), Some(album));
    }

    #[tokio::test]
    async fn test_album_without_artist_is_rejected() {
        let db = test_db().await;
        let mut session = CatalogSession::new();
        let album = session.register_album(Album::new("Orphan", 2001, "x.jpg"));
        session.stage_save(album).unwrap();

        let err = session.commit(&db.conn).await.unwrap_err();
        assert!(matches!(err, CatalogError::MissingArtist { album: a } if a == album));
        assert_eq!(session.album(album).unwrap().id(), None);
    }

    #[tokio::test]
    async fn test_unassigned_track_is_rejected() {
        let db = test_db().await;
        let mut session = CatalogSession::new();
        let (artist, album) = album_with_artist(&mut session);
        let track = session.register_track(Track::new("Talisman", "4:16", 3));
        session.add_track(album, track).unwrap();
        session.remove_track(album, track).unwrap();

        session.stage_save(artist).unwrap();
        session.stage_save(album).unwrap();
        session.stage_save(track).unwrap();

        let err = session.commit(&db.conn).await.unwrap_err();
        assert!(matches!(err, CatalogError::UnassignedTrack { .. }));

        let count = entities::artist::Entity::find().count(&db.conn).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_stored_album_removed_from_artist_is_rejected() {
        let db = test_db().await;
        let artist_row = insert_artist(&db.conn, "Portishead").await;
        let album_row = insert_album(&db.conn, artist_row.id, None, "Dummy", 1994).await;
        let track_row = insert_track(&db.conn, album_row.id, "Mysterons", 1).await;

        let mut session = CatalogSession::new();
        let artist = session.attach_artist(artist_row.clone()).unwrap();
        let album = session.attach_album(album_row.clone());
        let track = session.attach_track(track_row);
        session.set_album_artist(album, Some(artist)).unwrap();
        session.set_track_album(track, Some(album)).unwrap();
        assert_eq!(session.album_tracks(album), &[track]);

        assert!(session.remove_album_from_artist(artist, album).unwrap());
        assert_eq!(session.album_artist(album), None);
        assert!(session.artist_albums(artist).is_empty());

        session.stage_save(album).unwrap();
        let err = session.commit(&db.conn).await.unwrap_err();
        assert!(matches!(err, CatalogError::MissingArtist { album: a } if a == album));

        // Unsetting the track's album empties the album side too
        session.add_album_to_artist(artist, album).unwrap();
        session.set_track_album(track, None).unwrap();
        assert!(session.album_tracks(album).is_empty());
        session.stage_save(track).unwrap();
        let err = session.commit(&db.conn).await.unwrap_err();
        assert!(matches!(err, CatalogError::UnassignedTrack { track: t } if t == track));

        let stored = entities::album::Entity::find_by_id(album_row.id)
            .one(&db.conn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.artist_id, artist_row.id);
        assert!(session.has_pending_changes());
    }

    #[tokio::test]
    async fn test_unsaved_artist_is_rejected() {
        let db = test_db().await;
        let mut session = CatalogSession::new();
        let (_, album) = album_with_artist(&mut session);
        session.stage_save(album).unwrap();

        let err = session.commit(&db.conn).await.unwrap_err();
        assert!(matches!(err, CatalogError::UnsavedReference { .. }));
    }

    #[tokio::test]
    async fn test_style_links_are_written_and_removed() {
        let db = test_db().await;
        let mut session = CatalogSession::new();
        let (artist, album) = album_with_artist(&mut session);
        let electro = session.register_style(Style::new("Electronic"));
        let lounge = session.register_style(Style::new("Lounge"));

        session.add_style(album, electro).unwrap();
        session.add_album_to_style(lounge, album).unwrap();
        assert_eq!(session.album_styles(album), &[electro, lounge]);
        assert_eq!(session.style_albums(lounge), &[album]);

        for key in [
            EntityKey::from(artist),
            album.into(),
            electro.into(),
            lounge.into(),
        ] {
            session.stage_save(key).unwrap();
        }
        let summary = session.commit(&db.conn).await.unwrap();
        assert_eq!(summary.links, 2);

        session.remove_album_from_style(lounge, album).unwrap();
        session.commit(&db.conn).await.unwrap();

        let links = entities::album_style::Entity::find().all(&db.conn).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(Some(links[0].style_id), session.style(electro).unwrap().id());
    }

    #[tokio::test]
    async fn test_link_to_transient_style_is_rejected() {
        let db = test_db().await;
        let mut session = CatalogSession::new();
        let (artist, album) = album_with_artist(&mut session);
        let style = session.register_style(Style::new("Trip hop"));
        session.add_style(album, style).unwrap();
        session.stage_save(artist).unwrap();
        session.stage_save(album).unwrap();

        let err = session.commit(&db.conn).await.unwrap_err();
        assert!(matches!(err, CatalogError::UnsavedReference { .. }));
    }

    #[tokio::test]
    async fn test_remove_album_from_other_label_keeps_reference() {
        let db = test_db().await;
        let mut session = CatalogSession::new();
        let (artist, album) = album_with_artist(&mut session);
        let source = session.register_label(Label::new("Source"));
        let virgin = session.register_label(Label::new("Virgin"));
        session.add_album_to_label(source, album).unwrap();

        assert!(!session.remove_album_from_label(virgin, album).unwrap());
        assert_eq!(session.album_label(album), Some(source));

        for key in [EntityKey::from(source), artist.into(), album.into()] {
            session.stage_save(key).unwrap();
        }
        session.commit(&db.conn).await.unwrap();

        let stored = entities::album::Entity::find().one(&db.conn).await.unwrap().unwrap();
        assert_eq!(stored.label_id, session.label(source).unwrap().id());
    }

    #[tokio::test]
    async fn test_update_keeps_id() {
        let db = test_db().await;
        let mut session = CatalogSession::new();
        let label = session.register_label(Label::new("Warp"));
        session.stage_save(label).unwrap();
        session.commit(&db.conn).await.unwrap();
        let id = session.label(label).unwrap().id();

        session.label_mut(label).unwrap().set_founded_year(Some(1989));
        session.stage_save(label).unwrap();
        let summary = session.commit(&db.conn).await.unwrap();

        assert_eq!(summary.updated, 1);
        assert_eq!(session.label(label).unwrap().id(), id);
        let stored = entities::label::Entity::find().all(&db.conn).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].founded_year, Some(1989));
    }

    #[tokio::test]
    async fn test_delete_detaches_album() {
        let db = test_db().await;
        let mut session = CatalogSession::new();
        let (artist, album) = album_with_artist(&mut session);
        let track = session.register_track(Track::new("Sexy Boy", "4:58", 2));
        let style = session.register_style(Style::new("Electronic"));
        session.add_track(album, track).unwrap();
        session.add_style(album, style).unwrap();
        for key in [
            EntityKey::from(artist),
            album.into(),
            track.into(),
            style.into(),
        ] {
            session.stage_save(key).unwrap();
        }
        session.commit(&db.conn).await.unwrap();

        session.stage_delete(album).unwrap();
        let err = session.commit(&db.conn).await.unwrap_err();
        assert!(matches!(err, CatalogError::DependentRows { .. }));

        session.stage_delete(track).unwrap();
        let summary = session.commit(&db.conn).await.unwrap();

        assert_eq!(summary.deleted, 2);
        assert!(session.album(album).is_none());
        assert!(session.artist_albums(artist).is_empty());
        assert!(session.style_albums(style).is_empty());
        assert_eq!(entities::album::Entity::find().count(&db.conn).await.unwrap(), 0);
        assert_eq!(
            entities::album_style::Entity::find().count(&db.conn).await.unwrap(),
            0
        );
        assert_eq!(entities::style::Entity::find().count(&db.conn).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_attach_is_identity_mapped() {
        let db = test_db().await;
        let mut session = CatalogSession::new();
        let label = session.register_label(Label::new("Ninja Tune"));
        session.stage_save(label).unwrap();
        session.commit(&db.conn).await.unwrap();

        let model = entities::label::Entity::find().one(&db.conn).await.unwrap().unwrap();
        assert_eq!(session.attach_label(model.clone()), label);

        let mut other = CatalogSession::new();
        let first = other.attach_label(model.clone());
        assert_eq!(other.attach_label(model), first);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let mut session = CatalogSession::new();
        let mut other = CatalogSession::new();
        let _ = other.register_artist(Artist::new("Someone", ArtistKind::Solo));
        let foreign = other.register_album(Album::new("Elsewhere", 2000, "e.jpg"));

        let artist = session.register_artist(Artist::new("Air", ArtistKind::Group));
        assert!(matches!(
            session.add_album_to_artist(artist, foreign),
            Err(CatalogError::UnknownKey(_))
        ));
        assert!(session.stage_save(foreign).is_err());
    }
}
