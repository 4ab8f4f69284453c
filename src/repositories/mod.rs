//! One repository per catalog entity.
//!
//! Reads go straight to the store and come back as entity models or detail
//! projections. Writes go through a [`CatalogSession`]: `add`/`remove` stage
//! the change and commit it on request.

use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog::{CatalogError, CatalogSession, CommitSummary, EntityKey};
use crate::database::Database;

pub mod album;
pub mod artist;
pub mod label;
pub mod style;
pub mod track;

pub use album::AlbumRepository;
pub use artist::ArtistRepository;
pub use label::LabelRepository;
pub use style::StyleRepository;
pub use track::TrackRepository;

#[async_trait]
pub trait Repository: Send + Sync {
    type Key: Into<EntityKey> + Copy + Send + 'static;

    fn db(&self) -> &Arc<Database>;

    /// Stages an insert or update of `key`. With `commit_now` every pending
    /// change in the session is written.
    async fn add(
        &self,
        session: &mut CatalogSession,
        key: Self::Key,
        commit_now: bool,
    ) -> Result<Option<CommitSummary>, CatalogError> {
        session.stage_save(key)?;
        if commit_now {
            return session.commit(&self.db().conn).await.map(Some);
        }
        Ok(None)
    }

    /// Stages a delete of `key`. With `commit_now` every pending change in
    /// the session is written.
    async fn remove(
        &self,
        session: &mut CatalogSession,
        key: Self::Key,
        commit_now: bool,
    ) -> Result<Option<CommitSummary>, CatalogError> {
        session.stage_delete(key)?;
        if commit_now {
            return session.commit(&self.db().conn).await.map(Some);
        }
        Ok(None)
    }
}
