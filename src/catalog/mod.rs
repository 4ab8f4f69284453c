//! In-memory catalog graph and its unit of work.

mod keys;
mod records;
mod relations;
mod session;

pub use keys::{AlbumKey, ArtistKey, EntityKey, LabelKey, StyleKey, TrackKey};
pub use records::{Album, Artist, ArtistKind, Label, Style, Track, UnknownArtistKind};
pub use session::{CatalogSession, CommitSummary};

use sea_orm::DbErr;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0} is not tracked by this session")]
    UnknownKey(EntityKey),

    #[error("{album} has no artist")]
    MissingArtist { album: AlbumKey },

    #[error("{track} is not assigned to an album")]
    UnassignedTrack { track: TrackKey },

    #[error("{from} references {to}, which is neither stored nor staged for save")]
    UnsavedReference { from: EntityKey, to: EntityKey },

    #[error("{from} references {to}, which is staged for deletion")]
    DeletedReference { from: EntityKey, to: EntityKey },

    #[error("{key} cannot be deleted while {dependent} still references it")]
    DependentRows { key: EntityKey, dependent: EntityKey },

    #[error("Invalid stored artist: {0}")]
    InvalidArtist(#[from] UnknownArtistKind),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}
