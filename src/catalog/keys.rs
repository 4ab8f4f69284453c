use std::fmt;

macro_rules! session_key {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn new(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

session_key!(
    /// Handle to an artist tracked by a `CatalogSession`.
    ArtistKey,
    "artist"
);
session_key!(
    /// Handle to an album tracked by a `CatalogSession`.
    AlbumKey,
    "album"
);
session_key!(
    /// Handle to a track tracked by a `CatalogSession`.
    TrackKey,
    "track"
);
session_key!(
    /// Handle to a label tracked by a `CatalogSession`.
    LabelKey,
    "label"
);
session_key!(
    /// Handle to a style tracked by a `CatalogSession`.
    StyleKey,
    "style"
);

/// Any session handle, used where staging does not care about the entity type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Artist(ArtistKey),
    Album(AlbumKey),
    Track(TrackKey),
    Label(LabelKey),
    Style(StyleKey),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Artist(key) => key.fmt(f),
            EntityKey::Album(key) => key.fmt(f),
            EntityKey::Track(key) => key.fmt(f),
            EntityKey::Label(key) => key.fmt(f),
            EntityKey::Style(key) => key.fmt(f),
        }
    }
}

impl From<ArtistKey> for EntityKey {
    fn from(key: ArtistKey) -> Self {
        EntityKey::Artist(key)
    }
}

impl From<AlbumKey> for EntityKey {
    fn from(key: AlbumKey) -> Self {
        EntityKey::Album(key)
    }
}

impl From<TrackKey> for EntityKey {
    fn from(key: TrackKey) -> Self {
        EntityKey::Track(key)
    }
}

impl From<LabelKey> for EntityKey {
    fn from(key: LabelKey) -> Self {
        EntityKey::Label(key)
    }
}

impl From<StyleKey> for EntityKey {
    fn from(key: StyleKey) -> Self {
        EntityKey::Style(key)
    }
}
