//! Scalar state of catalog entities.
//!
//! Records hold attributes only. Which artist owns an album, which styles it
//! carries and so on is owned by [`super::relations::Relations`] and read
//! through the session.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::entities;

/// Whether an artist performs alone or as a band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtistKind {
    Solo,
    Group,
}

impl ArtistKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtistKind::Solo => "solo",
            ArtistKind::Group => "group",
        }
    }
}

impl fmt::Display for ArtistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown artist kind: {0}")]
pub struct UnknownArtistKind(pub String);

impl FromStr for ArtistKind {
    type Err = UnknownArtistKind;

    /// Accepts the stored names as well as the `0`/`1` encoding older rows use.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solo" | "0" => Ok(ArtistKind::Solo),
            "group" | "1" => Ok(ArtistKind::Group),
            other => Err(UnknownArtistKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    id: Option<i64>,
    name: String,
    description: String,
    website: Option<String>,
    image: Option<String>,
    kind: ArtistKind,
}

impl Artist {
    pub fn new(name: impl Into<String>, kind: ArtistKind) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            website: None,
            image: None,
            kind,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(dead_code)]
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self
    }

    pub fn website(&self) -> Option<&str> {
        self.website.as_deref()
    }

    pub fn set_website(&mut self, website: Option<String>) -> &mut Self {
        self.website = website;
        self
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn set_image(&mut self, image: Option<String>) -> &mut Self {
        self.image = image;
        self
    }

    pub fn kind(&self) -> ArtistKind {
        self.kind
    }

    #[allow(dead_code)]
    pub fn set_kind(&mut self, kind: ArtistKind) -> &mut Self {
        self.kind = kind;
        self
    }
}

impl TryFrom<entities::artist::Model> for Artist {
    type Error = UnknownArtistKind;

    fn try_from(model: entities::artist::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(model.id),
            kind: model.kind.parse()?,
            name: model.name,
            description: model.description,
            website: model.website,
            image: model.image,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    id: Option<i64>,
    name: String,
    release_year: i32,
    cover_image: String,
}

impl Album {
    pub fn new(name: impl Into<String>, release_year: i32, cover_image: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            release_year,
            cover_image: cover_image.into(),
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(dead_code)]
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn release_year(&self) -> i32 {
        self.release_year
    }

    #[allow(dead_code)]
    pub fn set_release_year(&mut self, release_year: i32) -> &mut Self {
        self.release_year = release_year;
        self
    }

    pub fn cover_image(&self) -> &str {
        &self.cover_image
    }

    #[allow(dead_code)]
    pub fn set_cover_image(&mut self, cover_image: impl Into<String>) -> &mut Self {
        self.cover_image = cover_image.into();
        self
    }
}

impl From<entities::album::Model> for Album {
    fn from(model: entities::album::Model) -> Self {
        Self {
            id: Some(model.id),
            name: model.name,
            release_year: model.release_year,
            cover_image: model.cover_image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    id: Option<i64>,
    title: String,
    duration: String,
    track_number: i32,
}

impl Track {
    pub fn new(title: impl Into<String>, duration: impl Into<String>, track_number: i32) -> Self {
        Self {
            id: None,
            title: title.into(),
            duration: duration.into(),
            track_number,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    #[allow(dead_code)]
    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    /// Free-form display duration, e.g. "3:45".
    pub fn duration(&self) -> &str {
        &self.duration
    }

    #[allow(dead_code)]
    pub fn set_duration(&mut self, duration: impl Into<String>) -> &mut Self {
        self.duration = duration.into();
        self
    }

    pub fn track_number(&self) -> i32 {
        self.track_number
    }

    #[allow(dead_code)]
    pub fn set_track_number(&mut self, track_number: i32) -> &mut Self {
        self.track_number = track_number;
        self
    }
}

impl From<entities::track::Model> for Track {
    fn from(model: entities::track::Model) -> Self {
        Self {
            id: Some(model.id),
            title: model.title,
            duration: model.duration,
            track_number: model.track_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    id: Option<i64>,
    name: String,
    description: Option<String>,
    founded_year: Option<i32>,
    kind: Option<String>,
    logo: Option<String>,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            founded_year: None,
            kind: None,
            logo: None,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(dead_code)]
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) -> &mut Self {
        self.description = description;
        self
    }

    pub fn founded_year(&self) -> Option<i32> {
        self.founded_year
    }

    pub fn set_founded_year(&mut self, founded_year: Option<i32>) -> &mut Self {
        self.founded_year = founded_year;
        self
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn set_kind(&mut self, kind: Option<String>) -> &mut Self {
        self.kind = kind;
        self
    }

    pub fn logo(&self) -> Option<&str> {
        self.logo.as_deref()
    }

    pub fn set_logo(&mut self, logo: Option<String>) -> &mut Self {
        self.logo = logo;
        self
    }
}

impl From<entities::label::Model> for Label {
    fn from(model: entities::label::Model) -> Self {
        Self {
            id: Some(model.id),
            name: model.name,
            description: model.description,
            founded_year: model.founded_year,
            kind: model.kind,
            logo: model.logo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    id: Option<i64>,
    name: String,
    color: Option<String>,
}

impl Style {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            color: None,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(dead_code)]
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn set_color(&mut self, color: Option<String>) -> &mut Self {
        self.color = color;
        self
    }
}

impl From<entities::style::Model> for Style {
    fn from(model: entities::style::Model) -> Self {
        Self {
            id: Some(model.id),
            name: model.name,
            color: model.color,
        }
    }
}

/// Store identity shared by every record.
pub(crate) trait StoredRecord {
    fn stored_id(&self) -> Option<i64>;

    /// Records the id the store assigned on first insert. Ids never change
    /// once set.
    fn assign_id(&mut self, id: i64);
}

macro_rules! stored_record {
    ($($record:ty),+) => {
        $(
            impl StoredRecord for $record {
                fn stored_id(&self) -> Option<i64> {
                    self.id
                }

                fn assign_id(&mut self, id: i64) {
                    debug_assert!(self.id.is_none() || self.id == Some(id));
                    self.id.get_or_insert(id);
                }
            }
        )+
    };
}

stored_record!(Artist, Album, Track, Label, Style);
