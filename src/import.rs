//! Loads a catalog fixture (TOML) through the session in a single commit.
//!
//! ```toml
//! [[labels]]
//! name = "Warp"
//! founded_year = 1989
//!
//! [[styles]]
//! name = "IDM"
//!
//! [[artists]]
//! name = "Aphex Twin"
//! kind = "solo"
//!
//! [[artists.albums]]
//! name = "Drukqs"
//! release_year = 2001
//! cover_image = "drukqs.jpg"
//! label = "Warp"
//! styles = ["IDM"]
//!
//! [[artists.albums.tracks]]
//! title = "Jynweythek"
//! duration = "2:23"
//! track_number = 1
//! ```
//!
//! Labels and styles are matched by name against the file first, then
//! against the store. Stored ones are updated with the file's attributes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use color_eyre::Result;
use color_eyre::eyre::Context;
use serde::Deserialize;

use crate::catalog::{
    Album, Artist, ArtistKind, CatalogSession, CommitSummary, Label, LabelKey, Style, StyleKey,
    Track,
};
use crate::database::Database;
use crate::repositories::{
    AlbumRepository, ArtistRepository, LabelRepository, Repository, StyleRepository,
    TrackRepository,
};

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub labels: Vec<LabelEntry>,
    #[serde(default)]
    pub styles: Vec<StyleEntry>,
    #[serde(default)]
    pub artists: Vec<ArtistEntry>,
}

#[derive(Debug, Deserialize)]
pub struct LabelEntry {
    pub name: String,
    pub description: Option<String>,
    pub founded_year: Option<i32>,
    pub kind: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StyleEntry {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistEntry {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub description: String,
    pub website: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub albums: Vec<AlbumEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AlbumEntry {
    pub name: String,
    pub release_year: i32,
    pub cover_image: String,
    pub label: Option<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub tracks: Vec<TrackEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TrackEntry {
    pub title: String,
    pub duration: String,
    pub track_number: i32,
}

impl CatalogFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read catalog file: {}", path.display()))?;
        Self::parse(&contents)
            .wrap_err_with(|| format!("Failed to parse catalog file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

pub struct CatalogImporter {
    labels: LabelRepository,
    styles: StyleRepository,
    artists: ArtistRepository,
    albums: AlbumRepository,
    tracks: TrackRepository,
}

impl CatalogImporter {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            labels: LabelRepository::new(db.clone()),
            styles: StyleRepository::new(db.clone()),
            artists: ArtistRepository::new(db.clone()),
            albums: AlbumRepository::new(db.clone()),
            tracks: TrackRepository::new(db),
        }
    }

    #[tracing::instrument(skip_all)]
    pub async fn import(&self, file: CatalogFile) -> Result<CommitSummary> {
        let mut session = CatalogSession::new();
        let mut labels: HashMap<String, LabelKey> = HashMap::new();
        let mut styles: HashMap<String, StyleKey> = HashMap::new();

        for entry in file.labels {
            let key = self.label_key(&mut session, &mut labels, &entry.name).await?;
            if let Some(label) = session.label_mut(key) {
                label
                    .set_description(entry.description)
                    .set_founded_year(entry.founded_year)
                    .set_kind(entry.kind)
                    .set_logo(entry.logo);
            }
            self.labels.add(&mut session, key, false).await?;
        }

        for entry in file.styles {
            let key = self.style_key(&mut session, &mut styles, &entry.name).await?;
            if let Some(style) = session.style_mut(key) {
                style.set_color(entry.color);
            }
            self.styles.add(&mut session, key, false).await?;
        }

        for entry in file.artists {
            let kind: ArtistKind = entry
                .kind
                .parse()
                .wrap_err_with(|| format!("Invalid kind for artist {}", entry.name))?;
            let mut artist = Artist::new(entry.name, kind);
            artist
                .set_description(entry.description)
                .set_website(entry.website)
                .set_image(entry.image);
            let artist = session.register_artist(artist);
            self.artists.add(&mut session, artist, false).await?;

            for album_entry in entry.albums {
                let album = session.register_album(Album::new(
                    album_entry.name,
                    album_entry.release_year,
                    album_entry.cover_image,
                ));
                session.add_album_to_artist(artist, album)?;

                if let Some(label_name) = &album_entry.label {
                    let label = self.label_key(&mut session, &mut labels, label_name).await?;
                    self.labels.add(&mut session, label, false).await?;
                    session.add_album_to_label(label, album)?;
                }

                for style_name in &album_entry.styles {
                    let style = self.style_key(&mut session, &mut styles, style_name).await?;
                    self.styles.add(&mut session, style, false).await?;
                    session.add_style(album, style)?;
                }

                for track_entry in album_entry.tracks {
                    let track = session.register_track(Track::new(
                        track_entry.title,
                        track_entry.duration,
                        track_entry.track_number,
                    ));
                    session.add_track(album, track)?;
                    self.tracks.add(&mut session, track, false).await?;
                }

                self.albums.add(&mut session, album, false).await?;
            }
        }

        let summary = session
            .commit(&self.albums.db().conn)
            .await
            .wrap_err("Failed to commit imported catalog")?;
        tracing::info!(
            inserted = summary.inserted,
            updated = summary.updated,
            "Catalog imported"
        );
        Ok(summary)
    }

    /// Key for the label called `name`: one met earlier in this import, a
    /// stored one, or a new one.
    async fn label_key(
        &self,
        session: &mut CatalogSession,
        known: &mut HashMap<String, LabelKey>,
        name: &str,
    ) -> Result<LabelKey> {
        if let Some(key) = known.get(name) {
            return Ok(*key);
        }
        let key = match self.labels.find_by_name(name).await? {
            Some(model) => session.attach_label(model),
            None => session.register_label(Label::new(name)),
        };
        known.insert(name.to_string(), key);
        Ok(key)
    }

    async fn style_key(
        &self,
        session: &mut CatalogSession,
        known: &mut HashMap<String, StyleKey>,
        name: &str,
    ) -> Result<StyleKey> {
        if let Some(key) = known.get(name) {
            return Ok(*key);
        }
        let key = match self.styles.find_by_name(name).await? {
            Some(model) => session.attach_style(model),
            None => session.register_style(Style::new(name)),
        };
        known.insert(name.to_string(), key);
        Ok(key)
    }
}
