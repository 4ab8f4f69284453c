use std::sync::Arc;

use migration::MigratorTrait;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database as SeaDatabase, DatabaseConnection};

use crate::database::Database;
use crate::entities;

pub async fn test_db() -> Arc<Database> {
    let conn = SeaDatabase::connect("sqlite::memory:?mode=rwc")
        .await
        .unwrap();

    // Enable foreign keys
    conn.execute_unprepared("PRAGMA foreign_keys = ON")
        .await
        .unwrap();

    migration::Migrator::up(&conn, None)
        .await
        .unwrap_or_else(|e| panic!("Failed to run migrations: {}", e));

    Arc::new(Database { conn })
}

// Row fixtures written straight through the entities, bypassing the session.

pub async fn insert_artist(conn: &DatabaseConnection, name: &str) -> entities::artist::Model {
    entities::artist::ActiveModel {
        name: Set(name.to_string()),
        description: Set(format!("About {name}")),
        kind: Set("group".to_string()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap()
}

pub async fn insert_label(conn: &DatabaseConnection, name: &str) -> entities::label::Model {
    entities::label::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap()
}

pub async fn insert_style(conn: &DatabaseConnection, name: &str) -> entities::style::Model {
    entities::style::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap()
}

pub async fn insert_album(
    conn: &DatabaseConnection,
    artist_id: i64,
    label_id: Option<i64>,
    name: &str,
    release_year: i32,
) -> entities::album::Model {
    entities::album::ActiveModel {
        artist_id: Set(artist_id),
        label_id: Set(label_id),
        name: Set(name.to_string()),
        release_year: Set(release_year),
        cover_image: Set(format!("{}.jpg", name.to_lowercase().replace(' ', "-"))),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap()
}

pub async fn insert_track(
    conn: &DatabaseConnection,
    album_id: i64,
    title: &str,
    track_number: i32,
) -> entities::track::Model {
    entities::track::ActiveModel {
        album_id: Set(album_id),
        title: Set(title.to_string()),
        duration: Set("3:30".to_string()),
        track_number: Set(track_number),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap()
}

pub async fn link_style(conn: &DatabaseConnection, album_id: i64, style_id: i64) {
    entities::album_style::ActiveModel {
        album_id: Set(album_id),
        style_id: Set(style_id),
    }
    .insert(conn)
    .await
    .unwrap();
}
