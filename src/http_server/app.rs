use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use color_eyre::eyre::{Context, eyre};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    config::Config,
    database::Database,
    http_server::{
        http_routes::{albums, artists, home, labels},
        state::AppState,
    },
    ports::view::{JsonViewRenderer, ViewRenderer},
};

pub fn router(state: Arc<AppState>, assets: Option<PathBuf>) -> Router {
    let mut router = Router::new()
        .route("/", get(home::index))
        .route("/albums", get(albums::list))
        .route("/album/{id}", get(albums::show))
        .route("/artistes", get(artists::list))
        .route("/artiste/{id}", get(artists::show))
        .route("/labels", get(labels::list))
        .route("/label/{id}", get(labels::show));

    if let Some(assets) = assets {
        tracing::info!("Serving assets from {}", assets.display());
        router = router.nest_service("/assets", ServeDir::new(assets));
    }

    router
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start(config: &Config, database: Database) -> color_eyre::Result<()> {
    let renderer: Arc<dyn ViewRenderer> = Arc::new(JsonViewRenderer);
    let app_state = Arc::new(AppState {
        db: Arc::new(database),
        renderer,
    });
    let app = router(app_state, config.assets_path());

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .wrap_err_with(|| eyre!("Failed to bind to {}", address))?;
    tracing::info!("Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Failed to start HTTP server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("Shutting down HTTP server");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::view::MockViewRenderer;
    use crate::test_utils::{
        insert_album, insert_artist, insert_label, insert_style, insert_track, link_style, test_db,
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use color_eyre::eyre::eyre;
    use tower::ServiceExt;

    async fn json_app() -> (Router, Arc<Database>) {
        let db = test_db().await;
        let state = Arc::new(AppState {
            db: db.clone(),
            renderer: Arc::new(JsonViewRenderer),
        });
        (router(state, None), db)
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_home_uses_mocked_renderer() {
        let db = test_db().await;
        let mut renderer = MockViewRenderer::new();
        renderer
            .expect_render()
            .times(1)
            .returning(|view, _| Ok(format!("<h1>{view}</h1>")));
        renderer
            .expect_content_type()
            .return_const("text/html; charset=utf-8");

        let state = Arc::new(AppState {
            db,
            renderer: Arc::new(renderer),
        });
        let response = router(state, None)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>home/index</h1>");
    }

    #[tokio::test]
    async fn test_renderer_failure_is_internal_error() {
        let db = test_db().await;
        let mut renderer = MockViewRenderer::new();
        renderer
            .expect_render()
            .returning(|_, _| Err(eyre!("template missing")));
        renderer.expect_content_type().return_const("text/html");

        let state = Arc::new(AppState {
            db,
            renderer: Arc::new(renderer),
        });
        let response = router(state, None)
            .oneshot(Request::builder().uri("/labels").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_album_list_treats_bad_page_as_first() {
        let (app, db) = json_app().await;
        let artist = insert_artist(&db.conn, "Cocteau Twins").await;
        let dream_pop = insert_style(&db.conn, "Dream pop").await;
        for n in 0..10 {
            let album = insert_album(&db.conn, artist.id, None, &format!("Record {n:02}"), 1982 + n).await;
            link_style(&db.conn, album.id, dream_pop.id).await;
        }

        let (status, first) = fetch(app.clone(), "/albums").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["view"], "albums/list");
        assert_eq!(first["context"]["pagination"]["page"], 1);
        assert_eq!(first["context"]["pagination"]["total_pages"], 2);
        assert_eq!(first["context"]["albums"].as_array().unwrap().len(), 9);
        assert_eq!(
            first["context"]["albums"][0]["artist"]["name"],
            "Cocteau Twins"
        );

        let (_, garbage) = fetch(app.clone(), "/albums?page=abc").await;
        assert_eq!(garbage["context"], first["context"]);

        let (_, second) = fetch(app.clone(), "/albums?page=2").await;
        assert_eq!(second["context"]["albums"].as_array().unwrap().len(), 1);

        let (status, beyond) = fetch(app, "/albums?page=5").await;
        assert_eq!(status, StatusCode::OK);
        assert!(beyond["context"]["albums"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_album_list_takes_first_of_repeated_pages() {
        let (app, db) = json_app().await;
        let artist = insert_artist(&db.conn, "Stereolab").await;
        let lounge = insert_style(&db.conn, "Space age pop").await;
        for n in 0..10 {
            let album = insert_album(&db.conn, artist.id, None, &format!("Dots {n:02}"), 1990 + n).await;
            link_style(&db.conn, album.id, lounge.id).await;
        }

        let (status, body) = fetch(app.clone(), "/albums?page=2&page=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["context"]["pagination"]["page"], 2);
        assert_eq!(body["context"]["albums"].as_array().unwrap().len(), 1);

        let (status, body) = fetch(app.clone(), "/albums?page=x&page=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["context"]["pagination"]["page"], 1);

        let (status, body) = fetch(app, "/albums?page").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["context"]["pagination"]["page"], 1);
    }

    #[tokio::test]
    async fn test_album_detail() {
        let (app, db) = json_app().await;
        let artist = insert_artist(&db.conn, "Low").await;
        let label = insert_label(&db.conn, "Sub Pop").await;
        let album = insert_album(&db.conn, artist.id, Some(label.id), "Double Negative", 2018).await;
        insert_track(&db.conn, album.id, "Fly", 8).await;
        insert_track(&db.conn, album.id, "Quorum", 1).await;

        let (status, body) = fetch(app, &format!("/album/{}", album.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["view"], "albums/detail");
        assert_eq!(body["context"]["album"]["name"], "Double Negative");
        assert_eq!(body["context"]["artist"]["name"], "Low");
        assert_eq!(body["context"]["label"]["name"], "Sub Pop");
        assert_eq!(body["context"]["tracks"][0]["title"], "Quorum");
        assert_eq!(body["context"]["styles"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_artist_and_label_pages() {
        let (app, db) = json_app().await;
        let artist = insert_artist(&db.conn, "Yo La Tengo").await;
        let label = insert_label(&db.conn, "Matador").await;
        insert_album(&db.conn, artist.id, Some(label.id), "Painful", 1993).await;

        let (status, artists) = fetch(app.clone(), "/artistes").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(artists["view"], "artists/list");
        assert_eq!(artists["context"]["artists"][0]["artist"]["name"], "Yo La Tengo");

        let (status, detail) = fetch(app.clone(), &format!("/artiste/{}", artist.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["context"]["albums"][0]["name"], "Painful");

        let (status, labels) = fetch(app.clone(), "/labels").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(labels["context"]["labels"][0]["name"], "Matador");

        let (status, detail) = fetch(app, &format!("/label/{}", label.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["view"], "labels/detail");
        assert_eq!(detail["context"]["albums"][0]["name"], "Painful");
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let (app, _db) = json_app().await;

        for uri in [
            "/album/42",
            "/artiste/42",
            "/label/42",
            "/album/abc",
            "/artiste/-x",
            "/label/1.5",
        ] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_assets_are_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cover.txt"), "cover").unwrap();
        let state = Arc::new(AppState {
            db: test_db().await,
            renderer: Arc::new(JsonViewRenderer),
        });

        let response = router(state, Some(dir.path().to_path_buf()))
            .oneshot(
                Request::builder()
                    .uri("/assets/cover.txt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"cover");
    }
}
