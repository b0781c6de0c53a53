pub mod albums;
pub mod artists;
pub mod songs;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch},
    Json, Router,
};
use tracing::info;

use crate::state::{ApiError, AppState, HealthResponse};

pub(crate) const DELETED_MESSAGE: &str = "Successfully deleted";

/// Every route answers unsupported methods with the same 404 as unknown
/// paths, so a request either hits a handler or gets `Endpoint not found`.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health).fallback(not_found))
        .route(
            "/artists",
            get(artists::list_artists)
                .post(artists::create_artist)
                .fallback(not_found),
        )
        .route(
            "/artists/:artist_id",
            get(artists::get_artist)
                .patch(artists::update_artist)
                .put(artists::update_artist)
                .delete(artists::delete_artist)
                .fallback(not_found),
        )
        .route(
            "/artist/:artist_id",
            patch(artists::update_artist)
                .put(artists::update_artist)
                .fallback(not_found),
        )
        .route(
            "/artists/:artist_id/albums",
            get(albums::list_artist_albums)
                .post(albums::create_album)
                .fallback(not_found),
        )
        .route(
            "/artists/:artist_id/songs",
            get(songs::list_artist_songs).fallback(not_found),
        )
        .route(
            "/albums/:album_id",
            get(albums::get_album)
                .patch(albums::update_album)
                .put(albums::update_album)
                .delete(albums::delete_album)
                .fallback(not_found),
        )
        .route(
            "/albums/:album_id/songs",
            get(songs::list_album_songs)
                .post(songs::create_song)
                .fallback(not_found),
        )
        .route(
            "/trackNumbers/:track_number",
            get(songs::list_track_number_songs).fallback(not_found),
        )
        .route("/songs/:song_id", get(songs::get_song).fallback(not_found))
        .fallback(not_found)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn log_request(req: Request, next: Next) -> Response {
    info!("{} {}", req.method(), req.uri());
    next.run(req).await
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        stats: state.catalog.stats(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use catalog::Catalog;
    use common::{Album, AlbumId, Artist, ArtistId, Song, SongId};
    use serde_json::{json, Map, Value};
    use time::OffsetDateTime;
    use tower::util::ServiceExt;

    use crate::utils::date_string;

    fn seeded_app() -> Router {
        let mut details = Map::new();
        details.insert("name".to_string(), json!("Dog"));
        details.insert("lyrics".to_string(), json!("Who let the dogs out?"));
        let catalog = Catalog::from_records(
            vec![Artist {
                artist_id: ArtistId(1),
                name: Some("Anonymous Bosch".to_string()),
            }],
            vec![Album {
                album_id: AlbumId(1),
                name: Some("Bad Song Lyrics".to_string()),
                artist_id: ArtistId(1),
            }],
            vec![Song {
                song_id: SongId(1),
                album_id: AlbumId(1),
                track_number: 1,
                details,
            }],
        );
        api_router(AppState::new(catalog))
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = send(app, req).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn assert_not_found(app: &Router, req: Request<Body>) {
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Endpoint not found");
    }

    #[tokio::test]
    async fn lists_artists_as_mapping() {
        let app = seeded_app();
        let (status, body) = send_json(&app, request("GET", "/artists")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "1": { "artistId": 1, "name": "Anonymous Bosch" } }));
    }

    #[tokio::test]
    async fn created_artist_is_readable() {
        let app = seeded_app();
        let (status, created) = send_json(
            &app,
            json_request("POST", "/artists", json!({ "name": "Second Artist" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created, json!({ "artistId": 2, "name": "Second Artist" }));

        let (status, fetched) = send_json(&app, request("GET", "/artists/2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Second Artist");
    }

    #[tokio::test]
    async fn artist_ids_increase() {
        let app = seeded_app();
        let mut last = 1;
        for name in ["a", "b", "c"] {
            let (_, created) =
                send_json(&app, json_request("POST", "/artists", json!({ "name": name }))).await;
            let id = created["artistId"].as_u64().unwrap();
            assert!(id > last);
            last = id;
        }
    }

    #[tokio::test]
    async fn create_artist_without_name() {
        let app = seeded_app();
        let (status, created) = send_json(&app, request("POST", "/artists")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created, json!({ "artistId": 2 }));
    }

    #[tokio::test]
    async fn create_artist_from_form() {
        let app = seeded_app();
        let req = Request::builder()
            .method("POST")
            .uri("/artists")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=Form+Artist%21"))
            .unwrap();
        let (status, created) = send_json(&app, req).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["name"], "Form Artist!");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let app = seeded_app();
        let req = Request::builder()
            .method("POST")
            .uri("/artists")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\""))
            .unwrap();
        let (status, body) = send_json(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        let (_, artists) = send_json(&app, request("GET", "/artists")).await;
        assert_eq!(artists.as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_artist_with_empty_body_stamps_date() {
        let app = seeded_app();
        let (status, body) = send_json(&app, request("PATCH", "/artist/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Anonymous Bosch");
        assert_eq!(body["artistId"], 1);
        let today = date_string(OffsetDateTime::now_utc()).unwrap();
        assert_eq!(body["lastUpdated"], today.as_str());
    }

    #[tokio::test]
    async fn update_artist_on_either_path() {
        let app = seeded_app();
        let (status, body) = send_json(
            &app,
            json_request("PUT", "/artist/1", json!({ "name": "Renamed" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Renamed");

        let (status, body) = send_json(
            &app,
            json_request("PATCH", "/artists/1", json!({ "name": "Again" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Again");

        let (_, fetched) = send_json(&app, request("GET", "/artists/1")).await;
        assert_eq!(fetched, json!({ "artistId": 1, "name": "Again" }));
    }

    #[tokio::test]
    async fn update_missing_artist_reports_invalid_id() {
        let app = seeded_app();
        let (status, body) = send(&app, request("PATCH", "/artist/42")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Endpoint: not valid id");
        let (status, body) = send(&app, request("PUT", "/artist/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Endpoint: not valid id");
    }

    #[tokio::test]
    async fn deleted_artist_is_gone() {
        let app = seeded_app();
        let (status, body) = send_json(&app, request("DELETE", "/artists/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Successfully deleted" }));
        assert_not_found(&app, request("GET", "/artists/1")).await;
        assert_not_found(&app, request("DELETE", "/artists/1")).await;
    }

    #[tokio::test]
    async fn album_created_under_artist() {
        let app = seeded_app();
        let (status, created) = send_json(
            &app,
            json_request("POST", "/artists/1/albums", json!({ "name": "First Album" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            created,
            json!({ "albumId": 2, "name": "First Album", "artistId": 1 })
        );

        let (status, albums) = send_json(&app, request("GET", "/artists/1/albums")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            albums,
            json!([
                { "albumId": 1, "name": "Bad Song Lyrics", "artistId": 1 },
                { "albumId": 2, "name": "First Album", "artistId": 1 }
            ])
        );

        let (status, fetched) = send_json(&app, request("GET", "/albums/2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn album_for_missing_artist_is_not_found() {
        let app = seeded_app();
        assert_not_found(
            &app,
            json_request("POST", "/artists/9/albums", json!({ "name": "Nope" })),
        )
        .await;
        assert_not_found(&app, request("GET", "/artists/9/albums")).await;
        assert_not_found(&app, request("GET", "/artists/9/songs")).await;
    }

    #[tokio::test]
    async fn update_and_delete_album() {
        let app = seeded_app();
        let (status, body) = send_json(
            &app,
            json_request("PATCH", "/albums/1", json!({ "name": "Good Song Lyrics" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Good Song Lyrics");

        let (status, body) = send_json(&app, json_request("PUT", "/albums/1", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Good Song Lyrics");

        assert_not_found(&app, request("PATCH", "/albums/5")).await;

        let (status, body) = send_json(&app, request("DELETE", "/albums/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Successfully deleted");
        assert_not_found(&app, request("GET", "/albums/1")).await;
    }

    #[tokio::test]
    async fn songs_of_album_and_artist() {
        let app = seeded_app();
        let (status, created) = send_json(
            &app,
            json_request(
                "POST",
                "/albums/1/songs",
                json!({ "name": "Cat", "lyrics": "Meow", "trackNumber": 2 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["songId"], 2);
        assert_eq!(created["albumId"], 1);
        assert_eq!(created["trackNumber"], 2);
        assert!(created["createdAt"].is_string());

        let (status, songs) = send_json(&app, request("GET", "/albums/1/songs")).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<_> = songs
            .as_array()
            .unwrap()
            .iter()
            .map(|song| song["songId"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);

        let (status, songs) = send_json(&app, request("GET", "/artists/1/songs")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(songs.as_array().unwrap().len(), 2);
        assert_eq!(songs[0]["lyrics"], "Who let the dogs out?");
    }

    #[tokio::test]
    async fn orphaned_songs_stay_reachable() {
        let app = seeded_app();
        send(&app, request("DELETE", "/albums/1")).await;
        let (status, songs) = send_json(&app, request("GET", "/artists/1/songs")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(songs, json!([]));
        let (status, song) = send_json(&app, request("GET", "/songs/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(song["name"], "Dog");
    }

    #[tokio::test]
    async fn missing_album_songs_not_found() {
        let app = seeded_app();
        assert_not_found(&app, request("GET", "/albums/999/songs")).await;
        assert_not_found(
            &app,
            json_request("POST", "/albums/999/songs", json!({ "name": "x" })),
        )
        .await;
    }

    #[tokio::test]
    async fn songs_by_track_number() {
        let app = seeded_app();
        send(
            &app,
            json_request("POST", "/artists/1/albums", json!({ "name": "Second" })),
        )
        .await;
        send(
            &app,
            json_request(
                "POST",
                "/albums/2/songs",
                json!({ "name": "Opener", "trackNumber": 1 }),
            ),
        )
        .await;

        let (status, songs) = send_json(&app, request("GET", "/trackNumbers/1")).await;
        assert_eq!(status, StatusCode::OK);
        let albums: Vec<_> = songs
            .as_array()
            .unwrap()
            .iter()
            .map(|song| song["albumId"].as_u64().unwrap())
            .collect();
        assert_eq!(albums, vec![1, 2]);

        let (status, songs) = send_json(&app, request("GET", "/trackNumbers/one")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(songs, json!([]));
    }

    #[tokio::test]
    async fn unknown_routes_and_methods_are_not_found() {
        let app = seeded_app();
        assert_not_found(&app, request("GET", "/nothing")).await;
        assert_not_found(&app, request("GET", "/artists/")).await;
        assert_not_found(&app, request("GET", "/artists/01")).await;
        assert_not_found(&app, request("GET", "/songs/abc")).await;
        assert_not_found(&app, request("DELETE", "/songs/1")).await;
        assert_not_found(&app, request("GET", "/artist/1")).await;
        assert_not_found(&app, request("POST", "/trackNumbers/1")).await;
    }

    #[tokio::test]
    async fn percent_encoded_ids_name_nothing() {
        let app = seeded_app();
        assert_not_found(&app, request("GET", "/artists/%31")).await;
        assert_not_found(&app, request("GET", "/artists/%FF")).await;
        assert_not_found(&app, request("GET", "/artists/%31/albums")).await;
        assert_not_found(&app, request("GET", "/albums/%FF/songs")).await;
        assert_not_found(&app, request("DELETE", "/albums/%31")).await;
        assert_not_found(&app, request("GET", "/songs/%FF")).await;
        assert_not_found(&app, request("GET", "/songs/%31")).await;

        let (status, songs) = send_json(&app, request("GET", "/trackNumbers/%31")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(songs, json!([]));
        let (status, songs) = send_json(&app, request("GET", "/trackNumbers/%FF")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(songs, json!([]));

        let (status, body) = send(&app, request("PATCH", "/artist/%FF")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Endpoint: not valid id");
        let (status, body) = send(&app, request("PUT", "/artist/%31")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Endpoint: not valid id");

        let (status, _) = send_json(&app, request("GET", "/artists/1")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn boolean_name_leaves_artist_unchanged() {
        let app = seeded_app();
        let (status, body) = send_json(
            &app,
            json_request("PATCH", "/artist/1", json!({ "name": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Anonymous Bosch");
    }

    #[tokio::test]
    async fn invalid_track_number_is_bad_request() {
        let app = seeded_app();
        for track_number in [json!(-1), json!(2.5), json!("two")] {
            let (status, body) = send_json(
                &app,
                json_request(
                    "POST",
                    "/albums/1/songs",
                    json!({ "name": "Bad", "trackNumber": track_number }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"].is_string());
        }
        let (_, songs) = send_json(&app, request("GET", "/albums/1/songs")).await;
        assert_eq!(songs.as_array().unwrap().len(), 1);

        let (status, created) =
            send_json(&app, json_request("POST", "/albums/1/songs", json!({ "name": "Untracked" })))
                .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["trackNumber"], 0);
    }

    #[tokio::test]
    async fn health_reports_counts() {
        let app = seeded_app();
        let (status, body) = send_json(&app, request("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "status": "ok", "artists": 1, "albums": 1, "songs": 1 })
        );
    }
}
