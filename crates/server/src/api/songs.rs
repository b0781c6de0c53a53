use axum::{
    extract::State,
    http::{StatusCode, Uri},
    Json,
};
use catalog::NewSong;
use common::{parse_canonical, AlbumId, ArtistId, Song, SongId};
use time::OffsetDateTime;
use tracing::info;

use crate::body::RequestBody;
use crate::state::{ApiError, ApiResult, AppState};
use crate::utils::{parse_id, path_segment, timestamp};

pub async fn list_artist_songs(
    State(state): State<AppState>,
    uri: Uri,
) -> ApiResult<Json<Vec<Song>>> {
    let artist_id: ArtistId = parse_id(path_segment(&uri))?;
    Ok(Json(state.catalog.list_artist_songs(artist_id)?))
}

pub async fn list_album_songs(
    State(state): State<AppState>,
    uri: Uri,
) -> ApiResult<Json<Vec<Song>>> {
    let album_id: AlbumId = parse_id(path_segment(&uri))?;
    Ok(Json(state.catalog.list_album_songs(album_id)?))
}

/// A segment that is not a track number matches no song.
pub async fn list_track_number_songs(
    State(state): State<AppState>,
    uri: Uri,
) -> Json<Vec<Song>> {
    let songs = parse_canonical(path_segment(&uri))
        .and_then(|n| u32::try_from(n).ok())
        .map(|n| state.catalog.songs_by_track_number(n))
        .unwrap_or_default();
    Json(songs)
}

pub async fn get_song(
    State(state): State<AppState>,
    uri: Uri,
) -> ApiResult<Json<Song>> {
    let song_id: SongId = parse_id(path_segment(&uri))?;
    state
        .catalog
        .get_song(song_id)
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub async fn create_song(
    State(state): State<AppState>,
    uri: Uri,
    body: RequestBody,
) -> ApiResult<(StatusCode, Json<Song>)> {
    let album_id: AlbumId = parse_id(path_segment(&uri))?;
    let new_song = NewSong {
        name: body.text("name"),
        lyrics: body.text("lyrics"),
        track_number: body.number("trackNumber")?.unwrap_or(0),
    };
    let now = timestamp(OffsetDateTime::now_utc())?;
    let song = state.catalog.create_song(album_id, new_song, &now)?;
    info!("Created song {} on album {}", song.song_id, album_id);
    Ok((StatusCode::CREATED, Json(song)))
}
