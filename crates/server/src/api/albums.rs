use axum::{
    extract::State,
    http::{StatusCode, Uri},
    Json,
};
use common::{Album, AlbumId, ArtistId};
use tracing::info;

use crate::body::RequestBody;
use crate::state::{ApiError, ApiResult, AppState, MessageResponse};
use crate::utils::{parse_id, path_segment};

use super::DELETED_MESSAGE;

pub async fn list_artist_albums(
    State(state): State<AppState>,
    uri: Uri,
) -> ApiResult<Json<Vec<Album>>> {
    let artist_id: ArtistId = parse_id(path_segment(&uri))?;
    Ok(Json(state.catalog.list_artist_albums(artist_id)?))
}

pub async fn get_album(
    State(state): State<AppState>,
    uri: Uri,
) -> ApiResult<Json<Album>> {
    let album_id: AlbumId = parse_id(path_segment(&uri))?;
    state
        .catalog
        .get_album(album_id)
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub async fn create_album(
    State(state): State<AppState>,
    uri: Uri,
    body: RequestBody,
) -> ApiResult<(StatusCode, Json<Album>)> {
    let artist_id: ArtistId = parse_id(path_segment(&uri))?;
    let album = state.catalog.create_album(artist_id, body.text("name"))?;
    info!("Created album {} for artist {}", album.album_id, artist_id);
    Ok((StatusCode::CREATED, Json(album)))
}

pub async fn update_album(
    State(state): State<AppState>,
    uri: Uri,
    body: RequestBody,
) -> ApiResult<Json<Album>> {
    let album_id: AlbumId = parse_id(path_segment(&uri))?;
    state
        .catalog
        .rename_album(album_id, body.text("name"))
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub async fn delete_album(
    State(state): State<AppState>,
    uri: Uri,
) -> ApiResult<Json<MessageResponse>> {
    let album_id: AlbumId = parse_id(path_segment(&uri))?;
    state
        .catalog
        .delete_album(album_id)
        .ok_or(ApiError::NotFound)?;
    info!("Deleted album {}", album_id);
    Ok(Json(MessageResponse {
        message: DELETED_MESSAGE,
    }))
}
