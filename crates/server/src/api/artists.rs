use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    Json,
};
use common::{Artist, ArtistId};
use time::OffsetDateTime;
use tracing::info;

use crate::body::RequestBody;
use crate::state::{ApiError, ApiResult, AppState, MessageResponse, UpdatedArtist};
use crate::utils::{date_string, parse_id, path_segment};

use super::DELETED_MESSAGE;

pub async fn list_artists(State(state): State<AppState>) -> Json<BTreeMap<ArtistId, Artist>> {
    Json(state.catalog.list_artists())
}

pub async fn get_artist(
    State(state): State<AppState>,
    uri: Uri,
) -> ApiResult<Json<Artist>> {
    let artist_id: ArtistId = parse_id(path_segment(&uri))?;
    state
        .catalog
        .get_artist(artist_id)
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub async fn create_artist(
    State(state): State<AppState>,
    body: RequestBody,
) -> ApiResult<(StatusCode, Json<Artist>)> {
    let artist = state.catalog.create_artist(body.text("name"))?;
    info!("Created artist {}", artist.artist_id);
    Ok((StatusCode::CREATED, Json(artist)))
}

pub async fn update_artist(
    State(state): State<AppState>,
    uri: Uri,
    body: RequestBody,
) -> ApiResult<Json<UpdatedArtist>> {
    let artist_id: ArtistId = path_segment(&uri)
        .parse()
        .map_err(|_| ApiError::InvalidId)?;
    let artist = state
        .catalog
        .rename_artist(artist_id, body.text("name"))
        .ok_or(ApiError::InvalidId)?;
    let last_updated = date_string(OffsetDateTime::now_utc())?;
    Ok(Json(UpdatedArtist {
        artist,
        last_updated,
    }))
}

pub async fn delete_artist(
    State(state): State<AppState>,
    uri: Uri,
) -> ApiResult<Json<MessageResponse>> {
    let artist_id: ArtistId = parse_id(path_segment(&uri))?;
    state
        .catalog
        .delete_artist(artist_id)
        .ok_or(ApiError::NotFound)?;
    info!("Deleted artist {}", artist_id);
    Ok(Json(MessageResponse {
        message: DELETED_MESSAGE,
    }))
}
