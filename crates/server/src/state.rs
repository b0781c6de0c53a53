use catalog::{Catalog, CatalogError, CatalogStats};
use common::Artist;
use serde::Serialize;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
}

impl AppState {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    /// Artist updates report a missing id with their own message.
    InvalidId,
    BadRequest(String),
    Internal(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotFound => write!(f, "not found"),
            ApiError::InvalidId => write!(f, "invalid id"),
            ApiError::BadRequest(message) => write!(f, "bad request: {}", message),
            ApiError::Internal(message) => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ArtistNotFound(_) | CatalogError::AlbumNotFound(_) => ApiError::NotFound,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub stats: CatalogStats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedArtist {
    #[serde(flatten)]
    pub artist: Artist,
    pub last_updated: String,
}
