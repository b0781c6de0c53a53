use std::str::FromStr;

use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::warn;

use crate::state::{ApiError, ErrorResponse};

pub const NOT_FOUND_MESSAGE: &str = "Endpoint not found";
pub const INVALID_ID_MESSAGE: &str = "Endpoint: not valid id";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => text_response(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
            ApiError::InvalidId => text_response(StatusCode::NOT_FOUND, INVALID_ID_MESSAGE),
            ApiError::BadRequest(message) => json_error_response(StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => {
                warn!("Request failed: {}", message);
                json_error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}

pub fn text_response(status: StatusCode, body: &'static str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

pub fn json_error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Every parameterised route carries its id as the second path segment.
/// The segment is taken as sent, without percent-decoding, so `%31` never
/// names id 1 and undecodable bytes simply name nothing.
pub fn path_segment(uri: &Uri) -> &str {
    uri.path().split('/').nth(2).unwrap_or("")
}

/// Path segments that are not a canonical id cannot name a record.
pub fn parse_id<T: FromStr>(raw: &str) -> Result<T, ApiError> {
    raw.parse::<T>().map_err(|_| ApiError::NotFound)
}

/// Calendar date in the `Sun Oct 18 2026` form.
pub fn date_string(now: OffsetDateTime) -> Result<String, ApiError> {
    now.format(format_description!(
        "[weekday repr:short] [month repr:short] [day] [year]"
    ))
    .map_err(|err| ApiError::Internal(format!("date format error: {}", err)))
}

pub fn timestamp(now: OffsetDateTime) -> Result<String, ApiError> {
    now.format(&Rfc3339)
        .map_err(|err| ApiError::Internal(format!("timestamp format error: {}", err)))
}
