use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::header,
};
use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::debug;

use crate::state::ApiError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

impl BodyKind {
    fn from_content_type(value: &str) -> Self {
        let media_type = value.split(';').next().unwrap_or("").trim();
        if media_type.eq_ignore_ascii_case("application/json") {
            BodyKind::Json
        } else if media_type.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            BodyKind::Form
        } else {
            BodyKind::Other
        }
    }
}

/// Flat field mapping decoded from a JSON or form-urlencoded payload.
/// Anything else decodes to no fields at all.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestBody {
    fields: Map<String, Value>,
}

impl RequestBody {
    pub fn parse(content_type: Option<&str>, bytes: &[u8]) -> Result<Self, ApiError> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        let kind = content_type
            .map(BodyKind::from_content_type)
            .unwrap_or(BodyKind::Other);
        match kind {
            BodyKind::Json => {
                let value: Value = serde_json::from_slice(bytes)
                    .map_err(|err| ApiError::BadRequest(format!("invalid json body: {}", err)))?;
                match value {
                    Value::Object(fields) => Ok(Self { fields }),
                    _ => Ok(Self::default()),
                }
            }
            BodyKind::Form => {
                let mut fields = Map::new();
                for (key, value) in url::form_urlencoded::parse(bytes) {
                    fields.insert(key.into_owned(), Value::String(value.into_owned()));
                }
                Ok(Self { fields })
            }
            BodyKind::Other => Ok(Self::default()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Strings and numbers are text. `null`, booleans, arrays, objects and
    /// absent fields all read as "no value supplied".
    pub fn text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(value) => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Absent or `null` is `Ok(None)`; anything that is not a whole number
    /// in `u32` range is rejected.
    pub fn number(&self, key: &str) -> Result<Option<u32>, ApiError> {
        let parsed = match self.fields.get(key) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Number(value)) => value.as_u64().and_then(|n| u32::try_from(n).ok()),
            Some(Value::String(value)) => value.trim().parse::<u32>().ok(),
            Some(_) => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("{} must be a non-negative integer", key)))
    }
}

#[async_trait]
impl<S> FromRequest<S> for RequestBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|err| ApiError::BadRequest(err.body_text()))?;
        let body = Self::parse(content_type.as_deref(), &bytes)?;
        if !body.is_empty() {
            debug!("Request body: {:?}", body.fields);
        }
        Ok(body)
    }
}
