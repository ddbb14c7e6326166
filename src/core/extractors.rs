//! Axum extractors for list endpoints
//!
//! These extractors turn the raw query string into [`PaginationOptions`]
//! and an optional [`Filter`], so list handlers stay one-liners. [`EntityId`]
//! and [`JsonBody`] wrap axum's `Path` and `Json` so that their rejections
//! are reported as failed requests too.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::core::error::RequestFailure;
use crate::core::query::PaginationOptions;
use crate::core::store::Filter;

/// Errors that can occur during extraction
#[derive(Debug, Clone)]
pub enum ExtractorError {
    InvalidQuery(String),
    InvalidFilter(String),
    InvalidPath(String),
    /// Keeps the status axum chose (400, 415 or 422)
    InvalidBody { status: StatusCode, message: String },
}

impl ExtractorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExtractorError::InvalidBody { status, .. } => *status,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl std::fmt::Display for ExtractorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractorError::InvalidQuery(msg) => write!(f, "Invalid query string: {}", msg),
            ExtractorError::InvalidFilter(msg) => write!(f, "Invalid filter: {}", msg),
            ExtractorError::InvalidPath(msg) => write!(f, "Invalid path parameter: {}", msg),
            ExtractorError::InvalidBody { message, .. } => {
                write!(f, "Invalid request body: {}", message)
            }
        }
    }
}

impl std::error::Error for ExtractorError {}

impl IntoResponse for ExtractorError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let response = (
            self.status_code(),
            Json(serde_json::json!({ "error": message })),
        )
            .into_response();
        RequestFailure::new(message).attach(response)
    }
}

async fn query_pairs<S: Send + Sync>(
    parts: &mut Parts,
    state: &S,
) -> Result<Vec<(String, String)>, ExtractorError> {
    let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
        .await
        .map_err(|e| ExtractorError::InvalidQuery(e.body_text()))?;
    Ok(pairs)
}

/// Extractor for pagination parameters
///
/// # Example
/// ```rust,ignore
/// // GET /items?page=2&limit=10&sort=-created_at
/// pub async fn list_items(Pagination(options): Pagination) -> impl IntoResponse {
///     // options.page == 2, options.limit == 10
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Pagination(pub PaginationOptions);

impl<S: Send + Sync> FromRequestParts<S> for Pagination {
    type Rejection = ExtractorError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pairs = query_pairs(parts, state).await?;
        Ok(Pagination(PaginationOptions::from_query(pairs)))
    }
}

/// Extractor for pagination plus an optional JSON `filter` parameter
///
/// # Format
/// ```text
/// GET /items?filter={"status":"active","age":{"$gte":18}}&page=1&limit=20
/// ```
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filter: Filter,
    pub options: PaginationOptions,
}

impl<S: Send + Sync> FromRequestParts<S> for ListQuery {
    type Rejection = ExtractorError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pairs = query_pairs(parts, state).await?;

        let filter = match pairs.iter().find(|(key, _)| key == "filter") {
            Some((_, raw)) => parse_filter(raw)?,
            None => Filter::new(),
        };

        Ok(ListQuery {
            filter,
            options: PaginationOptions::from_query(pairs),
        })
    }
}

/// Entity id taken from the `{id}` path segment
#[derive(Debug, Clone, Copy)]
pub struct EntityId(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for EntityId {
    type Rejection = ExtractorError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|e| ExtractorError::InvalidPath(e.body_text()))?;
        Ok(EntityId(id))
    }
}

/// JSON request body
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ExtractorError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ExtractorError::InvalidBody {
                status: e.status(),
                message: e.body_text(),
            })?;
        Ok(JsonBody(value))
    }
}

fn parse_filter(raw: &str) -> Result<Filter, ExtractorError> {
    if raw.trim().is_empty() {
        return Ok(Filter::new());
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(filter)) => Ok(filter),
        Ok(_) => Err(ExtractorError::InvalidFilter(
            "expected a JSON object".to_string(),
        )),
        Err(e) => Err(ExtractorError::InvalidFilter(e.to_string())),
    }
}
