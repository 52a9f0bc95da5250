//! Route handlers.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use super::error::ApiResult;
use super::AppState;
use crate::relay::FALLBACK_CONTENT_TYPE;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub url: Option<String>,
}

/// `GET /api/download?url=...`
///
/// Validate, probe, then stream. Everything up to the GET's headers can still
/// fail with a clean status; once the body starts, failures only cut it short.
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Response> {
    let raw = query.url.unwrap_or_default();
    let url = state.relay.validate(&raw)?;
    let probe = state.relay.probe(&url).await?;
    let session = state.relay.open_stream(&url, &probe).await?;

    let mut headers = HeaderMap::new();
    let content_type = HeaderValue::from_str(session.content_type())
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
    headers.insert(header::CONTENT_TYPE, content_type);

    // The filename is sanitized, so this only fails on a bug; fall back rather than 500.
    let disposition = HeaderValue::from_str(&session.content_disposition())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"video\""));
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    if let Some(len) = session.content_length() {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }

    let body = Body::from_stream(session.into_body());
    Ok((StatusCode::OK, headers, body).into_response())
}

/// `GET /api/health`
pub async fn health() -> &'static str {
    "ok"
}
