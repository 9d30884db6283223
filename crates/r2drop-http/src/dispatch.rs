//! Route handlers.

use http::{HeaderValue, StatusCode};
use serde::Serialize;
use tracing::{debug, info};

use crate::body::DropResponseBody;
use crate::error::ApiError;
use crate::response::{json_response, no_content, text_response};
use crate::router::{Route, query_param};
use crate::service::DropState;

/// Body of a successful `GET /generateUploadUrl`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    /// The presigned PUT URL.
    pub upload_url: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"running"`.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Dispatch a resolved route to its handler.
pub async fn dispatch_route(
    route: Route,
    parts: &http::request::Parts,
    state: &DropState,
) -> Result<http::Response<DropResponseBody>, ApiError> {
    debug!(route = %route, "dispatching r2drop route");
    let query = parts.uri.query();
    match route {
        Route::GenerateUploadUrl => generate_upload_url(state, query),
        Route::ListFiles => list_files(state).await,
        Route::DeleteFile => delete_file(state, query).await,
        Route::Health => Ok(health()),
        Route::Preflight => Ok(preflight()),
    }
}

/// Issue a presigned PUT URL for `name`.
///
/// The parameter is checked before the engine runs, so a missing name is a
/// `400` even when credentials are also absent.
fn generate_upload_url(
    state: &DropState,
    query: Option<&str>,
) -> Result<http::Response<DropResponseBody>, ApiError> {
    let name = query_param(query, "name")
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing file name parameter."))?;

    let mut request = state.engine.default_request(name);
    if let Some(raw) = query_param(query, "expires") {
        let secs: u64 = raw
            .trim()
            .parse()
            .map_err(|_| ApiError::bad_request(format!("Invalid expires parameter: {raw:?}")))?;
        request = request.with_expiry(secs);
    }

    let url = state.engine.presign(&request)?;
    info!(key = %request.key, expires_in = url.expires_in(), "Issued upload URL");

    Ok(json_response(
        StatusCode::OK,
        &UploadUrlResponse {
            upload_url: url.into_string(),
        },
    ))
}

async fn list_files(state: &DropState) -> Result<http::Response<DropResponseBody>, ApiError> {
    let entries = state.storage.list_objects().await?;
    debug!(count = entries.len(), "Listed files");
    Ok(json_response(StatusCode::OK, &entries))
}

async fn delete_file(
    state: &DropState,
    query: Option<&str>,
) -> Result<http::Response<DropResponseBody>, ApiError> {
    let key = query_param(query, "key")
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing key parameter."))?;

    state.storage.delete_object(&key).await?;
    info!(key = %key, "Deleted file");
    Ok(text_response(StatusCode::OK, "OK"))
}

fn health() -> http::Response<DropResponseBody> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            status: "running",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

fn preflight() -> http::Response<DropResponseBody> {
    let mut response = no_content();
    let headers = response.headers_mut();
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, DELETE, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type"),
    );
    headers.insert("access-control-max-age", HeaderValue::from_static("86400"));
    response
}
