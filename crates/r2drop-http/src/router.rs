//! Request router.
//!
//! r2drop exposes a handful of fixed paths, so routing is an exact match on
//! the path followed by a method check:
//!
//! ```text
//! GET    /generateUploadUrl?name=<key>[&expires=<secs>]
//! GET    /listFiles
//! DELETE /deleteFile?key=<key>
//! GET    /health | /_health
//! OPTIONS *
//! ```

use std::fmt;

use http::Method;

use crate::error::ApiError;

/// A resolved endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Issue a presigned PUT URL.
    GenerateUploadUrl,
    /// List bucket contents.
    ListFiles,
    /// Delete one object.
    DeleteFile,
    /// Liveness probe.
    Health,
    /// CORS preflight.
    Preflight,
}

impl Route {
    /// The route's name as used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GenerateUploadUrl => "GenerateUploadUrl",
            Self::ListFiles => "ListFiles",
            Self::DeleteFile => "DeleteFile",
            Self::Health => "Health",
            Self::Preflight => "Preflight",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a route from the request method and path.
///
/// Unknown paths yield `404`; a known path with the wrong method yields `405`.
/// `OPTIONS` on any path is a preflight.
pub fn resolve_route(method: &Method, path: &str) -> Result<Route, ApiError> {
    if *method == Method::OPTIONS {
        return Ok(Route::Preflight);
    }

    let (route, allowed) = match path {
        "/generateUploadUrl" => (Route::GenerateUploadUrl, Method::GET),
        "/listFiles" => (Route::ListFiles, Method::GET),
        "/deleteFile" => (Route::DeleteFile, Method::DELETE),
        "/health" | "/_health" => (Route::Health, Method::GET),
        _ => return Err(ApiError::not_found(path)),
    };

    if *method == allowed {
        Ok(route)
    } else {
        Err(ApiError::method_not_allowed(method, path))
    }
}

/// Look up a form-urlencoded query parameter by name, decoded.
///
/// The first occurrence wins.
#[must_use]
pub fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}
