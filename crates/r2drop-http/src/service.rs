//! r2drop HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use r2drop_auth::SigningEngine;
use r2drop_storage::StorageGateway;
use tracing::{debug, error, warn};

use crate::body::DropResponseBody;
use crate::dispatch::dispatch_route;
use crate::response::error_to_response;
use crate::router::resolve_route;

/// Shared, read-only state behind every request.
#[derive(Debug, Clone)]
pub struct DropState {
    /// Presigned URL generator.
    pub engine: Arc<SigningEngine>,
    /// List/delete backend.
    pub storage: Arc<dyn StorageGateway>,
}

impl DropState {
    /// Bundle an engine and a storage gateway.
    pub fn new(engine: SigningEngine, storage: Arc<dyn StorageGateway>) -> Self {
        Self {
            engine: Arc::new(engine),
            storage,
        }
    }
}

/// Hyper `Service` implementation for r2drop.
///
/// Request bodies are never read: every endpoint takes its input from the
/// query string.
#[derive(Debug, Clone)]
pub struct DropHttpService {
    state: Arc<DropState>,
}

impl DropHttpService {
    /// Create a new `DropHttpService`.
    #[must_use]
    pub fn new(state: DropState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }
}

impl<B> hyper::service::Service<http::Request<B>> for DropHttpService
where
    B: Send + 'static,
{
    type Response = http::Response<DropResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let state = Arc::clone(&self.state);
        let request_id = uuid::Uuid::new_v4().to_string();
        let (parts, _body) = req.into_parts();

        Box::pin(async move {
            let response = process_request(&parts, &state).await;
            debug!(
                request_id = %request_id,
                method = %parts.method,
                path = %parts.uri.path(),
                status = response.status().as_u16(),
                "Handled request"
            );
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Route and dispatch one request, converting failures into error responses.
async fn process_request(
    parts: &http::request::Parts,
    state: &DropState,
) -> http::Response<DropResponseBody> {
    let result = match resolve_route(&parts.method, parts.uri.path()) {
        Ok(route) => dispatch_route(route, parts, state).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(response) => response,
        Err(err) => {
            if err.status.is_server_error() {
                error!(status = err.status.as_u16(), error = %err, "Request failed");
            } else {
                warn!(status = err.status.as_u16(), error = %err, "Request rejected");
            }
            error_to_response(&err)
        }
    }
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<DropResponseBody>,
    request_id: &str,
) -> http::Response<DropResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", hv);
    }

    headers.insert("server", http::HeaderValue::from_static("r2drop"));

    // CORS headers.
    headers.insert(
        "access-control-allow-origin",
        http::HeaderValue::from_static("*"),
    );

    response
}
