//! End-to-end tests for r2drop.
//!
//! Each test starts two local servers on `127.0.0.1:0`:
//!
//! - the r2drop gateway (`r2drop-http`) with an in-memory storage gateway
//! - a mock bucket that accepts presigned PUTs only after verifying them
//!   with [`r2drop_auth::verify_presigned`], and stores into the same
//!   in-memory gateway
//!
//! The client library then drives the full flow. Tests that need a real R2
//! bucket are marked `#[ignore]`; run them with:
//!
//! ```text
//! cargo test -p r2drop-integration -- --ignored
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Once};

use bytes::Bytes;
use chrono::Utc;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use r2drop_auth::{SigningEngine, SigningError, verify_presigned};
use r2drop_client::DropClient;
use r2drop_core::{Credential, R2Config};
use r2drop_http::{DropHttpService, DropState};
use r2drop_storage::InMemoryStorageGateway;
use tokio::net::TcpListener;

/// Access key shared by the gateway and the mock bucket.
pub const TEST_ACCESS_KEY: &str = "AKIDEXAMPLE";
/// Secret shared by the gateway and the mock bucket.
pub const TEST_SECRET_KEY: &str = "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY";
/// Bucket served by the mock.
pub const TEST_BUCKET: &str = "examplebucket";

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A PUT the mock bucket accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedPut {
    /// Decoded object key.
    pub key: String,
    /// Body length as received.
    pub size: u64,
    /// `Content-Type` header, if any.
    pub content_type: Option<String>,
    /// `Content-Length` header, if any.
    pub content_length: Option<u64>,
}

/// A running gateway plus mock bucket.
#[derive(Debug)]
pub struct TestStack {
    /// Client pointed at the gateway.
    pub client: DropClient,
    /// Storage shared by the gateway and the mock bucket.
    pub storage: Arc<InMemoryStorageGateway>,
    /// Engine configured exactly like the gateway's.
    pub engine: SigningEngine,
    /// Gateway base URL.
    pub gateway_url: String,
    /// Mock bucket endpoint.
    pub bucket_endpoint: String,
    /// Every PUT the mock bucket accepted, in order.
    pub received: Arc<Mutex<Vec<ReceivedPut>>>,
}

/// Start a mock bucket and a gateway wired to it.
pub async fn start_stack() -> TestStack {
    init_tracing();

    let storage = Arc::new(InMemoryStorageGateway::new());
    let received = Arc::new(Mutex::new(Vec::new()));
    let credential = Credential::new("local", TEST_ACCESS_KEY, TEST_SECRET_KEY, TEST_BUCKET);

    let bucket_addr = spawn_mock_bucket(
        credential.clone(),
        Arc::clone(&storage),
        Arc::clone(&received),
    )
    .await;
    let bucket_endpoint = format!("http://{bucket_addr}");

    let config = R2Config::new(credential).with_endpoint(&bucket_endpoint);
    let engine = SigningEngine::new(&config);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|e| panic!("failed to bind gateway listener: {e}"));
    let gateway_addr = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("gateway listener has no address: {e}"));
    let state = DropState::new(engine.clone(), Arc::clone(&storage) as _);
    tokio::spawn(r2drop_http::serve(
        listener,
        DropHttpService::new(state),
        std::future::pending(),
    ));
    let gateway_url = format!("http://{gateway_addr}");

    TestStack {
        client: DropClient::new(&gateway_url),
        storage,
        engine,
        gateway_url,
        bucket_endpoint,
        received,
    }
}

async fn spawn_mock_bucket(
    credential: Credential,
    storage: Arc<InMemoryStorageGateway>,
    received: Arc<Mutex<Vec<ReceivedPut>>>,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|e| panic!("failed to bind bucket listener: {e}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("bucket listener has no address: {e}"));
    let credential = Arc::new(credential);

    tokio::spawn(async move {
        let http = HttpConnBuilder::new(TokioExecutor::new());
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let credential = Arc::clone(&credential);
            let storage = Arc::clone(&storage);
            let received = Arc::clone(&received);
            let svc = hyper::service::service_fn(move |req| {
                handle_bucket_request(
                    req,
                    Arc::clone(&credential),
                    Arc::clone(&storage),
                    Arc::clone(&received),
                )
            });
            let conn = http.serve_connection(TokioIo::new(stream), svc).into_owned();
            tokio::spawn(async move {
                let _ = conn.await;
            });
        }
    });

    addr
}

async fn handle_bucket_request(
    req: http::Request<Incoming>,
    credential: Arc<Credential>,
    storage: Arc<InMemoryStorageGateway>,
    received: Arc<Mutex<Vec<ReceivedPut>>>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    if parts.method != http::Method::PUT {
        return Ok(s3_error(405, "MethodNotAllowed", "only PUT is supported"));
    }

    if let Err(err) = verify_presigned(&parts, &credential, Utc::now()) {
        let code = match &err {
            SigningError::SignatureDoesNotMatch => "SignatureDoesNotMatch",
            SigningError::RequestExpired => "AccessDenied",
            _ => "AuthorizationQueryParametersError",
        };
        return Ok(s3_error(403, code, &err.to_string()));
    }

    let prefix = format!("/{}/", credential.bucket);
    let Some(raw_key) = parts.uri.path().strip_prefix(&prefix) else {
        return Ok(s3_error(404, "NoSuchBucket", "bucket does not exist"));
    };
    let key = percent_encoding::percent_decode_str(raw_key)
        .decode_utf8_lossy()
        .into_owned();

    let data = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => return Ok(s3_error(400, "IncompleteBody", &e.to_string())),
    };
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
    };

    let size = data.len() as u64;
    storage.put_object(key.clone(), size);
    received
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .push(ReceivedPut {
            key,
            size,
            content_type: header("content-type"),
            content_length: header("content-length").and_then(|v| v.parse().ok()),
        });

    let mut response = http::Response::new(Full::new(Bytes::new()));
    if let Ok(etag) = http::HeaderValue::from_str(&format!("\"{}\"", uuid::Uuid::new_v4())) {
        response.headers_mut().insert("etag", etag);
    }
    Ok(response)
}

fn s3_error(status: u16, code: &str, message: &str) -> http::Response<Full<Bytes>> {
    let body = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <Error><Code>{code}</Code><Message>{message}</Message></Error>"
    );
    let mut response = http::Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() =
        http::StatusCode::from_u16(status).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
    response
}

mod test_listing;
mod test_r2;
mod test_upload;
