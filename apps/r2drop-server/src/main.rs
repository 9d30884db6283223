//! r2drop server - issues presigned upload URLs and proxies list/delete.
//!
//! Clients ask this server for a presigned PUT URL and then upload directly
//! to the bucket; file bytes never pass through here.
//!
//! # Usage
//!
//! ```text
//! R2_ACCOUNT_ID=... R2_ACCESS_KEY_ID=... R2_SECRET_ACCESS_KEY=... \
//! R2_BUCKET_NAME=uploads r2drop-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `R2_ACCOUNT_ID` | *(required)* | Account identifier |
//! | `R2_ACCESS_KEY_ID` | *(required)* | Access key ID |
//! | `R2_SECRET_ACCESS_KEY` | *(required)* | Secret access key |
//! | `R2_BUCKET_NAME` | *(required)* | Target bucket |
//! | `R2_ENDPOINT_URL` | `https://<account>.r2.cloudflarestorage.com` | Endpoint override |
//! | `R2_PRESIGN_EXPIRY` | `3600` | Default URL lifetime in seconds |
//! | `GATEWAY_LISTEN` | `0.0.0.0:8788` | Bind address |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use r2drop_auth::SigningEngine;
use r2drop_core::{R2Config, ServerConfig};
use r2drop_http::{DropHttpService, DropState};
use r2drop_storage::S3StorageGateway;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Wire the signing engine and the S3 gateway into the HTTP service state.
fn build_state(config: &R2Config) -> DropState {
    DropState::new(
        SigningEngine::new(config),
        Arc::new(S3StorageGateway::new(config)),
    )
}

/// Perform a health check by connecting to the gateway and requesting the health endpoint.
///
/// Exits with code 0 if healthy, 1 otherwise.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /_health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let server_config = ServerConfig::from_env();

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let addr = server_config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&server_config.log_level)?;

    let config = R2Config::from_env().context("incomplete R2 configuration")?;

    info!(
        gateway_listen = %server_config.gateway_listen,
        bucket = %config.credential.bucket,
        endpoint = %config.endpoint_url(),
        default_expiry_secs = config.default_expiry_secs,
        version = VERSION,
        "starting r2drop server",
    );

    let service = DropHttpService::new(build_state(&config));

    let addr: SocketAddr = server_config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", server_config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };
    r2drop_http::serve(listener, service, shutdown).await;

    Ok(())
}
