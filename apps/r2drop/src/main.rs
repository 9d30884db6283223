//! r2drop - command-line client.
//!
//! ```text
//! r2drop --server http://localhost:8788 upload ./photo.png
//! r2drop list
//! r2drop delete photo.png
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use r2drop_client::{DEFAULT_CHUNK_SIZE, DropClient, ProgressTick, format_bytes, render_table};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// r2drop - upload files straight to a bucket through presigned URLs
#[derive(Parser, Debug)]
#[command(name = "r2drop")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the r2drop server
    #[arg(
        long,
        global = true,
        env = "R2DROP_SERVER",
        default_value = "http://127.0.0.1:8788"
    )]
    server: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a local file
    Upload {
        /// File to upload
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Object key (defaults to the file name)
        #[arg(long)]
        name: Option<String>,

        /// Content-Type sent with the upload
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,

        /// Bytes per progress step
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },

    /// List bucket contents
    List {
        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete an object
    Delete {
        /// Object key
        #[arg(value_name = "KEY")]
        key: String,
    },
}

/// Initialize the tracing subscriber, writing to stderr.
fn init_tracing(debug: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The object key for `path`: `name` if given, otherwise the file name.
fn object_name(path: &Path, name: Option<String>) -> Result<String> {
    if let Some(name) = name {
        return Ok(name);
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("cannot derive an object name from {}", path.display()))
}

/// One progress line, e.g. `[ 42%] 1.5 MB / 3.57 MB`.
fn progress_line(tick: &ProgressTick) -> String {
    format!(
        "[{:>3}%] {} / {}",
        tick.percent(),
        format_bytes(tick.sent, 2),
        format_bytes(tick.total, 2)
    )
}

async fn upload(
    client: &DropClient,
    path: &Path,
    name: Option<String>,
    content_type: &str,
    chunk_size: usize,
) -> Result<()> {
    let name = object_name(path, name)?;
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    debug!(path = %path.display(), size = data.len(), "Read file");

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        let mut stderr = std::io::stderr();
        while let Some(tick) = rx.recv().await {
            let _ = write!(stderr, "\r{}", progress_line(&tick));
            let _ = stderr.flush();
        }
        let _ = writeln!(stderr);
    });

    let result = client
        .upload(&name, content_type, Bytes::from(data), chunk_size, Some(tx))
        .await;
    // The sender was moved into the upload and is dropped by now.
    printer.await.ok();

    let outcome = result.with_context(|| format!("upload of {name} failed"))?;
    println!(
        "Uploaded {} ({}) -> {}",
        outcome.key,
        format_bytes(outcome.size, 2),
        outcome.object_url
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let client = DropClient::new(&cli.server);

    match cli.command {
        Commands::Upload {
            path,
            name,
            content_type,
            chunk_size,
        } => upload(&client, &path, name, &content_type, chunk_size).await?,
        Commands::List { json } => {
            let entries = client.list_files().await.context("listing failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print!("{}", render_table(&entries));
            }
        }
        Commands::Delete { key } => {
            client
                .delete_file(&key)
                .await
                .with_context(|| format!("delete of {key} failed"))?;
            println!("Deleted {key}");
        }
    }

    Ok(())
}
