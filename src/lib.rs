pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod files;
pub mod models;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::AppState;
use crate::config::{Cli, SecretConfig};
use crate::database::ClipboardStore;
use crate::files::FileDirectory;

pub use crate::error::{ShareError, StorageError};

/// Load configuration, open both stores and serve HTTP until SIGINT/SIGTERM.
///
/// Any failure before the listener is bound (unreadable `config.json`, bad
/// hash, unusable database or upload directory) is returned to the caller.
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let secret = SecretConfig::load(&cli.config)?;
    let credential = secret.credential()?;
    info!(path = %cli.config.display(), "configuration loaded");

    let db_path = cli.database.clone();
    let clipboard = tokio::task::spawn_blocking(move || ClipboardStore::open(db_path)).await??;

    let files = FileDirectory::new(&cli.uploads, credential);
    files.create_root().await?;
    info!(path = %files.root().display(), "upload directory ready");

    if !cli.web.join("index.html").is_file() {
        warn!(path = %cli.web.display(), "index.html not found, frontend will not be served");
    }

    let state = AppState {
        clipboard,
        files,
        web_root: cli.web.clone(),
        max_upload_bytes: cli.max_upload_bytes(),
    };
    let app = api::router(state);

    let listener = TcpListener::bind(cli.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
