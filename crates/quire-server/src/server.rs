//! Development server implementation.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use quire_build::{BuildConfig, BuildReport, SiteBuilder};
use tower_http::services::ServeDir;

use crate::livereload::{
    client_script, script_tag, LiveReloadHub, ReloadMessage, LIVE_RELOAD_PATH,
    LIVE_RELOAD_SCRIPT_PATH,
};
use crate::watcher::FileWatcher;

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Site source directory
    pub source_dir: PathBuf,

    /// Build destination, served as the site root
    pub output_dir: PathBuf,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Inject the live reload script and push reloads after rebuilds
    pub live_reload: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("_site"),
            port: 4000,
            host: "127.0.0.1".to_string(),
            live_reload: false,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),

    #[error("Build failed: {0}")]
    BuildError(String),
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Build configuration used for every (re)build.
    pub fn build_config(&self) -> BuildConfig {
        BuildConfig {
            source_dir: self.config.source_dir.clone(),
            output_dir: self.config.output_dir.clone(),
            live_reload: self.config.live_reload.then(script_tag),
            ..Default::default()
        }
    }

    /// Build the site, then serve it and rebuild on source changes.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                ServerError::InvalidAddress(format!("{}:{}", self.config.host, self.config.port))
            })?;

        let builder = Arc::new(SiteBuilder::new(self.build_config()));
        run_build(Arc::clone(&builder)).await?;

        let hub = LiveReloadHub::new();

        // Output lands inside the watched tree when the destination is nested
        // in the source, so it has to be ignored to avoid rebuild loops.
        let source_dir = canonical(&self.config.source_dir);
        let ignored = vec![canonical(&self.config.output_dir)];
        let (watcher, mut rx) = FileWatcher::new(&source_dir, ignored)
            .map_err(|e| ServerError::WatchError(e.to_string()))?;

        let watch_hub = hub.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                tracing::info!("Changed: {}", event.path().display());
                match run_build(Arc::clone(&builder)).await {
                    Ok(_) => watch_hub.send(ReloadMessage::Reload),
                    Err(e) => tracing::error!("Rebuild failed: {}", e),
                }
            }
            // Keep watcher alive
            drop(watcher);
        });

        let mut app = Router::new();
        if self.config.live_reload {
            app = app
                .route(LIVE_RELOAD_PATH, get(ws_handler))
                .route(LIVE_RELOAD_SCRIPT_PATH, get(script_handler));
        }
        let app = app
            .fallback_service(ServeDir::new(&self.config.output_dir))
            .with_state(hub);

        tracing::info!(
            "Serving {} at http://{}",
            self.config.output_dir.display(),
            addr
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}

/// Run the synchronous build off the async runtime.
async fn run_build(builder: Arc<SiteBuilder>) -> Result<BuildReport, ServerError> {
    tokio::task::spawn_blocking(move || builder.build())
        .await
        .map_err(|e| ServerError::BuildError(e.to_string()))?
        .map_err(|e| ServerError::BuildError(e.to_string()))
}

fn canonical(path: &std::path::Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Handler for the live reload WebSocket endpoint.
async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<LiveReloadHub>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, hub))
}

/// Forward reload messages to one browser until it disconnects.
async fn handle_ws(mut socket: WebSocket, hub: LiveReloadHub) {
    let mut rx = hub.subscribe();

    if send_message(&mut socket, &ReloadMessage::Connected)
        .await
        .is_err()
    {
        return;
    }

    while let Ok(msg) = rx.recv().await {
        if send_message(&mut socket, &msg).await.is_err() {
            break;
        }
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ReloadMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}

/// Handler for the live reload client script.
async fn script_handler() -> impl IntoResponse {
    (
        [("content-type", "application/javascript")],
        client_script(),
    )
}
