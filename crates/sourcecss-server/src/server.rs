//! Sandbox server implementation.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use serde::Deserialize;
use tower_http::services::ServeDir;

use sourcecss_generate::{discover_units, GenerateError, GenerateResult, Generator};

use crate::catalog::Catalog;
use crate::reload::{reload_client_script, ReloadHub, ReloadMessage};
use crate::templates::TemplateEngine;
use crate::watcher::{RecipeWatcher, WatchEvent};

const RELOAD_PATH: &str = "/__reload";
const RELOAD_SCRIPT_PATH: &str = "/__reload.js";

/// Configuration for the sandbox server.
#[derive(Debug, Clone)]
pub struct PlaygroundConfig {
    /// Directory holding component recipes
    pub source_dir: PathBuf,

    /// Directory holding generated stylesheets
    pub dist_dir: PathBuf,

    /// Extra files whose change regenerates everything
    pub watch_files: Vec<PathBuf>,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src"),
            dist_dir: PathBuf::from("dist"),
            watch_files: Vec::new(),
            port: 5173,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address {0}")]
    Address(String),

    #[error("Failed to bind to {0}: {1}")]
    Bind(SocketAddr, String),

    #[error("File watch error: {0}")]
    Watch(String),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Shared server state.
struct ServerState {
    config: PlaygroundConfig,
    hub: ReloadHub,
    templates: TemplateEngine,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<usize>,
}

/// Builds a generator from the project's current configuration.
pub type RebuildGenerator = Arc<dyn Fn() -> Result<Generator, String> + Send + Sync>;

/// Sandbox server previewing generated stylesheets.
pub struct PlaygroundServer {
    config: PlaygroundConfig,
    generator: Arc<Generator>,
    rebuild: Option<RebuildGenerator>,
}

impl PlaygroundServer {
    pub fn new(config: PlaygroundConfig, generator: Arc<Generator>) -> Self {
        Self {
            config,
            generator,
            rebuild: None,
        }
    }

    /// Rebuild the generator before every full regeneration, so edits to
    /// the watched config files take effect.
    pub fn with_rebuild(mut self, rebuild: RebuildGenerator) -> Self {
        self.rebuild = Some(rebuild);
        self
    }

    /// Serve until the process stops, regenerating on recipe changes.
    pub async fn start(self) -> Result<(), ServerError> {
        let address = format!("{}:{}", self.config.host, self.config.port);
        let addr: SocketAddr = address
            .parse()
            .map_err(|_| ServerError::Address(address.clone()))?;

        let state = Arc::new(ServerState {
            config: self.config.clone(),
            hub: ReloadHub::new(),
            templates: TemplateEngine::new()?,
        });

        let (watcher, mut rx) = RecipeWatcher::new(&self.config.source_dir, &self.config.watch_files)
            .map_err(|e| ServerError::Watch(e.to_string()))?;

        // Regenerate one burst at a time so runs never overlap
        let watch_state = Arc::clone(&state);
        let mut regenerator = Regenerator {
            generator: Arc::clone(&self.generator),
            rebuild: self.rebuild.clone(),
        };
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                regenerator.handle(&watch_state.hub, event).await;
            }
            // Keep watcher alive
            drop(watcher);
        });

        let app = router(state);

        tracing::info!("Starting sandbox at http://{}", addr);

        if self.config.open {
            let url = format!("http://{}", addr);
            let _ = open::that(&url);
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Bind(addr, e.to_string()))?;

        Ok(())
    }
}

fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route(RELOAD_PATH, get(ws_handler))
        .route(RELOAD_SCRIPT_PATH, get(reload_script_handler))
        .nest_service("/dist", ServeDir::new(&state.config.dist_dir))
        .with_state(state)
}

/// The generator the watch loop runs, replaced when the project changes.
struct Regenerator {
    generator: Arc<Generator>,
    rebuild: Option<RebuildGenerator>,
}

impl Regenerator {
    /// Regenerate what a burst of changes touched and tell open pages.
    async fn handle(&mut self, hub: &ReloadHub, event: WatchEvent) {
        match &event {
            WatchEvent::Components(names) => {
                tracing::info!("Recipes changed: {}", names.join(", "))
            }
            WatchEvent::All => tracing::info!("Project changed, regenerating everything"),
        }

        if matches!(event, WatchEvent::All) {
            if let Err(message) = self.reload().await {
                tracing::error!("Failed to reload configuration: {}", message);
                hub.send(ReloadMessage::Failed { message });
                return;
            }
        }

        let generator = Arc::clone(&self.generator);
        let outcome = tokio::task::spawn_blocking(move || regenerate(&generator, event)).await;

        match outcome {
            Ok(Ok(results)) if results.is_empty() => {
                tracing::debug!("No generator units affected");
            }
            Ok(Ok(results)) => {
                hub.send(ReloadMessage::Reload {
                    components: results.into_iter().map(|r| r.component).collect(),
                });
            }
            Ok(Err(e)) => {
                tracing::error!("Generation failed: {}", e);
                hub.send(ReloadMessage::Failed {
                    message: e.to_string(),
                });
            }
            Err(e) => {
                tracing::error!("Generation task panicked: {}", e);
                hub.send(ReloadMessage::Failed {
                    message: e.to_string(),
                });
            }
        }
    }

    /// Swap in a freshly built generator. The old one stays on failure.
    async fn reload(&mut self) -> Result<(), String> {
        let Some(rebuild) = self.rebuild.clone() else {
            return Ok(());
        };

        let fresh = tokio::task::spawn_blocking(move || rebuild())
            .await
            .map_err(|e| e.to_string())??;

        if fresh.config().layout != self.generator.config().layout {
            tracing::warn!("Directory layout changed; restart the sandbox to watch and serve it");
        }
        tracing::debug!("Rebuilt generator from configuration");
        self.generator = Arc::new(fresh);
        Ok(())
    }
}

/// Run the units a watch event selects.
///
/// Changed directories without a recipe select nothing.
fn regenerate(generator: &Generator, event: WatchEvent) -> Result<Vec<GenerateResult>, GenerateError> {
    let config = generator.config();
    let units = discover_units(&config.root, &config.layout)?;

    let units: Vec<_> = match event {
        WatchEvent::All => units,
        WatchEvent::Components(names) => units
            .into_iter()
            .filter(|unit| names.contains(&unit.component))
            .collect(),
    };

    generator.run_all(&units)
}

/// Handler for the catalog page.
async fn index_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let catalog = match Catalog::scan(&state.config.dist_dir, "dist") {
        Ok(catalog) => catalog,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read {}: {}", state.config.dist_dir.display(), e),
            )
                .into_response();
        }
    };

    let page = catalog.icon_page(query.page.unwrap_or(0));

    match state
        .templates
        .render_index(&catalog, &page, RELOAD_SCRIPT_PATH)
    {
        Ok(html) => Html(html).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render catalog: {}", e),
        )
            .into_response(),
    }
}

/// Handler for the reload WebSocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Forward reload messages to one page.
async fn handle_ws(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut rx = state.hub.subscribe();

    if !send_message(&mut socket, &ReloadMessage::Connected).await {
        return;
    }

    while let Ok(msg) = rx.recv().await {
        if !send_message(&mut socket, &msg).await {
            break;
        }
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ReloadMessage) -> bool {
    let Ok(json) = serde_json::to_string(msg) else {
        return false;
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

/// Handler for the reload client script.
async fn reload_script_handler() -> impl IntoResponse {
    (
        [("content-type", "application/javascript")],
        reload_client_script(RELOAD_PATH),
    )
}
