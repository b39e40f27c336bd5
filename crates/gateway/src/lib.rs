//! HTTP gateway for Setlist.
//!
//! Serves the embedded web front end and the JSON API that drives it:
//! playlist generation, the Spotify OAuth callback, and session state.
//! Sessions are server-side and in-memory, keyed by a `sid` cookie, so a
//! prompt submitted before the OAuth round trip survives it.
//!
//! Built on Axum.

pub mod frontend;
pub mod routes;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    http::{HeaderMap, HeaderValue, header},
    response::{Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::info;

use setlist_agent::{PlaylistAgent, RunResult};
use setlist_catalog::{SpotifyAuth, SpotifyClient, TokenSet};
use setlist_config::AppConfig;
use setlist_core::catalog::CatalogApi;
use setlist_core::model::ModelClient;
use setlist_providers::OpenAiResponsesClient;

/// Name of the session cookie.
const SESSION_COOKIE: &str = "sid";

/// Maximum number of in-memory sessions before the oldest is evicted.
const MAX_SESSIONS: usize = 10_000;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub auth: SpotifyAuth,
    pub model: Arc<dyn ModelClient>,
    pub sessions: RwLock<HashMap<String, Session>>,
}

pub type SharedState = Arc<GatewayState>;

/// Per-browser state, held server-side and keyed by the `sid` cookie.
pub struct Session {
    /// Catalog tokens, present once the user has connected Spotify
    pub tokens: Option<TokenSet>,

    /// Prompt waiting for the OAuth round trip to complete
    pub pending_prompt: String,

    /// Most recent run result, consumed by the next page load
    pub last_result: Option<RunResult>,

    created_at: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            tokens: None,
            pending_prompt: String::new(),
            last_result: None,
            created_at: Instant::now(),
        }
    }
}

impl GatewayState {
    /// Look up the request's session, minting a fresh one when the cookie
    /// is absent or names an unknown session.
    ///
    /// Returns the session id and, for a fresh session, the `Set-Cookie`
    /// value the response must carry.
    pub(crate) async fn obtain_session(&self, headers: &HeaderMap) -> (String, Option<String>) {
        if let Some(sid) = session_id_from_headers(headers) {
            let sessions = self.sessions.read().await;
            if sessions.contains_key(&sid) {
                return (sid, None);
            }
        }

        let sid = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;

        // Evict the oldest session when at capacity.
        if sessions.len() >= MAX_SESSIONS {
            if let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, session)| session.created_at)
                .map(|(key, _)| key.clone())
            {
                sessions.remove(&oldest);
            }
        }

        sessions.insert(sid.clone(), Session::default());
        drop(sessions);

        let cookie = format!("{SESSION_COOKIE}={sid}; Path=/; HttpOnly; SameSite=Lax");
        (sid, Some(cookie))
    }

    /// Run one playlist generation against an authenticated catalog client.
    ///
    /// The registry is re-bound per request because each session carries
    /// its own catalog identity; the model client is process-wide.
    pub(crate) async fn run_for_client(
        &self,
        client: SpotifyClient,
        prompt: &str,
    ) -> Result<RunResult, setlist_core::error::Error> {
        let catalog: Arc<dyn CatalogApi> = Arc::new(client);
        let registry = setlist_tools::registry_for(catalog).await?;
        let agent = PlaylistAgent::new(
            self.model.clone(),
            self.config.openai.model.clone(),
            Arc::new(registry),
        )
        .with_max_turns(self.config.agent.max_turns);
        agent.run(prompt).await
    }
}

/// Extract the session id from the request's Cookie header.
fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.trim().to_string())
    })
}

/// Attach a freshly minted session cookie to a response.
pub(crate) fn with_session_cookie(mut response: Response, set_cookie: Option<String>) -> Response {
    if let Some(value) = set_cookie {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            response
                .headers_mut()
                .append(header::SET_COOKIE, header_value);
        }
    }
    response
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/session", get(routes::session_handler))
        .route("/generate_async", post(routes::generate_handler))
        .route("/callback", get(routes::callback_handler))
        .route("/finish_generation", post(routes::finish_handler))
        .route("/latest_result", get(routes::latest_result_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let auth = SpotifyAuth::new(
        config.spotify.client_id.clone(),
        config.spotify.client_secret.clone(),
        config.spotify.redirect_uri(),
        config.spotify.scope.clone(),
    );
    let model: Arc<dyn ModelClient> = Arc::new(OpenAiResponsesClient::new(
        "openai",
        config.openai.base_url.clone(),
        config.openai.api_key.clone(),
    ));

    let state = Arc::new(GatewayState {
        config,
        auth,
        model,
        sessions: RwLock::new(HashMap::new()),
    });

    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
