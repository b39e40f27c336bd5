//! Application routes: session state, playlist generation, and the OAuth
//! callback.
//!
//! Endpoints:
//!
//! - `GET  /session`           — session flags + the stored result, if any
//! - `POST /generate_async`    — run a generation, or request Spotify auth
//! - `GET  /callback`          — Spotify OAuth redirect target
//! - `POST /finish_generation` — resume the generation stored before auth
//! - `GET  /latest_result`     — last stored result, 204 when none
//!
//! Every handler goes through `obtain_session`; locks on the session map
//! are released before any network call.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use setlist_agent::RunResult;
use setlist_catalog::ensure_valid_client;
use tracing::{error, info};

use crate::{SharedState, frontend, with_session_cookie};

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Json<Self> {
        Json(Self {
            error: error.into(),
        })
    }
}

#[derive(Serialize)]
struct SessionResponse {
    connected: bool,
    pending_prompt: String,
    has_result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<RunResult>,
}

#[derive(Serialize)]
struct AuthRequiredResponse {
    need_auth: bool,
    auth_url: String,
}

#[derive(Serialize)]
struct FinishResponse {
    ok: bool,
    result: RunResult,
}

#[derive(Deserialize)]
pub(crate) struct GenerateRequest {
    prompt: String,
}

#[derive(Deserialize)]
pub(crate) struct CallbackQuery {
    #[serde(default)]
    code: Option<String>,
}

/// Session flags for a freshly loaded page. The stored result is taken
/// out of the session when read.
pub(crate) async fn session_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Response {
    let (sid, set_cookie) = state.obtain_session(&headers).await;

    let mut sessions = state.sessions.write().await;
    let session = sessions.entry(sid).or_default();
    let result = session.last_result.take();
    let body = SessionResponse {
        connected: session.tokens.is_some(),
        pending_prompt: session.pending_prompt.clone(),
        has_result: result.is_some(),
        result,
    };
    drop(sessions);

    with_session_cookie(Json(body).into_response(), set_cookie)
}

/// Run a generation for the submitted prompt, or hand back the Spotify
/// authorization URL when the session has no usable tokens.
pub(crate) async fn generate_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<GenerateRequest>,
) -> Response {
    let (sid, set_cookie) = state.obtain_session(&headers).await;

    let prompt = payload.prompt.trim().to_string();
    if prompt.is_empty() {
        return with_session_cookie(
            (StatusCode::BAD_REQUEST, ErrorResponse::new("empty prompt")).into_response(),
            set_cookie,
        );
    }

    info!(prompt_len = prompt.len(), "Generation requested");

    // The prompt is stored before the auth check so it survives the OAuth
    // round trip server-side.
    let mut sessions = state.sessions.write().await;
    let session = sessions.entry(sid.clone()).or_default();
    session.pending_prompt = prompt.clone();
    let mut tokens = session.tokens.clone();
    drop(sessions);

    let client = match ensure_valid_client(&state.auth, &mut tokens).await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Catalog token validation failed");
            return with_session_cookie(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(e.to_string()),
                )
                    .into_response(),
                set_cookie,
            );
        }
    };

    // Persist whatever validation did to the tokens: refreshed or cleared.
    let mut sessions = state.sessions.write().await;
    sessions.entry(sid.clone()).or_default().tokens = tokens;
    drop(sessions);

    let Some(client) = client else {
        let body = Json(AuthRequiredResponse {
            need_auth: true,
            auth_url: state.auth.authorize_url(None),
        });
        return with_session_cookie(
            (StatusCode::UNAUTHORIZED, body).into_response(),
            set_cookie,
        );
    };

    match state.run_for_client(client, &prompt).await {
        Ok(result) => {
            let mut sessions = state.sessions.write().await;
            sessions.entry(sid).or_default().pending_prompt.clear();
            drop(sessions);
            with_session_cookie(Json(result).into_response(), set_cookie)
        }
        Err(e) => {
            error!(error = %e, "Agent run failed");
            with_session_cookie(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(e.to_string()),
                )
                    .into_response(),
                set_cookie,
            )
        }
    }
}

/// Spotify OAuth redirect target. Exchanges the code, stores the tokens in
/// the session, and serves the page that notifies the opener window.
pub(crate) async fn callback_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let (sid, set_cookie) = state.obtain_session(&headers).await;

    let Some(code) = query.code.filter(|code| !code.is_empty()) else {
        return with_session_cookie(
            (StatusCode::BAD_REQUEST, "Missing 'code' from Spotify").into_response(),
            set_cookie,
        );
    };

    let tokens = match state.auth.exchange_code(&code).await {
        Ok(tokens) => tokens,
        Err(e) => {
            error!(error = %e, "Authorization code exchange failed");
            return with_session_cookie(
                (StatusCode::BAD_GATEWAY, "Spotify authorization failed").into_response(),
                set_cookie,
            );
        }
    };

    let mut sessions = state.sessions.write().await;
    sessions.entry(sid).or_default().tokens = Some(tokens);
    drop(sessions);

    info!("Catalog account connected");
    with_session_cookie(Html(frontend::AFTER_AUTH_HTML).into_response(), set_cookie)
}

/// Resume the generation whose prompt was stored before the OAuth round
/// trip. The result is kept in the session for the next page load too.
pub(crate) async fn finish_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Response {
    let (sid, set_cookie) = state.obtain_session(&headers).await;

    let (prompt, mut tokens) = {
        let sessions = state.sessions.read().await;
        match sessions.get(&sid) {
            Some(session) => (
                session.pending_prompt.trim().to_string(),
                session.tokens.clone(),
            ),
            None => (String::new(), None),
        }
    };

    if prompt.is_empty() {
        return with_session_cookie(
            (StatusCode::BAD_REQUEST, ErrorResponse::new("no_prompt")).into_response(),
            set_cookie,
        );
    }

    let client = match ensure_valid_client(&state.auth, &mut tokens).await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Catalog token validation failed");
            return with_session_cookie(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(e.to_string()),
                )
                    .into_response(),
                set_cookie,
            );
        }
    };

    let mut sessions = state.sessions.write().await;
    sessions.entry(sid.clone()).or_default().tokens = tokens;
    drop(sessions);

    let Some(client) = client else {
        return with_session_cookie(
            (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("no_spotify_client"),
            )
                .into_response(),
            set_cookie,
        );
    };

    match state.run_for_client(client, &prompt).await {
        Ok(result) => {
            let mut sessions = state.sessions.write().await;
            let session = sessions.entry(sid).or_default();
            session.pending_prompt.clear();
            session.last_result = Some(result.clone());
            drop(sessions);

            let body = Json(FinishResponse { ok: true, result });
            with_session_cookie(body.into_response(), set_cookie)
        }
        Err(e) => {
            error!(error = %e, "Agent run failed");
            with_session_cookie(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(e.to_string()),
                )
                    .into_response(),
                set_cookie,
            )
        }
    }
}

/// The stored result without consuming it, for clients that lost the
/// generation response. 204 when there is none.
pub(crate) async fn latest_result_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Response {
    let (sid, set_cookie) = state.obtain_session(&headers).await;

    let sessions = state.sessions.read().await;
    let result = sessions.get(&sid).and_then(|s| s.last_result.clone());
    drop(sessions);

    match result {
        Some(result) => with_session_cookie(Json(result).into_response(), set_cookie),
        None => with_session_cookie(StatusCode::NO_CONTENT.into_response(), set_cookie),
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_state;
    use crate::{Session, build_router};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use setlist_agent::{RunResult, RunStatus};
    use tower::ServiceExt;

    fn generate_request(prompt: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate_async")
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"prompt":{}}}"#, serde_json::to_string(prompt).unwrap())))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn session_cookie(response: &axum::response::Response) -> String {
        let raw = response
            .headers()
            .get("set-cookie")
            .expect("missing set-cookie")
            .to_str()
            .unwrap();
        raw.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected() {
        let app = build_router(test_state());

        let response = app.oneshot(generate_request("   ")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = json_body(response).await;
        assert_eq!(json["error"], "empty prompt");
    }

    #[tokio::test]
    async fn unauthenticated_generation_requests_auth() {
        let app = build_router(test_state());

        let response = app.oneshot(generate_request("du jazz pour réviser")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json = json_body(response).await;
        assert_eq!(json["need_auth"], true);
        let auth_url = json["auth_url"].as_str().unwrap();
        assert!(auth_url.starts_with("https://accounts.spotify.com/authorize?"));
        assert!(auth_url.contains("client_id=client-id"));
        assert!(auth_url.contains("callback"));
    }

    #[tokio::test]
    async fn pending_prompt_survives_the_auth_round_trip() {
        let app = build_router(test_state());

        let response = app
            .clone()
            .oneshot(generate_request("du jazz pour réviser"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let cookie = session_cookie(&response);

        let req = Request::builder()
            .uri("/session")
            .header("cookie", &cookie)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["connected"], false);
        assert_eq!(json["pending_prompt"], "du jazz pour réviser");
        assert_eq!(json["has_result"], false);
    }

    #[tokio::test]
    async fn finish_without_a_pending_prompt_is_rejected() {
        let app = build_router(test_state());

        let req = Request::builder()
            .method("POST")
            .uri("/finish_generation")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = json_body(response).await;
        assert_eq!(json["error"], "no_prompt");
    }

    #[tokio::test]
    async fn finish_without_tokens_is_unauthorized() {
        let app = build_router(test_state());

        let response = app
            .clone()
            .oneshot(generate_request("une playlist running"))
            .await
            .unwrap();
        let cookie = session_cookie(&response);

        let req = Request::builder()
            .method("POST")
            .uri("/finish_generation")
            .header("cookie", &cookie)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json = json_body(response).await;
        assert_eq!(json["error"], "no_spotify_client");
    }

    #[tokio::test]
    async fn callback_without_code_is_rejected() {
        let app = build_router(test_state());

        let req = Request::builder()
            .uri("/callback")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Missing 'code' from Spotify");
    }

    #[tokio::test]
    async fn latest_result_is_empty_by_default() {
        let app = build_router(test_state());

        let req = Request::builder()
            .uri("/latest_result")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn session_read_consumes_the_stored_result() {
        let state = test_state();
        state.sessions.write().await.insert(
            "seeded-sid".into(),
            Session {
                last_result: Some(RunResult {
                    summary: "Playlist prête.".into(),
                    playlist_url: "https://open.spotify.com/playlist/p1".into(),
                    playlist_name: "Focus".into(),
                    status: RunStatus::Completed,
                }),
                ..Session::default()
            },
        );
        let app = build_router(state);

        let req = Request::builder()
            .uri("/session")
            .header("cookie", "sid=seeded-sid")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        let json = json_body(response).await;
        assert_eq!(json["has_result"], true);
        assert_eq!(json["result"]["playlist_name"], "Focus");
        assert_eq!(json["result"]["status"], "completed");

        let req = Request::builder()
            .uri("/session")
            .header("cookie", "sid=seeded-sid")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        let json = json_body(response).await;
        assert_eq!(json["has_result"], false);
        assert!(json.get("result").is_none());
    }

    #[tokio::test]
    async fn latest_result_does_not_consume() {
        let state = test_state();
        state.sessions.write().await.insert(
            "seeded-sid".into(),
            Session {
                last_result: Some(RunResult {
                    summary: "Playlist prête.".into(),
                    playlist_url: String::new(),
                    playlist_name: String::new(),
                    status: RunStatus::Completed,
                }),
                ..Session::default()
            },
        );
        let app = build_router(state);

        for _ in 0..2 {
            let req = Request::builder()
                .uri("/latest_result")
                .header("cookie", "sid=seeded-sid")
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let json = json_body(response).await;
            assert_eq!(json["summary"], "Playlist prête.");
        }
    }
}
