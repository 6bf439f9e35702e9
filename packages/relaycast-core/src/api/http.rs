//! HTTP route handlers.
//!
//! All handlers are thin - they translate the request into a
//! [`RelayRequest`] and render the controller's outcome. Requests run on a
//! spawned task, so a client that disconnects mid-request never interrupts a
//! resolution or a call transition.

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, Method},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::response::{api_success, outcome_response};
use crate::api::AppState;
use crate::error::{RelayError, RelayResult};
use crate::platform::{ChatKind, GroupId};
use crate::protocol_constants::{SECRET_HEADER, SERVICE_ID};
use crate::request::{RelayRequest, RequestContext};
use crate::runtime::TaskSpawner;

// ─────────────────────────────────────────────────────────────────────────────
// Request Types
// ─────────────────────────────────────────────────────────────────────────────

/// Query parameters accepted by every group route.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatQuery {
    /// Kind of chat the command came from; group routes default to supergroup.
    chat_kind: Option<ChatKind>,
}

#[derive(Debug, Deserialize)]
struct PlayBody {
    text: String,
}

/// End-of-track notice body: the source file that finished.
#[derive(Debug, Deserialize)]
struct TrackEndedBody {
    source: PathBuf,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Rejects requests that do not carry the configured shared secret.
fn authorize(state: &AppState, headers: &HeaderMap) -> RelayResult<()> {
    let Some(expected) = state.config.read().api_secret.clone() else {
        return Ok(());
    };

    let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if provided == Some(expected.as_str()) {
        Ok(())
    } else {
        log::warn!("[Server] Rejected request with missing or wrong {}", SECRET_HEADER);
        Err(RelayError::Forbidden(format!(
            "missing or invalid {SECRET_HEADER} header"
        )))
    }
}

fn parse_group_id(raw: &str) -> RelayResult<GroupId> {
    raw.parse()
        .map_err(|_| RelayError::InvalidRequest(format!("invalid group id: {raw:?}")))
}

fn request_context(raw_id: &str, query: &ChatQuery) -> RelayResult<RequestContext> {
    Ok(RequestContext::new(
        parse_group_id(raw_id)?,
        query.chat_kind.unwrap_or(ChatKind::Supergroup),
    ))
}

/// Runs `request` to completion on its own task and renders the outcome.
///
/// The task keeps going if the handler future is dropped.
async fn dispatch(state: &AppState, request: RelayRequest) -> RelayResult<Response> {
    let kind = request.name();
    let controller = Arc::clone(&state.controller);
    let (tx, rx) = oneshot::channel();

    state.spawner.spawn(async move {
        let outcome = controller.handle(request).await;
        if tx.send(outcome).is_err() {
            log::debug!("[Server] Client went away before {} finished", kind);
        }
    });

    let outcome = rx
        .await
        .map_err(|_| RelayError::Internal(format!("{kind} task ended without an outcome")))?;
    Ok(outcome_response(outcome))
}

/// Builds the CORS layer restricted to the trusted origin prefixes.
pub fn cors_layer(trusted_origins: Vec<String>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            let origin_str = origin.to_str().unwrap_or("");
            trusted_origins
                .iter()
                .any(|allowed| origin_str.starts_with(allowed))
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-relay-secret"),
        ])
        .allow_credentials(false)
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Creates the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/help", get(handle_help))
        .route("/api/events", get(event_stream))
        .route("/api/groups/{id}/play", post(handle_play))
        .route("/api/groups/{id}/skip", post(handle_skip))
        .route("/api/groups/{id}/stop", post(handle_stop))
        .route("/api/groups/{id}/status", get(handle_status))
        .route("/api/groups/{id}/queue", get(handle_queue))
        .route("/api/groups/{id}/setup", get(handle_setup))
        .route("/api/groups/{id}/track-ended", post(handle_track_ended))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Liveness check. `HEAD` is answered by the same route with an empty body.
async fn health_check() -> impl IntoResponse {
    api_success(json!({ "ok": true, "service": SERVICE_ID }))
}

async fn handle_help(State(state): State<AppState>, headers: HeaderMap) -> RelayResult<Response> {
    authorize(&state, &headers)?;
    dispatch(&state, RelayRequest::Help).await
}

async fn handle_play(
    Path(id): Path<String>,
    Query(query): Query<ChatQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PlayBody>,
) -> RelayResult<Response> {
    authorize(&state, &headers)?;
    let ctx = request_context(&id, &query)?;
    dispatch(
        &state,
        RelayRequest::Play {
            ctx,
            text: body.text,
        },
    )
    .await
}

async fn handle_skip(
    Path(id): Path<String>,
    Query(query): Query<ChatQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> RelayResult<Response> {
    authorize(&state, &headers)?;
    let ctx = request_context(&id, &query)?;
    dispatch(&state, RelayRequest::Skip { ctx }).await
}

async fn handle_stop(
    Path(id): Path<String>,
    Query(query): Query<ChatQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> RelayResult<Response> {
    authorize(&state, &headers)?;
    let ctx = request_context(&id, &query)?;
    dispatch(&state, RelayRequest::Stop { ctx }).await
}

async fn handle_status(
    Path(id): Path<String>,
    Query(query): Query<ChatQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> RelayResult<Response> {
    authorize(&state, &headers)?;
    let ctx = request_context(&id, &query)?;
    dispatch(&state, RelayRequest::Status { ctx }).await
}

async fn handle_queue(
    Path(id): Path<String>,
    Query(query): Query<ChatQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> RelayResult<Response> {
    authorize(&state, &headers)?;
    let ctx = request_context(&id, &query)?;
    dispatch(&state, RelayRequest::Queue { ctx }).await
}

async fn handle_setup(
    Path(id): Path<String>,
    Query(query): Query<ChatQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> RelayResult<Response> {
    authorize(&state, &headers)?;
    let ctx = request_context(&id, &query)?;
    dispatch(&state, RelayRequest::Setup { ctx }).await
}

/// End-of-track notification from the call layer.
async fn handle_track_ended(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TrackEndedBody>,
) -> RelayResult<Response> {
    authorize(&state, &headers)?;
    let group_id = parse_group_id(&id)?;
    dispatch(
        &state,
        RelayRequest::TrackEnded {
            group_id,
            source: body.source,
        },
    )
    .await
}

/// Server-Sent Events stream of queue and call events.
async fn event_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> RelayResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    authorize(&state, &headers)?;

    let rx = state.event_bridge.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|res| async move {
        match res {
            Ok(event) => match Event::default().json_data(&event) {
                Ok(sse) => Some(Ok(sse)),
                Err(e) => {
                    log::warn!("[Server] Failed to encode event: {}", e);
                    None
                }
            },
            Err(BroadcastStreamRecvError::Lagged(n)) => {
                log::warn!("[Server] Event stream client lagged, skipped {} event(s)", n);
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use parking_lot::RwLock;
    use serde_json::Value;
    use tokio_util::sync::CancellationToken;

    use crate::artifact::Artifact;
    use crate::bootstrap::bootstrap_services_with;
    use crate::platform::test_fixtures::MockPlatform;
    use crate::resolver::{ArtifactResolver, ResolveError, ResolveResult};
    use crate::state::Config;

    struct FileResolver {
        dir: tempfile::TempDir,
    }

    #[async_trait::async_trait]
    impl ArtifactResolver for FileResolver {
        async fn resolve(&self, query: &str) -> ResolveResult<Artifact> {
            if query == "missing" {
                return Err(ResolveError::not_found("no result"));
            }
            if query == "slow" {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            let path = self.dir.path().join(format!("{query}.mp3"));
            std::fs::write(&path, b"ID3").map_err(|e| ResolveError::failed(e.to_string()))?;
            Ok(Artifact::new(path))
        }
    }

    fn app_state(config: Config) -> AppState {
        let platform = Arc::new(MockPlatform::new());
        let resolver = Arc::new(FileResolver {
            dir: tempfile::tempdir().unwrap(),
        });
        let services = bootstrap_services_with(&config, platform, resolver).unwrap();
        AppState::new(&services, Arc::new(RwLock::new(config)))
    }

    /// Serves the router on an ephemeral port and returns its base URL.
    async fn spawn_server(config: Config) -> (String, CancellationToken) {
        let state = app_state(config);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            crate::api::serve(listener, state, token).await.unwrap();
        });
        (format!("http://{addr}"), cancel)
    }

    #[test]
    fn group_ids_must_be_numeric() {
        assert_eq!(parse_group_id("-100123").unwrap(), GroupId(-100123));
        assert!(matches!(
            parse_group_id("abc"),
            Err(RelayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn chat_kind_defaults_to_supergroup() {
        let ctx = request_context("-5", &ChatQuery::default()).unwrap();
        assert_eq!(ctx.chat_kind, ChatKind::Supergroup);

        let ctx = request_context(
            "-5",
            &ChatQuery {
                chat_kind: Some(ChatKind::Private),
            },
        )
        .unwrap();
        assert_eq!(ctx.chat_kind, ChatKind::Private);
    }

    #[tokio::test]
    async fn health_answers_get_and_head() {
        let (base, cancel) = spawn_server(Config::default()).await;
        let client = reqwest::Client::new();

        let body: Value = client
            .get(format!("{base}/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["ok"], true);

        let head = client.head(format!("{base}/health")).send().await.unwrap();
        assert_eq!(head.status(), 200);
        assert!(head.bytes().await.unwrap().is_empty());

        cancel.cancel();
    }

    #[tokio::test]
    async fn play_then_queue_over_http() {
        let (base, cancel) = spawn_server(Config::default()).await;
        let client = reqwest::Client::new();

        let res = client
            .post(format!("{base}/api/groups/-100/play"))
            .json(&json!({ "text": "song" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["code"], "playing");
        assert_eq!(body["data"]["displayName"], "song.mp3");

        let body: Value = client
            .get(format!("{base}/api/groups/-100/queue"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["code"], "queue");
        assert_eq!(body["data"]["entries"][0]["nowPlaying"], true);

        cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn play_completes_after_caller_goes_away() {
        let state = app_state(Config::default());
        let request = RelayRequest::Play {
            ctx: RequestContext::new(GroupId(-100), ChatKind::Supergroup),
            text: "slow".into(),
        };

        // Drop the handler future while the resolution is still running
        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), dispatch(&state, request)).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_secs(1)).await;
        let snap = state.controller.snapshot(GroupId(-100)).await.unwrap();
        assert_eq!(snap.current.unwrap().display_name, "slow.mp3");
    }

    #[tokio::test]
    async fn stale_track_end_over_http_is_ignored() {
        let (base, cancel) = spawn_server(Config::default()).await;
        let client = reqwest::Client::new();

        for text in ["first", "second"] {
            client
                .post(format!("{base}/api/groups/-100/play"))
                .json(&json!({ "text": text }))
                .send()
                .await
                .unwrap();
        }

        let body: Value = client
            .post(format!("{base}/api/groups/-100/track-ended"))
            .json(&json!({ "source": "/elsewhere/second.mp3" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["code"], "ignored");

        let body: Value = client
            .get(format!("{base}/api/groups/-100/queue"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["data"]["entries"][0]["displayName"], "first.mp3");

        cancel.cancel();
    }

    #[tokio::test]
    async fn failures_map_to_http_statuses() {
        let (base, cancel) = spawn_server(Config::default()).await;
        let client = reqwest::Client::new();

        let res = client
            .post(format!("{base}/api/groups/-100/play"))
            .json(&json!({ "text": "missing" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 404);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["code"], "resolution_not_found");

        let res = client
            .post(format!("{base}/api/groups/-100/skip?chatKind=private"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);

        let res = client
            .post(format!("{base}/api/groups/not-a-number/stop"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "invalid_request");

        cancel.cancel();
    }

    #[tokio::test]
    async fn secret_is_enforced_when_configured() {
        let config = Config {
            api_secret: Some("s3cret".into()),
            ..Config::default()
        };
        let (base, cancel) = spawn_server(config).await;
        let client = reqwest::Client::new();

        let res = client.get(format!("{base}/api/help")).send().await.unwrap();
        assert_eq!(res.status(), 403);

        let res = client
            .get(format!("{base}/api/help"))
            .header(SECRET_HEADER, "s3cret")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);

        // Health stays open for uptime monitors
        let res = client.get(format!("{base}/health")).send().await.unwrap();
        assert_eq!(res.status(), 200);

        cancel.cancel();
    }
}
