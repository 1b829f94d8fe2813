// crates/host/src/server.rs

//! Slash-command HTTP endpoints.

use axum::{
    body::Bytes,
    extract::{rejection::FormRejection, Form, State},
    http::{request::Parts, HeaderValue, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use ooobot_core::parse_command;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::state::AppState;

/// Fields of a Slack slash-command post that the bot reads.
/// Everything else in the form is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SlashCommand {
    pub channel_id: String,
    pub user_id: String,
    pub text: String,
    pub response_url: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

type Rejection = (StatusCode, String);

/// Build the router with all endpoints.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/outofoffice", post(handle_out_request))
        .route("/v1/whosout", post(handle_whos_out_request))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

/// Serve `app` on an already bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `/outofoffice [START [END]]`: record an absence for the calling user.
pub async fn handle_out_request(
    State(state): State<AppState>,
    form: Result<Form<SlashCommand>, FormRejection>,
) -> Result<StatusCode, Rejection> {
    let Form(cmd) = form.map_err(|e| {
        warn!("error parsing form: {}", e);
        (StatusCode::BAD_REQUEST, e.body_text())
    })?;

    if cmd.channel_id.is_empty() || cmd.user_id.is_empty() {
        warn!("slash command without channel_id or user_id");
        return Err((
            StatusCode::BAD_REQUEST,
            "missing channel_id or user_id".to_string(),
        ));
    }

    let range = parse_command(&cmd.text, state.store.today()).map_err(|e| {
        warn!("error parsing text: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    state
        .store
        .add(&cmd.channel_id, &cmd.user_id, &range.start, &range.end)
        .map_err(|e| {
            warn!("error adding out: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        })?;

    let reply = format!(
        "set <@{}> out of office from {} to {}",
        cmd.user_id, range.start, range.end
    );
    state.reply_later(cmd.response_url, reply);

    Ok(StatusCode::OK)
}

/// `/whosout`: acknowledge immediately, reply with the channel digest later.
pub async fn handle_whos_out_request(
    State(state): State<AppState>,
    form: Result<Form<SlashCommand>, FormRejection>,
) -> StatusCode {
    let cmd = match form {
        Ok(Form(cmd)) => cmd,
        Err(e) => {
            warn!("error parsing form: {}", e);
            SlashCommand::default()
        }
    };

    tokio::spawn(async move {
        let now = state.store.now();
        let text = state.store.who_is_out(&cmd.channel_id, &now);
        let text = state.embellish(text).await;
        state.reply(&cmd.response_url, &text).await;
    });

    StatusCode::OK
}

async fn not_found(method: Method, uri: Uri, body: Bytes) -> StatusCode {
    info!(
        "unrouted request: {} {} body={}",
        method,
        uri,
        String::from_utf8_lossy(&body)
    );
    StatusCode::NOT_FOUND
}

/// CORS layer admitting the configured origins.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let patterns = allowed_origins.to_vec();
    CorsLayer::new().allow_origin(AllowOrigin::predicate(
        move |origin: &HeaderValue, _: &Parts| {
            origin
                .to_str()
                .map(|o| origin_allowed(&patterns, o))
                .unwrap_or(false)
        },
    ))
}

/// Entries are exact origins or `*.domain`, which matches any subdomain
/// host of `domain` regardless of scheme and port.
pub fn origin_allowed(patterns: &[String], origin: &str) -> bool {
    let authority = origin.split_once("://").map_or(origin, |(_, rest)| rest);
    let host = authority.split(':').next().unwrap_or(authority);

    patterns.iter().map(|p| p.trim()).any(|pattern| {
        if pattern == "*" {
            return true;
        }
        match pattern.strip_prefix("*.") {
            Some(domain) => host
                .strip_suffix(domain)
                .is_some_and(|sub| sub.len() > 1 && sub.ends_with('.')),
            None => pattern.eq_ignore_ascii_case(origin),
        }
    })
}
