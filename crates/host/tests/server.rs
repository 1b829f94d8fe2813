//! End-to-end tests for the slash-command endpoints.
//!
//! Each test serves the router on an ephemeral port and talks to it over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    routing::post,
    Json, Router,
};
use chrono::{Days, TimeZone};
use chrono_tz::America::Los_Angeles;
use ooobot_core::{IntervalStore, Passthrough, DATE_FORMAT};
use ooobot_host::{build_router, AppState, DigestWindow, Scheduler, SlackClient};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

async fn spawn_app(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn start_bot() -> (AppState, SocketAddr) {
    let state = AppState::new(
        Arc::new(IntervalStore::default()),
        Arc::new(Passthrough),
        SlackClient::new(None).unwrap(),
    );
    let addr = spawn_app(build_router(state.clone(), &[])).await;
    (state, addr)
}

/// A stand-in for Slack's `response_url` that forwards posted text.
async fn start_response_sink() -> (String, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(4);
    let app = Router::new()
        .route(
            "/hook",
            post(
                |State(tx): State<mpsc::Sender<String>>, Json(body): Json<serde_json::Value>| async move {
                    let text = body["text"].as_str().unwrap_or_default().to_string();
                    tx.send(text).await.unwrap();
                },
            ),
        )
        .with_state(tx);
    let addr = spawn_app(app).await;
    (format!("http://{addr}/hook"), rx)
}

/// A stand-in for the Slack Web API. Records `chat.postMessage` calls and
/// answers `ok: false` for `missing_channel`.
async fn start_fake_slack() -> (String, mpsc::Receiver<(String, Value)>) {
    let (tx, rx) = mpsc::channel(8);
    let app = Router::new()
        .route(
            "/api/chat.postMessage",
            post(
                |State(tx): State<mpsc::Sender<(String, Value)>>,
                 headers: HeaderMap,
                 Json(body): Json<Value>| async move {
                    let auth = headers
                        .get(AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    let found = body["channel"] != "missing_channel";
                    tx.send((auth, body)).await.unwrap();
                    if found {
                        Json(json!({ "ok": true }))
                    } else {
                        Json(json!({ "ok": false, "error": "channel_not_found" }))
                    }
                },
            ),
        )
        .with_state(tx);
    let addr = spawn_app(app).await;
    (format!("http://{addr}/api"), rx)
}

fn slash_command<'a>(text: &'a str, response_url: &'a str) -> Vec<(&'static str, &'a str)> {
    vec![
        ("token", "fake_val"),
        ("team_id", "fake_val"),
        ("channel_id", "test_channel_id"),
        ("channel_name", "test_channel_name"),
        ("user_id", "test_user_id"),
        ("user_name", "test_user"),
        ("command", "/outofoffice"),
        ("text", text),
        ("response_url", response_url),
    ]
}

#[tokio::test]
async fn test_out_request_stores_absence() {
    let (state, addr) = start_bot().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/outofoffice"))
        .form(&slash_command("2020-01-01 2020-01-01", ""))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let noon = Los_Angeles.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap();
    let out = state.store.query(&noon);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].channel, "test_channel_id");
    assert_eq!(out[0].subject, "test_user_id");
    assert_eq!(
        out[0].start,
        Los_Angeles.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(
        out[0].end,
        Los_Angeles.with_ymd_and_hms(2020, 1, 1, 23, 59, 59).unwrap()
    );
}

#[tokio::test]
async fn test_out_request_replies_to_response_url() {
    let (_state, addr) = start_bot().await;
    let (hook, mut replies) = start_response_sink().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/outofoffice"))
        .form(&slash_command("2020-01-01 2020-01-03", &hook))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let reply = tokio::time::timeout(Duration::from_secs(5), replies.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        reply,
        "set <@test_user_id> out of office from 2020-01-01 to 2020-01-03"
    );
}

#[tokio::test]
async fn test_out_request_without_body_is_rejected() {
    let (state, addr) = start_bot().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/outofoffice"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(state.store.is_empty());
}

#[tokio::test]
async fn test_out_request_with_bad_text_is_rejected() {
    let (state, addr) = start_bot().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/v1/outofoffice"))
        .form(&slash_command("not-a-date", ""))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(resp.text().await.unwrap().contains("not-a-date"));

    let resp = client
        .post(format!("http://{addr}/v1/outofoffice"))
        .form(&slash_command("a b c", ""))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "invalid text: a b c");

    assert!(state.store.is_empty());
}

#[tokio::test]
async fn test_whos_out_replies_with_channel_digest() {
    let (state, addr) = start_bot().await;
    let (hook, mut replies) = start_response_sink().await;

    let today = state.store.today();
    let first = today.checked_sub_days(Days::new(1)).unwrap();
    let last = today.checked_add_days(Days::new(1)).unwrap();
    let (first, last) = (
        first.format(DATE_FORMAT).to_string(),
        last.format(DATE_FORMAT).to_string(),
    );
    state
        .store
        .add("test_channel_id", "U1", &first, &last)
        .unwrap();
    state.store.add("other_channel", "U2", &first, &last).unwrap();

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/whosout"))
        .form(&slash_command("", &hook))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let reply = tokio::time::timeout(Duration::from_secs(5), replies.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        reply,
        format!("<@U1> out of the office from {first} to {last}.")
    );
}

#[tokio::test]
async fn test_whos_out_without_body_is_accepted() {
    let (_state, addr) = start_bot().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/whosout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (_state, addr) = start_bot().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/nope"))
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_state, addr) = start_bot().await;

    let body: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_post_message_sends_bearer_token() {
    let (api_base, mut calls) = start_fake_slack().await;
    let slack = SlackClient::with_api_base(Some("xoxb-test".to_string()), &api_base).unwrap();

    slack.post_message("C1", "hello").await.unwrap();

    let (auth, body) = calls.recv().await.unwrap();
    assert_eq!(auth, "Bearer xoxb-test");
    assert_eq!(body, json!({ "channel": "C1", "text": "hello" }));
}

#[tokio::test]
async fn test_post_message_surfaces_slack_error() {
    let (api_base, _calls) = start_fake_slack().await;
    let slack = SlackClient::with_api_base(Some("xoxb-test".to_string()), &api_base).unwrap();

    let err = slack.post_message("missing_channel", "hello").await.unwrap_err();
    assert!(err.to_string().contains("channel_not_found"), "{err:#}");
}

#[tokio::test]
async fn test_post_message_without_token_fails() {
    let (api_base, mut calls) = start_fake_slack().await;
    let slack = SlackClient::with_api_base(None, &api_base).unwrap();

    let err = slack.post_message("C1", "hello").await.unwrap_err();
    assert!(err.to_string().contains("no Slack OAuth token"), "{err:#}");
    assert!(calls.try_recv().is_err());
}

#[tokio::test]
async fn test_send_digests_posts_one_message_per_channel() {
    let (api_base, mut calls) = start_fake_slack().await;
    let store = Arc::new(IntervalStore::default());
    store.add("C1", "A", "2020-01-01", "2020-01-01").unwrap();
    store.add("C1", "B", "2020-01-01", "2020-01-02").unwrap();
    store.add("missing_channel", "M", "2020-01-01", "2020-01-01").unwrap();
    store.add("C2", "C", "2020-01-01", "2020-01-01").unwrap();
    store.add("C3", "D", "2020-01-09", "2020-01-09").unwrap();

    let state = AppState::new(
        store,
        Arc::new(Passthrough),
        SlackClient::with_api_base(Some("xoxb-test".to_string()), &api_base).unwrap(),
    );
    let scheduler = Scheduler::new(state, Duration::from_secs(300), DigestWindow::new(9, 5));

    let now = Los_Angeles.with_ymd_and_hms(2020, 1, 1, 9, 2, 0).unwrap();
    scheduler.send_digests(&now).await;

    let mut posted = Vec::new();
    while let Ok((_, body)) = calls.try_recv() {
        posted.push((
            body["channel"].as_str().unwrap().to_string(),
            body["text"].as_str().unwrap().to_string(),
        ));
    }
    // A failed channel does not stop the others.
    assert_eq!(
        posted,
        [
            (
                "C1".to_string(),
                "<@A> out of the office on 2020-01-01.\n<@B> out of the office from 2020-01-01 to 2020-01-02."
                    .to_string()
            ),
            (
                "C2".to_string(),
                "<@C> out of the office on 2020-01-01.".to_string()
            ),
            (
                "missing_channel".to_string(),
                "<@M> out of the office on 2020-01-01.".to_string()
            ),
        ]
    );
}
