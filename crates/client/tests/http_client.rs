//! Integration tests for the HTTP client against a mock Axum server.

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use marketplace_client::shared::{ApiError, BookingStatus, LoginRequest};
use marketplace_client::{ApiClient, ApiClientConfig, FileUpload, MarketplaceApi, TokenPair};
use parking_lot::Mutex;
use rstest::rstest;
use serde_json::{json, Value};

const FRESH_TOKEN: &str = "fresh-access";

#[derive(Clone, Default)]
struct TestServerState {
    booking_hits: Arc<AtomicUsize>,
    refresh_hits: Arc<AtomicUsize>,
    refresh_fails: Arc<AtomicBool>,
    reject_fresh_token: Arc<AtomicBool>,
    last_authorization: Arc<Mutex<Option<String>>>,
    seen_authorizations: Arc<Mutex<Vec<Option<String>>>>,
    refresh_body: Arc<Mutex<Option<Value>>>,
    upload_content_type: Arc<Mutex<Option<String>>>,
    upload_fields: Arc<Mutex<Vec<String>>>,
    upload_query: Arc<Mutex<HashMap<String, String>>>,
}

fn json_response(status: StatusCode, body: Value) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn whoami(State(state): State<TestServerState>, headers: HeaderMap) -> Response {
    *state.last_authorization.lock() = authorization(&headers);
    json_response(StatusCode::OK, json!({ "success": true, "data": { "ok": true } }))
}

/// Accepts only the token issued by the refresh endpoint.
async fn booking(State(state): State<TestServerState>, headers: HeaderMap) -> Response {
    state.booking_hits.fetch_add(1, Ordering::SeqCst);
    let auth = authorization(&headers);
    state.seen_authorizations.lock().push(auth.clone());

    let fresh = auth.as_deref() == Some(format!("Bearer {FRESH_TOKEN}").as_str());
    if !fresh || state.reject_fresh_token.load(Ordering::SeqCst) {
        return json_response(
            StatusCode::UNAUTHORIZED,
            json!({ "success": false, "error": { "code": "TOKEN_EXPIRED", "message": "Token expired" } }),
        );
    }
    json_response(
        StatusCode::OK,
        json!({ "success": true, "data": { "id": "42", "status": "confirmed" } }),
    )
}

async fn refresh(State(state): State<TestServerState>, body: String) -> Response {
    state.refresh_hits.fetch_add(1, Ordering::SeqCst);
    *state.refresh_body.lock() = serde_json::from_str(&body).ok();

    if state.refresh_fails.load(Ordering::SeqCst) {
        return json_response(
            StatusCode::UNAUTHORIZED,
            json!({ "success": false, "message": "Refresh token revoked" }),
        );
    }
    json_response(
        StatusCode::OK,
        json!({ "success": true, "data": { "accessToken": FRESH_TOKEN, "refreshToken": "rotated-refresh" } }),
    )
}

async fn login() -> Response {
    json_response(
        StatusCode::UNAUTHORIZED,
        json!({ "success": false, "error": { "code": "INVALID_CREDENTIALS", "message": "Invalid email or password" } }),
    )
}

async fn upload(
    State(state): State<TestServerState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    *state.upload_content_type.lock() = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *state.upload_query.lock() = query;
    while let Ok(Some(field)) = multipart.next_field().await {
        if let Some(name) = field.name() {
            state.upload_fields.lock().push(name.to_string());
        }
    }
    json_response(
        StatusCode::OK,
        json!({ "success": true, "data": [{ "id": "f1", "url": "https://cdn.example.com/f1.png" }] }),
    )
}

async fn server_error() -> Response {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "success": false, "message": "Database unavailable" }),
    )
}

async fn soft_failure() -> Response {
    json_response(
        StatusCode::OK,
        json!({ "success": false, "error": { "code": "SLOT_TAKEN", "message": "Slot no longer available" } }),
    )
}

fn create_router(state: TestServerState) -> Router {
    Router::new()
        .route("/api/me", get(whoami))
        .route("/api/bookings/{id}", get(booking))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth-enhanced/login", post(login))
        .route("/api/files/upload", post(upload))
        .route("/api/services/broken", get(server_error))
        .route("/api/bookings/upcoming", get(soft_failure))
        .with_state(state)
}

async fn start_server(state: TestServerState) -> String {
    common::init_tracing();
    let addr = common::serve(create_router(state)).await;
    format!("http://{addr}/api")
}

/// Config with a stale access token and a working refresh token.
fn refreshing_config(
    base_url: &str,
    refreshed: Arc<Mutex<Vec<TokenPair>>>,
    auth_failures: Arc<AtomicUsize>,
) -> ApiClientConfig {
    ApiClientConfig::new(base_url)
        .with_token_provider(|| Some("stale-access".to_string()))
        .with_refresh_token_provider(|| Some("refresh-1".to_string()))
        .on_token_refresh(move |pair| refreshed.lock().push(pair))
        .on_auth_failure(move || {
            auth_failures.fetch_add(1, Ordering::SeqCst);
        })
}

#[rstest]
#[case::with_token(Some("abc"), Some("Bearer abc"))]
#[case::without_token(None, None)]
#[tokio::test]
async fn test_bearer_header_follows_token_provider(
    #[case] token: Option<&'static str>,
    #[case] expected: Option<&'static str>,
) {
    let state = TestServerState::default();
    let base_url = start_server(state.clone()).await;

    let client = ApiClient::new(
        ApiClientConfig::new(&base_url).with_token_provider(move || token.map(str::to_string)),
    )
    .unwrap();
    let data: Value = client.get_data("/me").await.unwrap();

    assert_eq!(data, json!({ "ok": true }));
    assert_eq!(state.last_authorization.lock().as_deref(), expected);
}

#[rstest]
#[tokio::test]
async fn test_login_401_never_refreshes() {
    let state = TestServerState::default();
    let base_url = start_server(state.clone()).await;
    let refreshed = Arc::new(Mutex::new(Vec::new()));
    let auth_failures = Arc::new(AtomicUsize::new(0));

    let api = MarketplaceApi::new(refreshing_config(
        &base_url,
        refreshed.clone(),
        auth_failures.clone(),
    ))
    .unwrap();
    let err = api
        .auth()
        .login(&LoginRequest {
            email: "a@example.com".to_string(),
            password: "wrong".to_string(),
            remember_me: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.user_message(), "Invalid email or password");
    assert_eq!(state.refresh_hits.load(Ordering::SeqCst), 0);
    assert_eq!(auth_failures.load(Ordering::SeqCst), 0);
    assert!(refreshed.lock().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_401_refreshes_once_and_replays() {
    let state = TestServerState::default();
    let base_url = start_server(state.clone()).await;
    let refreshed = Arc::new(Mutex::new(Vec::new()));
    let auth_failures = Arc::new(AtomicUsize::new(0));

    let api = MarketplaceApi::new(refreshing_config(
        &base_url,
        refreshed.clone(),
        auth_failures.clone(),
    ))
    .unwrap();
    let response = api.bookings().get_booking("42").await.unwrap();

    let booking = response.into_data().unwrap();
    assert_eq!(booking.id, "42");
    assert_eq!(booking.status, BookingStatus::Confirmed);

    assert_eq!(state.refresh_hits.load(Ordering::SeqCst), 1);
    assert_eq!(state.booking_hits.load(Ordering::SeqCst), 2);
    assert_eq!(
        *state.seen_authorizations.lock(),
        vec![
            Some("Bearer stale-access".to_string()),
            Some(format!("Bearer {FRESH_TOKEN}")),
        ]
    );
    assert_eq!(
        *state.refresh_body.lock(),
        Some(json!({ "refreshToken": "refresh-1" }))
    );
    assert_eq!(
        *refreshed.lock(),
        vec![TokenPair {
            access_token: FRESH_TOKEN.to_string(),
            refresh_token: "rotated-refresh".to_string(),
        }]
    );
    assert_eq!(auth_failures.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn test_failed_refresh_signals_auth_failure_and_returns_original_error() {
    let state = TestServerState::default();
    state.refresh_fails.store(true, Ordering::SeqCst);
    let base_url = start_server(state.clone()).await;
    let refreshed = Arc::new(Mutex::new(Vec::new()));
    let auth_failures = Arc::new(AtomicUsize::new(0));

    let api = MarketplaceApi::new(refreshing_config(
        &base_url,
        refreshed.clone(),
        auth_failures.clone(),
    ))
    .unwrap();
    let err = api.bookings().get_booking("42").await.unwrap_err();

    match err {
        ApiError::Http {
            status, message, ..
        } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Token expired");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(auth_failures.load(Ordering::SeqCst), 1);
    assert_eq!(state.refresh_hits.load(Ordering::SeqCst), 1);
    assert_eq!(state.booking_hits.load(Ordering::SeqCst), 1);
    assert!(refreshed.lock().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_missing_refresh_token_signals_auth_failure() {
    let state = TestServerState::default();
    let base_url = start_server(state.clone()).await;
    let auth_failures = Arc::new(AtomicUsize::new(0));

    let failures = auth_failures.clone();
    let api = MarketplaceApi::new(
        ApiClientConfig::new(&base_url)
            .with_token_provider(|| Some("stale-access".to_string()))
            .with_refresh_token_provider(|| None)
            .on_token_refresh(|_| {})
            .on_auth_failure(move || {
                failures.fetch_add(1, Ordering::SeqCst);
            }),
    )
    .unwrap();
    let err = api.bookings().get_booking("42").await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.user_message(), "Token expired");
    assert_eq!(auth_failures.load(Ordering::SeqCst), 1);
    assert_eq!(state.refresh_hits.load(Ordering::SeqCst), 0);
    assert_eq!(state.booking_hits.load(Ordering::SeqCst), 1);
}

#[rstest]
#[tokio::test]
async fn test_replayed_401_does_not_refresh_again() {
    let state = TestServerState::default();
    state.reject_fresh_token.store(true, Ordering::SeqCst);
    let base_url = start_server(state.clone()).await;
    let refreshed = Arc::new(Mutex::new(Vec::new()));
    let auth_failures = Arc::new(AtomicUsize::new(0));
    let reported: Arc<Mutex<Vec<(Option<u16>, String)>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = reported.clone();
    let api = MarketplaceApi::new(
        refreshing_config(&base_url, refreshed.clone(), auth_failures.clone())
            .on_error(move |status, message| sink.lock().push((status, message.to_string()))),
    )
    .unwrap();
    let err = api.bookings().get_booking("42").await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(state.refresh_hits.load(Ordering::SeqCst), 1);
    assert_eq!(state.booking_hits.load(Ordering::SeqCst), 2);
    assert_eq!(refreshed.lock().len(), 1);
    assert_eq!(auth_failures.load(Ordering::SeqCst), 0);
    assert_eq!(
        *reported.lock(),
        vec![(Some(401), "Token expired".to_string())]
    );
}

#[rstest]
#[tokio::test]
async fn test_upload_sends_multipart_not_json() {
    let state = TestServerState::default();
    let base_url = start_server(state.clone()).await;

    let api = MarketplaceApi::new(
        ApiClientConfig::new(&base_url).with_token_provider(|| Some("t".to_string())),
    )
    .unwrap();
    let file = FileUpload::new("avatar.png", vec![0x89, 0x50, 0x4e, 0x47]).with_mime_type("image/png");
    let uploaded = api.upload(file, Some("avatar")).await.unwrap().into_data().unwrap();

    assert_eq!(uploaded[0].id, "f1");
    let content_type = state.upload_content_type.lock().clone().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    assert!(!content_type.contains("application/json"));
    assert_eq!(*state.upload_fields.lock(), vec!["files".to_string()]);
    assert_eq!(state.upload_query.lock().get("purpose").map(String::as_str), Some("avatar"));
}

#[rstest]
#[tokio::test]
async fn test_error_callback_receives_status_and_message() {
    let state = TestServerState::default();
    let base_url = start_server(state).await;
    let reported: Arc<Mutex<Vec<(Option<u16>, String)>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = reported.clone();
    let client = ApiClient::new(
        ApiClientConfig::new(&base_url)
            .on_error(move |status, message| sink.lock().push((status, message.to_string()))),
    )
    .unwrap();
    let err = client.get::<Value>("/services/broken").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(
        *reported.lock(),
        vec![(Some(500), "Database unavailable".to_string())]
    );
}

#[rstest]
#[tokio::test]
async fn test_unreachable_server_reports_without_status() {
    common::init_tracing();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let reported: Arc<Mutex<Vec<Option<u16>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = reported.clone();
    let client = ApiClient::new(
        ApiClientConfig::new(format!("http://{addr}/api"))
            .on_error(move |status, _| sink.lock().push(status)),
    )
    .unwrap();
    let err = client.get::<Value>("/me").await.unwrap_err();

    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(*reported.lock(), vec![None]);
}

#[rstest]
#[tokio::test]
async fn test_unsuccessful_envelope_is_an_error_for_data_calls() {
    let state = TestServerState::default();
    let base_url = start_server(state).await;
    let client = ApiClient::new(ApiClientConfig::new(&base_url)).unwrap();

    let envelope = client.get::<Value>("/bookings/upcoming").await.unwrap();
    assert!(!envelope.success);

    let err = client.get_data::<Value>("/bookings/upcoming").await.unwrap_err();
    match err {
        ApiError::Api { code, message } => {
            assert_eq!(code, "SLOT_TAKEN");
            assert_eq!(message, "Slot no longer available");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
