//! Request shapes produced by the endpoint modules.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use marketplace_client::shared::{
    ApiError, BookingStatus, CreateReviewRequest, FavoriteKind, ListParams,
    UpdateBookingStatusRequest,
};
use marketplace_client::{ApiClientConfig, MarketplaceApi};
use parking_lot::Mutex;
use rstest::{fixture, rstest};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
struct Recorded {
    method: Method,
    uri: String,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct Recorder {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Recorder {
    fn last(&self) -> Recorded {
        self.requests.lock().last().cloned().expect("no request recorded")
    }

    fn count(&self) -> usize {
        self.requests.lock().len()
    }
}

async fn record(State(recorder): State<Recorder>, method: Method, uri: Uri, body: String) -> Response {
    let path = uri.path().to_string();
    recorder.requests.lock().push(Recorded {
        method,
        uri: uri.to_string(),
        body: serde_json::from_str(&body).ok(),
    });

    let payload = if path.ends_with("/check") {
        json!({ "success": true, "data": { "isFavorite": true } })
    } else {
        json!({ "success": true })
    };
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

struct Harness {
    api: MarketplaceApi,
    recorder: Recorder,
}

#[fixture]
async fn harness() -> Harness {
    common::init_tracing();
    let recorder = Recorder::default();
    let app = Router::new().fallback(record).with_state(recorder.clone());
    let addr = common::serve(app).await;

    let config = ApiClientConfig::new(format!("http://{addr}/api"))
        .with_token_provider(|| Some("token".to_string()));
    Harness {
        api: MarketplaceApi::new(config).unwrap(),
        recorder,
    }
}

#[rstest]
#[tokio::test]
async fn test_cancel_booking_posts_reason(#[future] harness: Harness) {
    let h = harness.await;
    h.api.bookings().cancel_booking("b 1", Some("sick")).await.unwrap();

    assert_eq!(
        h.recorder.last(),
        Recorded {
            method: Method::POST,
            uri: "/api/bookings/b%201/cancel".to_string(),
            body: Some(json!({ "reason": "sick" })),
        }
    );
}

#[rstest]
#[tokio::test]
async fn test_booking_status_uses_patch_with_canonical_casing(#[future] harness: Harness) {
    let h = harness.await;
    h.api
        .bookings()
        .update_status(
            "7",
            &UpdateBookingStatusRequest {
                status: BookingStatus::InProgress,
                reason: None,
            },
        )
        .await
        .unwrap();

    let last = h.recorder.last();
    assert_eq!(last.method, Method::PATCH);
    assert_eq!(last.uri, "/api/bookings/7/status");
    assert_eq!(last.body.unwrap()["status"], "IN_PROGRESS");
}

#[rstest]
#[tokio::test]
async fn test_default_payment_method_route(#[future] harness: Harness) {
    let h = harness.await;
    h.api.payments().set_default_payment_method("pm_1").await.unwrap();

    let last = h.recorder.last();
    assert_eq!(last.method, Method::PUT);
    assert_eq!(last.uri, "/api/payments/methods/pm_1/default");
}

#[rstest]
#[tokio::test]
async fn test_notification_listing_query(#[future] harness: Harness) {
    let h = harness.await;
    h.api
        .notifications()
        .get_notifications(&ListParams::new(2, 10), true)
        .await
        .unwrap();

    let last = h.recorder.last();
    assert_eq!(last.method, Method::GET);
    assert_eq!(last.uri, "/api/notifications?page=2&limit=10&unreadOnly=true");
    assert_eq!(last.body, None);
}

#[rstest]
#[tokio::test]
async fn test_telegram_login_sends_init_data(#[future] harness: Harness) {
    let h = harness.await;
    h.api.auth().telegram_login("query_id=1&hash=abc").await.unwrap();

    let last = h.recorder.last();
    assert_eq!(last.uri, "/api/auth-enhanced/telegram");
    assert_eq!(last.body, Some(json!({ "initData": "query_id=1&hash=abc" })));
}

#[rstest]
#[tokio::test]
async fn test_favorite_check_unwraps_flag(#[future] harness: Harness) {
    let h = harness.await;
    let favorite = h
        .api
        .favorites()
        .is_favorite(FavoriteKind::Specialist, "s1")
        .await
        .unwrap();

    assert!(favorite);
    assert_eq!(h.recorder.last().uri, "/api/favorites/specialists/s1/check");
}

#[rstest]
#[tokio::test]
async fn test_referral_code_is_normalized(#[future] harness: Harness) {
    let h = harness.await;
    h.api.referral().apply_code("  abc123 ").await.unwrap();

    assert_eq!(h.recorder.last().body, Some(json!({ "code": "ABC123" })));
}

#[rstest]
#[tokio::test]
async fn test_out_of_range_rating_is_rejected_locally(#[future] harness: Harness) {
    let h = harness.await;
    let err = h
        .api
        .reviews()
        .create_review(&CreateReviewRequest {
            booking_id: "b1".to_string(),
            rating: 6,
            comment: None,
            tags: Vec::new(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidRequest(_)));
    assert_eq!(h.recorder.count(), 0);
}
