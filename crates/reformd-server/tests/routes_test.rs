//! Router tests driving the waitlist endpoints end to end over an
//! in-memory SurrealDB.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use parking_lot::Mutex;
use reformd_core::error::{ReformdError, ReformdResult};
use reformd_core::notifier::{Delivery, Notifier, OutgoingEmail};
use reformd_db::SurrealSignupRepository;
use reformd_waitlist::{WaitlistConfig, WaitlistService};
use serde_json::{Value, json};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use tower::ServiceExt;

#[derive(Clone, Default)]
struct StubNotifier {
    unconfigured: bool,
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl StubNotifier {
    fn last_token(&self) -> String {
        let sent = self.sent.lock();
        let html = &sent.last().expect("no email sent").html;
        let start = html.find("token=").expect("no token in link") + "token=".len();
        html[start..start + 64].to_string()
    }
}

impl Notifier for StubNotifier {
    async fn send(&self, email: OutgoingEmail) -> ReformdResult<Delivery> {
        if self.unconfigured {
            return Err(ReformdError::NotifierConfig("RESEND_API_KEY is required".into()));
        }
        self.sent.lock().push(email);
        Ok(Delivery::Sent { id: "msg-1".into() })
    }
}

async fn app_with(notifier: StubNotifier) -> Router {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    reformd_db::run_migrations(&db).await.unwrap();

    let config = WaitlistConfig {
        site_url: Some("https://www.getreformd.com".into()),
        ..Default::default()
    };
    let service = WaitlistService::new(SurrealSignupRepository::new(db), notifier, config);
    reformd_server::router(Arc::new(service))
}

fn post_waitlist(body: Value) -> Request<Body> {
    Request::post("/waitlist")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.5")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn health_probe() {
    let app = app_with(StubNotifier::default()).await;

    let response = app.oneshot(get("/waitlist")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "ok": true, "route": "waitlist" })
    );
}

#[tokio::test]
async fn signup_returns_flags() {
    let app = app_with(StubNotifier::default()).await;

    let response = app
        .oneshot(post_waitlist(json!({
            "email": "Ada@Example.com",
            "goal": "sleep",
            "utm_source": "ig",
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "ok": true, "already": false, "email_sent": true, "verified": false })
    );
}

#[tokio::test]
async fn invalid_email_is_400() {
    let app = app_with(StubNotifier::default()).await;

    let response = app
        .oneshot(post_waitlist(json!({ "email": "not-an-email" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "Invalid email address.");
}

#[tokio::test]
async fn malformed_json_is_400() {
    let app = app_with(StubNotifier::default()).await;

    let request = Request::post("/waitlist")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ninth_request_is_429() {
    let app = app_with(StubNotifier::default()).await;

    for i in 0..8 {
        let response = app
            .clone()
            .oneshot(post_waitlist(json!({ "email": format!("u{i}@example.com") })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(post_waitlist(json!({ "email": "u8@example.com" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn malformed_bodies_count_toward_rate_limit() {
    let app = app_with(StubNotifier::default()).await;

    for _ in 0..8 {
        let request = Request::post("/waitlist")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let request = Request::post("/waitlist")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::from(json!({ "email": "ada@example.com" }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn honeypot_looks_like_success() {
    let notifier = StubNotifier::default();
    let app = app_with(notifier.clone()).await;

    let response = app
        .oneshot(post_waitlist(json!({
            "email": "bot@example.com",
            "website": "http://spam.example",
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "ok": true, "already": false, "email_sent": false, "verified": false })
    );
    assert!(notifier.sent.lock().is_empty());
}

#[tokio::test]
async fn missing_mail_config_is_500() {
    let app = app_with(StubNotifier {
        unconfigured: true,
        ..Default::default()
    })
    .await;

    let response = app
        .oneshot(post_waitlist(json!({ "email": "ada@example.com" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn verify_without_token_redirects_missing() {
    let app = app_with(StubNotifier::default()).await;

    let response = app.oneshot(get("/waitlist/verify")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "https://www.getreformd.com/?verified=missing"
    );
}

#[tokio::test]
async fn verify_unknown_token_redirects_invalid() {
    let app = app_with(StubNotifier::default()).await;

    let response = app
        .oneshot(get("/waitlist/verify?token=abcdef"))
        .await
        .unwrap();
    assert_eq!(
        location(&response),
        "https://www.getreformd.com/?verified=invalid"
    );
}

#[tokio::test]
async fn signup_then_verify_twice() {
    let notifier = StubNotifier::default();
    let app = app_with(notifier.clone()).await;

    app.clone()
        .oneshot(post_waitlist(json!({ "email": "ada@example.com" })))
        .await
        .unwrap();
    let uri = format!("/waitlist/verify?token={}", notifier.last_token());

    let first = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(
        location(&first),
        "https://www.getreformd.com/?verified=success"
    );

    let second = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(
        location(&second),
        "https://www.getreformd.com/?verified=already"
    );

    let response = app
        .oneshot(post_waitlist(json!({ "email": "ada@example.com" })))
        .await
        .unwrap();
    assert_eq!(
        json_body(response).await,
        json!({ "ok": true, "already": true, "email_sent": false, "verified": true })
    );
}
