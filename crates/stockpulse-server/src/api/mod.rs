mod price;
mod stocks;
mod updates;
mod worker;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use stockpulse_core::{AppConfig, MatchRules};
use stockpulse_pipeline::QuoteClient;
use stockpulse_store::SnapshotStore;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};
use crate::notify::UpdateNotifier;

/// Shared handler state. Cloning is cheap; the store decides its own sharing
/// semantics.
#[derive(Clone)]
pub struct AppState<S> {
    pub store: S,
    pub config: Arc<AppConfig>,
    pub rules: Arc<MatchRules>,
    pub notifier: UpdateNotifier,
    pub quotes: Arc<QuoteClient>,
    /// Serializes pipeline runs: overlapping triggers queue behind this lock
    /// instead of interleaving their snapshot writes.
    pub run_lock: Arc<tokio::sync::Mutex<()>>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_store_error(request_id: String, error: &stockpulse_store::StoreError) -> ApiError {
    tracing::error!(error = %error, "snapshot store operation failed");
    ApiError::new(request_id, "internal_error", "snapshot store operation failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router<S>(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState<S>>
where
    S: SnapshotStore + Clone + 'static,
{
    Router::new()
        .route("/api/v1/worker", post(worker::trigger_run::<S>))
        .route("/api/v1/notify", post(updates::notify_clients::<S>))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app<S>(state: AppState<S>, auth: AuthState, rate_limit: RateLimitState) -> Router
where
    S: SnapshotStore + Clone + 'static,
{
    // Every read must reflect the latest persisted snapshot.
    let no_store = SetResponseHeaderLayer::overriding(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, max-age=0"),
    );

    let read_routes = Router::new()
        .route("/api/v1/stocks", get(stocks::get_stocks::<S>))
        .route("/api/v1/price", get(price::get_price::<S>))
        .route_layer(no_store);

    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/updates", get(updates::stream_updates::<S>));

    Router::new()
        .merge(public_routes)
        .merge(read_routes)
        .merge(protected_router::<S>(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData { status: "ok" },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}


#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::Utc;
    use tower::ServiceExt;

    use stockpulse_core::{Snapshot, SnapshotStatus, SymbolAggregate};
    use stockpulse_store::{SnapshotStore, SNAPSHOT_KEY};

    use super::test_support::{test_app, test_config, test_state};
    use super::*;

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_unknown_code_maps_to_internal_error() {
        let response = ApiError::new("req-1", "internal_error", "boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let state = test_state(test_config("http://127.0.0.1:9", &["alpha"]));
        let auth = AuthState::from_secret(None, true).expect("auth");
        let app = test_app(state, auth);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["data"]["status"], "ok");
        assert!(json["meta"]["request_id"].is_string());
    }

    #[tokio::test]
    async fn stocks_without_data_returns_placeholder() {
        let state = test_state(test_config("http://127.0.0.1:9", &["alpha"]));
        let auth = AuthState::from_secret(None, true).expect("auth");
        let app = test_app(state, auth);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/stocks")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
            Some("no-store, max-age=0")
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["data"]["stocks"].as_array().map(Vec::len), Some(0));
        assert_eq!(json["data"]["communities_scanned"], 0);
        assert!(json["data"]["message"].is_string());
    }

    #[tokio::test]
    async fn stocks_returns_persisted_snapshot() {
        let state = test_state(test_config("http://127.0.0.1:9", &["alpha"]));
        let mut aggregate = SymbolAggregate::new("AAPL".to_string());
        aggregate.mentions = 4;
        aggregate.positive_mentions = 3;
        aggregate.negative_mentions = 1;
        aggregate.sentiment_score = 2;
        aggregate.ranking_score = 8;
        let snapshot = Snapshot {
            stocks: vec![aggregate],
            generated_at: Utc::now(),
            communities_scanned: 4,
            status: SnapshotStatus::Ok,
        };
        state
            .store
            .set(SNAPSHOT_KEY, &snapshot)
            .await
            .expect("seed snapshot");

        let auth = AuthState::from_secret(None, true).expect("auth");
        let app = test_app(state, auth);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/stocks")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["data"]["stocks"][0]["symbol"], "AAPL");
        assert_eq!(json["data"]["stocks"][0]["ranking_score"], 8);
        assert_eq!(json["data"]["status"], "ok");
        assert!(json["data"]["message"].is_null());
    }

    #[tokio::test]
    async fn worker_without_bearer_is_rejected_and_store_untouched() {
        let state = test_state(test_config("http://127.0.0.1:9", &["alpha"]));
        let store = state.store.clone();
        let auth =
            AuthState::from_secret(Some("test-secret".to_string()), false).expect("auth");
        let app = test_app(state, auth);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/worker")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(
            store.get(SNAPSHOT_KEY).await.expect("get").is_none(),
            "rejected trigger must not write a snapshot"
        );
    }

    #[tokio::test]
    async fn worker_with_wrong_bearer_is_rejected() {
        let state = test_state(test_config("http://127.0.0.1:9", &["alpha"]));
        let auth =
            AuthState::from_secret(Some("test-secret".to_string()), false).expect("auth");
        let app = test_app(state, auth);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/worker")
                    .header(header::AUTHORIZATION, "Bearer wrong")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn notify_without_bearer_is_rejected() {
        let state = test_state(test_config("http://127.0.0.1:9", &["alpha"]));
        let auth =
            AuthState::from_secret(Some("test-secret".to_string()), false).expect("auth");
        let app = test_app(state, auth);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/notify")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn notify_broadcasts_to_subscribers() {
        use futures::StreamExt;

        let state = test_state(test_config("http://127.0.0.1:9", &["alpha"]));
        let notifier = state.notifier.clone();
        let mut subscription = notifier.subscribe();
        // Drain the connected event.
        let _ = subscription.next().await;

        let auth =
            AuthState::from_secret(Some("test-secret".to_string()), false).expect("auth");
        let app = test_app(state, auth);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/notify")
                    .header(header::AUTHORIZATION, "Bearer test-secret")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["data"]["active_connections"], 1);

        assert!(matches!(
            subscription.next().await,
            Some(crate::notify::UpdateEvent::Update { .. })
        ));
    }

    #[tokio::test]
    async fn worker_with_valid_bearer_runs_and_persists() {
        use futures::StreamExt;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let listing = serde_json::json!({
            "kind": "Listing",
            "data": {
                "children": [
                    { "kind": "t3", "data": { "title": "AAPL moon", "selftext": "", "score": 5, "created_utc": 1_700_000_000.0, "subreddit": "alpha", "permalink": "/r/alpha/comments/1", "author": "u1" } },
                    { "kind": "t3", "data": { "title": "AAPL rocket", "selftext": "", "score": 9, "created_utc": 1_700_000_100.0, "subreddit": "alpha", "permalink": "/r/alpha/comments/2", "author": "u2" } }
                ],
                "after": null
            }
        });
        Mock::given(method("GET"))
            .and(path("/r/alpha/new.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing))
            .mount(&server)
            .await;

        let state = test_state(test_config(&server.uri(), &["alpha"]));
        let store = state.store.clone();
        let notifier = state.notifier.clone();
        let mut subscription = notifier.subscribe();
        let _ = subscription.next().await; // connected

        let auth =
            AuthState::from_secret(Some("test-secret".to_string()), false).expect("auth");
        let app = test_app(state, auth);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/worker")
                    .header(header::AUTHORIZATION, "Bearer test-secret")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["stock_count"], 1);
        assert_eq!(json["data"]["notified_clients"], 1);

        let snapshot = store
            .get(SNAPSHOT_KEY)
            .await
            .expect("get")
            .expect("snapshot persisted");
        assert_eq!(snapshot.stocks[0].symbol, "AAPL");
        assert_eq!(snapshot.stocks[0].mentions, 2);

        assert!(matches!(
            subscription.next().await,
            Some(crate::notify::UpdateEvent::Update { .. })
        ));
    }

    #[tokio::test]
    async fn price_without_symbol_is_a_validation_error() {
        let state = test_state(test_config("http://127.0.0.1:9", &["alpha"]));
        let auth = AuthState::from_secret(None, true).expect("auth");
        let app = test_app(state, auth);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/price")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn updates_stream_opens_as_event_stream() {
        let state = test_state(test_config("http://127.0.0.1:9", &["alpha"]));
        let auth = AuthState::from_secret(None, true).expect("auth");
        let app = test_app(state, auth);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/updates")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("text/event-stream")
        );
    }
}
