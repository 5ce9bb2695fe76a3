//! HTTP 适配器测试
//!
//! 在本地端口启动 mock 的 OneSignal / PostgREST 服务，验证：
//! - 请求头和请求体
//! - 非 2xx 响应转成错误
//! - PostgREST 查询参数与回写

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use reengage_notifier::reengagement::EligibilityWindow;
use reengage_notifier::{
    ChatOrder, DispatchError, OneSignalClient, OneSignalConfig, PostgrestStore, PushNotification,
    PushSender, ReEngagementStore, StoreError,
};

// ============================================================================
// mock 服务
// ============================================================================

#[derive(Default)]
struct Captured {
    headers: Vec<HeaderMap>,
    bodies: Vec<Value>,
    queries: Vec<HashMap<String, String>>,
}

#[derive(Clone)]
struct MockState {
    captured: Arc<Mutex<Captured>>,
    status: StatusCode,
    reply: Value,
}

impl MockState {
    fn new(status: StatusCode, reply: Value) -> Self {
        Self {
            captured: Arc::new(Mutex::new(Captured::default())),
            status,
            reply,
        }
    }
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn capture_post(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut captured = state.captured.lock().unwrap();
    captured.headers.push(headers);
    captured.bodies.push(body);
    (state.status, Json(state.reply.clone()))
}

async fn capture_get(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let mut captured = state.captured.lock().unwrap();
    captured.headers.push(headers);
    captured.queries.push(query);
    (state.status, Json(state.reply.clone()))
}

async fn capture_patch(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> StatusCode {
    let mut captured = state.captured.lock().unwrap();
    captured.headers.push(headers);
    captured.queries.push(query);
    captured.bodies.push(body);
    if state.status.is_success() {
        StatusCode::NO_CONTENT
    } else {
        state.status
    }
}

fn header<'a>(headers: &'a HeaderMap, key: &str) -> &'a str {
    headers.get(key).and_then(|v| v.to_str().ok()).unwrap_or("")
}

// ============================================================================
// OneSignal
// ============================================================================

mod onesignal_tests {
    use super::*;

    async fn client_for(state: MockState) -> OneSignalClient {
        let base = spawn(
            Router::new()
                .route("/api/v1/notifications", post(capture_post))
                .with_state(state),
        )
        .await;

        OneSignalClient::new(OneSignalConfig {
            app_id: "app-1".to_string(),
            api_key: "rest-key".to_string(),
            api_url: format!("{}/api/v1/notifications", base),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn notification() -> PushNotification {
        PushNotification::re_engagement("u-1", "We miss you!", "Aria is waiting for you!", "c-1", "Aria")
    }

    #[tokio::test]
    async fn test_send_success() {
        let state = MockState::new(StatusCode::OK, json!({"id": "n-42", "recipients": 3}));
        let client = client_for(state.clone()).await;

        let ack = client.send(&notification()).await.unwrap();
        assert_eq!(ack.id.as_deref(), Some("n-42"));
        assert_eq!(ack.recipients, Some(3));

        let captured = state.captured.lock().unwrap();
        assert_eq!(header(&captured.headers[0], "authorization"), "Basic rest-key");
        assert_eq!(
            captured.bodies[0],
            json!({
                "app_id": "app-1",
                "include_external_user_ids": ["u-1"],
                "contents": {"en": "Aria is waiting for you!"},
                "headings": {"en": "We miss you!"},
                "data": {"type": "re_engagement", "chat_id": "c-1", "chat_name": "Aria"}
            })
        );
    }

    #[tokio::test]
    async fn test_send_non_success_status() {
        let state = MockState::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"errors": ["Internal Server Error"]}),
        );
        let client = client_for(state).await;

        let err = client.send(&notification()).await.unwrap_err();
        match &err {
            DispatchError::Status { status, body } => {
                assert_eq!(*status, 500);
                assert!(body.contains("Internal Server Error"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().starts_with("OneSignal API error: 500"));
    }

    #[tokio::test]
    async fn test_send_transport_error() {
        let client = OneSignalClient::new(OneSignalConfig {
            app_id: "app-1".to_string(),
            api_key: "rest-key".to_string(),
            // 保留端口，无服务监听
            api_url: "http://127.0.0.1:9/api/v1/notifications".to_string(),
            timeout_secs: 2,
        })
        .unwrap();

        let err = client.send(&notification()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Transport(_)));
    }
}

// ============================================================================
// PostgREST
// ============================================================================

mod postgrest_tests {
    use super::*;

    async fn store_for(state: MockState) -> PostgrestStore {
        let base = spawn(
            Router::new()
                .route(
                    "/rest/v1/user_profiles",
                    get(capture_get).patch(capture_patch),
                )
                .route("/rest/v1/chats", get(capture_get))
                .with_state(state),
        )
        .await;
        PostgrestStore::new(&base, "service-key", 5).unwrap()
    }

    #[tokio::test]
    async fn test_select_eligible_users() {
        let state = MockState::new(
            StatusCode::OK,
            json!([{
                "id": "u-1",
                "last_app_activity": "2026-01-01T00:00:00+00:00",
                "last_re_engagement_sent": null,
                "re_engagement_enabled": true
            }]),
        );
        let store = store_for(state.clone()).await;
        let window = EligibilityWindow::new(Utc::now(), Duration::days(7), Duration::days(7));

        let users = store.select_eligible_users(&window).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "u-1");

        let captured = state.captured.lock().unwrap();
        assert_eq!(header(&captured.headers[0], "apikey"), "service-key");
        assert_eq!(
            header(&captured.headers[0], "authorization"),
            "Bearer service-key"
        );
        let query = &captured.queries[0];
        assert_eq!(query["re_engagement_enabled"], "eq.true");
        assert!(query["last_app_activity"].starts_with("lt."));
        assert!(query["or"].starts_with("(last_re_engagement_sent.is.null,"));
    }

    #[tokio::test]
    async fn test_select_chats() {
        let state = MockState::new(
            StatusCode::OK,
            json!([{
                "id": "c-1",
                "user_id": "u-1",
                "name": "Aria",
                "last_message_time": "2026-01-05T10:00:00+00:00",
                "created_at": "2025-12-01T10:00:00+00:00"
            }]),
        );
        let store = store_for(state.clone()).await;

        let chats = store
            .select_chats_by_user("u-1", ChatOrder::LastMessageTime, 1)
            .await
            .unwrap();
        assert_eq!(chats[0].name, "Aria");
        assert!(chats[0].last_message_time.is_some());

        let captured = state.captured.lock().unwrap();
        let query = &captured.queries[0];
        assert_eq!(query["user_id"], "eq.u-1");
        assert_eq!(query["order"], "last_message_time.desc.nullslast,id.asc");
        assert_eq!(query["limit"], "1");
    }

    #[tokio::test]
    async fn test_update_last_sent() {
        let state = MockState::new(StatusCode::OK, Value::Null);
        let store = store_for(state.clone()).await;

        store
            .update_last_re_engagement_sent("u-1", Utc::now())
            .await
            .unwrap();

        let captured = state.captured.lock().unwrap();
        assert_eq!(captured.queries[0]["id"], "eq.u-1");
        assert!(captured.bodies[0]["last_re_engagement_sent"].is_string());
    }

    #[tokio::test]
    async fn test_error_status() {
        let state = MockState::new(
            StatusCode::UNAUTHORIZED,
            json!({"message": "Invalid API key"}),
        );
        let store = store_for(state).await;
        let window = EligibilityWindow::new(Utc::now(), Duration::days(7), Duration::days(7));

        let err = store.select_eligible_users(&window).await.unwrap_err();
        match err {
            StoreError::Status { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_decode_error() {
        let state = MockState::new(StatusCode::OK, json!({"not": "a list"}));
        let store = store_for(state).await;

        let err = store
            .select_chats_by_user("u-1", ChatOrder::CreatedAt, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }
}
