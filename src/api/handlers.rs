//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::sse::sse_stream;
use super::types::{ErrorResponse, InfoResponse, MessageRequest, MessageResponse};
use super::AppState;
use crate::registry::{Action, ChatId, ReduceError};
use crate::runtime::{ChatView, HistorySnapshot};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // The page
        .route("/", get(serve_page))
        .route("/assets/*path", get(serve_static))
        // Chat registry
        .route("/api/chats", get(list_chats))
        .route("/api/chats/new", post(create_chat))
        .route("/api/chats/:id", get(get_chat))
        .route("/api/chats/:id/select", post(select_chat))
        .route("/api/chats/:id/delete", post(delete_chat))
        // Exchange
        .route("/api/chats/:id/messages", post(send_message))
        // Live updates
        .route("/api/stream", get(stream))
        // Help panel
        .route("/api/info", get(get_info))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Page
// ============================================================

async fn serve_page() -> impl IntoResponse {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - page not found</h1>".to_string()),
        )
            .into_response(),
    }
}

// ============================================================
// Chat Registry
// ============================================================

async fn list_chats(State(state): State<AppState>) -> Result<Json<HistorySnapshot>, AppError> {
    let dispatched = state.runtime.dispatch(Action::EnsureChat).await?;
    Ok(Json(dispatched.snapshot))
}

async fn create_chat(State(state): State<AppState>) -> Result<Json<HistorySnapshot>, AppError> {
    let dispatched = state.runtime.dispatch(Action::NewChat).await?;
    tracing::info!(chat_id = ?dispatched.snapshot.current_chat, "Created chat");
    Ok(Json(dispatched.snapshot))
}

async fn get_chat(
    State(state): State<AppState>,
    Path(id): Path<ChatId>,
) -> Result<Json<ChatView>, AppError> {
    state
        .runtime
        .chat(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Chat not found: {id}")))
}

async fn select_chat(
    State(state): State<AppState>,
    Path(id): Path<ChatId>,
) -> Result<Json<HistorySnapshot>, AppError> {
    let dispatched = state.runtime.dispatch(Action::SelectChat { id }).await?;
    Ok(Json(dispatched.snapshot))
}

async fn delete_chat(
    State(state): State<AppState>,
    Path(id): Path<ChatId>,
) -> Result<Json<HistorySnapshot>, AppError> {
    let dispatched = state.runtime.dispatch(Action::DeleteChat { id }).await?;
    tracing::info!(chat_id = %id, "Deleted chat");
    Ok(Json(dispatched.snapshot))
}

// ============================================================
// Exchange
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<ChatId>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let exchange = state.runtime.send_message(id, req.text).await?;
    Ok(Json(MessageResponse {
        reply: exchange.reply,
        chat: exchange.chat,
        notice: exchange.notice,
    }))
}

// ============================================================
// Streaming
// ============================================================

async fn stream(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before taking the snapshot so no change is missed in between
    let broadcast_rx = state.runtime.subscribe();
    let snapshot = state.runtime.snapshot().await;
    let startup_notice = state.runtime.startup_notice().map(str::to_string);
    sse_stream(snapshot, startup_notice, broadcast_rx)
}

// ============================================================
// Info
// ============================================================

async fn get_info() -> Json<InfoResponse> {
    Json(InfoResponse::teenbuddy())
}

async fn get_version() -> &'static str {
    concat!("teenbuddy ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
}

impl From<ReduceError> for AppError {
    fn from(e: ReduceError) -> Self {
        match e {
            ReduceError::UnknownChat(_) => AppError::NotFound(e.to_string()),
            ReduceError::EmptyMessage => AppError::BadRequest(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmResponse;
    use crate::reply::{ResponseGenerator, FALLBACK_REPLY};
    use crate::runtime::testing::{MemoryStore, MockLlmService};
    use crate::runtime::ChatRuntime;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct Harness {
        router: Router,
        llm: Arc<MockLlmService>,
        store: Arc<MemoryStore>,
    }

    async fn harness() -> Harness {
        let llm = Arc::new(MockLlmService::new());
        let store = Arc::new(MemoryStore::new());
        let runtime = ChatRuntime::start(store.clone(), ResponseGenerator::new(llm.clone())).await;
        Harness {
            router: create_router(AppState::new(runtime)),
            llm,
            store,
        }
    }

    async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    fn current_chat(snapshot: &Value) -> String {
        snapshot["current_chat"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_list_returns_ensured_chat() {
        let h = harness().await;
        let (status, body) = call(&h.router, "GET", "/api/chats", None).await;

        assert_eq!(status, StatusCode::OK);
        let chats = body["chats"].as_array().unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0]["id"], body["current_chat"]);
        assert_eq!(chats[0]["message_count"], 0);
    }

    #[tokio::test]
    async fn test_new_chat_is_listed_first_and_current() {
        let h = harness().await;
        let (_, before) = call(&h.router, "GET", "/api/chats", None).await;
        let (status, after) = call(&h.router, "POST", "/api/chats/new", None).await;

        assert_eq!(status, StatusCode::OK);
        let chats = after["chats"].as_array().unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0]["id"], after["current_chat"]);
        assert_eq!(chats[1]["id"], before["current_chat"]);
    }

    #[tokio::test]
    async fn test_exchange_round_trip() {
        let h = harness().await;
        h.llm
            .queue_response(LlmResponse::new("user: hi\nassistant: hello"));
        let (_, snapshot) = call(&h.router, "GET", "/api/chats", None).await;
        let id = current_chat(&snapshot);

        let (status, body) = call(
            &h.router,
            "POST",
            &format!("/api/chats/{id}/messages"),
            Some(json!({"text": "hi"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], json!({"role": "assistant", "content": "hello"}));
        assert_eq!(body["chat"]["name"], "hi");
        assert_eq!(
            body["chat"]["messages"],
            json!([
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"},
            ])
        );
        assert!(body.get("notice").is_none());

        let (status, chat) = call(&h.router, "GET", &format!("/api/chats/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(chat["messages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_inference_replies_with_fallback() {
        let h = harness().await;
        let (_, snapshot) = call(&h.router, "GET", "/api/chats", None).await;
        let id = current_chat(&snapshot);

        // Nothing queued, so the mock fails
        let (status, body) = call(
            &h.router,
            "POST",
            &format!("/api/chats/{id}/messages"),
            Some(json!({"text": "hello"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"]["content"], FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_blank_message_is_bad_request() {
        let h = harness().await;
        let (_, snapshot) = call(&h.router, "GET", "/api/chats", None).await;
        let id = current_chat(&snapshot);

        let (status, body) = call(
            &h.router,
            "POST",
            &format!("/api/chats/{id}/messages"),
            Some(json!({"text": "   "})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message is empty");
        assert!(h.llm.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_chat_is_not_found() {
        let h = harness().await;
        let missing = Uuid::new_v4();

        let (status, _) = call(&h.router, "GET", &format!("/api/chats/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&h.router, "POST", &format!("/api/chats/{missing}/select"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(
            &h.router,
            "POST",
            &format!("/api/chats/{missing}/messages"),
            Some(json!({"text": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains(&missing.to_string()));
    }

    #[tokio::test]
    async fn test_delete_unknown_chat_is_noop() {
        let h = harness().await;
        let (_, before) = call(&h.router, "GET", "/api/chats", None).await;
        let saves = h.store.saves().len();

        let (status, after) = call(
            &h.router,
            "POST",
            &format!("/api/chats/{}/delete", Uuid::new_v4()),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(before, after);
        assert_eq!(h.store.saves().len(), saves);
    }

    #[tokio::test]
    async fn test_select_and_delete() {
        let h = harness().await;
        let (_, first) = call(&h.router, "GET", "/api/chats", None).await;
        let first_id = current_chat(&first);
        let (_, second) = call(&h.router, "POST", "/api/chats/new", None).await;
        let second_id = current_chat(&second);

        let (status, selected) =
            call(&h.router, "POST", &format!("/api/chats/{first_id}/select"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(current_chat(&selected), first_id);

        // Deleting a chat that is not current keeps the selection
        let (_, deleted) =
            call(&h.router, "POST", &format!("/api/chats/{second_id}/delete"), None).await;
        assert_eq!(current_chat(&deleted), first_id);
        assert_eq!(deleted["chats"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_info_lists_helplines() {
        let h = harness().await;
        let (status, body) = call(&h.router, "GET", "/api/info", None).await;

        assert_eq!(status, StatusCode::OK);
        let numbers: Vec<&str> = body["helplines"]
            .as_array()
            .unwrap()
            .iter()
            .map(|line| line["number"].as_str().unwrap())
            .collect();
        assert_eq!(numbers, vec!["1098", "112", "1800-599-0019"]);
        assert!(body["contact_email"].as_str().unwrap().contains('@'));
    }

    #[tokio::test]
    async fn test_page_and_version() {
        let h = harness().await;
        let (status, page) = call(&h.router, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(page.as_str().unwrap().contains("TeenBuddy"));

        let (status, version) = call(&h.router, "GET", "/version", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(version.as_str().unwrap().starts_with("teenbuddy "));
    }
}
