//! Stand-in provider server for tests.

use axum::Router;
use serde_json::{Value, json};
use url::Url;

/// Serves `router` on an ephemeral local port and returns its base URL.
pub(crate) async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock provider");
    let addr = listener.local_addr().expect("mock address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Url::parse(&format!("http://{addr}/")).expect("mock url")
}

/// Base URL that refuses connections.
pub(crate) async fn closed_port() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock provider");
    let addr = listener.local_addr().expect("mock provider address");
    drop(listener);
    Url::parse(&format!("http://{addr}/")).expect("closed url")
}

/// Messages API body wrapping `text`.
pub(crate) fn anthropic_reply(text: &str) -> Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn"
    })
}

/// Images API body with one hosted image.
pub(crate) fn openai_image(url: &str) -> Value {
    json!({
        "created": 0,
        "data": [{"url": url, "revised_prompt": "A revised prompt"}]
    })
}

/// Error body in the shape both providers use.
pub(crate) fn provider_error(message: &str) -> Value {
    json!({"type": "error", "error": {"type": "api_error", "message": message}})
}
