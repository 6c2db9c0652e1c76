//! Suffix-based request routing.
//!
//! Routes are matched on the end of the request path so the simulator works
//! behind any reverse-proxy prefix (`/openai/v1/models` and `/v1/models` are
//! the same route). The HTTP method is not considered.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::server::openai_api::{self, AppState};

/// Handler selected for a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Completions,
    Models,
    Health,
}

/// Route table, evaluated first-match in order.
pub const ROUTES: &[(&[&str], Route)] = &[
    (&["/v1/chat/completions", "/v1/completions"], Route::Completions),
    (&["/v1/models"], Route::Models),
    (&["/health", "/ready"], Route::Health),
];

/// Select the route for `path`, if any suffix matches.
pub fn resolve(path: &str) -> Option<Route> {
    ROUTES
        .iter()
        .find(|(suffixes, _)| suffixes.iter().any(|suffix| path.ends_with(suffix)))
        .map(|(_, route)| *route)
}

/// Build the axum app. Every request goes through [`dispatch`].
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dispatch(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match resolve(uri.path()) {
        Some(Route::Completions) => {
            openai_api::chat_completions(&state, &headers, &body).into_response()
        }
        Some(Route::Models) => openai_api::list_models(&state, &headers).into_response(),
        Some(Route::Health) => openai_api::health().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::server::auth::API_KEY_HEADER;
    use crate::server::variability::FixedVariability;

    #[test]
    fn test_resolve_suffixes() {
        assert_eq!(resolve("/v1/chat/completions"), Some(Route::Completions));
        assert_eq!(resolve("/v1/completions"), Some(Route::Completions));
        assert_eq!(resolve("/openai/v1/chat/completions"), Some(Route::Completions));
        assert_eq!(resolve("/v1/models"), Some(Route::Models));
        assert_eq!(resolve("/anything/prefix/v1/models"), Some(Route::Models));
        assert_eq!(resolve("/health"), Some(Route::Health));
        assert_eq!(resolve("/api/ready"), Some(Route::Health));
    }

    #[test]
    fn test_resolve_mismatch() {
        assert_eq!(resolve("/v1/modelsX"), None);
        assert_eq!(resolve("/v1/models/"), None);
        assert_eq!(resolve("/"), None);
        assert_eq!(resolve("/v2/chat"), None);
        assert_eq!(resolve(""), None);
    }

    #[test]
    fn test_resolve_precedence() {
        // Only the final segments count.
        assert_eq!(resolve("/health/v1/completions"), Some(Route::Completions));
        assert_eq!(resolve("/v1/models/health"), Some(Route::Health));
    }

    fn test_app() -> Router {
        let config = Arc::new(Config::new("sk-test", "gpt-4-external").unwrap());
        let variability = Arc::new(FixedVariability {
            prompt_tokens: 4,
            completion_tokens: 6,
            reply_index: 0,
        });
        build_router(Arc::new(AppState::with_variability(config, variability)))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    fn post(uri: &str, key: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_unauthenticated() {
        let app = test_app();
        for uri in ["/health", "/ready", "/prefix/health"] {
            let (status, json) = send(&app, get(uri, None)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json, serde_json::json!({"status": "healthy"}));
        }
    }

    #[tokio::test]
    async fn test_chat_completion_ok() {
        let app = test_app();
        let (status, json) = send(
            &app,
            post("/v1/chat/completions", Some("sk-test"), r#"{"model":"foo"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["model"], "foo");
        assert_eq!(json["object"], "chat.completion");
        assert_eq!(json["choices"].as_array().unwrap().len(), 1);
        assert_eq!(json["usage"]["prompt_tokens"], 4);
        assert_eq!(json["usage"]["completion_tokens"], 6);
        assert_eq!(json["usage"]["total_tokens"], 10);
    }

    #[tokio::test]
    async fn test_completion_malformed_body_uses_default_model() {
        let app = test_app();
        let (status, json) = send(&app, post("/v1/completions", Some("sk-test"), "{oops")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["model"], "gpt-4-external");
    }

    #[tokio::test]
    async fn test_protected_routes_require_key() {
        let app = test_app();
        let requests = [
            post("/v1/chat/completions", None, "{}"),
            post("/v1/completions", None, "{}"),
            get("/v1/models", None),
        ];
        for request in requests {
            let (status, json) = send(&app, request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(json["error"]["code"], "missing_api_key");
            assert_eq!(json["error"]["type"], "authentication_error");
        }
    }

    #[tokio::test]
    async fn test_wrong_key_rejected() {
        let app = test_app();
        for key in ["wrong-key", "abc", "sk-test-but-longer"] {
            let (status, json) = send(&app, get("/v1/models", Some(key))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(json["error"]["code"], "invalid_api_key");
            let message = json["error"]["message"].as_str().unwrap();
            assert!(!message.contains(key), "message leaked key: {message}");
        }
    }

    #[tokio::test]
    async fn test_auth_failure_is_stable() {
        let app = test_app();
        let (_, first) = send(&app, get("/v1/models", Some("wrong-key"))).await;
        let (_, second) = send(&app, get("/v1/models", Some("wrong-key"))).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_models_with_prefix() {
        let app = test_app();
        let (status, json) = send(&app, get("/anything/prefix/v1/models", Some("sk-test"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["object"], "list");
        assert_eq!(json["data"][0]["id"], "gpt-4-external");
    }

    #[tokio::test]
    async fn test_unknown_path_not_found() {
        let app = test_app();
        let (status, _) = send(&app, get("/v1/modelsX", Some("sk-test"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, get("/", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
