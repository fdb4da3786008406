use crate::config::AppState;
use anyhow::Result;
use axum::{
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

mod rpc;

/// Start the bridge HTTP server. The state (and with it the live
/// session) must already be constructed: binding only happens once the
/// tool host is ready, so no request can observe an unset session.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("bridge listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the bridge router
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/rpc", post(rpc::dispatch))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness probe; deliberately does not touch the session
async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use finbridge_mcp::{SessionError, ToolHost, ToolSchema};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Fake tool host the dispatcher tests run against
    pub(crate) enum FakeHost {
        /// Lists two tools; echoes calls back as {"called": name, "with": args}
        Healthy,
        /// Rejects every tool name
        UnknownTool,
        /// Fails every call with a host-side internal error
        Failing,
        /// Channel-level failure on every operation
        Disconnected,
    }

    #[async_trait::async_trait]
    impl ToolHost for FakeHost {
        async fn list_tools(&self) -> Result<Vec<ToolSchema>, SessionError> {
            match self {
                Self::Disconnected => Err(SessionError::Closed),
                _ => Ok(vec![
                    ToolSchema {
                        name: "get_stock_info".to_string(),
                        description: "info".to_string(),
                        input_schema: serde_json::json!({"type": "object"}),
                    },
                    ToolSchema {
                        name: "get_yahoo_finance_news".to_string(),
                        description: "news".to_string(),
                        input_schema: serde_json::json!({"type": "object"}),
                    },
                ]),
            }
        }

        async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, SessionError> {
            match self {
                Self::Healthy => Ok(serde_json::json!({
                    "called": name,
                    "with": arguments,
                })),
                Self::UnknownTool => Err(SessionError::Rpc {
                    code: -32601,
                    message: format!("Method not found: tool {}", name),
                }),
                Self::Failing => Err(SessionError::Rpc {
                    code: -32603,
                    message: "tool exploded".to_string(),
                }),
                Self::Disconnected => Err(SessionError::Closed),
            }
        }
    }

    pub(crate) fn router(host: FakeHost) -> Router {
        create_router(AppState::new(Arc::new(host)))
    }

    pub(crate) async fn post_rpc(app: Router, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/rpc")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_healthz_ignores_session_state() {
        // a disconnected host must not affect liveness
        let response = router(FakeHost::Disconnected)
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"ok": true}));
    }
}
