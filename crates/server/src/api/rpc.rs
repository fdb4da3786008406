// The dispatcher: one inbound JSON request, one session call, one JSON
// response. Stateless per request; the session rides in AppState.

use crate::config::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use finbridge_mcp::SessionError;
use serde_json::Value;

// Stable machine-readable error codes; bodies carry nothing else
const INVALID_JSON: &str = "invalid_json";
const MISSING_METHOD: &str = "missing_method";
const MISSING_TOOL_NAME: &str = "missing_tool_name";
const TOOL_NOT_FOUND: &str = "tool_not_found";
const TOOL_CALL_FAILED: &str = "tool_call_failed";
const UPSTREAM_UNAVAILABLE: &str = "upstream_unavailable";

fn ok(result: Value) -> Response {
    (StatusCode::OK, Json(serde_json::json!({ "result": result }))).into_response()
}

fn fail(status: StatusCode, code: &str) -> Response {
    (status, Json(serde_json::json!({ "error": code }))).into_response()
}

/// Map a session failure to the error taxonomy. Detail stays in the
/// log; clients get the stable code only.
fn session_error(err: SessionError) -> Response {
    tracing::error!("session call failed: {}", err);
    match err {
        ref e if e.is_method_not_found() => fail(StatusCode::BAD_GATEWAY, TOOL_NOT_FOUND),
        SessionError::Rpc { .. } => fail(StatusCode::INTERNAL_SERVER_ERROR, TOOL_CALL_FAILED),
        _ => fail(StatusCode::BAD_GATEWAY, UPSTREAM_UNAVAILABLE),
    }
}

/// POST /rpc
pub async fn dispatch(State(state): State<AppState>, body: Bytes) -> Response {
    // parse the raw body ourselves so a bad payload maps to our own
    // error code rather than the framework's rejection
    let Ok(payload) = serde_json::from_slice::<Value>(&body) else {
        return fail(StatusCode::BAD_REQUEST, INVALID_JSON);
    };

    let method = payload
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if method.is_empty() {
        return fail(StatusCode::BAD_REQUEST, MISSING_METHOD);
    }
    let params = payload
        .get("params")
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));

    match method {
        "tools/list" => match state.host.list_tools().await {
            Ok(tools) => ok(serde_json::json!({ "tools": tools })),
            Err(e) => session_error(e),
        },
        "tools/call" => {
            let name = params
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if name.is_empty() {
                return fail(StatusCode::BAD_REQUEST, MISSING_TOOL_NAME);
            }
            let arguments = params
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default()));
            match state.host.call_tool(name, arguments).await {
                Ok(output) => ok(output),
                Err(e) => session_error(e),
            }
        }
        // convenience: any other method is treated as a direct tool name
        tool => match state.host.call_tool(tool, params).await {
            Ok(output) => ok(output),
            Err(e) => session_error(e),
        },
    }
}
