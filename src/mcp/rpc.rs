//! JSON-RPC protocol representations and formatting utilities
//!
//! Maps internal errors onto JSON-RPC error payloads built from the SDK envelope types.

use rust_mcp_sdk::schema::{
    JsonrpcErrorResponse, JsonrpcResultResponse, RequestId, Result as McpResult, RpcError,
};
use serde_json::{json, Value};

use crate::errors::AppError;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const UNAUTHORIZED: i32 = -32001;

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

fn error_data(code: &str, message: &str) -> Option<Value> {
    Some(json!({
        "code": code,
        "message": message,
        "details": {}
    }))
}

pub fn app_error_to_json_rpc(id: Option<Value>, err: AppError) -> Value {
    match err {
        AppError::BadRequest { code, message } => json_rpc_error_with_data(
            id,
            INVALID_PARAMS,
            "Invalid params",
            error_data(code, &message),
        ),
        AppError::NotFound { code, message } => json_rpc_error_with_data(
            id,
            METHOD_NOT_FOUND,
            "Method not found",
            error_data(code, &message),
        ),
        AppError::Unauthorized { code, message } => {
            json_rpc_error_with_data(id, UNAUTHORIZED, "Unauthorized", error_data(code, message))
        }
        AppError::Internal { message, .. } => {
            tracing::error!(error = %message, "mcp request failed with internal error");
            json_rpc_error(id, INTERNAL_ERROR, "Internal error")
        }
    }
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: &str) -> Value {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: Option<Value>,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> Value {
    let response = JsonrpcErrorResponse::new(
        RpcError {
            code: i64::from(code),
            data,
            message: message.to_string(),
        },
        id.as_ref().and_then(value_to_request_id),
    );

    serde_json::to_value(response).unwrap_or_else(|_| {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message }
        })
    })
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    if let Some(request_id) = id.as_ref().and_then(value_to_request_id) {
        let extra = result.as_object().cloned();
        let response = JsonrpcResultResponse::new(request_id, McpResult { meta: None, extra });
        if let Ok(value) = serde_json::to_value(response) {
            return value;
        }
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

/// Serializes an SDK result type, degrading to an internal error response.
pub fn json_rpc_serialized<T: serde::Serialize>(id: Option<Value>, result: &T) -> Value {
    match serde_json::to_value(result) {
        Ok(value) => json_rpc_result(id, value),
        Err(err) => app_error_to_json_rpc(
            id,
            AppError::internal(format!("result serialization failed: {err}")),
        ),
    }
}

pub fn value_to_request_id(value: &Value) -> Option<RequestId> {
    if let Some(string_id) = value.as_str() {
        return Some(RequestId::String(string_id.to_string()));
    }

    value.as_i64().map(RequestId::Integer)
}

pub fn request_id_to_value(id: RequestId) -> Value {
    match id {
        RequestId::String(value) => Value::String(value),
        RequestId::Integer(value) => Value::Number(value.into()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn not_found_maps_to_method_not_found_with_data() {
        let response = app_error_to_json_rpc(
            Some(json!(7)),
            AppError::not_found("tool_not_found", "tool 'nope' not found"),
        );

        assert_eq!(response["id"], 7);
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(response["error"]["data"]["code"], "tool_not_found");
    }

    #[test]
    fn internal_error_omits_data() {
        let response =
            app_error_to_json_rpc(Some(json!("abc")), AppError::internal("boom"));

        assert_eq!(response["id"], "abc");
        assert_eq!(response["error"]["code"], INTERNAL_ERROR);
        assert!(response["error"].get("data").is_none());
    }

    #[test]
    fn request_ids_round_trip_through_values() {
        assert_eq!(
            value_to_request_id(&json!(5)).map(request_id_to_value),
            Some(json!(5))
        );
        assert_eq!(
            value_to_request_id(&json!("req-1")).map(request_id_to_value),
            Some(json!("req-1"))
        );
        assert!(value_to_request_id(&json!(1.5)).is_none());
    }

    #[test]
    fn result_response_keeps_payload() {
        let response = json_rpc_result(Some(json!(3)), json!({ "tools": [] }));

        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], 3);
        assert!(response["result"]["tools"].is_array());
    }
}
