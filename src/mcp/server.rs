//! The central Model Context Protocol engine
//!
//! Decodes JSON-RPC payloads (single messages and batches), negotiates
//! `initialize`, and routes tool, resource and prompt methods.

use rust_mcp_sdk::schema::{
    CallToolRequest, GetPromptRequest, Implementation, InitializeRequest, InitializeResult,
    JsonrpcMessage, JsonrpcRequest, ListPromptsRequest, ListResourceTemplatesRequest,
    ListResourcesRequest, ListResourcesResult, ListToolsRequest, PingRequest, ReadResourceRequest,
    ServerCapabilities, ServerCapabilitiesPrompts, ServerCapabilitiesResources,
    ServerCapabilitiesTools,
};
use serde_json::{json, Value};
use tracing::info;

use crate::domain::{
    prompts::{build_prompts_list, handle_prompts_get},
    resources::{build_resource_templates_list, build_resources_list, handle_resources_read},
    tools::{build_tools_list, handle_tools_call},
};
use crate::logging::redact_audit_params;
use crate::mcp::rpc::{
    app_error_to_json_rpc, is_json_rpc_error, json_rpc_error, json_rpc_result,
    json_rpc_serialized, request_id_to_value, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
};
use crate::{errors::AppError, AppState};

/// Newest first; the first entry is offered when the client asks for an unknown version.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

/// Handles a decoded request body: a single message or a batch.
///
/// Returns `None` when nothing needs to be sent back (notifications only).
pub async fn handle_json_rpc_payload(state: &AppState, payload: Value) -> Option<Value> {
    let Value::Array(batch) = payload else {
        return handle_json_rpc_value(state, payload).await;
    };

    if batch.is_empty() {
        return Some(Value::Array(vec![json_rpc_error(
            None,
            INVALID_REQUEST,
            "Invalid Request",
        )]));
    }

    let mut responses = Vec::new();
    for item in batch {
        if let Some(response) = handle_json_rpc_value(state, item).await {
            responses.push(response);
        }
    }

    if responses.is_empty() {
        None
    } else {
        Some(Value::Array(responses))
    }
}

pub async fn handle_json_rpc_value(state: &AppState, payload: Value) -> Option<Value> {
    if !payload.is_object() {
        return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
    }

    let request_id = payload.get("id").cloned();
    let parsed: JsonrpcMessage = match serde_json::from_value(payload) {
        Ok(message) => message,
        Err(_) => return Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request")),
    };

    match parsed {
        JsonrpcMessage::Request(request) => {
            if let Err(error_response) = validate_request_shape(&request) {
                return Some(error_response);
            }

            let request_id = request_id_to_value(request.id);
            if request.method.trim().is_empty() {
                return Some(json_rpc_error(
                    Some(request_id),
                    INVALID_REQUEST,
                    "Invalid Request",
                ));
            }

            Some(
                handle_json_rpc_request(
                    state,
                    Some(request_id),
                    request.method,
                    request.params.map(Value::Object),
                )
                .await,
            )
        }
        JsonrpcMessage::Notification(notification) => {
            if notification.method.trim().is_empty() {
                return None;
            }

            let _ = handle_json_rpc_request(
                state,
                None,
                notification.method,
                notification.params.map(Value::Object),
            )
            .await;
            None
        }
        JsonrpcMessage::ResultResponse(_) | JsonrpcMessage::ErrorResponse(_) => {
            Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request"))
        }
    }
}

/// Checks a request against the SDK's typed request for its method.
pub fn validate_request_shape(request: &JsonrpcRequest) -> Result<(), Value> {
    let request_id = Some(request_id_to_value(request.id.clone()));
    let invalid_params = || json_rpc_error(request_id.clone(), INVALID_PARAMS, "Invalid params");

    let payload = serde_json::to_value(request).map_err(|_| invalid_params())?;
    let valid = match request.method.as_str() {
        "tools/call" => serde_json::from_value::<CallToolRequest>(payload).is_ok(),
        "tools/list" => serde_json::from_value::<ListToolsRequest>(payload).is_ok(),
        "resources/read" => serde_json::from_value::<ReadResourceRequest>(payload).is_ok(),
        "resources/list" => serde_json::from_value::<ListResourcesRequest>(payload).is_ok(),
        "resources/templates/list" => {
            serde_json::from_value::<ListResourceTemplatesRequest>(payload).is_ok()
        }
        "prompts/get" => serde_json::from_value::<GetPromptRequest>(payload).is_ok(),
        "prompts/list" => serde_json::from_value::<ListPromptsRequest>(payload).is_ok(),
        "ping" => serde_json::from_value::<PingRequest>(payload).is_ok(),
        "initialize" => serde_json::from_value::<InitializeRequest>(payload).is_ok(),
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(invalid_params())
    }
}

fn initialize_result(protocol_version: &str) -> InitializeResult {
    InitializeResult {
        server_info: Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: None,
            description: None,
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools {
                list_changed: Some(false),
            }),
            resources: Some(ServerCapabilitiesResources {
                subscribe: Some(false),
                list_changed: Some(false),
            }),
            prompts: Some(ServerCapabilitiesPrompts {
                list_changed: Some(false),
            }),
            ..Default::default()
        },
        protocol_version: protocol_version.to_string(),
        instructions: None,
        meta: None,
    }
}

pub async fn handle_json_rpc_request(
    state: &AppState,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
) -> Value {
    let audit_params = redact_audit_params(params.as_ref());
    let registry = &state.registry;

    let response = match method.as_str() {
        "initialize" => match negotiate_protocol_version(params.as_ref()) {
            Ok(version) => json_rpc_serialized(id, &initialize_result(version)),
            Err(err) => app_error_to_json_rpc(id, err),
        },
        "notifications/initialized" | "ping" => json_rpc_result(id, json!({})),
        "tools/list" => json_rpc_result(id, json!({ "tools": build_tools_list(registry) })),
        "tools/call" => handle_tools_call(state, id, params).await,
        "resources/list" => json_rpc_serialized(
            id,
            &ListResourcesResult {
                meta: None,
                next_cursor: None,
                resources: build_resources_list(registry),
            },
        ),
        "resources/templates/list" => json_rpc_result(
            id,
            json!({ "resourceTemplates": build_resource_templates_list(registry) }),
        ),
        "resources/read" => handle_resources_read(state, id, params).await,
        "prompts/list" => json_rpc_result(id, json!({ "prompts": build_prompts_list(registry) })),
        "prompts/get" => handle_prompts_get(state, id, params).await,
        _ => json_rpc_error(id, METHOD_NOT_FOUND, "Method not found"),
    };

    info!(
        method = %method,
        params = %audit_params,
        outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
        "mcp action audited"
    );

    response
}

/// Echoes a supported offered version, otherwise answers with the newest one.
pub fn negotiate_protocol_version(params: Option<&Value>) -> Result<&'static str, AppError> {
    let offered_version = params
        .and_then(Value::as_object)
        .and_then(|object| object.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .ok_or_else(|| {
            AppError::bad_request(
                "invalid_protocol_version",
                "initialize params.protocolVersion is required",
            )
        })?;

    Ok(SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|supported| *supported == offered_version)
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0]))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::profile::{build_registry, Profile};

    fn state() -> AppState {
        AppState::new(None, build_registry(&Profile::primary()).expect("registry builds"))
    }

    #[test]
    fn negotiate_protocol_version_accepts_supported_versions() {
        for version in SUPPORTED_PROTOCOL_VERSIONS {
            let params = json!({ "protocolVersion": version });
            assert_eq!(
                negotiate_protocol_version(Some(&params)).expect("supported version"),
                version
            );
        }
    }

    #[test]
    fn negotiate_protocol_version_falls_back_to_latest() {
        let params = json!({ "protocolVersion": "2099-01-01" });

        let version = negotiate_protocol_version(Some(&params)).expect("fallback version");
        assert_eq!(version, SUPPORTED_PROTOCOL_VERSIONS[0]);
    }

    #[test]
    fn negotiate_protocol_version_requires_version() {
        let error = negotiate_protocol_version(Some(&json!({}))).expect_err("missing version");
        assert!(error.to_string().contains("bad request"));
    }

    #[tokio::test]
    async fn tools_call_domain_error_is_flagged_result() {
        let response = handle_json_rpc_value(
            &state(),
            json!({
                "jsonrpc": "2.0",
                "id": 9,
                "method": "tools/call",
                "params": {
                    "name": "calculator",
                    "arguments": { "operation": "divide", "num1": 1, "num2": 0 }
                }
            }),
        )
        .await
        .expect("request gets a response");

        assert_eq!(response["id"], 9);
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(
            response["result"]["content"][0]["text"],
            "Division by zero is not allowed"
        );
    }

    #[tokio::test]
    async fn tools_call_validation_error_is_invalid_params() {
        let response = handle_json_rpc_value(
            &state(),
            json!({
                "jsonrpc": "2.0",
                "id": 10,
                "method": "tools/call",
                "params": { "name": "echo", "arguments": { "message": 5 } }
            }),
        )
        .await
        .expect("request gets a response");

        assert_eq!(response["error"]["code"], -32602);
        assert_eq!(response["error"]["data"]["code"], "invalid_arguments");
    }

    #[tokio::test]
    async fn resource_templates_list_returns_greeting() {
        let response = handle_json_rpc_value(
            &state(),
            json!({ "jsonrpc": "2.0", "id": 11, "method": "resources/templates/list", "params": {} }),
        )
        .await
        .expect("request gets a response");

        assert_eq!(
            response["result"]["resourceTemplates"][0]["uriTemplate"],
            "greeting://{name}"
        );
    }

    #[tokio::test]
    async fn notifications_produce_no_response() {
        let response = handle_json_rpc_payload(
            &state(),
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
        )
        .await;

        assert!(response.is_none());
    }

    #[tokio::test]
    async fn empty_batch_is_invalid_request() {
        let response = handle_json_rpc_payload(&state(), json!([]))
            .await
            .expect("empty batch gets an error");

        assert_eq!(response[0]["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn response_messages_are_rejected() {
        let response = handle_json_rpc_value(
            &state(),
            json!({ "jsonrpc": "2.0", "id": 12, "result": {} }),
        )
        .await
        .expect("stray response gets an error");

        assert_eq!(response["error"]["code"], -32600);
    }
}
