//! Prompt templates exposed via Model Context Protocol

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::domain::profile::Profile;
use crate::errors::AppError;
use crate::mcp::rpc::{app_error_to_json_rpc, json_rpc_error, json_rpc_result, INVALID_PARAMS};
use crate::registry::{
    Arguments, Content, Handler, Operation, OperationKind, Registry, RegistryError, Role, Target,
};
use crate::AppState;

pub struct FixedMessage(pub String);

#[async_trait]
impl Handler for FixedMessage {
    async fn call(&self, _args: Arguments) -> Result<Vec<Content>, RegistryError> {
        Ok(vec![Content::text(self.0.clone())])
    }
}

pub fn helpful_assistant(profile: &Profile) -> Operation {
    Operation::prompt(
        profile.named("helpful-assistant"),
        Role::Assistant,
        FixedMessage("You are a helpful assistant.".to_string()),
    )
    .with_description("A helpful assistant prompt")
}

#[derive(Debug, Deserialize)]
struct GetPromptParams {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

pub fn build_prompts_list(registry: &Registry) -> Vec<Value> {
    registry
        .list(OperationKind::Prompt)
        .map(|operation| {
            let arguments = operation
                .shape
                .as_ref()
                .map(|shape| {
                    shape
                        .params()
                        .iter()
                        .map(|param| {
                            json!({
                                "name": param.name,
                                "description": param.description,
                                "required": true,
                            })
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();

            let mut prompt = json!({
                "name": operation.name,
                "arguments": arguments,
            });
            if let Some(description) = &operation.description {
                prompt["description"] = Value::String(description.clone());
            }
            prompt
        })
        .collect()
}

pub async fn handle_prompts_get(
    state: &AppState,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let prompt_get: GetPromptParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    let prompt = state
        .registry
        .get(OperationKind::Prompt, &prompt_get.name)
        .and_then(|operation| match operation.target {
            Target::Prompt { role } => Some((role, operation.description.clone())),
            _ => None,
        });
    let Some((role, description)) = prompt else {
        return app_error_to_json_rpc(
            id,
            AppError::from(RegistryError::NotFound {
                kind: OperationKind::Prompt,
                name: prompt_get.name,
            }),
        );
    };

    let content = match state
        .registry
        .invoke(
            OperationKind::Prompt,
            &prompt_get.name,
            prompt_get.arguments.map(Value::Object),
        )
        .await
    {
        Ok(content) => content,
        Err(err) => return app_error_to_json_rpc(id, AppError::from(err)),
    };

    let messages = content
        .into_iter()
        .map(|block| json!({ "role": role, "content": block }))
        .collect::<Vec<_>>();

    let mut result = json!({ "messages": messages });
    if let Some(description) = description {
        result["description"] = Value::String(description);
    }

    json_rpc_result(id, result)
}
