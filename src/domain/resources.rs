//! Model Context Protocol resource providers
//!
//! A fixed `hello://world` resource and a `greeting://{name}` template, both
//! suffixed by the active profile.

use async_trait::async_trait;
use rust_mcp_sdk::schema::{
    ReadResourceContent, ReadResourceRequestParams, ReadResourceResult, Resource,
    TextResourceContents,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::profile::Profile;
use crate::errors::AppError;
use crate::mcp::rpc::{app_error_to_json_rpc, json_rpc_error, json_rpc_serialized, INVALID_PARAMS};
use crate::registry::{
    parse_args, Arguments, Content, Handler, Operation, OperationKind, Registry, RegistryError,
    UriTemplate,
};
use crate::AppState;

pub const TEXT_MIME_TYPE: &str = "text/plain";

pub struct StaticText(pub String);

#[async_trait]
impl Handler for StaticText {
    async fn call(&self, _args: Arguments) -> Result<Vec<Content>, RegistryError> {
        Ok(vec![Content::text(self.0.clone())])
    }
}

#[derive(Debug, Deserialize)]
struct GreetingArgs {
    name: String,
}

pub struct Greeting;

#[async_trait]
impl Handler for Greeting {
    async fn call(&self, args: Arguments) -> Result<Vec<Content>, RegistryError> {
        let GreetingArgs { name } = parse_args(args)?;
        Ok(vec![Content::text(format!("Hello, {name} from the resource!"))])
    }
}

pub fn operations(profile: &Profile) -> Result<Vec<Operation>, RegistryError> {
    let hello = profile.named("hello");
    let greeting = profile.named("greeting");
    let template = UriTemplate::parse(format!("{greeting}://{{name}}"))?;

    Ok(vec![
        Operation::resource(
            hello.clone(),
            format!("{hello}://world"),
            StaticText("Hello, World from the resource!".to_string()),
        ),
        Operation::resource_template(greeting, template, Greeting),
    ])
}

pub fn build_resources_list(registry: &Registry) -> Vec<Resource> {
    registry
        .list(OperationKind::Resource)
        .filter_map(|operation| {
            operation.uri().map(|uri| Resource {
                annotations: None,
                description: operation.description.clone(),
                icons: vec![],
                meta: None,
                mime_type: Some(TEXT_MIME_TYPE.to_string()),
                name: operation.name.clone(),
                size: None,
                title: None,
                uri: uri.to_string(),
            })
        })
        .collect()
}

pub fn build_resource_templates_list(registry: &Registry) -> Vec<Value> {
    registry
        .list(OperationKind::ResourceTemplate)
        .filter_map(|operation| {
            operation.uri().map(|uri_template| {
                let mut template = json!({
                    "name": operation.name,
                    "uriTemplate": uri_template,
                    "mimeType": TEXT_MIME_TYPE,
                });
                if let Some(description) = &operation.description {
                    template["description"] = Value::String(description.clone());
                }
                template
            })
        })
        .collect()
}

pub async fn handle_resources_read(
    state: &AppState,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let resource_read: ReadResourceRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    let content = match state.registry.read_resource(&resource_read.uri).await {
        Ok(content) => content,
        Err(err) => return app_error_to_json_rpc(id, AppError::from(err)),
    };

    let result = ReadResourceResult {
        contents: content
            .into_iter()
            .map(|block| {
                ReadResourceContent::from(TextResourceContents {
                    meta: None,
                    mime_type: Some(TEXT_MIME_TYPE.to_string()),
                    text: block.as_text().to_string(),
                    uri: resource_read.uri.clone(),
                })
            })
            .collect(),
        meta: None,
    };

    json_rpc_serialized(id, &result)
}
