//! Interactive tools exposed via Model Context Protocol
//!
//! `echo` and `calculator` make up the calculator tool set, `ping` and
//! `even-or-odd` the parity tool set.

use std::fmt;

use async_trait::async_trait;
use rust_mcp_sdk::schema::{CallToolRequestParams, CallToolResult, ContentBlock, TextContent};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::profile::ToolSet;
use crate::errors::AppError;
use crate::mcp::rpc::{
    app_error_to_json_rpc, json_rpc_error, json_rpc_serialized, INVALID_PARAMS,
};
use crate::registry::{
    parse_args, Arguments, Content, Handler, Operation, OperationKind, ParamShape, Registry,
    RegistryError,
};
use crate::AppState;

pub const ECHO_TOOL: &str = "echo";
pub const CALCULATOR_TOOL: &str = "calculator";
pub const PING_TOOL: &str = "ping";
pub const EVEN_OR_ODD_TOOL: &str = "even-or-odd";

pub const DIVISION_BY_ZERO: &str = "Division by zero is not allowed";

#[derive(Debug, Deserialize)]
struct MessageArgs {
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arithmetic {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Arithmetic {
    pub const ALL: [&'static str; 4] = ["add", "subtract", "multiply", "divide"];

    pub fn apply(self, left: f64, right: f64) -> Result<f64, RegistryError> {
        match self {
            Self::Add => Ok(left + right),
            Self::Subtract => Ok(left - right),
            Self::Multiply => Ok(left * right),
            // -0.0 == 0.0, so negative zero is rejected as well
            Self::Divide if right == 0.0 => Err(RegistryError::domain(DIVISION_BY_ZERO)),
            Self::Divide => Ok(left / right),
        }
    }
}

impl fmt::Display for Arithmetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        })
    }
}

#[derive(Debug, Deserialize)]
struct CalculatorArgs {
    operation: Arithmetic,
    num1: f64,
    num2: f64,
}

#[derive(Debug, Deserialize)]
struct ParityArgs {
    num: f64,
}

pub fn parity(num: f64) -> &'static str {
    if num % 2.0 == 0.0 {
        "even"
    } else {
        "odd"
    }
}

/// Renders a number the way a JavaScript template literal would.
pub fn format_number(num: f64) -> String {
    if num == 0.0 {
        return "0".to_string();
    }
    if num.is_infinite() {
        return if num > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if num.is_nan() {
        return "NaN".to_string();
    }

    let magnitude = num.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return num.to_string();
    }

    let exponential = format!("{num:e}");
    match exponential.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => exponential,
    }
}

pub struct EchoTool;

#[async_trait]
impl Handler for EchoTool {
    async fn call(&self, args: Arguments) -> Result<Vec<Content>, RegistryError> {
        let MessageArgs { message } = parse_args(args)?;
        Ok(vec![Content::text(format!("Hello {message}"))])
    }
}

pub struct PingTool;

#[async_trait]
impl Handler for PingTool {
    async fn call(&self, args: Arguments) -> Result<Vec<Content>, RegistryError> {
        let MessageArgs { message } = parse_args(args)?;
        tracing::debug!(message = %message, "ping received");
        Ok(vec![Content::text("pong")])
    }
}

pub struct CalculatorTool;

#[async_trait]
impl Handler for CalculatorTool {
    async fn call(&self, args: Arguments) -> Result<Vec<Content>, RegistryError> {
        let CalculatorArgs {
            operation,
            num1,
            num2,
        } = parse_args(args)?;
        let result = operation.apply(num1, num2)?;
        Ok(vec![Content::text(format!(
            "The result of {operation} {} and {} is {}",
            format_number(num1),
            format_number(num2),
            format_number(result)
        ))])
    }
}

pub struct EvenOrOddTool;

#[async_trait]
impl Handler for EvenOrOddTool {
    async fn call(&self, args: Arguments) -> Result<Vec<Content>, RegistryError> {
        let ParityArgs { num } = parse_args(args)?;
        Ok(vec![Content::text(format!(
            "The result of {} is {}",
            format_number(num),
            parity(num)
        ))])
    }
}

pub fn operations(tool_set: ToolSet) -> Vec<Operation> {
    match tool_set {
        ToolSet::Calculator => vec![
            Operation::tool(ECHO_TOOL, EchoTool)
                .with_description("Echoes back a message with 'Hello' prefix")
                .with_shape(ParamShape::new().string("message", Some("The message to echo"))),
            Operation::tool(CALCULATOR_TOOL, CalculatorTool)
                .with_description("Performs basic arithmetic operations")
                .with_shape(
                    ParamShape::new()
                        .one_of(
                            "operation",
                            &Arithmetic::ALL,
                            Some("The arithmetic operation to perform"),
                        )
                        .number("num1", Some("The first number"))
                        .number("num2", Some("The second number")),
                ),
        ],
        ToolSet::Parity => vec![
            Operation::tool(PING_TOOL, PingTool)
                .with_description("Returns pong when received a ping")
                .with_shape(ParamShape::new().string("message", Some("The message to ping"))),
            Operation::tool(EVEN_OR_ODD_TOOL, EvenOrOddTool)
                .with_description("Returns if the input number is an even or odd number")
                .with_shape(ParamShape::new().number("num", Some("The number to check"))),
        ],
    }
}

pub fn build_tools_list(registry: &Registry) -> Vec<Value> {
    registry
        .list(OperationKind::Tool)
        .map(|operation| {
            let mut tool = json!({
                "name": operation.name,
                "inputSchema": operation
                    .shape
                    .as_ref()
                    .map(ParamShape::to_json_schema)
                    .unwrap_or_else(|| ParamShape::new().to_json_schema()),
            });
            if let Some(description) = &operation.description {
                tool["description"] = Value::String(description.clone());
            }
            tool
        })
        .collect()
}

fn text_blocks(content: Vec<Content>) -> Vec<ContentBlock> {
    content
        .into_iter()
        .map(|block| ContentBlock::from(TextContent::new(block.as_text().to_string(), None, None)))
        .collect()
}

pub async fn handle_tools_call(
    state: &AppState,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    let outcome = state
        .registry
        .invoke(
            OperationKind::Tool,
            &tool_call.name,
            tool_call.arguments.map(Value::Object),
        )
        .await;

    let result = match outcome {
        Ok(content) => CallToolResult {
            content: text_blocks(content),
            is_error: None,
            meta: None,
            structured_content: None,
        },
        Err(err @ (RegistryError::Domain(_) | RegistryError::Handler(_))) => {
            tracing::warn!(tool = %tool_call.name, error = %err, "tool invocation failed");
            CallToolResult {
                content: text_blocks(vec![Content::text(err.to_string())]),
                is_error: Some(true),
                meta: None,
                structured_content: None,
            }
        }
        Err(err) => return app_error_to_json_rpc(id, AppError::from(err)),
    };

    json_rpc_serialized(id, &result)
}
