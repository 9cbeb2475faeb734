//! Declarative registry of named operations
//!
//! Tools, resources, resource templates and prompts are registered once under a
//! `(kind, name)` key and dispatched by name with validated input.

pub mod shape;
pub mod template;

use std::{collections::BTreeMap, fmt, sync::Arc};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use shape::{Param, ParamKind, ParamShape};
pub use template::UriTemplate;

/// Validated arguments handed to a handler.
pub type Arguments = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Resource,
    ResourceTemplate,
    Prompt,
    Tool,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::ResourceTemplate => "resource_template",
            Self::Prompt => "prompt",
            Self::Tool => "tool",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
}

/// A tagged unit of output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Self::Text { text } => text,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("{kind} '{name}' is already registered")]
    Duplicate { kind: OperationKind, name: String },
    #[error("{kind} '{name}' not found")]
    NotFound { kind: OperationKind, name: String },
    #[error("invalid argument '{field}': {reason}")]
    Validation { field: String, reason: String },
    #[error("{0}")]
    Domain(String),
    #[error("handler failed: {0}")]
    Handler(String),
    #[error("invalid uri template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },
}

impl RegistryError {
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Callable body of an operation.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, args: Arguments) -> Result<Vec<Content>, RegistryError>;
}

/// Adapts a synchronous closure into a [`Handler`].
pub struct FnHandler<F>(F);

pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(Arguments) -> Result<Vec<Content>, RegistryError> + Send + Sync,
{
    FnHandler(f)
}

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(Arguments) -> Result<Vec<Content>, RegistryError> + Send + Sync,
{
    async fn call(&self, args: Arguments) -> Result<Vec<Content>, RegistryError> {
        (self.0)(args)
    }
}

/// Deserializes validated arguments into a typed struct.
pub fn parse_args<T: DeserializeOwned>(args: Arguments) -> Result<T, RegistryError> {
    serde_json::from_value(Value::Object(args))
        .map_err(|err| RegistryError::validation("arguments", err.to_string()))
}

#[derive(Debug, Clone)]
pub enum Target {
    Resource { uri: String },
    ResourceTemplate { template: UriTemplate },
    Prompt { role: Role },
    Tool,
}

impl Target {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Resource { .. } => OperationKind::Resource,
            Self::ResourceTemplate { .. } => OperationKind::ResourceTemplate,
            Self::Prompt { .. } => OperationKind::Prompt,
            Self::Tool => OperationKind::Tool,
        }
    }
}

#[derive(Clone)]
pub struct Operation {
    pub name: String,
    pub description: Option<String>,
    pub shape: Option<ParamShape>,
    pub target: Target,
    handler: Arc<dyn Handler>,
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl Operation {
    fn new(name: impl Into<String>, target: Target, handler: impl Handler + 'static) -> Self {
        Self {
            name: name.into(),
            description: None,
            shape: None,
            target,
            handler: Arc::new(handler),
        }
    }

    pub fn tool(name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self::new(name, Target::Tool, handler)
    }

    pub fn prompt(name: impl Into<String>, role: Role, handler: impl Handler + 'static) -> Self {
        Self::new(name, Target::Prompt { role }, handler)
    }

    pub fn resource(
        name: impl Into<String>,
        uri: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> Self {
        Self::new(name, Target::Resource { uri: uri.into() }, handler)
    }

    /// Template variables become required string parameters.
    pub fn resource_template(
        name: impl Into<String>,
        template: UriTemplate,
        handler: impl Handler + 'static,
    ) -> Self {
        let shape = template
            .variables()
            .iter()
            .fold(ParamShape::new(), |shape, variable| {
                shape.string(variable.as_str(), None)
            });
        let mut operation = Self::new(name, Target::ResourceTemplate { template }, handler);
        operation.shape = Some(shape);
        operation
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_shape(mut self, shape: ParamShape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.target.kind()
    }

    /// Fixed URI for resources, template text for resource templates.
    pub fn uri(&self) -> Option<&str> {
        match &self.target {
            Target::Resource { uri } => Some(uri),
            Target::ResourceTemplate { template } => Some(template.as_str()),
            Target::Prompt { .. } | Target::Tool => None,
        }
    }

    fn validate(&self, raw: Option<Value>) -> Result<Arguments, RegistryError> {
        match &self.shape {
            Some(shape) => shape.validate(raw),
            None => Ok(match raw {
                Some(Value::Object(map)) => map,
                _ => Arguments::new(),
            }),
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    operations: BTreeMap<(OperationKind, String), Operation>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, operation: Operation) -> Result<(), RegistryError> {
        let key = (operation.kind(), operation.name.clone());
        if self.operations.contains_key(&key) {
            return Err(RegistryError::Duplicate {
                kind: key.0,
                name: key.1,
            });
        }

        tracing::debug!(kind = %key.0, name = %key.1, "operation registered");
        self.operations.insert(key, operation);
        Ok(())
    }

    pub fn get(&self, kind: OperationKind, name: &str) -> Option<&Operation> {
        self.operations.get(&(kind, name.to_string()))
    }

    pub fn list(&self, kind: OperationKind) -> impl Iterator<Item = &Operation> {
        self.operations
            .iter()
            .filter(move |((entry_kind, _), _)| *entry_kind == kind)
            .map(|(_, operation)| operation)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub async fn invoke(
        &self,
        kind: OperationKind,
        name: &str,
        raw: Option<Value>,
    ) -> Result<Vec<Content>, RegistryError> {
        let operation = self.get(kind, name).ok_or_else(|| RegistryError::NotFound {
            kind,
            name: name.to_string(),
        })?;
        let args = operation.validate(raw)?;
        operation.handler.call(args).await
    }

    /// Exact static URI first, then the first matching template.
    pub fn resolve_resource(&self, uri: &str) -> Option<(&Operation, Arguments)> {
        if let Some(operation) = self
            .list(OperationKind::Resource)
            .find(|operation| operation.uri() == Some(uri))
        {
            return Some((operation, Arguments::new()));
        }

        self.list(OperationKind::ResourceTemplate)
            .find_map(|operation| match &operation.target {
                Target::ResourceTemplate { template } => {
                    template.match_uri(uri).map(|args| (operation, args))
                }
                _ => None,
            })
    }

    pub async fn read_resource(&self, uri: &str) -> Result<Vec<Content>, RegistryError> {
        let (operation, args) =
            self.resolve_resource(uri)
                .ok_or_else(|| RegistryError::NotFound {
                    kind: OperationKind::Resource,
                    name: uri.to_string(),
                })?;

        self.invoke(operation.kind(), &operation.name, Some(Value::Object(args)))
            .await
    }
}
