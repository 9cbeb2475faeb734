//! Parameter shapes: validation of raw arguments and JSON Schema rendering

use serde_json::{json, Map, Value};

use super::{Arguments, RegistryError};

#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    String,
    Number,
    Enum(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub description: Option<String>,
}

/// Every declared parameter is required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamShape {
    params: Vec<Param>,
}

impl ParamShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(self, name: impl Into<String>, description: Option<&str>) -> Self {
        self.param(name, ParamKind::String, description)
    }

    pub fn number(self, name: impl Into<String>, description: Option<&str>) -> Self {
        self.param(name, ParamKind::Number, description)
    }

    pub fn one_of(
        self,
        name: impl Into<String>,
        allowed: &[&str],
        description: Option<&str>,
    ) -> Self {
        let allowed = allowed.iter().map(|value| value.to_string()).collect();
        self.param(name, ParamKind::Enum(allowed), description)
    }

    fn param(mut self, name: impl Into<String>, kind: ParamKind, description: Option<&str>) -> Self {
        self.params.push(Param {
            name: name.into(),
            kind,
            description: description.map(str::to_string),
        });
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Unknown keys are dropped from the returned arguments.
    pub fn validate(&self, raw: Option<Value>) -> Result<Arguments, RegistryError> {
        let input = match raw {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(RegistryError::validation(
                    "arguments",
                    "arguments must be an object",
                ))
            }
        };

        let mut validated = Arguments::new();
        for param in &self.params {
            match input.get(&param.name) {
                None | Some(Value::Null) => {
                    return Err(RegistryError::validation(&param.name, "is required"));
                }
                Some(value) => {
                    check_kind(param, value)?;
                    validated.insert(param.name.clone(), value.clone());
                }
            }
        }

        Ok(validated)
    }

    pub fn to_json_schema(&self) -> Value {
        let properties = self
            .params
            .iter()
            .map(|param| {
                let mut property = match &param.kind {
                    ParamKind::String => json!({ "type": "string" }),
                    ParamKind::Number => json!({ "type": "number" }),
                    ParamKind::Enum(allowed) => json!({ "type": "string", "enum": allowed }),
                };
                if let Some(description) = &param.description {
                    property["description"] = Value::String(description.clone());
                }
                (param.name.clone(), property)
            })
            .collect::<Map<_, _>>();

        let required = self
            .params
            .iter()
            .map(|param| Value::String(param.name.clone()))
            .collect::<Vec<_>>();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

fn check_kind(param: &Param, value: &Value) -> Result<(), RegistryError> {
    match &param.kind {
        ParamKind::String if value.is_string() => Ok(()),
        ParamKind::String => Err(RegistryError::validation(&param.name, "expected string")),
        ParamKind::Number if value.is_number() => Ok(()),
        ParamKind::Number => Err(RegistryError::validation(&param.name, "expected number")),
        ParamKind::Enum(allowed) => match value.as_str() {
            Some(candidate) if allowed.iter().any(|item| item == candidate) => Ok(()),
            _ => Err(RegistryError::validation(
                &param.name,
                format!("expected one of: {}", allowed.join(", ")),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ParamShape;
    use crate::registry::RegistryError;

    fn calculator_shape() -> ParamShape {
        ParamShape::new()
            .one_of("operation", &["add", "subtract"], Some("The operation"))
            .number("num1", None)
            .number("num2", None)
    }

    #[test]
    fn accepts_valid_input_and_drops_unknown_keys() {
        let args = calculator_shape()
            .validate(Some(json!({ "operation": "add", "num1": 1, "num2": 2.5, "extra": true })))
            .expect("valid input");

        assert_eq!(args.len(), 3);
        assert!(!args.contains_key("extra"));
        assert_eq!(args["num2"], json!(2.5));
    }

    #[test]
    fn rejects_missing_required_param() {
        let error = calculator_shape()
            .validate(Some(json!({ "operation": "add", "num1": 1 })))
            .expect_err("num2 missing");

        assert_eq!(error, RegistryError::validation("num2", "is required"));
    }

    #[test]
    fn null_counts_as_missing() {
        let error = calculator_shape()
            .validate(Some(json!({ "operation": null, "num1": 1, "num2": 2 })))
            .expect_err("operation is null");

        assert_eq!(error, RegistryError::validation("operation", "is required"));
    }

    #[test]
    fn rejects_number_passed_as_string() {
        let error = calculator_shape()
            .validate(Some(json!({ "operation": "add", "num1": "1", "num2": 2 })))
            .expect_err("num1 is a string");

        assert_eq!(error, RegistryError::validation("num1", "expected number"));
    }

    #[test]
    fn rejects_value_outside_enum() {
        let error = calculator_shape()
            .validate(Some(json!({ "operation": "modulo", "num1": 1, "num2": 2 })))
            .expect_err("modulo is not allowed");

        assert!(error.to_string().contains("expected one of: add, subtract"));
    }

    #[test]
    fn rejects_non_object_input() {
        let error = ParamShape::new()
            .validate(Some(json!("not-an-object")))
            .expect_err("string input");

        assert!(matches!(error, RegistryError::Validation { ref field, .. } if field == "arguments"));
    }

    #[test]
    fn absent_input_is_empty_object() {
        let args = ParamShape::new().validate(None).expect("empty shape");
        assert!(args.is_empty());
    }

    #[test]
    fn renders_json_schema() {
        let schema = calculator_shape().to_json_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["operation"]["enum"], json!(["add", "subtract"]));
        assert_eq!(schema["properties"]["operation"]["description"], "The operation");
        assert_eq!(schema["properties"]["num1"]["type"], "number");
        assert_eq!(schema["required"], json!(["operation", "num1", "num2"]));
    }
}
