//! Level-1 URI templates such as `greeting://{name}`

use std::fmt;

use regex::Regex;
use serde_json::Value;

use super::{Arguments, RegistryError};

#[derive(Debug, Clone)]
pub struct UriTemplate {
    source: String,
    variables: Vec<String>,
    pattern: Regex,
}

impl UriTemplate {
    pub fn parse(source: impl Into<String>) -> Result<Self, RegistryError> {
        let source = source.into();
        let invalid = |reason: &str| RegistryError::InvalidTemplate {
            template: source.clone(),
            reason: reason.to_string(),
        };

        let mut variables = Vec::new();
        let mut pattern = String::from("^");
        let mut rest = source.as_str();

        while let Some(open) = rest.find('{') {
            let (literal, tail) = rest.split_at(open);
            if literal.contains('}') {
                return Err(invalid("unbalanced '}'"));
            }
            pattern.push_str(&regex::escape(literal));

            let close = tail.find('}').ok_or_else(|| invalid("unclosed '{'"))?;
            let name = &tail[1..close];
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid("variable names must be alphanumeric"));
            }
            if variables.iter().any(|existing| existing == name) {
                return Err(invalid("duplicate variable"));
            }

            pattern.push_str(&format!("(?P<{name}>[^/]+)"));
            variables.push(name.to_string());
            rest = &tail[close + 1..];
        }

        if rest.contains('}') {
            return Err(invalid("unbalanced '}'"));
        }
        pattern.push_str(&regex::escape(rest));
        pattern.push('$');

        let pattern = Regex::new(&pattern).map_err(|err| invalid(&err.to_string()))?;
        Ok(Self {
            source,
            variables,
            pattern,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn match_uri(&self, uri: &str) -> Option<Arguments> {
        let captures = self.pattern.captures(uri)?;
        Some(
            self.variables
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|value| (name.clone(), Value::String(value.as_str().to_string())))
                })
                .collect(),
        )
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::UriTemplate;

    #[test]
    fn extracts_single_variable() {
        let template = UriTemplate::parse("greeting://{name}").expect("valid template");

        let args = template.match_uri("greeting://Alice").expect("uri matches");
        assert_eq!(args["name"], json!("Alice"));
        assert_eq!(template.variables(), ["name".to_string()]);
    }

    #[test]
    fn rejects_other_schemes_and_nested_paths() {
        let template = UriTemplate::parse("greeting://{name}").expect("valid template");

        assert!(template.match_uri("greeting2://Alice").is_none());
        assert!(template.match_uri("greeting://Alice/extra").is_none());
        assert!(template.match_uri("greeting://").is_none());
    }

    #[test]
    fn escapes_literal_regex_characters() {
        let template = UriTemplate::parse("file://a.b/{id}").expect("valid template");

        assert!(template.match_uri("file://a.b/7").is_some());
        assert!(template.match_uri("file://aXb/7").is_none());
    }

    #[test]
    fn rejects_malformed_templates() {
        assert!(UriTemplate::parse("greeting://{name").is_err());
        assert!(UriTemplate::parse("greeting://name}").is_err());
        assert!(UriTemplate::parse("greeting://{}").is_err());
        assert!(UriTemplate::parse("x://{a}/{a}").is_err());
    }
}
