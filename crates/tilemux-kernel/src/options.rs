//! Processing options in the backend's JSON shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One configurable processing option a node advertises on `/options`.
///
/// `value` is the default and `domain` describes the accepted values: a
/// type keyword such as `"integer"` or `"bool"`, or an array of accepted
/// strings for enumerations.  `min`/`max` are only present once a caller's
/// limits have narrowed a numeric option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeOption {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub domain: Value,
    #[serde(default)]
    pub help: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl NodeOption {
    /// Construct an option with the given name, type keyword, and default.
    pub fn new(name: impl Into<String>, kind: impl Into<String>, value: Value) -> Self {
        let kind = kind.into();
        Self {
            name: name.into(),
            domain: Value::String(kind.clone()),
            kind,
            value,
            help: String::new(),
            min: None,
            max: None,
        }
    }

    /// Builder: replace the domain.
    pub fn with_domain(mut self, domain: Value) -> Self {
        self.domain = domain;
        self
    }

    /// Enumerated accepted values, when the domain is an array.
    pub fn choices(&self) -> Option<Vec<String>> {
        self.domain.as_array().map(|items| {
            items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
    }

    /// Whether the option takes a numeric value.
    pub fn is_numeric(&self) -> bool {
        matches!(self.kind.as_str(), "int" | "integer" | "float" | "number")
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.kind.as_str(), "int" | "integer")
    }
}

/// One option a caller submits with a new job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedOption {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}
