use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static FIELD_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[_.a-zA-Z-][_.a-zA-Z0-9-]*$").unwrap()
});

/// The value written to an output field: one string, or an ordered multivalue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    pub fn single(value: impl Into<String>) -> Self {
        FieldValue::Single(value.into())
    }
}

impl From<FieldValue> for Value {
    fn from(field: FieldValue) -> Self {
        match field {
            FieldValue::Single(s) => Value::String(s),
            FieldValue::Multi(values) => {
                Value::Array(values.into_iter().map(Value::String).collect())
            }
        }
    }
}

/// One record of the stream - an ordered mapping from field name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Record { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Write a field, overwriting any previous value under that name
    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Text of the input field as it should be handed to the JSON parser.
    ///
    /// Multivalue inputs only contribute their first element. Returns `None`
    /// when there is nothing parseable (missing field, null, empty multivalue).
    pub fn input_text(&self, field: &str) -> Option<String> {
        let raw = match self.fields.get(field)? {
            Value::Array(values) => values.first()?,
            other => other,
        };

        match raw {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Where query results land: a literal field, or a pattern with a `*` placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSpec {
    Literal(String),
    Wildcard(String),
}

impl OutputSpec {
    pub fn parse(output: &str) -> Self {
        if output.contains('*') {
            OutputSpec::Wildcard(output.to_string())
        } else {
            OutputSpec::Literal(output.to_string())
        }
    }

    /// The field name as configured, placeholder included
    pub fn name(&self) -> &str {
        match self {
            OutputSpec::Literal(name) | OutputSpec::Wildcard(name) => name,
        }
    }

    /// Substitute `key` for the first `*` of a wildcard pattern
    pub fn field_for(&self, key: &str) -> String {
        match self {
            OutputSpec::Literal(name) => name.clone(),
            OutputSpec::Wildcard(pattern) => pattern.replacen('*', key, 1),
        }
    }
}

/// Configuration for the projection process
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Field receiving per-record diagnostics
    pub error: String,

    /// Literal written to the output field when the query matches nothing
    pub default: Option<String>,

    /// Field holding the JSON text to query
    pub input: String,

    /// Output field name, or a pattern with a single `*`
    pub output: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            error: String::from("_jmespath_error"),
            default: None,
            input: String::from("_raw"),
            output: String::from("jpath"),
        }
    }
}

impl ProjectConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (option, value) in [("error", &self.error), ("input", &self.input)] {
            if !is_field_name(value) {
                return Err(ConfigError::InvalidFieldName {
                    option,
                    value: value.clone(),
                });
            }
        }

        if self.output.is_empty() {
            return Err(ConfigError::EmptyOutput);
        }

        Ok(())
    }

    pub fn output_spec(&self) -> OutputSpec {
        OutputSpec::parse(&self.output)
    }
}

fn is_field_name(name: &str) -> bool {
    FIELD_NAME_REGEX.is_match(name)
}
