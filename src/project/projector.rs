//! Per-record projection: extract, parse, evaluate, map
//!
//! A record either gets its output field(s) written, gets a diagnostic written
//! to the error field, or (for an expression calling an unregistered function)
//! stops the whole stream. Diagnosed records are still meant to be emitted.

use crate::error::{ConfigError, ProjectionError, QueryError};
use crate::project::mapper::map_result;
use crate::query::{FunctionTable, Query};
use crate::types::{FieldValue, OutputSpec, ProjectConfig, Record};
use serde_json::Value;
use tracing::debug;

/// What happened to a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The query matched and its result was written
    Mapped,
    /// No match; the configured default was written
    Defaulted,
    /// No match and no default; the record is untouched
    Unmatched,
    /// A diagnostic was written to the error field
    Diagnosed(String),
}

/// Recoverable per-record failures
#[derive(Debug)]
enum Diagnosis {
    InvalidJson,
    Query(QueryError),
    Unexpected(QueryError),
}

impl Diagnosis {
    fn message(&self) -> String {
        match self {
            Diagnosis::InvalidJson => String::from("Invalid JSON."),
            Diagnosis::Query(e) => format!("JMESPath error: {}", e),
            Diagnosis::Unexpected(e) => format!("Exception: {}", e),
        }
    }
}

impl From<QueryError> for Diagnosis {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::Expref { .. } => Diagnosis::Unexpected(e),
            other => Diagnosis::Query(other),
        }
    }
}

/// A compiled expression plus the options controlling where its results go
pub struct Projector<'a> {
    query: Query,
    functions: &'a FunctionTable,
    config: ProjectConfig,
    output: OutputSpec,
}

impl<'a> Projector<'a> {
    /// Validate the options and compile the expression. Function calls are
    /// resolved against `functions` when a record is projected.
    ///
    /// # Example
    /// ```rust
    /// use jpath::{new_function_table, ProjectConfig, Projector, Record};
    /// use serde_json::json;
    ///
    /// let functions = new_function_table();
    /// let projector = Projector::new(&functions, "user.name", ProjectConfig::default()).unwrap();
    ///
    /// let mut record = Record::default().with_field("_raw", r#"{"user": {"name": "alice"}}"#);
    /// projector.project(&mut record).unwrap();
    ///
    /// assert_eq!(record.get("jpath"), Some(&json!("alice")));
    /// ```
    pub fn new(
        functions: &'a FunctionTable,
        expression: &str,
        config: ProjectConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let query = Query::compile(expression)?;
        let output = config.output_spec();

        Ok(Projector {
            query,
            functions,
            config,
            output,
        })
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Project one record in place.
    ///
    /// Only an unknown function in the expression is returned as an error;
    /// every other failure is written to the error field.
    pub fn project(&self, record: &mut Record) -> Result<Outcome, ProjectionError> {
        let Some(document) = self.extract(record) else {
            return Ok(self.diagnose(record, Diagnosis::InvalidJson));
        };

        let result = match self.query.search(&document, self.functions) {
            Ok(result) => result,
            Err(e) if e.is_unknown_function() => return Err(ProjectionError::UnknownFunction(e)),
            Err(e) => return Ok(self.diagnose(record, e.into())),
        };

        if result.is_null() {
            return Ok(self.apply_default(record));
        }

        map_result(record, &self.output, &result);
        Ok(Outcome::Mapped)
    }

    /// Parse the input field, using only the first element of a multivalue
    fn extract(&self, record: &Record) -> Option<Value> {
        let mut bytes = record.input_text(&self.config.input)?.into_bytes();
        simd_json::serde::from_slice::<Value>(&mut bytes).ok()
    }

    fn apply_default(&self, record: &mut Record) -> Outcome {
        match &self.config.default {
            Some(default) => {
                record.set(self.config.output.as_str(), FieldValue::single(default.as_str()));
                Outcome::Defaulted
            }
            None => Outcome::Unmatched,
        }
    }

    fn diagnose(&self, record: &mut Record, diagnosis: Diagnosis) -> Outcome {
        let message = diagnosis.message();
        debug!(field = %self.config.error, %message, "record diagnosed");
        record.set(self.config.error.as_str(), FieldValue::single(message.as_str()));
        Outcome::Diagnosed(message)
    }
}
