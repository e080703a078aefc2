use jmespath::{ErrorReason, JmespathError, RuntimeError};
use thiserror::Error;

/// Problems with the configured options or expression, caught before any record is read
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid field name for option '{option}': {value:?}")]
    InvalidFieldName { option: &'static str, value: String },

    #[error("Output field name must not be empty")]
    EmptyOutput,

    #[error("Invalid JMESPath expression: {0}")]
    Compile(#[from] JmespathError),
}

/// Failures inside a library function body
#[derive(Error, Debug, PartialEq)]
pub enum FunctionError {
    #[error("element {index} is not a string")]
    ElementNotString { index: usize },

    #[error("element {index} is not valid JSON: {message}")]
    ElementParse { index: usize, message: String },
}

/// Failure while evaluating a compiled query against one document
#[derive(Error, Debug)]
pub enum QueryError {
    /// Type mismatch, arity mismatch, bad slice or unknown function, with the
    /// position in the expression
    #[error(transparent)]
    Runtime(#[from] JmespathError),

    #[error("{function}(): {source}")]
    Function {
        function: String,
        #[source]
        source: FunctionError,
    },

    #[error("expression reference at offset {offset} evaluated outside of a function argument")]
    Expref { offset: usize },
}

impl QueryError {
    pub fn is_unknown_function(&self) -> bool {
        matches!(
            self,
            QueryError::Runtime(JmespathError {
                reason: ErrorReason::Runtime(RuntimeError::UnknownFunction(_)),
                ..
            })
        )
    }
}

/// Stream-level failure: no further record can be projected
#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("Issue with JMESPath expression: {0}")]
    UnknownFunction(QueryError),
}
