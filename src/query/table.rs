//! Named functions callable from an expression

use super::builtins;
use super::interpreter::Interpreter;
use super::signature::Signature;
use crate::error::{FunctionError, QueryError};
use jmespath::ast::Ast;
use jmespath::RuntimeError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Function body. Arguments have already passed the signature check.
pub type Handler = fn(&Args<'_>) -> Result<Value, QueryError>;

/// A registered function
#[derive(Clone)]
pub struct FunctionDef {
    pub signature: Signature,
    pub handler: Handler,
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Functions available to a query, looked up by name at call time
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, FunctionDef>,
}

impl FunctionTable {
    /// An empty table. Every call fails as an unknown function.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the standard JMESPath functions
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        builtins::register(&mut table);
        table
    }

    /// Add a function, replacing any existing one with the same name
    pub fn register(&mut self, name: &str, signature: Signature, handler: Handler) {
        self.functions
            .insert(name.to_owned(), FunctionDef { signature, handler });
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

/// One evaluated argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg<'a> {
    Value(Value),
    /// `&expr`, left unevaluated for the function to apply
    Expref(&'a Ast),
}

impl Arg<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Arg::Value(value) => type_name(value),
            Arg::Expref(_) => "expref",
        }
    }
}

/// JMESPath type name of a value
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The arguments of one call, with typed accessors.
///
/// Accessors report a mismatch as a positioned runtime error instead of
/// panicking, so a handler never has to trust its signature.
pub struct Args<'a> {
    pub(crate) function: &'a str,
    pub(crate) offset: usize,
    pub(crate) args: Vec<Arg<'a>>,
    pub(crate) interpreter: &'a Interpreter<'a>,
}

impl<'a> Args<'a> {
    pub fn function(&self) -> &str {
        self.function
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arg<'a>> {
        self.args.iter()
    }

    pub fn value(&self, position: usize) -> Result<&Value, QueryError> {
        match self.args.get(position) {
            Some(Arg::Value(value)) => Ok(value),
            _ => Err(self.mismatch(position, "any")),
        }
    }

    pub fn string(&self, position: usize) -> Result<&str, QueryError> {
        self.value(position)?
            .as_str()
            .ok_or_else(|| self.mismatch(position, "string"))
    }

    pub fn number(&self, position: usize) -> Result<f64, QueryError> {
        self.value(position)?
            .as_f64()
            .ok_or_else(|| self.mismatch(position, "number"))
    }

    pub fn array(&self, position: usize) -> Result<&[Value], QueryError> {
        self.value(position)?
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.mismatch(position, "array"))
    }

    pub fn object(&self, position: usize) -> Result<&Map<String, Value>, QueryError> {
        self.value(position)?
            .as_object()
            .ok_or_else(|| self.mismatch(position, "object"))
    }

    pub fn expref(&self, position: usize) -> Result<&'a Ast, QueryError> {
        match self.args.get(position) {
            Some(Arg::Expref(ast)) => Ok(*ast),
            _ => Err(self.mismatch(position, "expref")),
        }
    }

    /// Evaluate an expression reference against one value
    pub fn apply(&self, expref: &Ast, data: &Value) -> Result<Value, QueryError> {
        self.interpreter.eval(expref, data)
    }

    /// A runtime error positioned at this call
    pub fn error(&self, reason: RuntimeError) -> QueryError {
        self.interpreter.runtime_error(self.offset, reason)
    }

    pub fn function_error(&self, source: FunctionError) -> QueryError {
        QueryError::Function {
            function: self.function.to_owned(),
            source,
        }
    }

    fn mismatch(&self, position: usize, expected: &str) -> QueryError {
        let actual = self.args.get(position).map_or("nothing", Arg::type_name);
        self.error(RuntimeError::InvalidType {
            expected: expected.to_owned(),
            actual: actual.to_owned(),
            position,
        })
    }
}
