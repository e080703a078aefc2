//! Order-preserving evaluation of JMESPath expressions
//!
//! Expressions are parsed with the `jmespath` crate and evaluated here over
//! `serde_json::Value`, so an object keeps the key order it had in the input
//! document through every projection and function call. JSON literals in the
//! expression keep the order they were written in.

mod builtins;
mod interpreter;
mod signature;
mod table;

pub use interpreter::{is_truthy, values_equal, Interpreter};
pub use signature::{ArgType, Signature};
pub use table::{type_name, Arg, Args, FunctionDef, FunctionTable, Handler};

use crate::error::QueryError;
use jmespath::ast::Ast;
use jmespath::{ErrorReason, JmespathError};
use serde_json::Value;
use std::collections::HashMap;

/// A parsed expression, ready to search any number of documents
#[derive(Debug, Clone)]
pub struct Query {
    expression: String,
    ast: Ast,
    /// Literal values keyed by their offset in the expression
    literals: HashMap<usize, Value>,
}

impl Query {
    pub fn compile(expression: &str) -> Result<Self, JmespathError> {
        let ast = jmespath::parse(expression)?;
        let mut literals = HashMap::new();
        collect_literals(expression, &ast, &mut literals)?;

        Ok(Query {
            expression: expression.to_owned(),
            ast,
            literals,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.expression
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Evaluate against one document
    pub fn search(&self, data: &Value, functions: &FunctionTable) -> Result<Value, QueryError> {
        Interpreter::new(self, functions).eval(&self.ast, data)
    }

    fn literal(&self, offset: usize) -> Value {
        self.literals.get(&offset).cloned().unwrap_or(Value::Null)
    }
}

fn collect_literals(
    expression: &str,
    node: &Ast,
    literals: &mut HashMap<usize, Value>,
) -> Result<(), JmespathError> {
    let children: Vec<&Ast> = match node {
        Ast::Literal { value, offset } => {
            // The parser's own value stores objects sorted by key, so JSON
            // literals are read again from the expression text.
            let ordered = json_literal_text(expression, *offset)
                .and_then(|text| serde_json::from_str(&text).ok());
            let value = match ordered {
                Some(value) => value,
                None => serde_json::to_value(&**value).map_err(|e| {
                    JmespathError::new(expression, *offset, ErrorReason::Parse(e.to_string()))
                })?,
            };
            literals.insert(*offset, value);
            vec![]
        }
        Ast::Identity { .. } | Ast::Field { .. } | Ast::Index { .. } | Ast::Slice { .. } => vec![],
        Ast::Expref { ast, .. } => vec![&**ast],
        Ast::Flatten { node, .. } | Ast::Not { node, .. } | Ast::ObjectValues { node, .. } => {
            vec![&**node]
        }
        Ast::Comparison { lhs, rhs, .. }
        | Ast::Projection { lhs, rhs, .. }
        | Ast::And { lhs, rhs, .. }
        | Ast::Or { lhs, rhs, .. }
        | Ast::Subexpr { lhs, rhs, .. } => vec![&**lhs, &**rhs],
        Ast::Condition { predicate, then, .. } => vec![&**predicate, &**then],
        Ast::Function { args, .. } => args.iter().collect(),
        Ast::MultiList { elements, .. } => elements.iter().collect(),
        Ast::MultiHash { elements, .. } => elements.iter().map(|pair| &pair.value).collect(),
    };

    for child in children {
        collect_literals(expression, child, literals)?;
    }
    Ok(())
}

/// Text between the backticks of a JSON literal starting at `offset`
fn json_literal_text(expression: &str, offset: usize) -> Option<String> {
    let rest = expression.get(offset..)?.strip_prefix('`')?;
    let mut text = String::new();
    let mut chars = rest.chars();

    while let Some(c) = chars.next() {
        match c {
            '`' => return Some(text.replace("\\`", "`")),
            '\\' => {
                text.push(c);
                text.extend(chars.next());
            }
            _ => text.push(c),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compile_rejects_bad_syntax() {
        assert!(Query::compile("a[").is_err());
        assert!(Query::compile("foo.`bar").is_err());
    }

    #[test]
    fn test_literal_text_handles_escapes() {
        assert_eq!(json_literal_text("`[1]`", 0).as_deref(), Some("[1]"));
        assert_eq!(json_literal_text("a || `\"x\\`y\"`", 5).as_deref(), Some("\"x`y\""));
        assert_eq!(json_literal_text("'raw'", 0), None);
    }

    #[test]
    fn test_nested_literals_are_collected() {
        let query = Query::compile("merge(`{\"b\": 1, \"a\": 2}`, {k: `{\"y\": 0, \"x\": 0}`})")
            .unwrap();
        let result = query.search(&json!({}), &FunctionTable::with_builtins()).unwrap();

        assert_eq!(result.to_string(), r#"{"b":1,"a":2,"k":{"y":0,"x":0}}"#);
    }

    #[test]
    fn test_query_is_reusable() {
        let query = Query::compile("a").unwrap();
        let functions = FunctionTable::new();

        assert_eq!(query.search(&json!({"a": 1}), &functions).unwrap(), json!(1));
        assert_eq!(query.search(&json!({"a": 2}), &functions).unwrap(), json!(2));
        assert_eq!(query.as_str(), "a");
    }
}
