//! Tree-walking evaluation over `serde_json::Value`

use super::table::{Arg, Args, FunctionTable};
use super::Query;
use crate::error::QueryError;
use jmespath::ast::{Ast, Comparator, KeyValuePair};
use jmespath::{ErrorReason, JmespathError, RuntimeError};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Evaluates one compiled query with a fixed set of functions
pub struct Interpreter<'q> {
    query: &'q Query,
    functions: &'q FunctionTable,
}

impl<'q> Interpreter<'q> {
    pub fn new(query: &'q Query, functions: &'q FunctionTable) -> Self {
        Interpreter { query, functions }
    }

    pub fn eval(&self, node: &Ast, data: &Value) -> Result<Value, QueryError> {
        match node {
            Ast::Identity { .. } => Ok(data.clone()),
            Ast::Field { name, .. } => Ok(data.get(name.as_str()).cloned().unwrap_or(Value::Null)),
            Ast::Subexpr { lhs, rhs, .. } => {
                let left = self.eval(lhs, data)?;
                self.eval(rhs, &left)
            }
            Ast::Index { idx, .. } => Ok(index(data, *idx)),
            Ast::Literal { offset, .. } => Ok(self.query.literal(*offset)),
            Ast::Or { lhs, rhs, .. } => {
                let left = self.eval(lhs, data)?;
                if is_truthy(&left) {
                    Ok(left)
                } else {
                    self.eval(rhs, data)
                }
            }
            Ast::And { lhs, rhs, .. } => {
                let left = self.eval(lhs, data)?;
                if is_truthy(&left) {
                    self.eval(rhs, data)
                } else {
                    Ok(left)
                }
            }
            Ast::Not { node, .. } => Ok(Value::Bool(!is_truthy(&self.eval(node, data)?))),
            Ast::Condition { predicate, then, .. } => {
                if is_truthy(&self.eval(predicate, data)?) {
                    self.eval(then, data)
                } else {
                    Ok(Value::Null)
                }
            }
            Ast::Comparison {
                comparator,
                lhs,
                rhs,
                ..
            } => {
                let left = self.eval(lhs, data)?;
                let right = self.eval(rhs, data)?;
                Ok(compare(comparator, &left, &right).map_or(Value::Null, Value::Bool))
            }
            Ast::ObjectValues { node, .. } => match self.eval(node, data)? {
                Value::Object(object) => {
                    Ok(Value::Array(object.into_iter().map(|(_, v)| v).collect()))
                }
                _ => Ok(Value::Null),
            },
            Ast::Projection { lhs, rhs, .. } => match self.eval(lhs, data)? {
                Value::Array(items) => {
                    let mut projected = Vec::with_capacity(items.len());
                    for item in &items {
                        let value = self.eval(rhs, item)?;
                        if !value.is_null() {
                            projected.push(value);
                        }
                    }
                    Ok(Value::Array(projected))
                }
                _ => Ok(Value::Null),
            },
            Ast::Flatten { node, .. } => match self.eval(node, data)? {
                Value::Array(items) => {
                    let mut flat = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            Value::Array(inner) => flat.extend(inner),
                            other => flat.push(other),
                        }
                    }
                    Ok(Value::Array(flat))
                }
                _ => Ok(Value::Null),
            },
            Ast::MultiList { elements, .. } => {
                if data.is_null() {
                    return Ok(Value::Null);
                }
                elements
                    .iter()
                    .map(|element| self.eval(element, data))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            Ast::MultiHash { elements, .. } => {
                if data.is_null() {
                    return Ok(Value::Null);
                }
                let mut object = Map::new();
                for KeyValuePair { key, value } in elements {
                    object.insert(key.clone(), self.eval(value, data)?);
                }
                Ok(Value::Object(object))
            }
            Ast::Function { name, args, offset } => self.call(name, args, data, *offset),
            Ast::Expref { offset, .. } => Err(QueryError::Expref { offset: *offset }),
            Ast::Slice {
                start,
                stop,
                step,
                offset,
            } => {
                if *step == 0 {
                    return Err(self.runtime_error(*offset, RuntimeError::InvalidSlice));
                }
                match data {
                    Value::Array(items) => Ok(Value::Array(
                        slice_positions(items.len(), *start, *stop, *step)
                            .into_iter()
                            .map(|i| items[i].clone())
                            .collect(),
                    )),
                    _ => Ok(Value::Null),
                }
            }
        }
    }

    /// Arguments are evaluated before the name is looked up, so an unknown
    /// function on an untaken branch never fails.
    fn call(
        &self,
        name: &str,
        nodes: &[Ast],
        data: &Value,
        offset: usize,
    ) -> Result<Value, QueryError> {
        let mut args = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Ast::Expref { ast, .. } => args.push(Arg::Expref(ast)),
                other => args.push(Arg::Value(self.eval(other, data)?)),
            }
        }

        let Some(function) = self.functions.get(name) else {
            return Err(self.runtime_error(offset, RuntimeError::UnknownFunction(name.to_owned())));
        };
        function
            .signature
            .validate(&args)
            .map_err(|reason| self.runtime_error(offset, reason))?;

        (function.handler)(&Args {
            function: name,
            offset,
            args,
            interpreter: self,
        })
    }

    pub(crate) fn runtime_error(&self, offset: usize, reason: RuntimeError) -> QueryError {
        QueryError::Runtime(JmespathError::new(
            self.query.as_str(),
            offset,
            ErrorReason::Runtime(reason),
        ))
    }
}

/// Empty strings, arrays and objects are false, as are `false` and `null`
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(_) => true,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(object) => !object.is_empty(),
    }
}

/// Structural equality where numbers compare by value, so `1` equals `1.0`
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => left == right,
    }
}

/// `None` when an ordering comparison is applied to anything but two numbers
fn compare(comparator: &Comparator, left: &Value, right: &Value) -> Option<bool> {
    let ordering = || match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => None,
    };

    match comparator {
        Comparator::Equal => Some(values_equal(left, right)),
        Comparator::NotEqual => Some(!values_equal(left, right)),
        Comparator::LessThan => ordering().map(Ordering::is_lt),
        Comparator::LessThanEqual => ordering().map(Ordering::is_le),
        Comparator::GreaterThan => ordering().map(Ordering::is_gt),
        Comparator::GreaterThanEqual => ordering().map(Ordering::is_ge),
    }
}

/// Negative indexes count from the end
fn index(data: &Value, idx: i32) -> Value {
    let Value::Array(items) = data else {
        return Value::Null;
    };
    let position = if idx >= 0 {
        Some(idx as usize)
    } else {
        items.len().checked_sub(idx.unsigned_abs() as usize)
    };

    position
        .and_then(|i| items.get(i))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Positions selected by `[start:stop:step]`. `step` is never zero here.
fn slice_positions(len: usize, start: Option<i32>, stop: Option<i32>, step: i32) -> Vec<usize> {
    let len = len as i64;
    let step = i64::from(step);

    let start = match start {
        Some(s) => adjust_endpoint(len, i64::from(s), step),
        None if step < 0 => len - 1,
        None => 0,
    };
    let stop = match stop {
        Some(s) => adjust_endpoint(len, i64::from(s), step),
        None if step < 0 => -1,
        None => len,
    };

    let mut positions = Vec::new();
    let mut i = start;
    if step > 0 {
        while i < stop {
            positions.push(i as usize);
            i += step;
        }
    } else {
        while i > stop {
            positions.push(i as usize);
            i += step;
        }
    }
    positions
}

fn adjust_endpoint(len: i64, endpoint: i64, step: i64) -> i64 {
    if endpoint < 0 {
        let endpoint = endpoint + len;
        match (endpoint >= 0, step < 0) {
            (true, _) => endpoint,
            (false, true) => -1,
            (false, false) => 0,
        }
    } else if endpoint >= len {
        if step < 0 {
            len - 1
        } else {
            len
        }
    } else {
        endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search(expression: &str, data: Value) -> Result<Value, QueryError> {
        let query = Query::compile(expression).unwrap();
        query.search(&data, &FunctionTable::with_builtins())
    }

    #[test]
    fn test_paths_and_indexes() {
        let data = json!({"a": {"b": [10, 20, 30]}});

        assert_eq!(search("a.b[0]", data.clone()).unwrap(), json!(10));
        assert_eq!(search("a.b[-1]", data.clone()).unwrap(), json!(30));
        assert_eq!(search("a.b[-4]", data.clone()).unwrap(), Value::Null);
        assert_eq!(search("a.missing.c", data.clone()).unwrap(), Value::Null);
        assert_eq!(search("a.b.c", data).unwrap(), Value::Null);
    }

    #[test]
    fn test_slices() {
        let data = json!([0, 1, 2, 3, 4, 5]);

        assert_eq!(search("[1:3]", data.clone()).unwrap(), json!([1, 2]));
        assert_eq!(search("[::2]", data.clone()).unwrap(), json!([0, 2, 4]));
        assert_eq!(search("[::-1]", data.clone()).unwrap(), json!([5, 4, 3, 2, 1, 0]));
        assert_eq!(search("[-2:]", data.clone()).unwrap(), json!([4, 5]));
        assert_eq!(search("[10:]", data.clone()).unwrap(), json!([]));
        assert_eq!(search("[::-1]", json!([])).unwrap(), json!([]));

        let err = search("[::0]", data).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Runtime(JmespathError {
                reason: ErrorReason::Runtime(RuntimeError::InvalidSlice),
                ..
            })
        ));
    }

    #[test]
    fn test_projections_drop_nulls() {
        let data = json!({"items": [{"id": 1}, {"other": 2}, {"id": 3}]});

        assert_eq!(search("items[*].id", data.clone()).unwrap(), json!([1, 3]));
        assert_eq!(search("items[].id", data.clone()).unwrap(), json!([1, 3]));
        assert_eq!(search("items.id", data).unwrap(), Value::Null);
        assert_eq!(search("[]", json!([[1, [2]], 3])).unwrap(), json!([1, [2], 3]));
    }

    #[test]
    fn test_object_projection_keeps_document_order() {
        let data = json!({"z": {"n": 1}, "a": {"n": 2}, "m": {"n": 3}});

        assert_eq!(search("*.n", data.clone()).unwrap(), json!([1, 2, 3]));
        assert_eq!(search("keys(@)", data).unwrap(), json!(["z", "a", "m"]));
    }

    #[test]
    fn test_identity_keeps_key_order() {
        let result = search("@", json!({"z": 1, "a": 2})).unwrap();
        let keys: Vec<&String> = result.as_object().unwrap().keys().collect();

        assert_eq!(keys, ["z", "a"]);
    }

    #[test]
    fn test_multi_select_hash_uses_expression_order() {
        let result = search("{z: a, b: b}", json!({"a": 1, "b": 2})).unwrap();
        let keys: Vec<&String> = result.as_object().unwrap().keys().collect();

        assert_eq!(keys, ["z", "b"]);
        assert_eq!(search("{a: a}", Value::Null).unwrap(), Value::Null);
        assert_eq!(search("[a, b]", json!({"a": 1})).unwrap(), json!([1, null]));
    }

    #[test]
    fn test_json_literal_keeps_key_order() {
        let result = search("`{\"z\": 1, \"a\": [2]}`", Value::Null).unwrap();
        let keys: Vec<&String> = result.as_object().unwrap().keys().collect();

        assert_eq!(keys, ["z", "a"]);
        assert_eq!(search("'raw'", Value::Null).unwrap(), json!("raw"));
        assert_eq!(search("`\"back\\`tick\"`", Value::Null).unwrap(), json!("back`tick"));
    }

    #[test]
    fn test_logic_and_comparisons() {
        let data = json!({"n": 5, "s": "", "list": [1], "f": 1.0, "i": 1});

        assert_eq!(search("s || n", data.clone()).unwrap(), json!(5));
        assert_eq!(search("list && n", data.clone()).unwrap(), json!(5));
        assert_eq!(search("s && n", data.clone()).unwrap(), json!(""));
        assert_eq!(search("!s", data.clone()).unwrap(), json!(true));
        assert_eq!(search("n > `3`", data.clone()).unwrap(), json!(true));
        assert_eq!(search("s < n", data.clone()).unwrap(), Value::Null);
        assert_eq!(search("f == i", data.clone()).unwrap(), json!(true));
        assert_eq!(search("n != s", data).unwrap(), json!(true));
    }

    #[test]
    fn test_filter_projection() {
        let data = json!({"people": [{"age": 20, "n": "a"}, {"age": 40, "n": "b"}]});

        assert_eq!(search("people[?age > `30`].n", data).unwrap(), json!(["b"]));
    }

    #[test]
    fn test_unknown_function_only_fails_when_reached() {
        let data = json!({"a": 1});

        assert_eq!(search("a || nope(@)", data.clone()).unwrap(), json!(1));
        assert!(search("missing || nope(@)", data).unwrap_err().is_unknown_function());
    }

    #[test]
    fn test_dangling_expref_is_an_error() {
        assert!(matches!(
            search("&a", json!({"a": 1})),
            Err(QueryError::Expref { offset: 0 })
        ));
    }
}
