//! The standard JMESPath function library over ordered JSON values

use super::interpreter::values_equal;
use super::signature::{ArgType, Signature};
use super::table::{type_name, Args, FunctionTable};
use crate::error::QueryError;
use jmespath::RuntimeError;
use serde_json::{Map, Value};
use std::cmp::Ordering;

type Result<T> = std::result::Result<T, QueryError>;

pub(super) fn register(table: &mut FunctionTable) {
    use ArgType::*;

    let strings_or_numbers = || Union(vec![ArgType::array_of(String), ArgType::array_of(Number)]);

    table.register("abs", Signature::new(vec![Number], None), abs);
    table.register("avg", Signature::new(vec![ArgType::array_of(Number)], None), avg);
    table.register("ceil", Signature::new(vec![Number], None), ceil);
    table.register(
        "contains",
        Signature::new(vec![Union(vec![String, Array]), Any], None),
        contains,
    );
    table.register("ends_with", Signature::new(vec![String, String], None), ends_with);
    table.register("floor", Signature::new(vec![Number], None), floor);
    table.register(
        "join",
        Signature::new(vec![String, ArgType::array_of(String)], None),
        join,
    );
    table.register("keys", Signature::new(vec![Object], None), keys);
    table.register(
        "length",
        Signature::new(vec![Union(vec![Array, Object, String])], None),
        length,
    );
    table.register("map", Signature::new(vec![Expref, Array], None), map);
    table.register("max", Signature::new(vec![strings_or_numbers()], None), max);
    table.register("max_by", Signature::new(vec![Array, Expref], None), max_by);
    table.register("merge", Signature::new(vec![Object], Some(Object)), merge);
    table.register("min", Signature::new(vec![strings_or_numbers()], None), min);
    table.register("min_by", Signature::new(vec![Array, Expref], None), min_by);
    table.register("not_null", Signature::new(vec![Any], Some(Any)), not_null);
    table.register(
        "reverse",
        Signature::new(vec![Union(vec![Array, String])], None),
        reverse,
    );
    table.register("sort", Signature::new(vec![strings_or_numbers()], None), sort);
    table.register("sort_by", Signature::new(vec![Array, Expref], None), sort_by);
    table.register("starts_with", Signature::new(vec![String, String], None), starts_with);
    table.register("sum", Signature::new(vec![ArgType::array_of(Number)], None), sum);
    table.register("to_array", Signature::new(vec![Any], None), to_array);
    table.register("to_number", Signature::new(vec![Any], None), to_number);
    table.register("to_string", Signature::new(vec![Any], None), to_string);
    table.register("type", Signature::new(vec![Any], None), type_of);
    table.register("values", Signature::new(vec![Object], None), values);
}

/// A float result, kept integral when it has no fractional part
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return Value::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
}

fn abs(args: &Args<'_>) -> Result<Value> {
    match args.value(0)?.as_i64() {
        Some(n) => Ok(n.checked_abs().map_or_else(|| number((n as f64).abs()), Value::from)),
        None => Ok(number(args.number(0)?.abs())),
    }
}

fn avg(args: &Args<'_>) -> Result<Value> {
    let items = args.array(0)?;
    if items.is_empty() {
        return Ok(Value::Null);
    }
    let total: f64 = items.iter().filter_map(Value::as_f64).sum();
    Ok(serde_json::Number::from_f64(total / items.len() as f64).map_or(Value::Null, Value::Number))
}

fn ceil(args: &Args<'_>) -> Result<Value> {
    Ok(number(args.number(0)?.ceil()))
}

fn floor(args: &Args<'_>) -> Result<Value> {
    Ok(number(args.number(0)?.floor()))
}

fn contains(args: &Args<'_>) -> Result<Value> {
    let needle = args.value(1)?;
    let found = match args.value(0)? {
        Value::String(haystack) => needle.as_str().is_some_and(|n| haystack.contains(n)),
        Value::Array(items) => items.iter().any(|item| values_equal(item, needle)),
        _ => false,
    };
    Ok(Value::Bool(found))
}

fn ends_with(args: &Args<'_>) -> Result<Value> {
    Ok(Value::Bool(args.string(0)?.ends_with(args.string(1)?)))
}

fn starts_with(args: &Args<'_>) -> Result<Value> {
    Ok(Value::Bool(args.string(0)?.starts_with(args.string(1)?)))
}

fn join(args: &Args<'_>) -> Result<Value> {
    let glue = args.string(0)?;
    let parts: Vec<&str> = args.array(1)?.iter().filter_map(Value::as_str).collect();
    Ok(Value::String(parts.join(glue)))
}

fn keys(args: &Args<'_>) -> Result<Value> {
    Ok(Value::Array(
        args.object(0)?.keys().cloned().map(Value::String).collect(),
    ))
}

fn values(args: &Args<'_>) -> Result<Value> {
    Ok(Value::Array(args.object(0)?.values().cloned().collect()))
}

fn length(args: &Args<'_>) -> Result<Value> {
    let len = match args.value(0)? {
        Value::Array(items) => items.len(),
        Value::Object(object) => object.len(),
        Value::String(s) => s.chars().count(),
        _ => 0,
    };
    Ok(Value::from(len))
}

fn map(args: &Args<'_>) -> Result<Value> {
    let expref = args.expref(0)?;
    args.array(1)?
        .iter()
        .map(|item| args.apply(expref, item))
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

/// Order for two values of the same comparable type
fn natural_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

fn max(args: &Args<'_>) -> Result<Value> {
    Ok(extreme(args.array(0)?, Ordering::Greater))
}

fn min(args: &Args<'_>) -> Result<Value> {
    Ok(extreme(args.array(0)?, Ordering::Less))
}

/// The first element that no later element beats in the `wanted` direction
fn extreme(items: &[Value], wanted: Ordering) -> Value {
    let mut best: Option<&Value> = None;
    for item in items {
        match best {
            Some(current) if natural_order(item, current) != wanted => {}
            _ => best = Some(item),
        }
    }
    best.cloned().unwrap_or(Value::Null)
}

/// Evaluate the expression reference against every element and check that
/// all keys are numbers or all are strings
fn sort_keys(args: &Args<'_>) -> Result<Vec<Value>> {
    let expref = args.expref(1)?;
    let items = args.array(0)?;
    let mut keys = Vec::with_capacity(items.len());
    let mut first_type = None;

    for (invocation, item) in items.iter().enumerate() {
        let key = args.apply(expref, item)?;
        let actual = type_name(&key);

        match first_type {
            None if actual == "number" || actual == "string" => first_type = Some(actual),
            None => {
                return Err(args.error(RuntimeError::InvalidReturnType {
                    expected: "expression->number|expression->string".to_owned(),
                    actual: actual.to_owned(),
                    position: 1,
                    invocation: 1,
                }))
            }
            Some(expected) if expected != actual => {
                return Err(args.error(RuntimeError::InvalidReturnType {
                    expected: format!("expression->{}", expected),
                    actual: actual.to_owned(),
                    position: 1,
                    invocation: invocation + 1,
                }))
            }
            Some(_) => {}
        }
        keys.push(key);
    }

    Ok(keys)
}

fn max_by(args: &Args<'_>) -> Result<Value> {
    extreme_by(args, Ordering::Greater)
}

fn min_by(args: &Args<'_>) -> Result<Value> {
    extreme_by(args, Ordering::Less)
}

fn extreme_by(args: &Args<'_>, wanted: Ordering) -> Result<Value> {
    let keys = sort_keys(args)?;
    let items = args.array(0)?;
    let mut best: Option<usize> = None;

    for (i, key) in keys.iter().enumerate() {
        match best {
            Some(current) if natural_order(key, &keys[current]) != wanted => {}
            _ => best = Some(i),
        }
    }
    Ok(best.map_or(Value::Null, |i| items[i].clone()))
}

fn sort(args: &Args<'_>) -> Result<Value> {
    let mut items = args.array(0)?.to_vec();
    items.sort_by(natural_order);
    Ok(Value::Array(items))
}

fn sort_by(args: &Args<'_>) -> Result<Value> {
    let keys = sort_keys(args)?;
    let mut keyed: Vec<(Value, &Value)> = keys.into_iter().zip(args.array(0)?).collect();
    keyed.sort_by(|a, b| natural_order(&a.0, &b.0));
    Ok(Value::Array(keyed.into_iter().map(|(_, item)| item.clone()).collect()))
}

/// Later objects overwrite earlier keys, which keep their first position
fn merge(args: &Args<'_>) -> Result<Value> {
    let mut merged = Map::new();
    for position in 0..args.len() {
        for (key, value) in args.object(position)? {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::Object(merged))
}

fn not_null(args: &Args<'_>) -> Result<Value> {
    for position in 0..args.len() {
        let value = args.value(position)?;
        if !value.is_null() {
            return Ok(value.clone());
        }
    }
    Ok(Value::Null)
}

fn reverse(args: &Args<'_>) -> Result<Value> {
    match args.value(0)? {
        Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
        _ => {
            let mut items = args.array(0)?.to_vec();
            items.reverse();
            Ok(Value::Array(items))
        }
    }
}

fn sum(args: &Args<'_>) -> Result<Value> {
    let items = args.array(0)?;
    let integers: Option<Vec<i64>> = items.iter().map(Value::as_i64).collect();

    if let Some(total) = integers.and_then(|ns| ns.into_iter().try_fold(0i64, i64::checked_add)) {
        return Ok(Value::from(total));
    }
    let total: f64 = items.iter().filter_map(Value::as_f64).sum();
    Ok(serde_json::Number::from_f64(total).map_or(Value::Null, Value::Number))
}

fn to_array(args: &Args<'_>) -> Result<Value> {
    match args.value(0)? {
        Value::Array(_) => Ok(args.value(0)?.clone()),
        other => Ok(Value::Array(vec![other.clone()])),
    }
}

fn to_number(args: &Args<'_>) -> Result<Value> {
    match args.value(0)? {
        Value::Number(_) => Ok(args.value(0)?.clone()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return Ok(Value::from(n));
            }
            Ok(s.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map_or(Value::Null, Value::Number))
        }
        _ => Ok(Value::Null),
    }
}

fn to_string(args: &Args<'_>) -> Result<Value> {
    match args.value(0)? {
        Value::String(s) => Ok(Value::String(s.clone())),
        other => Ok(Value::String(other.to_string())),
    }
}

fn type_of(args: &Args<'_>) -> Result<Value> {
    Ok(Value::String(args.iter().next().map_or("null", |a| a.type_name()).to_owned()))
}
