//! Binding of the reshaping functions into a query function table

use crate::error::QueryError;
use crate::query::{ArgType, Args, FunctionTable, Handler, Signature};
use serde_json::Value;

/// Create a table with the builtin functions and the reshaping functions registered
pub fn new_function_table() -> FunctionTable {
    let mut table = FunctionTable::with_builtins();
    register_functions(&mut table);
    table
}

/// Register the reshaping functions on an existing table.
///
/// Argument types are checked against the signature before a handler runs.
pub fn register_functions(table: &mut FunctionTable) {
    let functions: [(&str, Vec<ArgType>, Handler); 5] = [
        (
            "from_string",
            vec![ArgType::Union(vec![ArgType::Array, ArgType::String])],
            from_string,
        ),
        ("pairs", vec![ArgType::Object], pairs),
        ("items", vec![ArgType::Object], pairs),
        ("to_hash", vec![ArgType::Array], to_hash),
        (
            "unroll",
            vec![ArgType::Array, ArgType::String, ArgType::String],
            unroll,
        ),
    ];

    for (name, inputs, handler) in functions {
        table.register(name, Signature::new(inputs, None), handler);
    }
}

fn from_string(args: &Args<'_>) -> Result<Value, QueryError> {
    super::from_string(args.value(0)?).map_err(|e| args.function_error(e))
}

fn pairs(args: &Args<'_>) -> Result<Value, QueryError> {
    Ok(Value::Array(super::pairs(args.object(0)?)))
}

fn to_hash(args: &Args<'_>) -> Result<Value, QueryError> {
    Ok(Value::Object(super::to_hash(args.array(0)?)))
}

fn unroll(args: &Args<'_>) -> Result<Value, QueryError> {
    let unrolled = super::unroll(args.array(0)?, args.string(1)?, args.string(2)?);
    Ok(Value::Object(unrolled))
}
